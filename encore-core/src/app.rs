pub use encore_models::DBPool;

#[derive(Clone, Debug)]
pub struct PageTitle(String);

impl PageTitle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::convert::From<String> for PageTitle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::convert::From<&str> for PageTitle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
