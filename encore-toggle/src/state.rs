use encore_dependencies::reqwest::Method;

/// Id of the toggle element on the album page
pub const FAV_LINK_ID: &str = "fav-link";
pub const DATA_FAVORITED: &str = "data-favorited";
/// Icon classes, filled for a favorite and outlined otherwise
pub const FILLED: &str = "fas";
pub const OUTLINE: &str = "far";
pub const CSRF_COOKIE: &str = "csrftoken";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FavoriteState {
    Favorited,
    NotFavorited,
}

impl FavoriteState {
    /// Exactly `"true"` is a favorite, anything else (or nothing) is not
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Favorited,
            _ => Self::NotFavorited,
        }
    }

    pub fn as_attribute(&self) -> &'static str {
        match self {
            Self::Favorited => "true",
            Self::NotFavorited => "false",
        }
    }

    pub fn icon_class(&self) -> &'static str {
        match self {
            Self::Favorited => FILLED,
            Self::NotFavorited => OUTLINE,
        }
    }

    /// The verb that moves away from this state
    pub fn toggle_method(&self) -> Method {
        match self {
            Self::Favorited => Method::DELETE,
            Self::NotFavorited => Method::POST,
        }
    }
}

impl From<bool> for FavoriteState {
    fn from(favorited: bool) -> Self {
        if favorited {
            Self::Favorited
        } else {
            Self::NotFavorited
        }
    }
}
