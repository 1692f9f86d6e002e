use encore_dependencies::{lazy_static, regex::Regex};

lazy_static::lazy_static! {
    static ref SLUG_NONPRINTABLE: Regex = Regex::new(r#"[^ -~]"#).unwrap();
    static ref SLUG_NONALPHARUNS: Regex = Regex::new(r#"[^a-zA-Z0-9]+"#).unwrap();
    static ref SLUG_STARTENDHYPHENS: Regex = Regex::new(r#"^-|-$"#).unwrap();
}

/// Lossy slug used for genre URLs, "Hip Hop / Rap" becomes "hip-hop-rap"
pub fn slugify<S: AsRef<str>>(data: S) -> String {
    let data = SLUG_NONPRINTABLE.replace_all(data.as_ref(), "");
    let data = SLUG_NONALPHARUNS.replace_all(&data, "-");
    let data = SLUG_STARTENDHYPHENS.replace_all(&data, "");
    data.to_ascii_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_genre_slugs() {
        assert_eq!("hip-hop-rap", slugify("Hip Hop / Rap"));
        assert_eq!("r-b", slugify("R&B"));
        assert_eq!("80s-synth-pop", slugify("  80s Synth-Pop!  "));
        assert_eq!("", slugify("~`!@#$%^&*()"));
    }

    #[test]
    pub fn test_non_ascii_is_dropped() {
        assert_eq!("mtley-cre", slugify("Mötley Crüe"));
    }
}
