use chrono::NaiveDate;

pub mod frontmatter;

/// Font Awesome style class of a heart, filled for favorites
pub fn heart_class(favorited: bool) -> &'static str {
    if favorited {
        "fas"
    } else {
        "far"
    }
}

pub fn human_date(d: Option<NaiveDate>) -> String {
    match d {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_human_date() {
        assert_eq!(
            "June 22, 1971",
            human_date(NaiveDate::from_ymd_opt(1971, 6, 22))
        );
        assert_eq!("unknown", human_date(None));
    }
}
