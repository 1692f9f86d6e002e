use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};

use crate::ArtistKind;

#[derive(sqlx::FromRow, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist_id: Option<i64>,
    pub release_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An album as seen by one user in a listing
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct AlbumListing {
    #[sqlx(flatten)]
    pub album: Album,
    pub artist_name: Option<String>,
    pub favorited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub artist_name: Option<String>,
    pub artist_kind: ArtistKind,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
}

impl NewAlbum {
    pub fn titled<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            artist_name: None,
            artist_kind: ArtistKind::Individual,
            release_date: None,
            genres: Vec::new(),
        }
    }
    pub fn by<S: Into<String>>(mut self, artist_name: S) -> Self {
        self.artist_name = Some(artist_name.into());
        self
    }
    pub fn released(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }
    pub fn genre<S: Into<String>>(mut self, genre: S) -> Self {
        self.genres.push(genre.into());
        self
    }
}

/// Which albums a listing shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlbumFilter {
    #[default]
    All,
    Genre(i64),
    /// Case-insensitive substring of the title
    TitleContains(String),
    /// Case-insensitive substring of the artist's name
    ArtistContains(String),
}

impl AlbumFilter {
    /// Search terms from the `title` and `artist` query parameters. Blank
    /// terms are ignored, a title wins over an artist; `None` when neither
    /// is given.
    pub fn search(title: Option<&str>, artist: Option<&str>) -> Option<Self> {
        let term = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        match (term(title), term(artist)) {
            (Some(title), _) => Some(Self::TitleContains(title)),
            (None, Some(artist)) => Some(Self::ArtistContains(artist)),
            (None, None) => None,
        }
    }

    /// In-process counterpart of the SQL filter, `genres` are the album's genre ids
    pub fn matches(&self, listing: &AlbumListing, genres: &[i64]) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        match self {
            Self::All => true,
            Self::Genre(id) => genres.contains(id),
            Self::TitleContains(term) => contains(&listing.album.title, term),
            Self::ArtistContains(term) => listing
                .artist_name
                .as_deref()
                .map(|name| contains(name, term))
                .unwrap_or(false),
        }
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally in `ILIKE`
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ordering of the album listing, taken from the `sort` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlbumSort {
    #[default]
    Title,
    Artist,
    ReleaseDate,
    Newest,
}

impl AlbumSort {
    pub const ALL: [AlbumSort; 4] = [
        AlbumSort::Title,
        AlbumSort::Artist,
        AlbumSort::ReleaseDate,
        AlbumSort::Newest,
    ];

    /// Unknown or missing values fall back to sorting by title.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("artist") | Some("artist__name") => Self::Artist,
            Some("release_date") => Self::ReleaseDate,
            Some("newest") | Some("-created_at") => Self::Newest,
            _ => Self::Title,
        }
    }

    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::ReleaseDate => "release_date",
            Self::Newest => "newest",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Artist => "Artist",
            Self::ReleaseDate => "Release date",
            Self::Newest => "Recently added",
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            Self::Title => "a.title ASC, a.id ASC",
            Self::Artist => "ar.name ASC NULLS LAST, a.title ASC, a.id ASC",
            Self::ReleaseDate => "a.release_date ASC NULLS LAST, a.title ASC, a.id ASC",
            Self::Newest => "a.created_at DESC, a.id DESC",
        }
    }

    /// Same ordering as [`AlbumSort::order_by`], for stores that sort in process
    pub fn compare(&self, a: &AlbumListing, b: &AlbumListing) -> Ordering {
        let by_title = || {
            a.album
                .title
                .cmp(&b.album.title)
                .then(a.album.id.cmp(&b.album.id))
        };
        match self {
            Self::Title => by_title(),
            Self::Artist => nulls_last(&a.artist_name, &b.artist_name).then_with(by_title),
            Self::ReleaseDate => {
                nulls_last(&a.album.release_date, &b.album.release_date).then_with(by_title)
            }
            Self::Newest => b
                .album
                .created_at
                .cmp(&a.album.created_at)
                .then(b.album.id.cmp(&a.album.id)),
        }
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn listing(id: i64, title: &str, artist: Option<&str>, released: Option<NaiveDate>) -> AlbumListing {
        let created_at = NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, id as u32)
            .unwrap();
        AlbumListing {
            album: Album {
                id,
                title: title.to_string(),
                artist_id: None,
                release_date: released,
                created_at,
                updated_at: created_at,
            },
            artist_name: artist.map(str::to_string),
            favorited: false,
        }
    }

    #[test]
    fn test_sort_from_query() {
        assert_eq!(AlbumSort::Title, AlbumSort::from_query(None));
        assert_eq!(AlbumSort::Title, AlbumSort::from_query(Some("bogus; DROP TABLE")));
        assert_eq!(AlbumSort::Artist, AlbumSort::from_query(Some("artist__name")));
        assert_eq!(AlbumSort::Newest, AlbumSort::from_query(Some("-created_at")));
        for sort in AlbumSort::ALL {
            assert_eq!(sort, AlbumSort::from_query(Some(sort.as_query())));
        }
    }

    #[test]
    fn test_artist_sort_puts_unknown_artists_last() {
        let mut albums = vec![
            listing(1, "Purple Rain", None, None),
            listing(2, "Blue", Some("Joni Mitchell"), None),
            listing(3, "Abbey Road", Some("The Beatles"), None),
        ];
        albums.sort_by(|a, b| AlbumSort::Artist.compare(a, b));
        let ids: Vec<i64> = albums.iter().map(|l| l.album.id).collect();
        assert_eq!(vec![2, 3, 1], ids);
    }

    #[test]
    fn test_newest_first() {
        let mut albums = vec![
            listing(1, "B", None, None),
            listing(3, "A", None, None),
            listing(2, "C", None, None),
        ];
        albums.sort_by(|a, b| AlbumSort::Newest.compare(a, b));
        let ids: Vec<i64> = albums.iter().map(|l| l.album.id).collect();
        assert_eq!(vec![3, 2, 1], ids);
    }

    #[test]
    fn test_search_prefers_title() {
        assert_eq!(None, AlbumFilter::search(None, Some("  ")));
        assert_eq!(
            Some(AlbumFilter::TitleContains("blue".into())),
            AlbumFilter::search(Some(" blue "), Some("joni"))
        );
        assert_eq!(
            Some(AlbumFilter::ArtistContains("joni".into())),
            AlbumFilter::search(Some(""), Some("joni"))
        );
    }

    #[test]
    fn test_filter_matches_ignoring_case() {
        let blue = listing(1, "Blue", Some("Joni Mitchell"), None);
        let unknown = listing(2, "Untitled", None, None);
        assert!(AlbumFilter::TitleContains("BLU".into()).matches(&blue, &[]));
        assert!(AlbumFilter::ArtistContains("mitch".into()).matches(&blue, &[]));
        assert!(!AlbumFilter::ArtistContains("mitch".into()).matches(&unknown, &[]));
        assert!(AlbumFilter::Genre(9).matches(&blue, &[3, 9]));
        assert!(!AlbumFilter::Genre(9).matches(&unknown, &[3]));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!("%blue%", like_pattern("blue"));
        assert_eq!("%100\\%\\_\\\\%", like_pattern("100%_\\"));
    }

    #[test]
    fn test_release_date_sort() {
        let d = |y| NaiveDate::from_ymd_opt(y, 1, 1);
        let mut albums = vec![
            listing(1, "Undated", None, None),
            listing(2, "Late", None, d(1999)),
            listing(3, "Early", None, d(1969)),
        ];
        albums.sort_by(|a, b| AlbumSort::ReleaseDate.compare(a, b));
        let ids: Vec<i64> = albums.iter().map(|l| l.album.id).collect();
        assert_eq!(vec![3, 2, 1], ids);
    }
}
