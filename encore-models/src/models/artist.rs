use std::str::FromStr;

use chrono::NaiveDateTime;

#[derive(sqlx::FromRow, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Artist {
    pub fn kind(&self) -> ArtistKind {
        ArtistKind::from_str(&self.kind).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtistKind {
    #[default]
    Individual,
    Group,
}

impl ArtistKind {
    /// Column value, three letters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "IND",
            Self::Group => "GRP",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
        }
    }
}

impl FromStr for ArtistKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ind" | "individual" => Ok(Self::Individual),
            "grp" | "group" => Ok(Self::Group),
            v => Err(format!("unknown artist kind {:?}, expected ind or grp", v)),
        }
    }
}
