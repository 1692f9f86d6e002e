use encore_dependencies::{reqwest, url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("Transport Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Transport Error: {0}")]
    Transport(String),
    #[error("Response is not a favorite record: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("No element with id {0:?}")]
    MissingElement(String),
    #[error("Toggle element has no href")]
    MissingHref,
    #[error("Could not parse URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Refusing to send credentials to {0}, it is not the document origin")]
    CrossOrigin(url::Url),
}

pub type ToggleResult<T> = std::result::Result<T, ToggleError>;
