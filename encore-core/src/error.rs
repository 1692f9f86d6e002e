use encore_dependencies::{
    axum::{
        self,
        headers::{ContentType, HeaderMapExt},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Redirect, Response},
        Json,
    },
    http, hyper, reqwest, ring, url,
};
use encore_models::EncoreModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoreError {
    #[error("Database Error: {0}")]
    Database(#[from] EncoreModelError),
    #[error("SQLx Error: {0}")]
    SQLx(#[from] sqlx::Error),
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Ring: Unspecified: {0}")]
    RingUnspec(#[from] ring::error::Unspecified),
    #[error("Serde: JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Could not parse URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Could not join thread: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("HTTP Server Error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("General HTTP Format Error: {0:?}")]
    HttpError(#[from] http::Error),
    #[error("Configuration Variable Unset: {0}")]
    ConfigurationUnset(String),
    #[error("{0} {1} not found")]
    ObjectNotFound(String, String),
    #[error("Access has been denied")]
    AccessDenied,
    #[error("CSRF verification failed: {0}")]
    CsrfFailure(&'static str),
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Login required")]
    LoginRequired { ajax: bool, redirect: String },
    #[error("Invalid Log Level {0:?}")]
    InvalidLogLevel(String),
    #[error("Other Error: {0:?}")]
    Other(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type EncoreResult<T> = std::result::Result<T, EncoreError>;

fn html_response(status: StatusCode, content: maud::Markup) -> Response {
    let mut hm = HeaderMap::new();
    hm.typed_insert(ContentType::html());
    (status, hm, content.into_string()).into_response()
}

impl axum::response::IntoResponse for EncoreError {
    fn into_response(self) -> Response {
        match self {
            EncoreError::LoginRequired { ajax: true, .. } => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "login required" })),
            )
                .into_response(),
            EncoreError::LoginRequired {
                ajax: false,
                redirect,
            } => Redirect::to(&redirect).into_response(),
            EncoreError::CsrfFailure(reason) => {
                warn!("Forbidden (CSRF verification failed): {}", reason);
                html_response(
                    StatusCode::FORBIDDEN,
                    maud::html! {
                        h1 { "Forbidden (403)" }
                        p { "CSRF verification failed. Request aborted." }
                    },
                )
            }
            EncoreError::PayloadTooLarge(_) => {
                warn!("Rejected request: {}", self);
                html_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    maud::html! {
                        h1 { "Payload Too Large (413)" }
                    },
                )
            }
            EncoreError::AccessDenied => html_response(
                StatusCode::FORBIDDEN,
                maud::html! {
                    b { (self.to_string()) };
                },
            ),
            EncoreError::ObjectNotFound(..) => html_response(
                StatusCode::NOT_FOUND,
                maud::html! {
                    h1 { "Not Found" }
                    p { (self.to_string()) }
                },
            ),
            _ => {
                error!("Error presented to user: {:?}", self);
                let c = if cfg!(debug_assertions) {
                    maud::html! {
                        "Internal Error"
                        br;
                        b { pre { (self.to_string()) } };
                    }
                } else {
                    maud::html! {
                        "Internal Error"
                        br;
                    }
                };
                html_response(StatusCode::INTERNAL_SERVER_ERROR, c)
            }
        }
    }
}
