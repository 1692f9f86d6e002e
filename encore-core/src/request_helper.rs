use std::borrow::Cow;

use encore_dependencies::axum::{
    self,
    headers::{ContentType, HeaderMapExt},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Serialize;

use crate::error::{EncoreError, EncoreResult};

pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Whether the request came from script, as announced by `X-Requested-With`
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(X_REQUESTED_WITH)
        .map(|v| v.as_bytes() == b"XMLHttpRequest")
        .unwrap_or(false)
}

pub enum EncoreResponse {
    Html(HtmlResponse),
    Json(JsonResponse),
    Redirect(RedirectResponse),
    Error(EncoreError),
}

impl IntoResponse for EncoreResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            EncoreResponse::Html(h) => h.into_response(),
            EncoreResponse::Json(j) => j.into_response(),
            EncoreResponse::Redirect(r) => r.into_response(),
            EncoreResponse::Error(e) => e.into_response(),
        }
    }
}

impl From<HtmlResponse> for EncoreResponse {
    fn from(h: HtmlResponse) -> Self {
        Self::Html(h)
    }
}

impl From<JsonResponse> for EncoreResponse {
    fn from(j: JsonResponse) -> Self {
        Self::Json(j)
    }
}

impl From<RedirectResponse> for EncoreResponse {
    fn from(r: RedirectResponse) -> Self {
        Self::Redirect(r)
    }
}

pub struct HtmlResponse {
    pub content: String,
}

impl IntoResponse for HtmlResponse {
    fn into_response(self) -> axum::response::Response {
        let mut hm = HeaderMap::new();
        hm.typed_insert(ContentType::html());
        (hm, self.content).into_response()
    }
}

impl From<String> for HtmlResponse {
    fn from(s: String) -> Self {
        Self { content: s }
    }
}

impl From<maud::PreEscaped<String>> for HtmlResponse {
    fn from(s: maud::PreEscaped<String>) -> Self {
        Self { content: s.0 }
    }
}

pub struct RedirectResponse {
    pub redirect: Redirect,
}

impl IntoResponse for RedirectResponse {
    fn into_response(self) -> axum::response::Response {
        self.redirect.into_response()
    }
}

impl RedirectResponse {
    /// 303, so a POST or DELETE ends up as a GET of the target
    pub fn to(uri: &str) -> Self {
        Self {
            redirect: Redirect::to(uri),
        }
    }
}

pub struct JsonResponse {
    pub content: serde_json::Value,
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> axum::response::Response {
        Json(self.content).into_response()
    }
}

impl JsonResponse {
    pub fn serialize<T: Serialize>(v: &T) -> EncoreResult<Self> {
        Ok(JsonResponse {
            content: serde_json::to_value(v)?,
        })
    }
}

/// A file shipped with the binary
pub struct FileResponse {
    pub content: Cow<'static, [u8]>,
    pub content_type: HeaderValue,
}

impl IntoResponse for FileResponse {
    fn into_response(self) -> axum::response::Response {
        let mut hm = HeaderMap::new();
        hm.insert(header::CONTENT_TYPE, self.content_type);
        (hm, self.content.into_owned()).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use encore_dependencies::axum::http::StatusCode;

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert(X_REQUESTED_WITH, "fetch".parse().unwrap());
        assert!(!is_ajax(&headers));
        headers.insert(X_REQUESTED_WITH, "XMLHttpRequest".parse().unwrap());
        assert!(is_ajax(&headers));
    }

    #[test]
    fn test_response_kinds() {
        let html: EncoreResponse = HtmlResponse::from(maud::html! { p { "hi" } }).into();
        let res = html.into_response();
        assert_eq!(StatusCode::OK, res.status());
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let json: EncoreResponse = JsonResponse::serialize(&serde_json::json!({ "favorited": true }))
            .unwrap()
            .into();
        let res = json.into_response();
        assert_eq!(
            "application/json",
            res.headers()[header::CONTENT_TYPE].to_str().unwrap()
        );

        let redirect: EncoreResponse = RedirectResponse::to("/albums/3").into();
        let res = redirect.into_response();
        assert_eq!(StatusCode::SEE_OTHER, res.status());
        assert_eq!("/albums/3", res.headers()[header::LOCATION].to_str().unwrap());

        let file = FileResponse {
            content: Cow::Borrowed(b"console.log(1)"),
            content_type: HeaderValue::from_static("text/javascript"),
        };
        let res = file.into_response();
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!("text/javascript", res.headers()[header::CONTENT_TYPE]);
    }
}
