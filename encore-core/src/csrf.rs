//! Double-submit CSRF protection, compatible with the usual `csrftoken`
//! cookie / `X-CSRFToken` header convention.
//!
//! Every response to a client without a token cookie issues one. Requests
//! with unsafe methods must echo the cookie value back, either in the
//! `X-CSRFToken` header or in a `_csrf_token` form field.

use encore_dependencies::{
    axum::{
        body::Body,
        extract::State,
        http::{header, HeaderMap, HeaderName, Method, Request},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    axum_extra::extract::{
        cookie::{Cookie, SameSite},
        CookieJar,
    },
    base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine},
    http_body::{LengthLimitError, Limited},
    hyper, mime,
    ring::{self, rand::SecureRandom},
    serde_urlencoded,
};

use crate::{
    error::{EncoreError, EncoreResult},
    state::EncoreState,
};

pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrftoken");
pub const CSRF_FORM_FIELD: &str = "_csrf_token";
/// Largest urlencoded body buffered while looking for the token field
pub const FORM_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The token for the current request, placed into request extensions by [`csrf_protect`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> EncoreResult<Self> {
        let mut raw = [0u8; 32];
        ring::rand::SystemRandom::new().fill(&mut raw)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(raw)))
    }

    pub fn authenticity_token(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, presented: &str) -> bool {
        ring::constant_time::verify_slices_are_equal(self.0.as_bytes(), presented.as_bytes())
            .is_ok()
    }
}

#[derive(serde::Deserialize)]
struct CsrfForm {
    #[serde(rename = "_csrf_token")]
    csrf_token: Option<String>,
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
        .unwrap_or(false)
}

pub fn token_cookie(name: &str, token: &CsrfToken) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), token.0.clone());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    // scripts read this cookie to fill the header, it must not be HttpOnly
    cookie.set_http_only(false);
    cookie
}

/// Checks the presented token of an unsafe request. Urlencoded bodies are
/// buffered to find the form field and handed on unchanged.
async fn verify_request(req: Request<Body>, expected: &CsrfToken) -> EncoreResult<Request<Body>> {
    if let Some(presented) = req.headers().get(CSRF_HEADER) {
        let presented = presented
            .to_str()
            .map_err(|_| EncoreError::CsrfFailure("token header is not valid text"))?;
        return if expected.verify(presented) {
            Ok(req)
        } else {
            Err(EncoreError::CsrfFailure("token header incorrect"))
        };
    }
    if !is_urlencoded_form(req.headers()) {
        return Err(EncoreError::CsrfFailure("token missing"));
    }
    let (parts, body) = req.into_parts();
    let bytes = match hyper::body::to_bytes(Limited::new(body, FORM_BODY_LIMIT)).await {
        Ok(bytes) => bytes,
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(EncoreError::PayloadTooLarge(FORM_BODY_LIMIT))
        }
        Err(e) => return Err(EncoreError::Other(format!("could not read form body: {}", e))),
    };
    let form: CsrfForm = serde_urlencoded::from_bytes(&bytes)
        .map_err(|_| EncoreError::CsrfFailure("form could not be read"))?;
    match form.csrf_token {
        Some(presented) if expected.verify(&presented) => {
            Ok(Request::from_parts(parts, Body::from(bytes)))
        }
        Some(_) => Err(EncoreError::CsrfFailure("token field incorrect")),
        None => Err(EncoreError::CsrfFailure("token missing")),
    }
}

/// Middleware issuing and enforcing the CSRF token, see the module docs
pub async fn csrf_protect(
    State(state): State<EncoreState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Response {
    let cookie_name = state.config.csrf_cookie.as_str();
    let jar = CookieJar::from_headers(req.headers());
    let existing = jar
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(CsrfToken);

    let mut req = req;
    if !is_safe_method(req.method()) {
        let expected = match &existing {
            Some(token) => token,
            None => return EncoreError::CsrfFailure("cookie not set").into_response(),
        };
        req = match verify_request(req, expected).await {
            Ok(req) => req,
            Err(e) => return e.into_response(),
        };
    }

    let (token, fresh) = match existing {
        Some(token) => (token, false),
        None => match CsrfToken::generate() {
            Ok(token) => (token, true),
            Err(e) => return e.into_response(),
        },
    };
    req.extensions_mut().insert(token.clone());
    let res = next.run(req).await;
    if fresh {
        trace!("issuing new csrf token");
        (jar.add(token_cookie(cookie_name, &token)), res).into_response()
    } else {
        res
    }
}
