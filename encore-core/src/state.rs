use std::{marker::PhantomData, sync::Arc};

use encore_dependencies::{
    axum::{
        async_trait,
        extract::{FromRef, FromRequestParts},
        http::{request::Parts, HeaderMap, Uri},
    },
    axum_extra::extract::{cookie::Key, SignedCookieJar},
    url::form_urlencoded,
};
use encore_models::{DynStore, User};

use crate::{
    config::Configuration,
    csrf::CsrfToken,
    error::{EncoreError, EncoreResult},
    request_helper::is_ajax,
    session::{Authenticated, Session, SessionMode},
};

/// Paths the core needs to point users at, owned by the server crate
#[derive(Clone, Debug)]
pub struct UrlDirections {
    pub login_page: String,
}

#[derive(Clone)]
pub struct EncoreState {
    pub config: Arc<Configuration>,
    pub store: DynStore,
    pub session_key: Key,
    pub directions: Arc<UrlDirections>,
}

impl EncoreState {
    pub fn new(
        config: Configuration,
        store: DynStore,
        directions: UrlDirections,
    ) -> EncoreResult<Self> {
        Ok(Self {
            session_key: config.session_key()?,
            config: Arc::new(config),
            store,
            directions: Arc::new(directions),
        })
    }
    pub fn config(&self) -> &Configuration {
        &self.config
    }
    pub fn store(&self) -> &DynStore {
        &self.store
    }
    /// Login page, remembering where to come back to
    pub fn login_redirect(&self, next: &Uri) -> String {
        let next: String = form_urlencoded::byte_serialize(next.to_string().as_bytes()).collect();
        format!("{}?next={}", self.directions.login_page, next)
    }
}

impl std::fmt::Debug for EncoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoreState")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl FromRef<EncoreState> for Key {
    fn from_ref(state: &EncoreState) -> Self {
        state.session_key.clone()
    }
}

/// Everything a page needs to know about the request it is answering.
///
/// `T` decides whether a signed-in user is required, see [`SessionMode`].
pub struct EncoreRequestState<T: SessionMode> {
    pub headers: HeaderMap,
    pub uri: Uri,
    pub csrf_token: CsrfToken,
    pub session: Session,
    pub user: T::User,
    _mode: PhantomData<T>,
}

impl<T: SessionMode> EncoreRequestState<T> {
    pub fn is_ajax(&self) -> bool {
        is_ajax(&self.headers)
    }
    pub fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
    pub fn current_user(&self) -> Option<&User> {
        T::current_user(&self.user)
    }
}

impl EncoreRequestState<Authenticated> {
    /// Album editing is for staff only
    pub fn require_staff(&self) -> EncoreResult<&User> {
        if self.user.is_staff {
            Ok(&self.user)
        } else {
            debug!("user {} is not staff", self.user.id);
            Err(EncoreError::AccessDenied)
        }
    }
}

#[async_trait]
impl<T: SessionMode> FromRequestParts<EncoreState> for EncoreRequestState<T> {
    type Rejection = EncoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &EncoreState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.session_key.clone());
        let session = Session::from_jar(&jar, &state.config.session_cookie);
        let user: Option<User> = session.user(state.store()).await?;
        let user = T::from_user(user).ok_or_else(|| EncoreError::LoginRequired {
            ajax: is_ajax(&parts.headers),
            redirect: state.login_redirect(&parts.uri),
        })?;
        let csrf_token = parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or(EncoreError::CsrfFailure("request did not pass the CSRF layer"))?;
        Ok(Self {
            headers: parts.headers.clone(),
            uri: parts.uri.clone(),
            csrf_token,
            session,
            user,
            _mode: PhantomData,
        })
    }
}
