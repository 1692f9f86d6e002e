use encore_dependencies::axum_extra::extract::{
    cookie::{Cookie, SameSite},
    SignedCookieJar,
};
use encore_models::{DynStore, User};

use crate::error::EncoreResult;

/// Decides what a handler receives as the current user
pub trait SessionMode: Send + Sync + 'static {
    type User: Send + Sync;

    /// `None` rejects the request as needing a login.
    fn from_user(user: Option<User>) -> Option<Self::User>;
    fn current_user(user: &Self::User) -> Option<&User>;
}

/// A user must be signed in; handlers get the [`User`] itself
pub struct Authenticated;

/// Anyone may see the page; handlers get an `Option<User>`
pub struct Unauthenticated;

impl SessionMode for Authenticated {
    type User = User;

    fn from_user(user: Option<User>) -> Option<Self::User> {
        user
    }
    fn current_user(user: &Self::User) -> Option<&User> {
        Some(user)
    }
}

impl SessionMode for Unauthenticated {
    type User = Option<User>;

    fn from_user(user: Option<User>) -> Option<Self::User> {
        Some(user)
    }
    fn current_user(user: &Self::User) -> Option<&User> {
        user.as_ref()
    }
}

/// The session is a signed cookie carrying the user id, nothing is kept server side
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<i64>,
}

impl Session {
    pub fn from_jar(jar: &SignedCookieJar, cookie_name: &str) -> Self {
        let user_id = jar
            .get(cookie_name)
            .and_then(|cookie| cookie.value().parse::<i64>().ok());
        Self { user_id }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// A cookie pointing at a deleted user behaves like no session
    pub async fn user(&self, store: &DynStore) -> EncoreResult<Option<User>> {
        match self.user_id {
            None => Ok(None),
            Some(user_id) => Ok(store.user(user_id).await?),
        }
    }

    pub fn login(jar: SignedCookieJar, cookie_name: &str, user: &User) -> SignedCookieJar {
        trace!("starting session for user {}", user.id);
        let mut cookie = Cookie::new(cookie_name.to_string(), user.id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        jar.add(cookie)
    }

    pub fn logout(jar: SignedCookieJar, cookie_name: &str) -> SignedCookieJar {
        let mut cookie = Cookie::named(cookie_name.to_string());
        cookie.set_path("/");
        jar.remove(cookie)
    }
}
