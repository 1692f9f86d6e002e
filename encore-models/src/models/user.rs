use chrono::NaiveDateTime;
use encore_dependencies::bcrypt;

use crate::ModelResult;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn displayname(&self) -> &str {
        &self.username
    }
    pub fn verify_password(&self, password: &str) -> ModelResult<bool> {
        Ok(bcrypt::verify(password, &self.password_hash)?)
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, password: &str, is_staff: bool) -> ModelResult<Self> {
        Self::with_cost(username, password, is_staff, bcrypt::DEFAULT_COST)
    }
    /// Lower costs are only sensible in tests
    pub fn with_cost<S: Into<String>>(
        username: S,
        password: &str,
        is_staff: bool,
        cost: u32,
    ) -> ModelResult<Self> {
        Ok(Self {
            username: username.into(),
            password_hash: bcrypt::hash(password, cost)?,
            is_staff,
        })
    }
}
