#[macro_use]
extern crate tracing;

mod models;
pub mod slug;
mod store;

use std::sync::Arc;

pub use models::*;
pub use store::{memory::MemoryStore, postgres::PgStore, DynStore, Store};

use encore_dependencies::bcrypt;

pub type DBPool = sqlx::PgPool;

#[derive(thiserror::Error, Debug)]
pub enum EncoreModelError {
    #[error("Other error: {}", .0)]
    Other(String),
    #[error("Error in underlying datamodel: {}", .0)]
    SQLx(#[from] sqlx::Error),
    #[error("Could not migrate database: {}", .0)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("BCrypt Error: {}", .0)]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("Could not find {} {}", .0, .1)]
    NotFound(String, i64),
    #[error("{} {:?} already exists", .0, .1)]
    AlreadyExists(String, String),
    #[error("{:?}", .0)]
    Context(#[from] anyhow::Error),
}

impl From<Arc<sqlx::Error>> for EncoreModelError {
    fn from(v: Arc<sqlx::Error>) -> Self {
        Self::Other(v.to_string())
    }
}

pub type ModelResult<T> = std::result::Result<T, EncoreModelError>;
