//! Shared third-party stack for the encore crates.
//!
//! Crates that only need a library at runtime pull it from here so the
//! whole workspace agrees on one version. Crates whose derive macros
//! expand to absolute paths (serde, sqlx, maud, axum-extra's `TypedPath`) are
//! still listed directly by their users.

pub use async_trait;
pub use axum;
pub use axum_extra;
pub use base64;
pub use bcrypt;
pub use better_panic;
pub use chrono;
pub use http;
pub use http_body;
pub use hyper;
pub use kankyo;
pub use lazy_static;
pub use mime;
pub use regex;
pub use reqwest;
pub use ring;
pub use serde_urlencoded;
pub use tower;
pub use url;
