mod album;
mod artist;
mod genre;
mod user;

pub use album::*;
pub use artist::*;
pub use genre::*;
pub use user::*;
