//! Client side of album favorites.
//!
//! The album page renders a heart link, `a#fav-link`, whose
//! `data-favorited` attribute says whether the signed-in user already
//! favorited the album. [`FavoriteToggle`] listens for clicks on it, sends
//! `POST` or `DELETE` to the link target together with the anti-forgery
//! token from the `csrftoken` cookie, and swaps the icon between `far`
//! (outline) and `fas` (filled) once the server answers with
//! `{"favorited": bool}`.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use encore_toggle::*;
//! # async fn run(markup: &str, jar: Arc<encore_dependencies::reqwest::cookie::Jar>, client: encore_dependencies::reqwest::Client) -> ToggleResult<()> {
//! let url = encore_dependencies::url::Url::parse("http://localhost:8000/albums/1")?;
//! let document = Document::from_markup(url, markup);
//! let toggle = FavoriteToggle::new(&document, Arc::new(ReqwestTransport::new(client)), jar)?;
//! let _subscription = toggle.listen();
//! document.click(toggle.link());
//! toggle.settle().await;
//! println!("{:?}", toggle.state());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod dom;
pub mod error;
pub mod handler;
pub mod state;
pub mod transport;

pub use dom::{ClickOutcome, Document, Event, Node, Subscription};
pub use error::{ToggleError, ToggleResult};
pub use handler::FavoriteToggle;
pub use state::FavoriteState;
pub use transport::{
    CookieMap, CookieSource, FavoriteTransport, ReqwestTransport, ToggleRequest,
    TransportResponse,
};
