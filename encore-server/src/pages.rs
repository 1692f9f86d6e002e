use axum::{extract::State, http::Uri, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use encore_core::{
    app::PageTitle,
    error::{EncoreError, EncoreResult},
    request_helper::{EncoreResponse, HtmlResponse, RedirectResponse},
    session::Unauthenticated,
    state::{EncoreRequestState, EncoreState},
};
use maud::html;
use serde::Deserialize;

use crate::pages::{albums::PathAlbums, common::frontmatter, session::PathSessionsLogin};

pub mod album_admin;
pub mod albums;
pub mod common;
pub mod genres;
pub mod session;

pub fn index_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.typed_get(index).typed_get(health)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/")]
pub struct PathIndex {}

#[instrument(skip(rstate))]
pub async fn index(
    _: PathIndex,
    rstate: EncoreRequestState<Unauthenticated>,
) -> EncoreResult<EncoreResponse> {
    if rstate.user.is_some() {
        return Ok(RedirectResponse::to(&PathAlbums {}.to_uri().to_string()).into());
    }
    let body = html! {
        h1 { "Encore" }
        p { "Keep track of the albums you love." }
        p {
            a href=(PathSessionsLogin {}.to_uri().to_string()) { "Sign in" }
            " to see the collection."
        }
    };
    Ok(HtmlResponse::from(frontmatter::app(&rstate, Some(PageTitle::from("Welcome")), body)).into())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/health")]
pub struct PathHealth {}

#[instrument(skip(state))]
pub async fn health(_: PathHealth, State(state): State<EncoreState>) -> EncoreResult<&'static str> {
    state.store().ping().await?;
    Ok("ok")
}

pub async fn not_found_page(uri: Uri) -> EncoreError {
    debug!("no route for {}", uri.path());
    EncoreError::ObjectNotFound("Page".to_string(), uri.path().to_string())
}
