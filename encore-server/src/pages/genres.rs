use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use encore_core::{
    app::PageTitle,
    error::{EncoreError, EncoreResult},
    request_helper::HtmlResponse,
    session::Authenticated,
    state::{EncoreRequestState, EncoreState},
};
use encore_models::{AlbumFilter, AlbumSort};
use maud::html;
use serde::Deserialize;

use crate::pages::{albums::album_table, common::frontmatter};

pub fn genre_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.typed_get(show_genre)
}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/genres/:slug")]
pub struct PathShowGenre {
    pub slug: String,
}

#[instrument(skip(state, rstate))]
pub async fn show_genre(
    PathShowGenre { slug }: PathShowGenre,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<HtmlResponse> {
    let store = state.store();
    let genre = store
        .genre_by_slug(&slug)
        .await?
        .ok_or_else(|| EncoreError::ObjectNotFound("Genre".to_string(), slug.clone()))?;
    let albums = store
        .albums(Some(rstate.user.id), &AlbumFilter::Genre(genre.id), AlbumSort::Title)
        .await?;
    let body = html! {
        h1 { (genre.name) }
        (album_table(&albums))
    };
    Ok(frontmatter::app(&rstate, Some(PageTitle::from(genre.name.clone())), body).into())
}
