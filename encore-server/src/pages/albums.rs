use axum::{
    extract::{Query, State},
    Router,
};
use axum_extra::routing::{RouterExt, TypedPath};
use encore_core::{
    app::PageTitle,
    error::{EncoreError, EncoreResult},
    request_helper::{EncoreResponse, HtmlResponse, JsonResponse, RedirectResponse},
    session::{Authenticated, Unauthenticated},
    state::{EncoreRequestState, EncoreState},
};
use encore_models::{Album, AlbumFilter, AlbumListing, AlbumSort};
use maud::{html, Markup};
use serde::{Deserialize, Serialize};

use crate::{
    assets::static_path,
    pages::{
        album_admin::{PathDeleteAlbum, PathEditAlbum, PathNewAlbum},
        common::{frontmatter, heart_class, human_date},
        genres::PathShowGenre,
    },
};

pub fn album_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.typed_get(list_albums)
        .typed_get(show_album)
        .typed_get(search)
        .typed_post(add_favorite)
        .typed_delete(remove_favorite)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/albums")]
pub struct PathAlbums {}

#[derive(Deserialize, Debug, Default)]
pub struct AlbumListQuery {
    sort: Option<String>,
}

/// Table of albums with the viewer's hearts, shared by every listing
pub fn album_table(albums: &[AlbumListing]) -> Markup {
    html! {
        @if albums.is_empty() {
            p { "No albums to show." }
        } @else {
            table.albums {
                thead { tr { th {} th { "Title" } th { "Artist" } th { "Released" } } }
                tbody {
                    @for listing in albums {
                        tr.album data-album-id=(listing.album.id) {
                            td {
                                i.(heart_class(listing.favorited)).fa-heart
                                    title=(if listing.favorited { "Favorite" } else { "" }) {}
                            }
                            td { a href=(show_path(&listing.album)) { (listing.album.title) } }
                            td { (listing.artist_name.as_deref().unwrap_or("Unknown artist")) }
                            td { (human_date(listing.album.release_date)) }
                        }
                    }
                }
            }
        }
    }
}

fn search_form(title: &str, artist: &str) -> Markup {
    html! {
        form.search action=(PathSearch {}.to_uri().to_string()) method="GET" {
            input.input type="search" name="title" value=(title) placeholder="Title";
            input.input type="search" name="artist" value=(artist) placeholder="Artist";
            button.button type="submit" { "Search" }
        }
    }
}

#[instrument(skip(state, rstate))]
pub async fn list_albums(
    _: PathAlbums,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
    Query(query): Query<AlbumListQuery>,
) -> EncoreResult<HtmlResponse> {
    let sort = AlbumSort::from_query(query.sort.as_deref());
    let albums = state
        .store()
        .albums(Some(rstate.user.id), &AlbumFilter::All, sort)
        .await?;
    let body = html! {
        h1 { "Albums" }
        @if rstate.user.is_staff {
            p { a.button href=(PathNewAlbum {}.to_uri().to_string()) { "Add album" } }
        }
        (search_form("", ""))
        nav.sort {
            "Sort by: "
            @for option in AlbumSort::ALL {
                @if option == sort {
                    strong.sort__current { (option.label()) }
                } @else {
                    a href=(format!("{}?sort={}", PathAlbums {}.to_uri(), option.as_query())) { (option.label()) }
                }
                " "
            }
        }
        (album_table(&albums))
    };
    Ok(frontmatter::app(&rstate, Some(PageTitle::from("Albums")), body).into())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/search")]
pub struct PathSearch {}

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
    title: Option<String>,
    artist: Option<String>,
}

/// Title or artist search, open to everyone. Without a term there is
/// nothing to search and the user lands on the full listing.
#[instrument(skip(state, rstate))]
pub async fn search(
    _: PathSearch,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Unauthenticated>,
    Query(query): Query<SearchQuery>,
) -> EncoreResult<EncoreResponse> {
    let filter = match AlbumFilter::search(query.title.as_deref(), query.artist.as_deref()) {
        Some(filter) => filter,
        None => return Ok(RedirectResponse::to(&PathAlbums {}.to_uri().to_string()).into()),
    };
    let viewer = rstate.current_user().map(|user| user.id);
    let albums = state
        .store()
        .albums(viewer, &filter, AlbumSort::Title)
        .await?;
    let body = html! {
        h1 { "Search results" }
        (search_form(
            query.title.as_deref().unwrap_or_default(),
            query.artist.as_deref().unwrap_or_default(),
        ))
        p.search__count { (albums.len()) " found" }
        (album_table(&albums))
    };
    Ok(HtmlResponse::from(frontmatter::app(&rstate, Some(PageTitle::from("Search")), body)).into())
}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/albums/:album_id")]
pub struct PathShowAlbum {
    pub album_id: i64,
}

pub fn show_path(album: &Album) -> String {
    PathShowAlbum { album_id: album.id }.to_uri().to_string()
}

pub async fn require_album(state: &EncoreState, album_id: i64) -> EncoreResult<Album> {
    state
        .store()
        .album(album_id)
        .await?
        .ok_or_else(|| EncoreError::ObjectNotFound("Album".to_string(), album_id.to_string()))
}

#[instrument(skip(state, rstate))]
pub async fn show_album(
    PathShowAlbum { album_id }: PathShowAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<HtmlResponse> {
    let store = state.store();
    let album = require_album(&state, album_id).await?;
    let artist = match album.artist_id {
        Some(id) => store.artist(id).await?,
        None => None,
    };
    let genres = store.album_genres(album_id).await?;
    let favorited = store.is_favorited(rstate.user.id, album_id).await?;
    let body = html! {
        article.album {
            h1.album__title { (album.title) }
            p.album__artist {
                @if let Some(artist) = &artist {
                    (artist.name) " (" (artist.kind().label()) ")"
                } @else {
                    "Unknown artist"
                }
            }
            p.album__released { "Released " (human_date(album.release_date)) }
            @if !genres.is_empty() {
                ul.album__genres {
                    @for genre in &genres {
                        li data-slug=(genre.slug) {
                            a href=(PathShowGenre { slug: genre.slug.clone() }.to_uri().to_string()) { (genre.name) }
                        }
                    }
                }
            }
            a #fav-link href=(PathFavoriteAlbum { album_id }.to_uri().to_string())
                data-favorited=(if favorited { "true" } else { "false" }) {
                i.(heart_class(favorited)).fa-heart {}
            }
            @if rstate.user.is_staff {
                p.album__actions {
                    a href=(PathEditAlbum { album_id }.to_uri().to_string()) { "Edit" }
                    " "
                    a href=(PathDeleteAlbum { album_id }.to_uri().to_string()) { "Delete" }
                }
            }
        }
        script src=(static_path("js/show_album.js")) defer {}
    };
    Ok(frontmatter::app(&rstate, Some(PageTitle::from(album.title.clone())), body).into())
}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/albums/:album_id/favorite")]
pub struct PathFavoriteAlbum {
    pub album_id: i64,
}

#[derive(Serialize)]
pub struct FavoriteStatus {
    pub favorited: bool,
}

async fn set_favorite(
    state: EncoreState,
    rstate: EncoreRequestState<Authenticated>,
    album_id: i64,
    favorited: bool,
) -> EncoreResult<EncoreResponse> {
    let album = require_album(&state, album_id).await?;
    let store = state.store();
    if favorited {
        store.add_favorite(rstate.user.id, album.id).await?;
    } else {
        store.remove_favorite(rstate.user.id, album.id).await?;
    }
    debug!(
        "user {} favorited album {}: {}",
        rstate.user.id, album.id, favorited
    );
    if rstate.is_ajax() {
        Ok(JsonResponse::serialize(&FavoriteStatus { favorited })?.into())
    } else {
        Ok(RedirectResponse::to(&show_path(&album)).into())
    }
}

#[instrument(skip(state, rstate))]
pub async fn add_favorite(
    PathFavoriteAlbum { album_id }: PathFavoriteAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<EncoreResponse> {
    set_favorite(state, rstate, album_id, true).await
}

#[instrument(skip(state, rstate))]
pub async fn remove_favorite(
    PathFavoriteAlbum { album_id }: PathFavoriteAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<EncoreResponse> {
    set_favorite(state, rstate, album_id, false).await
}
