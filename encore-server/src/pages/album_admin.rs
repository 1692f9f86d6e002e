//! Staff pages for adding, editing and deleting albums.

use std::{collections::BTreeSet, str::FromStr};

use axum::{extract::State, Form, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use encore_core::{
    app::PageTitle,
    error::EncoreResult,
    request_helper::{EncoreResponse, HtmlResponse, RedirectResponse},
    session::Authenticated,
    state::{EncoreRequestState, EncoreState},
};
use chrono::NaiveDate;
use encore_models::{slug::slugify, Album, Artist, ArtistKind, Genre, NewAlbum};
use maud::{html, Markup};
use serde::Deserialize;

use crate::pages::{
    albums::{require_album, show_path, PathAlbums},
    common::frontmatter,
};

const TITLE_MAX: usize = 255;
const ARTIST_MAX: usize = 255;
const GENRE_MAX: usize = 75;

pub fn album_admin_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.typed_get(new_album)
        .typed_post(post_new_album)
        .typed_get(edit_album)
        .typed_post(post_edit_album)
        .typed_get(delete_album)
        .typed_post(post_delete_album)
}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/albums/new")]
pub struct PathNewAlbum {}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/albums/:album_id/edit")]
pub struct PathEditAlbum {
    pub album_id: i64,
}

#[derive(TypedPath, Deserialize, Debug)]
#[typed_path("/albums/:album_id/delete")]
pub struct PathDeleteAlbum {
    pub album_id: i64,
}

/// The album form as submitted. Genres are one comma separated field.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AlbumForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub artist_kind: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genres: String,
}

impl AlbumForm {
    pub fn from_album(album: &Album, artist: Option<&Artist>, genres: &[Genre]) -> Self {
        Self {
            title: album.title.clone(),
            artist_name: artist.map(|a| a.name.clone()).unwrap_or_default(),
            artist_kind: artist
                .map(|a| a.kind())
                .unwrap_or_default()
                .as_str()
                .to_ascii_lowercase(),
            release_date: album
                .release_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            genres: genres
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Checks every field, returning all problems at once
    pub fn validate(&self) -> Result<NewAlbum, Vec<String>> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        } else if title.chars().count() > TITLE_MAX {
            errors.push(format!("Title must be at most {} characters", TITLE_MAX));
        }
        let artist_name = self.artist_name.trim();
        if artist_name.is_empty() {
            errors.push("Artist is required".to_string());
        } else if artist_name.chars().count() > ARTIST_MAX {
            errors.push(format!("Artist must be at most {} characters", ARTIST_MAX));
        }
        let artist_kind = match self.artist_kind.trim() {
            "" => ArtistKind::default(),
            kind => ArtistKind::from_str(kind).unwrap_or_else(|e| {
                errors.push(e);
                ArtistKind::default()
            }),
        };
        let release_date = match self.release_date.trim() {
            "" => None,
            date => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push("Release date must look like 1971-06-22".to_string());
                    None
                }
            },
        };
        let mut seen = BTreeSet::new();
        let mut genres = Vec::new();
        for genre in self.genres.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            if genre.chars().count() > GENRE_MAX {
                errors.push(format!("Genre names must be at most {} characters", GENRE_MAX));
                continue;
            }
            let slug = slugify(genre);
            if slug.is_empty() {
                errors.push(format!("Genre {:?} needs a letter or digit", genre));
                continue;
            }
            if seen.insert(slug) {
                genres.push(genre.to_string());
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewAlbum {
            title: title.to_string(),
            artist_name: Some(artist_name.to_string()),
            artist_kind,
            release_date,
            genres,
        })
    }
}

fn album_form_page(
    rstate: &EncoreRequestState<Authenticated>,
    heading: &str,
    action: String,
    form: &AlbumForm,
    errors: &[String],
) -> Markup {
    let kind = form.artist_kind.to_ascii_lowercase();
    let body = html! {
        h1 { (heading) }
        @if !errors.is_empty() {
            ul.flash.flash--error {
                @for error in errors {
                    li { (error) }
                }
            }
        }
        form.album-form action=(action) method="POST" {
            (frontmatter::csrf_input_tag(rstate))
            .field {
                label for="album_title" { "Title" }
                input.input #album_title name="title" type="text" required="true" value=(form.title);
            }
            .field {
                label for="album_artist_name" { "Artist" }
                input.input #album_artist_name name="artist_name" type="text" required="true" value=(form.artist_name);
            }
            .field {
                label for="album_artist_kind" { "Artist is a" }
                select.input #album_artist_kind name="artist_kind" {
                    @for choice in [ArtistKind::Individual, ArtistKind::Group] {
                        @let value = choice.as_str().to_ascii_lowercase();
                        option value=(value) selected[kind == value] { (choice.label()) }
                    }
                }
            }
            .field {
                label for="album_release_date" { "Release date" }
                input.input #album_release_date name="release_date" type="date" value=(form.release_date);
            }
            .field {
                label for="album_genres" { "Genres" }
                input.input #album_genres name="genres" type="text" value=(form.genres) placeholder="Jazz, Fusion";
            }
            .actions {
                button.button type="submit" { "Save" }
            }
        }
    };
    frontmatter::app(rstate, Some(PageTitle::from(heading)), body)
}

#[instrument(skip(rstate))]
pub async fn new_album(
    _: PathNewAlbum,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<HtmlResponse> {
    rstate.require_staff()?;
    let action = PathNewAlbum {}.to_uri().to_string();
    Ok(album_form_page(&rstate, "Add album", action, &AlbumForm::default(), &[]).into())
}

#[instrument(skip(state, rstate))]
pub async fn post_new_album(
    _: PathNewAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
    Form(form): Form<AlbumForm>,
) -> EncoreResult<EncoreResponse> {
    rstate.require_staff()?;
    match form.validate() {
        Ok(album) => {
            let album = state.store().create_album(album).await?;
            info!("{} added album {} ({})", rstate.user.displayname(), album.id, album.title);
            Ok(RedirectResponse::to(&show_path(&album)).into())
        }
        Err(errors) => {
            let action = PathNewAlbum {}.to_uri().to_string();
            Ok(HtmlResponse::from(album_form_page(&rstate, "Add album", action, &form, &errors)).into())
        }
    }
}

#[instrument(skip(state, rstate))]
pub async fn edit_album(
    PathEditAlbum { album_id }: PathEditAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<HtmlResponse> {
    rstate.require_staff()?;
    let album = require_album(&state, album_id).await?;
    let store = state.store();
    let artist = match album.artist_id {
        Some(id) => store.artist(id).await?,
        None => None,
    };
    let genres = store.album_genres(album_id).await?;
    let form = AlbumForm::from_album(&album, artist.as_ref(), &genres);
    let action = PathEditAlbum { album_id }.to_uri().to_string();
    let heading = format!("Edit {}", album.title);
    Ok(album_form_page(&rstate, &heading, action, &form, &[]).into())
}

#[instrument(skip(state, rstate))]
pub async fn post_edit_album(
    PathEditAlbum { album_id }: PathEditAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
    Form(form): Form<AlbumForm>,
) -> EncoreResult<EncoreResponse> {
    rstate.require_staff()?;
    let album = require_album(&state, album_id).await?;
    match form.validate() {
        Ok(changes) => {
            state.store().update_album(album.id, changes).await?;
            info!("{} edited album {}", rstate.user.displayname(), album.id);
            Ok(RedirectResponse::to(&PathAlbums {}.to_uri().to_string()).into())
        }
        Err(errors) => {
            let action = PathEditAlbum { album_id }.to_uri().to_string();
            let heading = format!("Edit {}", album.title);
            Ok(HtmlResponse::from(album_form_page(&rstate, &heading, action, &form, &errors)).into())
        }
    }
}

#[instrument(skip(state, rstate))]
pub async fn delete_album(
    PathDeleteAlbum { album_id }: PathDeleteAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<HtmlResponse> {
    rstate.require_staff()?;
    let album = require_album(&state, album_id).await?;
    let body = html! {
        h1 { "Delete " (album.title) "?" }
        p { "Everyone's favorite of this album goes with it." }
        form action=(PathDeleteAlbum { album_id }.to_uri().to_string()) method="POST" {
            (frontmatter::csrf_input_tag(&rstate))
            button.button.button--danger type="submit" { "Delete" }
            " "
            a href=(show_path(&album)) { "Cancel" }
        }
    };
    let title = format!("Delete {}", album.title);
    Ok(frontmatter::app(&rstate, Some(PageTitle::from(title)), body).into())
}

#[instrument(skip(state, rstate))]
pub async fn post_delete_album(
    PathDeleteAlbum { album_id }: PathDeleteAlbum,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Authenticated>,
) -> EncoreResult<RedirectResponse> {
    rstate.require_staff()?;
    let album = require_album(&state, album_id).await?;
    state.store().delete_album(album.id).await?;
    info!("{} deleted album {} ({})", rstate.user.displayname(), album.id, album.title);
    Ok(RedirectResponse::to(&PathAlbums {}.to_uri().to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn form(title: &str, artist: &str, date: &str, genres: &str) -> AlbumForm {
        AlbumForm {
            title: title.to_string(),
            artist_name: artist.to_string(),
            artist_kind: "grp".to_string(),
            release_date: date.to_string(),
            genres: genres.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let album = form(" OK Computer ", "Radiohead", "1997-05-21", "Alt Rock, alt rock,, Art Rock")
            .validate()
            .unwrap();
        assert_eq!("OK Computer", album.title);
        assert_eq!(Some("Radiohead".to_string()), album.artist_name);
        assert_eq!(ArtistKind::Group, album.artist_kind);
        assert_eq!(NaiveDate::from_ymd_opt(1997, 5, 21), album.release_date);
        assert_eq!(vec!["Alt Rock", "Art Rock"], album.genres);
    }

    #[test]
    fn test_form_errors_are_collected() {
        let errors = form("", "", "21/05/1997", "!!!").validate().unwrap_err();
        assert_eq!(4, errors.len(), "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("Title")));
        assert!(errors.iter().any(|e| e.contains("Artist")));
        assert!(errors.iter().any(|e| e.contains("Release date")));

        let mut bad_kind = form("Blue", "Joni Mitchell", "", "");
        bad_kind.artist_kind = "orchestra".to_string();
        assert_eq!(1, bad_kind.validate().unwrap_err().len());

        let long = form(&"x".repeat(TITLE_MAX + 1), "a", "", "");
        assert_eq!(1, long.validate().unwrap_err().len());
    }

    #[test]
    fn test_form_from_album() {
        let now = chrono::Utc::now().naive_utc();
        let album = Album {
            id: 1,
            title: "Blue".to_string(),
            artist_id: Some(2),
            release_date: NaiveDate::from_ymd_opt(1971, 6, 22),
            created_at: now,
            updated_at: now,
        };
        let artist = Artist {
            id: 2,
            name: "Joni Mitchell".to_string(),
            kind: "IND".to_string(),
            created_at: now,
            updated_at: now,
        };
        let genres = vec![
            Genre { id: 3, name: "Folk".to_string(), slug: "folk".to_string() },
            Genre { id: 4, name: "Pop".to_string(), slug: "pop".to_string() },
        ];
        let form = AlbumForm::from_album(&album, Some(&artist), &genres);
        assert_eq!("1971-06-22", form.release_date);
        assert_eq!("ind", form.artist_kind);
        assert_eq!("Folk, Pop", form.genres);
        assert_eq!(Ok("Blue".to_string()), form.validate().map(|a| a.title));
    }
}
