use std::collections::{BTreeMap, BTreeSet};

use encore_dependencies::async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    slug::slugify, Album, AlbumFilter, AlbumListing, AlbumSort, Artist, ArtistKind,
    EncoreModelError, Genre, ModelResult, NewAlbum, NewUser, Store, User,
};

/// Process-local store, everything is lost when it is dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

#[derive(Debug, Default)]
struct MemoryData {
    next_id: i64,
    albums: BTreeMap<i64, Album>,
    artists: BTreeMap<i64, Artist>,
    genres: BTreeMap<i64, Genre>,
    /// (album_id, genre_id)
    album_genres: BTreeSet<(i64, i64)>,
    users: BTreeMap<i64, User>,
    /// (user_id, album_id)
    favorites: BTreeSet<(i64, i64)>,
}

impl MemoryData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn artist_named(&mut self, name: &str, kind: ArtistKind, now: NaiveDateTime) -> i64 {
        if let Some(artist) = self.artists.values().find(|artist| artist.name == name) {
            return artist.id;
        }
        let id = self.next_id();
        self.artists.insert(
            id,
            Artist {
                id,
                name: name.to_string(),
                kind: kind.as_str().to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Points the album at exactly the named genres, creating missing ones
    fn set_genres(&mut self, album_id: i64, names: &[String]) {
        self.album_genres.retain(|(album, _)| *album != album_id);
        for name in names {
            let slug = slugify(name);
            let existing = self
                .genres
                .values()
                .find(|genre| genre.slug == slug)
                .map(|genre| genre.id);
            let genre_id = match existing {
                Some(genre_id) => genre_id,
                None => {
                    let genre_id = self.next_id();
                    self.genres.insert(
                        genre_id,
                        Genre {
                            id: genre_id,
                            name: name.clone(),
                            slug,
                        },
                    );
                    genre_id
                }
            };
            self.album_genres.insert((album_id, genre_id));
        }
    }

    fn genre_ids(&self, album_id: i64) -> Vec<i64> {
        self.album_genres
            .range((album_id, i64::MIN)..=(album_id, i64::MAX))
            .map(|(_, genre_id)| *genre_id)
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> ModelResult<()> {
        Ok(())
    }

    async fn album(&self, id: i64) -> ModelResult<Option<Album>> {
        Ok(self.data.read().await.albums.get(&id).cloned())
    }

    async fn albums(
        &self,
        viewer: Option<i64>,
        filter: &AlbumFilter,
        sort: AlbumSort,
    ) -> ModelResult<Vec<AlbumListing>> {
        let data = self.data.read().await;
        let mut listings: Vec<AlbumListing> = data
            .albums
            .values()
            .map(|album| AlbumListing {
                artist_name: album
                    .artist_id
                    .and_then(|id| data.artists.get(&id))
                    .map(|artist| artist.name.clone()),
                favorited: viewer
                    .map(|user_id| data.favorites.contains(&(user_id, album.id)))
                    .unwrap_or(false),
                album: album.clone(),
            })
            .filter(|listing| filter.matches(listing, &data.genre_ids(listing.album.id)))
            .collect();
        listings.sort_by(|a, b| sort.compare(a, b));
        Ok(listings)
    }

    async fn album_genres(&self, album_id: i64) -> ModelResult<Vec<Genre>> {
        let data = self.data.read().await;
        let mut genres: Vec<Genre> = data
            .album_genres
            .range((album_id, i64::MIN)..=(album_id, i64::MAX))
            .filter_map(|(_, genre_id)| data.genres.get(genre_id).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn create_album(&self, album: NewAlbum) -> ModelResult<Album> {
        let mut data = self.data.write().await;
        let now = Utc::now().naive_utc();
        let artist_id = album
            .artist_name
            .as_deref()
            .map(|name| data.artist_named(name, album.artist_kind, now));
        let id = data.next_id();
        let created = Album {
            id,
            title: album.title.clone(),
            artist_id,
            release_date: album.release_date,
            created_at: now,
            updated_at: now,
        };
        data.albums.insert(id, created.clone());
        data.set_genres(id, &album.genres);
        debug!("created album {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn update_album(&self, id: i64, album: NewAlbum) -> ModelResult<Option<Album>> {
        let mut data = self.data.write().await;
        if !data.albums.contains_key(&id) {
            return Ok(None);
        }
        let now = Utc::now().naive_utc();
        let artist_id = album
            .artist_name
            .as_deref()
            .map(|name| data.artist_named(name, album.artist_kind, now));
        data.set_genres(id, &album.genres);
        let updated = match data.albums.get_mut(&id) {
            Some(existing) => {
                existing.title = album.title;
                existing.artist_id = artist_id;
                existing.release_date = album.release_date;
                existing.updated_at = now;
                existing.clone()
            }
            None => return Ok(None),
        };
        debug!("updated album {} ({})", updated.id, updated.title);
        Ok(Some(updated))
    }

    async fn delete_album(&self, id: i64) -> ModelResult<bool> {
        let mut data = self.data.write().await;
        if data.albums.remove(&id).is_none() {
            return Ok(false);
        }
        data.album_genres.retain(|(album_id, _)| *album_id != id);
        data.favorites.retain(|(_, album_id)| *album_id != id);
        debug!("deleted album {}", id);
        Ok(true)
    }

    async fn genre_by_slug(&self, slug: &str) -> ModelResult<Option<Genre>> {
        Ok(self
            .data
            .read()
            .await
            .genres
            .values()
            .find(|genre| genre.slug == slug)
            .cloned())
    }

    async fn artist(&self, id: i64) -> ModelResult<Option<Artist>> {
        Ok(self.data.read().await.artists.get(&id).cloned())
    }

    async fn is_favorited(&self, user_id: i64, album_id: i64) -> ModelResult<bool> {
        Ok(self.data.read().await.favorites.contains(&(user_id, album_id)))
    }

    async fn add_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()> {
        let mut data = self.data.write().await;
        if !data.albums.contains_key(&album_id) {
            return Err(EncoreModelError::NotFound("album".to_string(), album_id));
        }
        if !data.users.contains_key(&user_id) {
            return Err(EncoreModelError::NotFound("user".to_string(), user_id));
        }
        data.favorites.insert((user_id, album_id));
        Ok(())
    }

    async fn remove_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()> {
        self.data.write().await.favorites.remove(&(user_id, album_id));
        Ok(())
    }

    async fn user(&self, id: i64) -> ModelResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn user_by_name(&self, username: &str) -> ModelResult<Option<User>> {
        Ok(self
            .data
            .read()
            .await
            .users
            .values()
            .find(|user| user.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> ModelResult<User> {
        let mut data = self.data.write().await;
        if data
            .users
            .values()
            .any(|existing| existing.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(EncoreModelError::AlreadyExists(
                "user".to_string(),
                user.username,
            ));
        }
        let id = data.next_id();
        let created = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            created_at: Utc::now().naive_utc(),
        };
        data.users.insert(id, created.clone());
        Ok(created)
    }
}
