use std::sync::Arc;

use encore_dependencies::async_trait::async_trait;

use crate::{
    Album, AlbumFilter, AlbumListing, AlbumSort, Artist, Genre, ModelResult, NewAlbum, NewUser,
    User,
};

pub mod memory;
pub mod postgres;

pub type DynStore = Arc<dyn Store>;

/// Persistence for albums and the favorites relation between users and albums.
///
/// Adding or removing a favorite is idempotent: adding twice keeps a single
/// relation, removing a favorite that does not exist is not an error.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    async fn ping(&self) -> ModelResult<()>;

    async fn album(&self, id: i64) -> ModelResult<Option<Album>>;
    /// Albums passing `filter`, annotated with whether `viewer` favorited
    /// them. Anonymous viewers see nothing favorited.
    async fn albums(
        &self,
        viewer: Option<i64>,
        filter: &AlbumFilter,
        sort: AlbumSort,
    ) -> ModelResult<Vec<AlbumListing>>;
    async fn album_genres(&self, album_id: i64) -> ModelResult<Vec<Genre>>;
    /// Creates the album, reusing an artist or genre that already exists by name
    async fn create_album(&self, album: NewAlbum) -> ModelResult<Album>;
    /// Replaces title, artist, release date and genres. `None` if there is no such album.
    async fn update_album(&self, id: i64, album: NewAlbum) -> ModelResult<Option<Album>>;
    /// Removes the album along with its genre links and favorites
    async fn delete_album(&self, id: i64) -> ModelResult<bool>;

    async fn genre_by_slug(&self, slug: &str) -> ModelResult<Option<Genre>>;

    async fn artist(&self, id: i64) -> ModelResult<Option<Artist>>;

    async fn is_favorited(&self, user_id: i64, album_id: i64) -> ModelResult<bool>;
    async fn add_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()>;
    async fn remove_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()>;

    async fn user(&self, id: i64) -> ModelResult<Option<User>>;
    async fn user_by_name(&self, username: &str) -> ModelResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> ModelResult<User>;
}
