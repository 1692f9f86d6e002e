use encore_core::{config::Configuration, error::EncoreResult};
use encore_models::{NewAlbum, PgStore, Store};

use crate::cli::AddAlbumCli;

pub fn new_album(cli: AddAlbumCli) -> NewAlbum {
    let mut album = NewAlbum::titled(cli.title);
    if let Some(artist) = cli.artist {
        album = album.by(artist);
    }
    album.artist_kind = cli.artist_kind;
    if let Some(date) = cli.release_date {
        album = album.released(date);
    }
    cli.genres.into_iter().fold(album, NewAlbum::genre)
}

pub async fn add_album(config: Configuration, cli: AddAlbumCli) -> EncoreResult<()> {
    let store = PgStore::new(config.db_conn().await?);
    store.migrate().await?;
    let album = store.create_album(new_album(cli)).await?;
    info!("Added album {} with id {}", album.title, album.id);
    Ok(())
}
