use std::sync::Arc;

use axum::{middleware, Router};
use axum_extra::routing::TypedPath;
use encore_core::{
    config::Configuration,
    csrf::csrf_protect,
    error::EncoreResult,
    state::{EncoreState, UrlDirections},
};
use encore_dependencies::chrono::NaiveDate;
use encore_models::{ArtistKind, DynStore, MemoryStore, NewAlbum, NewUser, PgStore, Store};

use crate::{
    cli::ServerCli,
    assets,
    pages::{self, not_found_page, session::PathSessionsLogin},
};

/// Postgres when a database is configured, memory otherwise
pub async fn open_store(config: &Configuration, in_memory: bool) -> EncoreResult<DynStore> {
    if in_memory || config.database_url.is_none() {
        warn!("Keeping all data in memory, nothing survives a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = PgStore::new(config.db_conn().await?);
    info!("Migrating database");
    store.migrate().await?;
    info!("Database migrated!");
    Ok(Arc::new(store))
}

pub fn setup_all_routes(router: Router<EncoreState>) -> Router<EncoreState> {
    let router = pages::index_pages(router);
    let router = pages::albums::album_pages(router);
    let router = pages::session::session_pages(router);
    let router = pages::genres::genre_pages(router);
    let router = pages::album_admin::album_admin_pages(router);
    let router = assets::asset_pages(router);

    router
}

pub fn axum_setup(state: EncoreState) -> Router {
    let router = Router::new();

    let router = setup_all_routes(router);

    router
        .fallback(not_found_page)
        .layer(middleware::from_fn_with_state(state.clone(), csrf_protect))
        .with_state(state)
}

pub fn directions() -> UrlDirections {
    UrlDirections {
        login_page: PathSessionsLogin {}.to_uri().to_string(),
    }
}

/// A user called `demo` (password `demo`), a staff user `curator` (password
/// `curator`) and a handful of albums
pub async fn seed_demo(store: &dyn Store) -> EncoreResult<()> {
    if store.user_by_name("demo").await?.is_some() {
        debug!("Demo data already present");
        return Ok(());
    }
    store.create_user(NewUser::new("demo", "demo", false)?).await?;
    info!("Created user demo with password demo");
    store.create_user(NewUser::new("curator", "curator", true)?).await?;
    info!("Created staff user curator with password curator");
    let albums = [
        ("Blue", "Joni Mitchell", ArtistKind::Individual, (1971, 6, 22), "Folk"),
        ("Kind of Blue", "Miles Davis", ArtistKind::Individual, (1959, 8, 17), "Jazz"),
        ("OK Computer", "Radiohead", ArtistKind::Group, (1997, 5, 21), "Alternative Rock"),
        ("Illmatic", "Nas", ArtistKind::Individual, (1994, 4, 19), "Hip Hop"),
    ];
    for (title, artist, kind, (y, m, d), genre) in albums {
        let mut album = NewAlbum::titled(title).by(artist).genre(genre);
        album.artist_kind = kind;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            album = album.released(date);
        }
        let album = store.create_album(album).await?;
        debug!("Seeded album {} {:?}", album.id, album.title);
    }
    Ok(())
}

pub async fn server_start(config: Configuration, cli: ServerCli) -> EncoreResult<()> {
    info!("Starting with config {:?}", config);
    let store = open_store(&config, cli.in_memory).await?;
    if cli.demo {
        seed_demo(store.as_ref()).await?;
    }
    debug!("Configuring application server");

    let listen_on = config.listen_on;
    let state = EncoreState::new(config, store, directions())?;
    let axum = axum_setup(state);

    info!("Listening on http://{}", listen_on);
    let server = axum::Server::bind(&listen_on).serve(axum.into_make_service());
    match server.await {
        Ok(()) => error!("server exited cleanly but unexpectedly"),
        Err(e) => {
            error!("Could not start server: {:?}", e);
            return Err(e.into());
        }
    }
    println!("Encore exited.");
    Ok(())
}
