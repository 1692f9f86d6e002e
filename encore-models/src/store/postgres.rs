use encore_dependencies::async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, PgConnection, PgPool};

use crate::{
    models::like_pattern, slug::slugify, Album, AlbumFilter, AlbumListing, AlbumSort, Artist,
    ArtistKind, DBPool, EncoreModelError, Genre, ModelResult, NewAlbum, NewUser, Store, User,
};

#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: DBPool) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DBPool {
        &self.db
    }

    pub async fn migrate(&self) -> ModelResult<()> {
        info!("Migrating database");
        sqlx::migrate!("../migrations").run(&self.db).await?;
        info!("Database migrated!");
        Ok(())
    }
}

async fn artist_named(conn: &mut PgConnection, name: &str, kind: ArtistKind) -> ModelResult<i64> {
    let artist = query_as::<_, Artist>(
        r#"INSERT INTO artists (name, kind) VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET updated_at = artists.updated_at
        RETURNING *"#,
    )
    .bind(name)
    .bind(kind.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(artist.id)
}

/// Points the album at exactly the named genres, creating missing ones
async fn set_genres(conn: &mut PgConnection, album_id: i64, names: &[String]) -> ModelResult<()> {
    query("DELETE FROM album_genres WHERE album_id = $1")
        .bind(album_id)
        .execute(&mut *conn)
        .await?;
    for name in names {
        let genre = query_as::<_, Genre>(
            r#"INSERT INTO genres (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = genres.name
            RETURNING *"#,
        )
        .bind(name)
        .bind(slugify(name))
        .fetch_one(&mut *conn)
        .await?;
        query("INSERT INTO album_genres (album_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(album_id)
            .bind(genre.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> ModelResult<()> {
        query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn album(&self, id: i64) -> ModelResult<Option<Album>> {
        Ok(query_as::<_, Album>("SELECT * FROM albums WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    async fn albums(
        &self,
        viewer: Option<i64>,
        filter: &AlbumFilter,
        sort: AlbumSort,
    ) -> ModelResult<Vec<AlbumListing>> {
        let condition = match filter {
            AlbumFilter::All => "TRUE",
            AlbumFilter::Genre(_) => {
                "EXISTS(SELECT 1 FROM album_genres ag WHERE ag.album_id = a.id AND ag.genre_id = $2)"
            }
            AlbumFilter::TitleContains(_) => "a.title ILIKE $2",
            AlbumFilter::ArtistContains(_) => "ar.name ILIKE $2",
        };
        let sql = format!(
            r#"SELECT a.id, a.title, a.artist_id, a.release_date, a.created_at, a.updated_at,
                ar.name AS artist_name,
                EXISTS(
                    SELECT 1 FROM favorite_albums f WHERE f.album_id = a.id AND f.user_id = $1
                ) AS favorited
            FROM albums a
            LEFT JOIN artists ar ON ar.id = a.artist_id
            WHERE {}
            ORDER BY {}"#,
            condition,
            sort.order_by()
        );
        let listing = query_as::<_, AlbumListing>(&sql).bind(viewer);
        let listing = match filter {
            AlbumFilter::All => listing,
            AlbumFilter::Genre(id) => listing.bind(*id),
            AlbumFilter::TitleContains(term) | AlbumFilter::ArtistContains(term) => {
                listing.bind(like_pattern(term))
            }
        };
        Ok(listing.fetch_all(&self.db).await?)
    }

    async fn album_genres(&self, album_id: i64) -> ModelResult<Vec<Genre>> {
        Ok(query_as::<_, Genre>(
            r#"SELECT g.* FROM genres g
            INNER JOIN album_genres ag ON ag.genre_id = g.id
            WHERE ag.album_id = $1
            ORDER BY g.name"#,
        )
        .bind(album_id)
        .fetch_all(&self.db)
        .await?)
    }

    #[instrument(skip(self))]
    async fn create_album(&self, album: NewAlbum) -> ModelResult<Album> {
        let mut tx = self.db.begin().await?;
        let artist_id = match &album.artist_name {
            Some(name) => Some(artist_named(&mut tx, name, album.artist_kind).await?),
            None => None,
        };
        let now = Utc::now().naive_utc();
        let created = query_as::<_, Album>(
            r#"INSERT INTO albums (title, artist_id, release_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4) RETURNING *"#,
        )
        .bind(&album.title)
        .bind(artist_id)
        .bind(album.release_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        set_genres(&mut tx, created.id, &album.genres).await?;
        tx.commit().await?;
        debug!("created album {} ({})", created.id, created.title);
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn update_album(&self, id: i64, album: NewAlbum) -> ModelResult<Option<Album>> {
        let mut tx = self.db.begin().await?;
        let artist_id = match &album.artist_name {
            Some(name) => Some(artist_named(&mut tx, name, album.artist_kind).await?),
            None => None,
        };
        let updated = query_as::<_, Album>(
            r#"UPDATE albums SET title = $2, artist_id = $3, release_date = $4, updated_at = $5
            WHERE id = $1 RETURNING *"#,
        )
        .bind(id)
        .bind(&album.title)
        .bind(artist_id)
        .bind(album.release_date)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&mut *tx)
        .await?;
        let updated = match updated {
            Some(updated) => updated,
            None => return Ok(None),
        };
        set_genres(&mut tx, id, &album.genres).await?;
        tx.commit().await?;
        debug!("updated album {} ({})", updated.id, updated.title);
        Ok(Some(updated))
    }

    #[instrument(skip(self))]
    async fn delete_album(&self, id: i64) -> ModelResult<bool> {
        // genre links and favorites go with it, ON DELETE CASCADE
        let res = query("DELETE FROM albums WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn genre_by_slug(&self, slug: &str) -> ModelResult<Option<Genre>> {
        Ok(query_as::<_, Genre>("SELECT * FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn artist(&self, id: i64) -> ModelResult<Option<Artist>> {
        Ok(query_as::<_, Artist>("SELECT * FROM artists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn is_favorited(&self, user_id: i64, album_id: i64) -> ModelResult<bool> {
        let (exists,): (bool,) = query_as(
            "SELECT EXISTS(SELECT 1 FROM favorite_albums WHERE user_id = $1 AND album_id = $2)",
        )
        .bind(user_id)
        .bind(album_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn add_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()> {
        query(
            r#"INSERT INTO favorite_albums (user_id, album_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING"#,
        )
        .bind(user_id)
        .bind(album_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_favorite(&self, user_id: i64, album_id: i64) -> ModelResult<()> {
        query("DELETE FROM favorite_albums WHERE user_id = $1 AND album_id = $2")
            .bind(user_id)
            .bind(album_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn user(&self, id: i64) -> ModelResult<Option<User>> {
        Ok(query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn user_by_name(&self, username: &str) -> ModelResult<Option<User>> {
        Ok(query_as::<_, User>("SELECT * FROM users WHERE lower(username) = lower($1)")
            .bind(username)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> ModelResult<User> {
        if self.user_by_name(&user.username).await?.is_some() {
            return Err(EncoreModelError::AlreadyExists(
                "user".to_string(),
                user.username,
            ));
        }
        Ok(query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, is_staff)
            VALUES ($1, $2, $3) RETURNING *"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.db)
        .await?)
    }
}
