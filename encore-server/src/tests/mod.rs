use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use encore_core::{config::Configuration, error::EncoreResult, state::EncoreState};
use encore_dependencies::{hyper, tower::ServiceExt, url::Url};
use encore_models::{Album, DynStore, MemoryStore, NewAlbum, NewUser, Store, User};
use encore_toggle::FavoriteState;

use crate::cli::{
    server::{axum_setup, directions},
    toggle::BrowserSession,
};

const PASSWORD: &str = "on the corner";

fn config() -> Configuration {
    Configuration {
        session_secret: Some("a test secret that is long enough".to_string()),
        ..Default::default()
    }
}

struct TestApp {
    router: Router,
    store: DynStore,
    user: User,
    album: Album,
    /// cookies the "browser" holds, by name
    cookies: BTreeMap<String, String>,
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    content_type: Option<String>,
    body: String,
}

impl TestApp {
    async fn new() -> EncoreResult<Self> {
        let store: DynStore = Arc::new(MemoryStore::new());
        let user = store
            .create_user(NewUser::with_cost("miles", PASSWORD, false, 4)?)
            .await?;
        store
            .create_user(NewUser::with_cost("curator", PASSWORD, true, 4)?)
            .await?;
        let album = store
            .create_album(NewAlbum::titled("Bitches Brew").by("Miles Davis").genre("Jazz"))
            .await?;
        store
            .create_album(NewAlbum::titled("A Love Supreme").by("John Coltrane"))
            .await?;
        let state = EncoreState::new(config(), store.clone(), directions())?;
        Ok(Self {
            router: axum_setup(state),
            store,
            user,
            album,
            cookies: BTreeMap::new(),
        })
    }

    fn csrf(&self) -> String {
        self.cookies.get("csrftoken").cloned().unwrap_or_default()
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let (mut parts, body) = req.into_parts();
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            parts
                .headers
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let res: Response<_> = self
            .router
            .clone()
            .oneshot(Request::from_parts(parts, body))
            .await
            .unwrap();
        for set in res.headers().get_all(header::SET_COOKIE) {
            let set = set.to_str().unwrap();
            let pair = set.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
        let status = res.status();
        let location = res
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        TestResponse {
            status,
            location,
            content_type,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    async fn form(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = encore_dependencies::serde_urlencoded::to_string(form).unwrap();
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// The request the favorite script sends
    async fn ajax(&mut self, method: Method, path: &str) -> TestResponse {
        let token = self.csrf();
        self.send(
            Request::builder()
                .method(method)
                .uri(path)
                .header("X-Requested-With", "XMLHttpRequest")
                .header("X-CSRFToken", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn login(&mut self) -> TestResponse {
        self.login_as("miles").await
    }

    async fn login_as(&mut self, username: &str) -> TestResponse {
        self.get("/sessions/login").await;
        let token = self.csrf();
        self.form(
            "/sessions/login",
            &[
                ("username", username),
                ("password", PASSWORD),
                ("_csrf_token", &token),
            ],
        )
        .await
    }

    fn favorite_path(&self) -> String {
        format!("/albums/{}/favorite", self.album.id)
    }
}

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/health").await;
    assert_eq!(StatusCode::OK, res.status);
    assert_eq!("ok", res.body);
}

#[tokio::test]
async fn test_first_visit_gets_a_csrf_cookie() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/").await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("Sign in"));
    let token = app.csrf();
    assert_eq!(43, token.len());
    // the page carries the same token for forms and scripts
    assert!(res.body.contains(&token));

    // and it is not replaced on the next visit
    app.get("/").await;
    assert_eq!(token, app.csrf());
}

#[tokio::test]
async fn test_pages_require_login() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/albums").await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert_eq!(Some("/sessions/login?next=%2Falbums"), res.location.as_deref());

    let show = format!("/albums/{}", app.album.id);
    let res = app.get(&show).await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert!(res.location.unwrap().starts_with("/sessions/login?next="));
}

#[tokio::test]
async fn test_favorite_without_login() {
    let mut app = TestApp::new().await.unwrap();
    app.get("/").await;
    let path = app.favorite_path();
    let res = app.ajax(Method::POST, &path).await;
    assert_eq!(StatusCode::UNAUTHORIZED, res.status);
    assert_eq!(Some("application/json"), res.content_type.as_deref());

    let token = app.csrf();
    let res = app.form(&path, &[("_csrf_token", &token)]).await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert!(res.location.unwrap().starts_with("/sessions/login"));
}

#[tokio::test]
async fn test_login() {
    let mut app = TestApp::new().await.unwrap();
    app.get("/sessions/login").await;
    let token = app.csrf();
    let res = app
        .form(
            "/sessions/login",
            &[
                ("username", "miles"),
                ("password", "wrong"),
                ("_csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("User or password incorrect"));
    assert!(!app.cookies.contains_key("encore_session"));

    let res = app.login().await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert_eq!(Some("/albums"), res.location.as_deref());
    assert!(app.cookies.contains_key("encore_session"));

    let res = app.get("/").await;
    assert_eq!(Some("/albums"), res.location.as_deref());

    let res = app.get("/albums").await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("Bitches Brew"));
    assert!(res.body.contains("A Love Supreme"));
    assert!(res.body.contains("miles"));
}

#[tokio::test]
async fn test_login_returns_to_next() {
    let mut app = TestApp::new().await.unwrap();
    app.get("/sessions/login").await;
    let token = app.csrf();
    let res = app
        .form(
            "/sessions/login",
            &[
                ("username", "MILES"),
                ("password", PASSWORD),
                ("next", "/albums/1"),
                ("_csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(Some("/albums/1"), res.location.as_deref());
}

#[tokio::test]
async fn test_logout() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let token = app.csrf();
    let res = app.form("/sessions/logout", &[("_csrf_token", &token)]).await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert!(!app.cookies.contains_key("encore_session"));
    assert_eq!(StatusCode::SEE_OTHER, app.get("/albums").await.status);
}

#[tokio::test]
async fn test_unsafe_requests_need_the_token() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let path = app.favorite_path();

    // no token at all
    let res = app.send(Request::post(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(StatusCode::FORBIDDEN, res.status);

    // a token that does not match the cookie
    let res = app
        .send(
            Request::delete(&path)
                .header("X-Requested-With", "XMLHttpRequest")
                .header("X-CSRFToken", "forged")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(StatusCode::FORBIDDEN, res.status);

    // no cookie to compare against
    app.cookies.remove("csrftoken");
    let res = app.ajax(Method::POST, &path).await;
    assert_eq!(StatusCode::FORBIDDEN, res.status);
    assert!(!app.store.is_favorited(app.user.id, app.album.id).await.unwrap());
}

#[tokio::test]
async fn test_album_page_renders_toggle() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let res = app.get(&format!("/albums/{}", app.album.id)).await;
    assert_eq!(StatusCode::OK, res.status);
    let link = format!(
        r#"<a id="fav-link" href="/albums/{}/favorite" data-favorited="false"><i class="far fa-heart"></i></a>"#,
        app.album.id
    );
    assert!(res.body.contains(&link), "{}", res.body);
    assert!(res.body.contains("Miles Davis"));
    assert!(res.body.contains(r#"data-slug="jazz""#));
}

#[tokio::test]
async fn test_ajax_favorite_roundtrip() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let path = app.favorite_path();

    for _ in 0..2 {
        let res = app.ajax(Method::POST, &path).await;
        assert_eq!(StatusCode::OK, res.status);
        assert_eq!(Some("application/json"), res.content_type.as_deref());
        let json: serde_json::Value = serde_json::from_str(&res.body).unwrap();
        assert_eq!(serde_json::json!({ "favorited": true }), json);
    }
    assert!(app.store.is_favorited(app.user.id, app.album.id).await.unwrap());

    let res = app.get(&format!("/albums/{}", app.album.id)).await;
    assert!(res.body.contains(r#"data-favorited="true""#));
    assert!(res.body.contains(r#"<i class="fas fa-heart">"#));

    for _ in 0..2 {
        let res = app.ajax(Method::DELETE, &path).await;
        let json: serde_json::Value = serde_json::from_str(&res.body).unwrap();
        assert_eq!(serde_json::json!({ "favorited": false }), json);
    }
    assert!(!app.store.is_favorited(app.user.id, app.album.id).await.unwrap());
}

#[tokio::test]
async fn test_form_favorite_redirects_to_album() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let path = app.favorite_path();
    let token = app.csrf();
    let res = app.form(&path, &[("_csrf_token", &token)]).await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert_eq!(
        Some(format!("/albums/{}", app.album.id)),
        res.location
    );
    assert!(app.store.is_favorited(app.user.id, app.album.id).await.unwrap());
}

#[tokio::test]
async fn test_favorite_unknown_album() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let res = app.ajax(Method::POST, "/albums/9999/favorite").await;
    assert_eq!(StatusCode::NOT_FOUND, res.status);
    let res = app.get("/albums/9999").await;
    assert_eq!(StatusCode::NOT_FOUND, res.status);
}

#[tokio::test]
async fn test_favorite_other_verbs() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let path = app.favorite_path();
    let res = app.ajax(Method::PUT, &path).await;
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED, res.status);
    let res = app.get(&path).await;
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED, res.status);
}

#[tokio::test]
async fn test_listing_shows_favorites_and_sorts() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let path = app.favorite_path();
    app.ajax(Method::POST, &path).await;

    let res = app.get("/albums?sort=title").await;
    let love = res.body.find("A Love Supreme").unwrap();
    let brew = res.body.find("Bitches Brew").unwrap();
    assert!(love < brew);
    assert_eq!(1, res.body.matches("fas fa-heart").count());

    let res = app.get("/albums?sort=-created_at").await;
    let love = res.body.find("A Love Supreme").unwrap();
    let brew = res.body.find("Bitches Brew").unwrap();
    assert!(love < brew);

    let res = app.get("/albums?sort=artist").await;
    let love = res.body.find("A Love Supreme").unwrap();
    let brew = res.body.find("Bitches Brew").unwrap();
    assert!(love < brew, "John Coltrane sorts before Miles Davis");
}

#[tokio::test]
async fn test_unknown_route() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/nowhere").await;
    assert_eq!(StatusCode::NOT_FOUND, res.status);
}

#[tokio::test]
async fn test_album_page_loads_favorite_script() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let res = app.get(&format!("/albums/{}", app.album.id)).await;
    assert!(res.body.contains(r#"<script src="/static/js/show_album.js" defer>"#));
    assert!(!res.body.contains("/edit\""));

    let res = app.get("/static/js/show_album.js").await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.content_type.unwrap().contains("javascript"));
    assert!(res.body.contains("X-CSRFToken"));

    assert_eq!(StatusCode::NOT_FOUND, app.get("/static/js/missing.js").await.status);
}

#[tokio::test]
async fn test_genre_page() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/genres/jazz").await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);

    app.login().await;
    let res = app.get("/genres/jazz").await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("Bitches Brew"));
    assert!(!res.body.contains("A Love Supreme"));

    let res = app.get(&format!("/albums/{}", app.album.id)).await;
    assert!(res.body.contains(r#"href="/genres/jazz""#));

    assert_eq!(StatusCode::NOT_FOUND, app.get("/genres/polka").await.status);
}

#[tokio::test]
async fn test_search() {
    let mut app = TestApp::new().await.unwrap();
    // open to visitors
    let res = app.get("/search?title=love").await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("A Love Supreme"));
    assert!(!res.body.contains("Bitches Brew"));

    let res = app.get("/search?artist=DAVIS").await;
    assert!(res.body.contains("Bitches Brew"));
    assert!(!res.body.contains("A Love Supreme"));

    let res = app.get("/search?title=%25").await;
    assert!(res.body.contains("0 found"));

    let res = app.get("/search?title=&artist=+").await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert_eq!(Some("/albums"), res.location.as_deref());

    app.login().await;
    let path = app.favorite_path();
    app.ajax(Method::POST, &path).await;
    let res = app.get("/search?title=brew").await;
    assert_eq!(1, res.body.matches("fas fa-heart").count());
}

#[tokio::test]
async fn test_album_admin_is_staff_only() {
    let mut app = TestApp::new().await.unwrap();
    let res = app.get("/albums/new").await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    assert!(res.location.unwrap().starts_with("/sessions/login"));

    app.login().await;
    assert_eq!(StatusCode::FORBIDDEN, app.get("/albums/new").await.status);
    let edit = format!("/albums/{}/edit", app.album.id);
    assert_eq!(StatusCode::FORBIDDEN, app.get(&edit).await.status);
    let delete = format!("/albums/{}/delete", app.album.id);
    let token = app.csrf();
    let res = app.form(&delete, &[("_csrf_token", &token)]).await;
    assert_eq!(StatusCode::FORBIDDEN, res.status);
    assert!(app.store.album(app.album.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_staff_manage_albums() {
    let mut app = TestApp::new().await.unwrap();
    app.login_as("curator").await;
    let res = app.get("/albums").await;
    assert!(res.body.contains(r#"href="/albums/new""#));
    assert_eq!(StatusCode::OK, app.get("/albums/new").await.status);

    let token = app.csrf();
    let res = app
        .form(
            "/albums/new",
            &[
                ("title", ""),
                ("artist_name", "Weather Report"),
                ("_csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(StatusCode::OK, res.status);
    assert!(res.body.contains("Title is required"));

    let res = app
        .form(
            "/albums/new",
            &[
                ("title", "Heavy Weather"),
                ("artist_name", "Weather Report"),
                ("artist_kind", "grp"),
                ("release_date", "1977-03-01"),
                ("genres", "Jazz, Fusion"),
                ("_csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(StatusCode::SEE_OTHER, res.status);
    let show = res.location.unwrap();
    let res = app.get(&show).await;
    assert!(res.body.contains("Heavy Weather"));
    assert!(res.body.contains(r#"data-slug="fusion""#));
    assert!(app.get("/genres/jazz").await.body.contains("Heavy Weather"));

    let edit = format!("/albums/{}/edit", app.album.id);
    let res = app.get(&edit).await;
    assert!(res.body.contains(r#"value="Miles Davis""#));
    let res = app
        .form(
            &edit,
            &[
                ("title", "Bitches Brew (Legacy Edition)"),
                ("artist_name", "Miles Davis"),
                ("genres", "Fusion"),
                ("_csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(Some("/albums"), res.location.as_deref());
    let album = app.store.album(app.album.id).await.unwrap().unwrap();
    assert_eq!("Bitches Brew (Legacy Edition)", album.title);
    assert!(!app.get("/genres/jazz").await.body.contains("Bitches Brew"));

    let delete = format!("/albums/{}/delete", app.album.id);
    let res = app.get(&delete).await;
    assert!(res.body.contains("_csrf_token"));
    let res = app.form(&delete, &[("_csrf_token", &token)]).await;
    assert_eq!(Some("/albums"), res.location.as_deref());
    assert!(app.store.album(app.album.id).await.unwrap().is_none());
    assert_eq!(StatusCode::NOT_FOUND, app.get(&edit).await.status);
}

#[tokio::test]
async fn test_oversized_form_is_rejected() {
    let mut app = TestApp::new().await.unwrap();
    app.login().await;
    let token = app.csrf();
    let padding = "x".repeat(encore_core::csrf::FORM_BODY_LIMIT);
    let body = format!("_csrf_token={}&pad={}", token, padding);
    let res = app
        .send(
            Request::post("/sessions/logout")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, res.status);
    assert!(app.cookies.contains_key("encore_session"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_toggle_against_running_server() -> EncoreResult<()> {
    let app = TestApp::new().await?;
    let album_id = app.album.id;
    let state = EncoreState::new(config(), app.store.clone(), directions())?;
    let router = axum_setup(state);
    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
        .serve(router.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    let base = Url::parse(&format!("http://{}/", addr))?;
    let session = BrowserSession::new(&config(), base)?;
    session.login(&config(), "miles", PASSWORD).await?;

    assert_eq!(FavoriteState::Favorited, session.toggle_album(album_id).await?);
    assert!(app.store.is_favorited(app.user.id, album_id).await?);
    assert_eq!(FavoriteState::NotFavorited, session.toggle_album(album_id).await?);
    assert!(!app.store.is_favorited(app.user.id, album_id).await?);

    let bad = BrowserSession::new(&config(), Url::parse(&format!("http://{}/", addr))?)?;
    assert!(bad.login(&config(), "miles", "wrong").await.is_err());
    Ok(())
}
