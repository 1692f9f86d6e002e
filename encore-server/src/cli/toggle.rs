use std::sync::Arc;

use anyhow::Context;
use axum_extra::routing::TypedPath;
use encore_core::{
    config::Configuration,
    error::{EncoreError, EncoreResult},
    http_client_builder,
};
use encore_dependencies::{
    reqwest::{self, cookie::Jar, StatusCode},
    url::Url,
};
use encore_toggle::{
    state::CSRF_COOKIE, CookieSource, Document, FavoriteState, FavoriteToggle, ReqwestTransport,
};

use crate::{
    cli::ToggleCli,
    pages::{albums::PathShowAlbum, session::PathSessionsLogin},
};

/// A client that keeps cookies the way a browser tab would
pub struct BrowserSession {
    pub base_url: Url,
    pub client: reqwest::Client,
    pub jar: Arc<Jar>,
}

impl BrowserSession {
    pub fn new(config: &Configuration, base_url: Url) -> EncoreResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = http_client_builder(config)?
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self {
            base_url,
            client,
            jar,
        })
    }

    fn url(&self, path: &str) -> EncoreResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Signs in through the login form, CSRF token and all
    pub async fn login(
        &self,
        config: &Configuration,
        username: &str,
        password: &str,
    ) -> EncoreResult<()> {
        let login = self.url(&PathSessionsLogin {}.to_uri().to_string())?;
        self.client.get(login.clone()).send().await?;
        let token = self
            .jar
            .cookie(&login, CSRF_COOKIE)
            .ok_or(EncoreError::CsrfFailure("server did not hand out a token"))?;
        let res = self
            .client
            .post(login.clone())
            .form(&[
                ("username", username),
                ("password", password),
                ("_csrf_token", token.as_str()),
            ])
            .send()
            .await?;
        debug!("login answered {}", res.status());
        if self.jar.cookie(&login, &config.session_cookie).is_none() {
            return Err(EncoreError::AccessDenied);
        }
        Ok(())
    }

    /// Loads the album page and clicks its heart once
    pub async fn toggle_album(&self, album_id: i64) -> EncoreResult<FavoriteState> {
        let page = self.url(&PathShowAlbum { album_id }.to_uri().to_string())?;
        let res = self.client.get(page.clone()).send().await?;
        match res.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(EncoreError::ObjectNotFound(
                    "Album".to_string(),
                    album_id.to_string(),
                ))
            }
            s => return Err(EncoreError::Other(format!("album page answered {}", s))),
        }
        let markup = res.text().await?;
        let document = Document::from_markup(page, &markup);
        let toggle = FavoriteToggle::new(
            &document,
            Arc::new(ReqwestTransport::new(self.client.clone())),
            self.jar.clone(),
        )
        .context("album page has no favorite link")?;
        let _subscription = toggle.listen();
        let before = toggle.state();
        let target = toggle
            .link()
            .children()
            .into_iter()
            .next()
            .unwrap_or_else(|| toggle.link().clone());
        document.click(&target);
        toggle.settle().await;
        let after = toggle.state();
        if before == after {
            warn!("favorite state did not change, see the log above for errors");
        }
        Ok(after)
    }
}

pub async fn toggle(config: Configuration, cli: ToggleCli) -> EncoreResult<()> {
    let session = BrowserSession::new(&config, cli.base_url)?;
    session.login(&config, &cli.username, &cli.password).await?;
    let state = session.toggle_album(cli.album_id).await?;
    let message = match state {
        FavoriteState::Favorited => "favorited",
        FavoriteState::NotFavorited => "not favorited",
    };
    println!("Album {} is now {}", cli.album_id, message);
    Ok(())
}
