use std::{net::SocketAddr, str::FromStr, time::Duration};

use encore_dependencies::{
    axum_extra::extract::cookie::Key,
    ring::{digest, rand::SecureRandom},
    url::Url,
};

use crate::error::{EncoreError, EncoreResult};

fn default_listen_on() -> SocketAddr {
    SocketAddr::from_str("127.0.0.1:8000").expect("static address")
}

fn default_session_cookie() -> String {
    "encore_session".to_string()
}

fn default_csrf_cookie() -> String {
    "csrftoken".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

#[derive(clap::Args, serde::Deserialize, serde::Serialize, Clone, securefmt::Debug)]
pub struct Configuration {
    /// Postgres database, the server keeps everything in memory if this is unset
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<Url>,
    #[clap(long, env = "LISTEN_ON", default_value = "127.0.0.1:8000")]
    #[serde(default = "default_listen_on")]
    pub listen_on: SocketAddr,
    #[clap(long, env = "SESSION_COOKIE", default_value = "encore_session")]
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Secret used to sign session cookies. Sessions do not survive a restart if unset.
    #[clap(long, env = "SESSION_SECRET", hide_env_values = true)]
    #[serde(skip_serializing)]
    #[sensitive]
    pub session_secret: Option<String>,
    #[clap(long, env = "CSRF_COOKIE", default_value = "csrftoken")]
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,
    /// Proxy for outgoing requests made by the toggle client
    #[clap(long, env = "PROXY")]
    #[serde(alias = "HTTP_PROXY", alias = "HTTPS_PROXY", alias = "SOCKS_PROXY")]
    pub proxy: Option<Url>,
    #[clap(long, env = "REQUEST_TIMEOUT_SECS", default_value = "5")]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Configuration {
    pub async fn db_conn(&self) -> EncoreResult<sqlx::PgPool> {
        let url = self
            .database_url
            .as_ref()
            .ok_or_else(|| EncoreError::ConfigurationUnset("DATABASE_URL".to_string()))?;
        let opts = sqlx::postgres::PgConnectOptions::from_str(url.as_str())?
            .application_name(&crate::package_full());
        Ok(sqlx::PgPool::connect_with(opts).await?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Signing key for session cookies.
    ///
    /// The configured secret is stretched with SHA-512 to the 64 bytes the
    /// cookie crate requires; without one a random key is generated.
    pub fn session_key(&self) -> EncoreResult<Key> {
        match &self.session_secret {
            Some(secret) => {
                let digest = digest::digest(&digest::SHA512, secret.as_bytes());
                Ok(Key::from(digest.as_ref()))
            }
            None => {
                warn!("SESSION_SECRET is unset, sessions will not survive a restart");
                let mut key = [0u8; 64];
                encore_dependencies::ring::rand::SystemRandom::new().fill(&mut key)?;
                Ok(Key::from(&key[..]))
            }
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            database_url: None,
            listen_on: default_listen_on(),
            session_cookie: default_session_cookie(),
            session_secret: None,
            csrf_cookie: default_csrf_cookie(),
            proxy: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_key_is_stable_for_a_secret() -> EncoreResult<()> {
        let config = Configuration {
            session_secret: Some("correct horse battery staple".to_string()),
            ..Default::default()
        };
        assert_eq!(config.session_key()?.master(), config.session_key()?.master());
        Ok(())
    }

    #[test]
    fn test_secret_is_masked_in_debug() {
        let config = Configuration {
            session_secret: Some("correct horse battery staple".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("correct horse"), "{}", printed);
        assert!(printed.contains("csrftoken"));
    }

    #[test]
    fn test_db_conn_requires_url() {
        let config = Configuration::default();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let res = rt.block_on(config.db_conn());
        assert!(matches!(res, Err(EncoreError::ConfigurationUnset(_))));
    }
}
