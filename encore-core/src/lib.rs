#[macro_use]
extern crate tracing;

use encore_dependencies::reqwest::{self, header::HeaderMap, Proxy};

use crate::{config::Configuration, error::EncoreResult};

pub mod app;
pub mod config;
pub mod csrf;
pub mod error;
pub mod request_helper;
pub mod session;
pub mod state;

/// Client builder carrying the configured proxy, timeouts and user agent.
///
/// Redirects are not followed so callers can observe them.
pub fn http_client_builder(config: &Configuration) -> EncoreResult<reqwest::ClientBuilder> {
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_millis(500))
        .timeout(config.request_timeout())
        .redirect(reqwest::redirect::Policy::none());
    let client = if let Some(proxy) = &config.proxy {
        client.proxy(Proxy::all(proxy.clone())?)
    } else {
        client
    };
    Ok(client.default_headers(common_headers()?))
}

pub fn http_client(config: &Configuration) -> EncoreResult<reqwest::Client> {
    Ok(http_client_builder(config)?.build()?)
}

fn common_headers() -> EncoreResult<HeaderMap> {
    let mut hm = HeaderMap::new();
    let user_agent = format!("Mozilla/5.0 ({})", package_full());
    trace!("new user agent with value {}", user_agent);
    hm.append(
        reqwest::header::USER_AGENT,
        user_agent
            .parse()
            .map_err(|_| error::EncoreError::Other(format!("bad user agent {user_agent:?}")))?,
    );
    Ok(hm)
}

pub fn package_full() -> String {
    format!("{} v{}", package_name(), package_version())
}

pub const fn package_name() -> &'static str {
    const NAME: &str = env!("CARGO_PKG_NAME");
    NAME
}

pub const fn package_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    VERSION
}
