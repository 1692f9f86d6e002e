use std::{collections::BTreeMap, sync::Arc};

use encore_dependencies::{
    async_trait::async_trait,
    reqwest::{
        self,
        cookie::{CookieStore, Jar},
        header::HeaderMap,
        Method, StatusCode,
    },
    url::{self, Url},
};

use crate::error::ToggleResult;

#[derive(Debug, Clone)]
pub struct ToggleRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Carries a toggle request to the server.
///
/// Implementations attach cookies for the document origin only.
#[async_trait]
pub trait FavoriteTransport: Send + Sync {
    async fn send(&self, request: ToggleRequest) -> ToggleResult<TransportResponse>;
}

/// Sends requests through a reqwest client, which should carry the cookie
/// jar the session was established with.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FavoriteTransport for ReqwestTransport {
    async fn send(&self, request: ToggleRequest) -> ToggleResult<TransportResponse> {
        trace!("{} {}", request.method, request.url);
        let res = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .send()
            .await?;
        let status = res.status();
        let body = res.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

/// Read access to the cookies a document can see
pub trait CookieSource: Send + Sync {
    fn cookie(&self, url: &Url, name: &str) -> Option<String>;
}

fn find_in_header(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

impl CookieSource for Jar {
    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.cookies(url)?;
        find_in_header(header.to_str().ok()?, name)
    }
}

impl<T: CookieSource + ?Sized> CookieSource for Arc<T> {
    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        (**self).cookie(url, name)
    }
}

/// Fixed cookies for one origin
#[derive(Debug, Default, Clone)]
pub struct CookieMap {
    origin: Option<url::Origin>,
    values: BTreeMap<String, String>,
}

impl CookieMap {
    pub fn for_origin(url: &Url) -> Self {
        Self {
            origin: Some(url.origin()),
            values: BTreeMap::new(),
        }
    }
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl CookieSource for CookieMap {
    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        match &self.origin {
            Some(origin) if *origin != url.origin() => None,
            _ => self.values.get(name).cloned(),
        }
    }
}
