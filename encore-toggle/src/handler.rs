use std::sync::{Arc, Mutex, PoisonError};

use encore_dependencies::{
    reqwest::header::{HeaderMap, HeaderValue},
    url::Url,
};
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    dom::{Document, Event, Node, Subscription},
    error::{ToggleError, ToggleResult},
    state::{FavoriteState, CSRF_COOKIE, DATA_FAVORITED, FAV_LINK_ID, FILLED, OUTLINE},
    transport::{CookieSource, FavoriteTransport, ToggleRequest},
};

pub const X_REQUESTED_WITH: &str = "x-requested-with";
pub const X_CSRF_TOKEN: &str = "x-csrftoken";

#[derive(serde::Deserialize)]
struct FavoriteResponse {
    favorited: bool,
}

/// Turns clicks on the `#fav-link` element into favorite requests and
/// reflects the answer back into the element.
#[derive(Clone)]
pub struct FavoriteToggle {
    link: Node,
    document_url: Url,
    transport: Arc<dyn FavoriteTransport>,
    cookies: Arc<dyn CookieSource>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for FavoriteToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteToggle")
            .field("link", &self.link)
            .field("document_url", &self.document_url.as_str())
            .finish_non_exhaustive()
    }
}

impl FavoriteToggle {
    pub fn new(
        document: &Document,
        transport: Arc<dyn FavoriteTransport>,
        cookies: Arc<dyn CookieSource>,
    ) -> ToggleResult<Self> {
        Ok(Self {
            link: document.require_element_by_id(FAV_LINK_ID)?,
            document_url: document.url().clone(),
            transport,
            cookies,
            pending: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Finds the toggle element and starts listening for clicks on it.
    /// The listener lives as long as the returned subscription.
    pub fn attach(
        document: &Document,
        transport: Arc<dyn FavoriteTransport>,
        cookies: Arc<dyn CookieSource>,
    ) -> ToggleResult<Subscription> {
        Ok(Self::new(document, transport, cookies)?.listen())
    }

    pub fn listen(&self) -> Subscription {
        let this = self.clone();
        self.link
            .add_event_listener("click", move |event| this.on_click(event))
    }

    pub fn link(&self) -> &Node {
        &self.link
    }

    pub fn state(&self) -> FavoriteState {
        FavoriteState::from_attribute(self.link.attribute(DATA_FAVORITED).as_deref())
    }

    /// Handles one click. Nothing is awaited here, the request runs on its
    /// own task and every click gets its own request.
    ///
    /// Clicks outside a tokio runtime are logged and dropped.
    pub fn on_click(&self, event: &Event) {
        event.prevent_default();
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Could not toggle favorite, no runtime to send on: {}", e);
                return;
            }
        };
        let request = match self.request() {
            Ok(request) => request,
            Err(e) => {
                error!("Could not toggle favorite: {}", e);
                return;
            }
        };
        let transport = self.transport.clone();
        let link = self.link.clone();
        let target = event.target().clone();
        let handle = runtime.spawn(async move {
            match send(transport.as_ref(), request).await {
                Ok(state) => apply(&link, &target, state),
                Err(e) => error!("Could not toggle favorite: {}", e),
            }
        });
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Builds the request the next click would send
    pub fn request(&self) -> ToggleResult<ToggleRequest> {
        let method = self.state().toggle_method();
        let href = self
            .link
            .attribute("href")
            .ok_or(ToggleError::MissingHref)?;
        let url = self.document_url.join(&href)?;
        if url.origin() != self.document_url.origin() {
            return Err(ToggleError::CrossOrigin(url));
        }
        // read fresh on every click, an empty header gets rejected upstream
        let token = self
            .cookies
            .cookie(&self.document_url, CSRF_COOKIE)
            .unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(X_CSRF_TOKEN, HeaderValue::from_str(&token)?);
        Ok(ToggleRequest {
            method,
            url,
            headers,
        })
    }

    /// Waits for every request spawned so far to settle
    pub async fn settle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                pending.drain(..).collect()
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    error!("Favorite task failed: {}", e);
                }
            }
        }
    }
}

async fn send(
    transport: &dyn FavoriteTransport,
    request: ToggleRequest,
) -> ToggleResult<FavoriteState> {
    let response = transport.send(request).await?;
    // the status is not looked at, any body with a favorited flag counts
    let parsed: FavoriteResponse = serde_json::from_slice(&response.body)?;
    debug!(
        "favorite toggled to {} ({})",
        parsed.favorited, response.status
    );
    Ok(parsed.favorited.into())
}

fn apply(link: &Node, target: &Node, state: FavoriteState) {
    match state {
        FavoriteState::Favorited => target.replace_class(OUTLINE, FILLED),
        FavoriteState::NotFavorited => target.replace_class(FILLED, OUTLINE),
    };
    link.set_attribute(DATA_FAVORITED, state.as_attribute());
}
