use axum::{extract::Path, http::HeaderValue, routing::get, Router};
use encore_core::{
    error::{EncoreError, EncoreResult},
    request_helper::FileResponse,
    state::EncoreState,
};

const PREFIX: &str = "/static/";

#[derive(rust_embed::RustEmbed)]
#[folder = "static/"]
#[prefix = "/static/"]
pub struct Assets;

pub fn asset_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.route("/static/*path", get(serve_asset))
}

/// Public path of a bundled asset, `path` is relative to `static/`
pub fn static_path(path: &str) -> String {
    let path = format!("{}{}", PREFIX, path.trim_start_matches('/'));
    debug_assert!(
        Assets::get(&path).is_some(),
        "asset must exist in repository: {:?}",
        path
    );
    path
}

#[instrument]
pub async fn serve_asset(Path(path): Path<String>) -> EncoreResult<FileResponse> {
    let path = path.trim_start_matches('/');
    let not_found = || EncoreError::ObjectNotFound("File".to_string(), path.to_string());
    if path.split('/').any(|segment| segment == "..") {
        return Err(not_found());
    }
    let file = Assets::get(&format!("{}{}", PREFIX, path)).ok_or_else(not_found)?;
    let content_type = HeaderValue::from_str(file.metadata.mimetype())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    trace!("Serving static file {} as {:?}", path, content_type);
    Ok(FileResponse {
        content: file.data,
        content_type,
    })
}
