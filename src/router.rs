use crate::state::Documents;
use axum::{extract::DefaultBodyLimit, http::Method, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use self::documents::documents_router;

mod documents;

pub const DOCUMENTS_PATH: &str = "/api/v1/documents";

/// Room for multipart boundaries and the text fields next to the file.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn router(state: Documents) -> Router {
    let body_limit = state.validator.max_size().saturating_add(FORM_OVERHEAD);

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE]);

    Router::new()
        .nest(DOCUMENTS_PATH, documents_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
