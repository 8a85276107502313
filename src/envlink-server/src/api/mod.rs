//! REST API routes for the secret sync surface.
//!
//! The sync endpoints are skeletal: they hold the route shape the CLI
//! talks to while the storage backend is out of scope here.

mod sync;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Create the sync API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/push", post(sync::push))
        .route("/pull", get(sync::pull))
        .route("/projects", get(sync::list_projects))
}
