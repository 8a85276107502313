//! Skeletal push/pull/projects handlers.

use std::collections::HashMap;

use axum::Json;
use axum::extract::Query;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of `POST /push`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushRequest {
    /// Project the env file belongs to.
    pub project_id: String,
    /// Raw env file content.
    pub content: String,
}

/// Response of `GET /pull`.
#[derive(Debug, Serialize)]
pub struct PullResponse {
    /// Project the entries were requested for.
    pub project_id: String,
    /// Stored env entries.
    pub entries: Vec<String>,
}

/// Response of `GET /projects`.
#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    /// Known project identifiers.
    pub projects: Vec<String>,
}

/// Accept an env file upload. Echoes the payload back until storage lands.
pub async fn push(Json(body): Json<PushRequest>) -> Json<PushRequest> {
    debug!(project_id = %body.project_id, bytes = body.content.len(), "push received");
    Json(body)
}

/// Return the stored entries for a project.
pub async fn pull(Query(params): Query<HashMap<String, String>>) -> Json<PullResponse> {
    let project_id = params.get("project_id").cloned().unwrap_or_default();
    debug!(project_id = %project_id, "pull requested");

    Json(PullResponse {
        project_id,
        entries: Vec::new(),
    })
}

/// List the caller's projects.
pub async fn list_projects() -> Json<ProjectsResponse> {
    Json(ProjectsResponse {
        projects: Vec::new(),
    })
}
