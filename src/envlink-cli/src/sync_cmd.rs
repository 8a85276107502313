//! Thin clients for the server's sync endpoints.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

use envlink_common::protocol::API_BASE_PATH;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

fn endpoint(server_url: &str, path: &str) -> String {
    format!("{}{API_BASE_PATH}{path}", server_url.trim_end_matches('/'))
}

pub async fn push(server_url: &str, project: &str, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let response = client()?
        .post(endpoint(server_url, "/push"))
        .json(&json!({ "project_id": project, "content": content }))
        .send()
        .await?
        .error_for_status()?;

    println!("{}", response.text().await?);
    Ok(())
}

pub async fn pull(server_url: &str, project: &str) -> Result<()> {
    let response = client()?
        .get(endpoint(server_url, "/pull"))
        .query(&[("project_id", project)])
        .send()
        .await?
        .error_for_status()?;

    println!("{}", response.text().await?);
    Ok(())
}

pub async fn projects(server_url: &str) -> Result<()> {
    let response = client()?
        .get(endpoint(server_url, "/projects"))
        .send()
        .await?
        .error_for_status()?;

    println!("{}", response.text().await?);
    Ok(())
}
