//! Credential file persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a successful login leaves behind on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Provider access token obtained through the server handoff.
    pub token: String,
    /// Provider the token came from.
    pub provider: String,
    /// When the login completed.
    pub created_at: DateTime<Utc>,
}

/// Write the credentials to `~/.envlink/auth.json`.
pub fn save(provider: &str, token: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    save_in(&home, provider, token)
}

fn save_in(home: &Path, provider: &str, token: &str) -> Result<PathBuf> {
    let dir = home.join(".envlink");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join("auth.json");
    let credentials = StoredCredentials {
        token: token.to_string(),
        provider: provider.to_string(),
        created_at: Utc::now(),
    };

    fs::write(&path, serde_json::to_vec_pretty(&credentials)?)
        .with_context(|| format!("failed to write {}", path.display()))?;

    // The token is a live credential; keep it owner-readable only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(path)
}
