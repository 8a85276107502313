//! `envlink login` implementation.

use std::time::Duration;

use anyhow::{Context, Result};

use envlink_login::{LoginOptions, run_login_flow};

use crate::credentials;

pub async fn run(server_url: &str, provider: &str, timeout_secs: u64) -> Result<()> {
    let mut opts = LoginOptions::new(server_url, provider);
    opts.timeout = Duration::from_secs(timeout_secs);

    let result = run_login_flow(opts).await.context("login failed")?;

    let path = credentials::save(provider, &result.token)
        .context("authenticated, but storing credentials failed")?;

    eprintln!("Login successful.");
    eprintln!("Credentials written to {}.", path.display());
    Ok(())
}
