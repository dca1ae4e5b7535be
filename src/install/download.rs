// src/install/download.rs

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{BootstrapError, Result};

/// Download `url` into `dest`, returning the number of bytes written.
///
/// Only connection setup is bounded by `connect_timeout`; large archives may
/// take as long as they need once the transfer is running.
pub async fn download_to(url: &str, dest: &Path, connect_timeout: Duration) -> Result<u64> {
    let to_error = |source: reqwest::Error| BootstrapError::Download {
        url: url.to_string(),
        source,
    };

    info!(%url, dest = ?dest, "downloading");

    let client = reqwest::Client::builder()
        .user_agent(concat!("rvc-bootstrap/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(connect_timeout)
        .build()
        .map_err(to_error)?;

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(to_error)?;
    debug!(status = %response.status(), "download response");

    let body = response.bytes().await.map_err(to_error)?;
    tokio::fs::write(dest, &body).await?;

    info!(%url, bytes = body.len(), "download finished");
    Ok(body.len() as u64)
}
