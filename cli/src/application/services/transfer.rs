//! Application service — file transfer phase and metrics download.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::{Context, Result};
use rtdeploy_common::{FileTransferSpec, TransferEndpoint};

use crate::application::ports::{LocalFs, ProgressReporter, TransferClient, TransferConnector};
use crate::domain::TransferError;

/// Upload every file into the endpoint's target directory.
///
/// All local files are checked before connecting, so a missing file never
/// leaves a half-finished upload behind. Size mismatches are returned as
/// warnings; they do not fail the phase.
///
/// # Errors
///
/// Returns an error if a local file is missing, the connection or login
/// fails, the remote directory cannot be prepared, or an upload fails.
pub async fn upload_all(
    connector: &impl TransferConnector,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    endpoint: &TransferEndpoint,
    files: &[FileTransferSpec],
) -> Result<Vec<String>> {
    for file in files {
        if fs.file_size(&file.local).is_none() {
            return Err(TransferError::LocalFileMissing(file.local.clone()).into());
        }
    }

    reporter.step(&format!("connecting to FTP server {}...", endpoint.address()));
    let mut client = connector
        .connect(endpoint)
        .await
        .with_context(|| format!("connecting to {}", endpoint.address()))?;

    let result = upload_files(&mut client, reporter, endpoint, files).await;
    if let Err(e) = client.quit().await {
        tracing::debug!("ftp quit failed: {e}");
    }
    result
}

async fn upload_files(
    client: &mut impl TransferClient,
    reporter: &impl ProgressReporter,
    endpoint: &TransferEndpoint,
    files: &[FileTransferSpec],
) -> Result<Vec<String>> {
    client
        .ensure_remote_directory(&endpoint.target_directory)
        .await?;
    tracing::info!(dir = %endpoint.target_directory, "remote directory ready");

    let mut warnings = Vec::new();
    for file in files {
        reporter.step(&format!("uploading {} → {}", file.local.display(), file.remote));
        let report = client
            .upload(&file.local, &file.remote)
            .await
            .with_context(|| format!("uploading {}", file.local.display()))?;
        match report.warning() {
            None => {
                tracing::info!(remote = %report.remote, bytes = report.bytes_sent, "upload verified");
                reporter.success(&format!("uploaded {} ({} bytes)", report.remote, report.bytes_sent));
            }
            Some(warning) => {
                tracing::warn!("{warning}");
                reporter.warn(&warning);
                warnings.push(warning);
            }
        }
    }
    Ok(warnings)
}

/// Fetch `remote_name` from the endpoint's target directory into `local`.
///
/// # Errors
///
/// Returns an error if the connection, directory change or download fails.
pub async fn download_file(
    connector: &impl TransferConnector,
    endpoint: &TransferEndpoint,
    remote_name: &str,
    local: &Path,
) -> Result<u64> {
    let mut client = connector
        .connect(endpoint)
        .await
        .with_context(|| format!("connecting to {}", endpoint.address()))?;
    let result = async {
        client.change_directory(&endpoint.target_directory).await?;
        client.download(remote_name, local).await
    }
    .await;
    if let Err(e) = client.quit().await {
        tracing::debug!("ftp quit failed: {e}");
    }
    let bytes = result.with_context(|| format!("downloading {remote_name}"))?;
    tracing::info!(remote = remote_name, local = %local.display(), bytes, "downloaded");
    Ok(bytes)
}
