//! Submit, wait, download: one archive job per invocation.

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use crate::archive::ArchiveService;
use crate::error::{Era5Error, ErrorCategory};
use crate::request::DatasetRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Success,
    Failure,
}

/// Outcome of a single fetch. Exactly one of `local_path` and
/// `error_message` is set, matching `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorCategory>,
}

impl FetchResult {
    pub fn success(local_path: &Path, bytes_written: u64) -> Self {
        Self {
            status: FetchStatus::Success,
            local_path: Some(local_path.display().to_string()),
            bytes_written: Some(bytes_written),
            error_message: None,
            error_kind: None,
        }
    }

    pub fn failure(error: &Era5Error) -> Self {
        Self {
            status: FetchStatus::Failure,
            local_path: None,
            bytes_written: None,
            error_message: Some(error.to_string()),
            error_kind: Some(error.category()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// Lifecycle of a fetch inside one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Built,
    Submitted,
    RemoteRunning,
    Downloaded,
    RemoteFailed,
    TransportFailed,
    WriteFailed,
}

impl FetchState {
    fn after(error: &Era5Error) -> Self {
        match error {
            Era5Error::RemoteJob(_) => FetchState::RemoteFailed,
            Era5Error::Write { .. } => FetchState::WriteFailed,
            _ => FetchState::TransportFailed,
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchState::Built => "BUILT",
            FetchState::Submitted => "SUBMITTED",
            FetchState::RemoteRunning => "REMOTE_RUNNING",
            FetchState::Downloaded => "DOWNLOADED",
            FetchState::RemoteFailed => "REMOTE_FAILED",
            FetchState::TransportFailed => "TRANSPORT_FAILED",
            FetchState::WriteFailed => "WRITE_FAILED",
        };
        f.write_str(name)
    }
}

/// Runs the whole fetch and folds any error into a failure result.
pub fn fetch(
    service: &dyn ArchiveService,
    request: &DatasetRequest,
    destination: &Path,
) -> FetchResult {
    match run(service, request, destination) {
        Ok(bytes) => {
            info!(
                "fetched {} ({} bytes) to {}",
                request.kind(),
                bytes,
                destination.display()
            );
            FetchResult::success(destination, bytes)
        }
        Err(e) => {
            warn!(
                "fetch of {} failed [{}]: {}",
                request.kind(),
                FetchState::after(&e),
                e
            );
            FetchResult::failure(&e)
        }
    }
}

fn run(
    service: &dyn ArchiveService,
    request: &DatasetRequest,
    destination: &Path,
) -> Result<u64, Era5Error> {
    debug!(
        "{}: {} variable={} years={:?} month={}",
        FetchState::Built,
        request.kind(),
        request.variable(),
        request.years(),
        request.month()
    );
    if destination.is_dir() {
        return Err(Era5Error::write(
            destination,
            std::io::Error::other("destination is a directory"),
        ));
    }

    let job = service.submit(request)?;
    debug!("{}: job {}", FetchState::Submitted, job.id);
    debug!("{}: waiting on {}", FetchState::RemoteRunning, job.monitor_url);
    let file = service.wait(&job)?;

    // Directories are only created once there is something to put in them.
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Era5Error::write(dir, e))?;

    // The download lands next to the destination and only replaces it once
    // complete; dropping the staging file on error removes it.
    let staging = tempfile::Builder::new()
        .prefix(".era5-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| Era5Error::write(dir, e))?;
    debug!(
        "{}: downloading {} into {}",
        FetchState::RemoteRunning,
        file.location,
        staging.path().display()
    );
    let bytes = service.download(&file, staging.path())?;
    staging
        .persist(destination)
        .map_err(|e| Era5Error::write(destination, e.error))?;
    debug!("{}: {}", FetchState::Downloaded, destination.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_the_error_category() {
        assert_eq!(
            FetchState::after(&Era5Error::RemoteJob("x".into())),
            FetchState::RemoteFailed
        );
        assert_eq!(
            FetchState::after(&Era5Error::Transport("x".into())),
            FetchState::TransportFailed
        );
        assert_eq!(FetchState::RemoteRunning.to_string(), "REMOTE_RUNNING");
    }

    #[test]
    fn failure_result_has_no_path() {
        let result = FetchResult::failure(&Era5Error::RemoteJob("no data for 1800".into()));
        assert!(!result.is_success());
        assert_eq!(result.local_path, None);
        assert_eq!(result.error_kind, Some(ErrorCategory::RemoteJob));
        assert!(result.error_message.unwrap().contains("no data for 1800"));
    }
}
