//! The remote archive: job submission, completion wait and download.
//!
//! [`ArchiveService`] is the seam the fetch workflow talks to. [`CdsClient`]
//! implements it against the Copernicus Climate Data Store; tests substitute
//! in-memory fakes. An [`ArchiveConnector`] produces one authenticated service
//! per tool invocation, so nothing is shared between calls.

mod client;
mod legacy;
mod processing;

pub use client::{CdsClient, CdsConnector, ClientOptions};

use std::path::Path;

use crate::error::Era5Error;
use crate::request::DatasetRequest;

/// Which CDS API a job was submitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `/resources/{dataset}` + `/tasks/{id}`, keys of the form `<UID>:<APIKEY>`.
    Legacy,
    /// OGC API Processes under `/retrieve/v1`, personal access tokens.
    Processing,
}

/// Handle to a job accepted by the archive.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: String,
    /// URL polled for the job status.
    pub monitor_url: String,
    /// Base used to resolve relative links in replies about this job.
    pub base_url: String,
    pub flavor: ApiFlavor,
}

/// A produced file, ready to be downloaded.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Download URL.
    pub location: String,
    /// Expected content length (bytes).
    pub content_length: u64,
    /// Optional content type.
    pub content_type: Option<String>,
}

pub trait ArchiveService {
    /// Submits a request and returns as soon as the archive accepted it.
    fn submit(&self, request: &DatasetRequest) -> Result<JobHandle, Era5Error>;

    /// Blocks until the job is terminal. A job that ends in failure is
    /// reported as [`Era5Error::RemoteJob`] carrying the archive's message.
    fn wait(&self, job: &JobHandle) -> Result<RemoteFile, Era5Error>;

    /// Writes the file to `target`, replacing any existing content, and
    /// returns the number of bytes written.
    fn download(&self, file: &RemoteFile, target: &Path) -> Result<u64, Era5Error>;
}

pub trait ArchiveConnector: Send + Sync {
    /// Builds an authenticated service. Missing or unusable credentials are
    /// transport failures.
    fn connect(&self) -> Result<Box<dyn ArchiveService>, Era5Error>;
}
