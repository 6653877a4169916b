use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, RANGE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::archive::legacy::TaskReply;
use crate::archive::processing::{JobResults, JobStatus, SubmittedJob};
use crate::archive::{ApiFlavor, ArchiveConnector, ArchiveService, JobHandle, RemoteFile};
use crate::config::{CdsCredentials, CredentialOverrides, load_credentials};
use crate::error::{CdsProblem, Era5Error, classify_cds_failure};
use crate::request::DatasetRequest;
use crate::util::{api_v2_variant, append_query, backoff, retriable_status, split_key_basic};

/// Tuning knobs of [`CdsClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Attempts for transient HTTP failures and interrupted downloads.
    pub retry_max: usize,
    /// Pause between retries and upper bound of the polling backoff.
    pub sleep_max: Duration,
    /// Draw a download progress bar on stderr.
    pub progress: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retry_max: 500,
            sleep_max: Duration::from_secs(120),
            progress: false,
        }
    }
}

/// Blocking client for the Copernicus Climate Data Store.
#[derive(Debug)]
pub struct CdsClient {
    url: String,
    key: String,
    options: ClientOptions,
    http: HttpClient,
}

impl CdsClient {
    pub fn new(credentials: CdsCredentials, options: ClientOptions) -> Result<Self, Era5Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("era5-mcp/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("era5-mcp")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(options.timeout);
        if !credentials.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| Era5Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: credentials.url,
            key: credentials.key,
            options,
            http,
        })
    }

    /// Legacy `<UID>:<APIKEY>` keys use the old task API, tokens the Retrieve API.
    pub fn flavor(&self) -> ApiFlavor {
        if split_key_basic(&self.key).is_some() {
            ApiFlavor::Legacy
        } else {
            ApiFlavor::Processing
        }
    }

    fn submit_legacy<T: Serialize>(&self, dataset: &str, body: &T) -> Result<JobHandle, Era5Error> {
        let base = self.url.trim_end_matches('/').to_string();
        let url = format!("{}/resources/{}", base, dataset);
        let (mut status, mut text) = self.call(Method::POST, &url, Some(body))?;
        let mut base_url = base.clone();

        if status == StatusCode::NOT_FOUND {
            if let Some(alt_base) = api_v2_variant(&base) {
                let alt_url = format!("{}/resources/{}", alt_base, dataset);
                debug!("{} answered 404, retrying at {}", url, alt_url);
                (status, text) = self.call(Method::POST, &alt_url, Some(body))?;
                base_url = alt_base;
            }
        }

        let reply: TaskReply = parse_reply(status, &url, &text)?;
        if reply.state == "failed" {
            return Err(Era5Error::RemoteJob(reply.failure_message()));
        }
        let id = reply.request_id.clone().ok_or_else(|| {
            Era5Error::Transport(format!(
                "task reply in state '{}' carries no request_id",
                reply.state
            ))
        })?;

        Ok(JobHandle {
            monitor_url: format!("{}/tasks/{}", base_url, id),
            id,
            base_url,
            flavor: ApiFlavor::Legacy,
        })
    }

    fn submit_processing<T: Serialize>(
        &self,
        dataset: &str,
        body: &T,
    ) -> Result<JobHandle, Era5Error> {
        // POST /retrieve/v1/processes/{process_id}/execution {"inputs": <request>}
        let retrieve_base = format!("{}/retrieve/v1", self.url.trim_end_matches('/'));
        let exec_url = format!("{}/processes/{}/execution", retrieve_base, dataset);
        let submit_body = serde_json::json!({ "inputs": body });
        let job: SubmittedJob = self.api_json(Method::POST, &exec_url, Some(&submit_body))?;

        let monitor_url = job
            .monitor_url()
            .or_else(|| {
                job.job_id
                    .as_deref()
                    .map(|id| format!("{}/jobs/{}", retrieve_base, id))
            })
            .ok_or_else(|| {
                Era5Error::Transport("job submission reply carries no monitor link".to_string())
            })?;

        Ok(JobHandle {
            id: job.job_id.clone().unwrap_or_else(|| monitor_url.clone()),
            monitor_url,
            base_url: retrieve_base,
            flavor: ApiFlavor::Processing,
        })
    }

    fn wait_legacy(&self, job: &JobHandle) -> Result<RemoteFile, Era5Error> {
        let mut sleep = Duration::from_secs(1).min(self.options.sleep_max);
        let mut last_state: Option<String> = None;

        loop {
            let reply: TaskReply = self.api_json(Method::GET, &job.monitor_url, None::<&()>)?;
            if last_state.as_deref() != Some(reply.state.as_str()) {
                info!("CDS request {} state: {}", job.id, reply.state);
                last_state = Some(reply.state.clone());
            }

            match reply.state.as_str() {
                "completed" => return reply.remote_file(&job.base_url),
                "queued" | "running" => {
                    thread::sleep(sleep);
                    sleep = backoff(sleep, self.options.sleep_max);
                }
                "failed" => return Err(Era5Error::RemoteJob(reply.failure_message())),
                other => {
                    return Err(Era5Error::RemoteJob(format!(
                        "request {} reached unknown state '{}'",
                        job.id, other
                    )));
                }
            }
        }
    }

    fn wait_processing(&self, job: &JobHandle) -> Result<RemoteFile, Era5Error> {
        let mut sleep = Duration::from_secs(1).min(self.options.sleep_max);
        let mut last_status: Option<String> = None;
        let status_url = append_query(&job.monitor_url, &[("log", "true"), ("request", "true")]);
        let default_results = format!("{}/results", job.monitor_url.trim_end_matches('/'));

        loop {
            let status: JobStatus = self.api_json(Method::GET, &status_url, None::<&()>)?;
            if last_status.as_deref() != Some(status.status.as_str()) {
                info!("CDS job {} status: {}", job.id, status.status);
                last_status = Some(status.status.clone());
            }

            match status.status.as_str() {
                "successful" => {
                    let results_url = status.results_url().unwrap_or(default_results);
                    let results: JobResults =
                        self.api_json(Method::GET, &results_url, None::<&()>)?;
                    return results.remote_file(&results_url);
                }
                "accepted" | "running" => {
                    thread::sleep(sleep);
                    sleep = backoff(sleep, self.options.sleep_max);
                }
                "failed" | "rejected" | "dismissed" | "deleted" => {
                    let results_url = status.results_url().unwrap_or(default_results);
                    let reason = status
                        .message
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .or_else(|| self.failure_detail(&results_url));
                    return Err(Era5Error::RemoteJob(match reason {
                        Some(reason) => format!("job {} {}: {}", job.id, status.status, reason),
                        None => format!("job {} ended with status {}", job.id, status.status),
                    }));
                }
                other => {
                    return Err(Era5Error::RemoteJob(format!(
                        "job {} reached unknown status '{}'",
                        job.id, other
                    )));
                }
            }
        }
    }

    /// For failed jobs the results endpoint answers with a problem payload
    /// describing what went wrong.
    fn failure_detail(&self, results_url: &str) -> Option<String> {
        let (_, text) = self.call(Method::GET, results_url, None::<&()>).ok()?;
        let problem: CdsProblem = serde_json::from_str(&text).ok()?;
        let summary = problem.summary();
        (!summary.is_empty()).then_some(summary)
    }

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        if let Some((u, p)) = split_key_basic(&self.key) {
            req.basic_auth(u, Some(p))
        } else {
            req.header("PRIVATE-TOKEN", self.key.trim())
        }
    }

    /// One HTTP exchange with retries; returns the final status and body.
    fn call<T: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&T>,
    ) -> Result<(StatusCode, String), Era5Error> {
        let resp = self.robust_request(url, || {
            let req = self.apply_auth(self.http.request(method.clone(), url));
            match body {
                Some(body) => req.json(body).send(),
                None => req.send(),
            }
        })?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| Era5Error::Transport(format!("failed to read reply from {url}: {e}")))?;
        Ok((status, text))
    }

    fn api_json<TReq: Serialize, TResp: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&TReq>,
    ) -> Result<TResp, Era5Error> {
        let (status, text) = self.call(method, url, body)?;
        parse_reply(status, url, &text)
    }

    fn robust_request<F>(&self, url: &str, mut send: F) -> Result<Response, Era5Error>
    where
        F: FnMut() -> Result<Response, reqwest::Error>,
    {
        let mut tries = 0usize;
        loop {
            match send() {
                Ok(resp) => {
                    let code = resp.status().as_u16();
                    if retriable_status(code) {
                        tries += 1;
                        if tries < self.options.retry_max {
                            warn!(
                                "HTTP {} from {}, retrying ({}/{})",
                                code, url, tries, self.options.retry_max
                            );
                            thread::sleep(self.options.sleep_max);
                            continue;
                        }
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    tries += 1;
                    if tries >= self.options.retry_max {
                        return Err(Era5Error::Transport(format!(
                            "could not connect to {url}: {err}"
                        )));
                    }
                    warn!(
                        "request to {} failed: {}, retrying ({}/{})",
                        url, err, tries, self.options.retry_max
                    );
                    thread::sleep(self.options.sleep_max);
                }
            }
        }
    }

    fn progress_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.options.progress {
            return None;
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    }
}

fn parse_reply<T: DeserializeOwned>(
    status: StatusCode,
    url: &str,
    text: &str,
) -> Result<T, Era5Error> {
    if !status.is_success() {
        return Err(classify_cds_failure(status, url, text));
    }
    serde_json::from_str::<T>(text).map_err(|e| {
        Era5Error::Transport(format!(
            "unexpected reply from {url} (HTTP {status}): {e}"
        ))
    })
}

/// CDS labels NetCDF results `application/netcdf` or `application/x-netcdf`;
/// some mirrors only send `application/octet-stream`.
fn is_netcdf_content_type(kind: &str) -> bool {
    let kind = kind.to_ascii_lowercase();
    kind.contains("netcdf") || kind.starts_with("application/octet-stream")
}

impl ArchiveService for CdsClient {
    fn submit(&self, request: &DatasetRequest) -> Result<JobHandle, Era5Error> {
        let dataset = request.kind().dataset_id();
        let body = request.to_cds_body();
        debug!("submitting {} via {:?} API", dataset, self.flavor());
        match self.flavor() {
            ApiFlavor::Legacy => self.submit_legacy(dataset, &body),
            ApiFlavor::Processing => self.submit_processing(dataset, &body),
        }
    }

    fn wait(&self, job: &JobHandle) -> Result<RemoteFile, Era5Error> {
        match job.flavor {
            ApiFlavor::Legacy => self.wait_legacy(job),
            ApiFlavor::Processing => self.wait_processing(job),
        }
    }

    fn download(&self, file: &RemoteFile, target: &Path) -> Result<u64, Era5Error> {
        match file.content_type.as_deref() {
            Some(kind) if !is_netcdf_content_type(kind) => warn!(
                "{} is announced as '{}', which is not a NetCDF content type",
                file.location, kind
            ),
            _ => debug!(
                "downloading {} byte(s) from {}",
                file.content_length, file.location
            ),
        }
        let pb = self.progress_bar(file.content_length);
        let mut downloaded: u64 = 0;
        let mut tries = 0usize;

        'attempt: while tries < self.options.retry_max {
            let resume = downloaded > 0;
            let resp = self.robust_request(&file.location, || {
                let mut req = self.apply_auth(self.http.get(&file.location));
                if resume {
                    req = req.header(RANGE, format!("bytes={}-", downloaded));
                }
                req.send()
            })?;
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().unwrap_or_default();
                return Err(classify_cds_failure(status, &file.location, &text));
            }
            // A server that ignores Range starts over from byte zero.
            let append = resume && resp.status() == StatusCode::PARTIAL_CONTENT;
            if !append {
                downloaded = 0;
            }
            let mut resp = resp;

            let mut out = OpenOptions::new()
                .create(true)
                .write(true)
                .append(append)
                .truncate(!append)
                .open(target)
                .map_err(|e| Era5Error::write(target, e))?;
            if let Some(pb) = &pb {
                pb.set_position(downloaded);
            }

            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = match resp.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        tries += 1;
                        warn!("download of {} interrupted: {}", file.location, e);
                        out.flush().map_err(|e| Era5Error::write(target, e))?;
                        if tries < self.options.retry_max {
                            thread::sleep(self.options.sleep_max);
                        }
                        continue 'attempt;
                    }
                };
                out.write_all(&buf[..n])
                    .map_err(|e| Era5Error::write(target, e))?;
                downloaded += n as u64;
                if let Some(pb) = &pb {
                    pb.inc(n as u64);
                }
            }
            out.flush().map_err(|e| Era5Error::write(target, e))?;

            if downloaded >= file.content_length {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Ok(downloaded);
            }

            tries += 1;
            warn!(
                "download of {} stopped at {} of {} bytes, resuming",
                file.location, downloaded, file.content_length
            );
            if tries < self.options.retry_max {
                thread::sleep(self.options.sleep_max);
            }
        }

        Err(Era5Error::Transport(format!(
            "download failed: received {} of {} byte(s) from {}",
            downloaded, file.content_length, file.location
        )))
    }
}

/// Connects to CDS with credentials resolved at call time, so a server can
/// start before `.cdsapirc` exists.
#[derive(Debug, Clone, Default)]
pub struct CdsConnector {
    overrides: CredentialOverrides,
    options: ClientOptions,
}

impl CdsConnector {
    pub fn new(overrides: CredentialOverrides, options: ClientOptions) -> Self {
        Self { overrides, options }
    }
}

impl ArchiveConnector for CdsConnector {
    fn connect(&self) -> Result<Box<dyn ArchiveService>, Era5Error> {
        let credentials = load_credentials(&self.overrides)
            .map_err(|e| Era5Error::Transport(format!("{e:#}")))?;
        Ok(Box::new(CdsClient::new(credentials, self.options.clone())?))
    }
}
