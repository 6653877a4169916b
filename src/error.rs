use std::path::PathBuf;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while serving a tool call.
///
/// The display text always starts with a category phrase so a caller can tell
/// a bad parameter from a network problem, a remote-side failure, a local disk
/// problem or a bad file without reading the logs.
#[derive(Debug, Error)]
pub enum Era5Error {
    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error("could not reach the CDS API: {0}")]
    Transport(String),

    #[error("CDS job failed: {0}")]
    RemoteJob(String),

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a readable NetCDF file {}: {reason}", path.display())]
    FileFormat { path: PathBuf, reason: String },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Coarse classification of an [`Era5Error`], reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Transport,
    RemoteJob,
    Write,
    FileFormat,
    NotFound,
}

impl Era5Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Era5Error::Validation(_) => ErrorCategory::Validation,
            Era5Error::Transport(_) => ErrorCategory::Transport,
            Era5Error::RemoteJob(_) => ErrorCategory::RemoteJob,
            Era5Error::Write { .. } => ErrorCategory::Write,
            Era5Error::FileFormat { .. } => ErrorCategory::FileFormat,
            Era5Error::NotFound(_) => ErrorCategory::NotFound,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Era5Error::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn file_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Era5Error::FileFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Problem payload returned by CDS endpoints on non-2xx responses.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct CdsProblem {
    #[serde(default, rename = "type")]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<u16>,
    #[serde(default)]
    pub(crate) detail: Option<String>,
    #[serde(default)]
    pub(crate) trace_id: Option<String>,
    // Legacy endpoints answer {"message": ..., "reason": ...}
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

impl CdsProblem {
    pub(crate) fn summary(&self) -> String {
        let title = self
            .title
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("")
            .trim();
        let detail = self
            .detail
            .as_deref()
            .or(self.reason.as_deref())
            .unwrap_or("")
            .trim();
        match (title.is_empty(), detail.is_empty()) {
            (false, false) => format!("{title}: {detail}"),
            (false, true) => title.to_string(),
            (true, false) => detail.to_string(),
            (true, true) => self.kind.clone().unwrap_or_default(),
        }
    }
}

/// Turns a failed CDS HTTP exchange into the matching error category.
///
/// Authentication, licence and endpoint problems mean the archive cannot be
/// used at all and are transport failures. A request the archive understood
/// but refused (400/422) is a remote job failure.
pub(crate) fn classify_cds_failure(status: StatusCode, url: &str, body: &str) -> Era5Error {
    let problem = serde_json::from_str::<CdsProblem>(body).unwrap_or_default();
    let summary = problem.summary();
    let server_message = if summary.is_empty() {
        body.trim().to_string()
    } else {
        summary
    };
    let trace = problem.trace_id.as_deref().unwrap_or("(none)");
    let status_in_body = problem.status.unwrap_or(status.as_u16());

    let lowered = server_message.to_lowercase();
    let looks_like_licence = status == StatusCode::FORBIDDEN
        && (lowered.contains("required licence") || lowered.contains("manage-licences"));
    if looks_like_licence {
        let link = problem
            .detail
            .as_deref()
            .and_then(|d| d.find("https://").map(|idx| &d[idx..]))
            .and_then(|d| d.split_whitespace().next())
            .unwrap_or("https://cds.climate.copernicus.eu/how-to-api");
        return Era5Error::Transport(format!(
            "HTTP 403, the dataset licence has not been accepted. Sign in at {link}, \
             accept the required licence(s) under 'Manage licences' and retry. \
             Server message: {server_message} (trace_id: {trace})"
        ));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Era5Error::Transport(format!(
            "authentication rejected (HTTP {status_in_body}). Check the key in .cdsapirc: \
             it must be a valid personal access token (or '<UID>:<APIKEY>' for the legacy \
             API). Server message: {server_message} (trace_id: {trace}, request: {url})"
        ));
    }

    if status == StatusCode::NOT_FOUND {
        return Era5Error::Transport(format!(
            "endpoint not found (HTTP 404) at {url}. The configured url should look like \
             https://cds.climate.copernicus.eu/api. Server message: {server_message}"
        ));
    }

    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        return Era5Error::RemoteJob(format!(
            "request rejected (HTTP {status_in_body}): {server_message}"
        ));
    }

    Era5Error::Transport(format!(
        "HTTP {status_in_body} for {url}: {server_message}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_transport() {
        let err = classify_cds_failure(
            StatusCode::UNAUTHORIZED,
            "https://cds.example/api/retrieve/v1/processes/x/execution",
            r#"{"title": "Authentication failed", "trace_id": "abc"}"#,
        );
        assert_eq!(err.category(), ErrorCategory::Transport);
        let text = err.to_string();
        assert!(text.contains("authentication rejected"));
        assert!(text.contains("abc"));
    }

    #[test]
    fn licence_error_points_at_the_manage_licences_page() {
        let link = "https://cds.climate.copernicus.eu/datasets/x?tab=download#manage-licences";
        let body = serde_json::json!({
            "title": "required licences not accepted",
            "detail": format!("accept at {link} now"),
        })
        .to_string();
        let err = classify_cds_failure(StatusCode::FORBIDDEN, "u", &body);
        let text = err.to_string();
        assert!(text.contains("licence has not been accepted"));
        assert!(text.contains(link));
    }

    #[test]
    fn bad_request_is_a_remote_job_failure() {
        let err = classify_cds_failure(
            StatusCode::BAD_REQUEST,
            "u",
            r#"{"message": "invalid request", "reason": "variable 'foo' not found"}"#,
        );
        assert_eq!(err.category(), ErrorCategory::RemoteJob);
        assert!(err.to_string().contains("variable 'foo' not found"));
    }

    #[test]
    fn non_json_body_is_reported_verbatim() {
        let err = classify_cds_failure(StatusCode::BAD_GATEWAY, "u", "upstream down");
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.to_string().contains("upstream down"));
    }
}
