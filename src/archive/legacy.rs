use serde_json::Value;

use crate::archive::RemoteFile;
use crate::error::Era5Error;
use crate::util::urljoin;

/// Reply of the legacy `/resources` and `/tasks` endpoints.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct TaskReply {
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) request_id: Option<String>,

    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "contentLength")]
    content_length: Option<u64>,
    #[serde(default, alias = "contentType")]
    content_type: Option<String>,

    #[serde(default)]
    result: Option<Value>,

    #[serde(default)]
    error: Option<TaskError>,
}

#[derive(Debug, serde::Deserialize)]
struct TaskError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ResultLocation {
    location: String,
    #[serde(alias = "contentLength")]
    content_length: u64,
    #[serde(default, alias = "contentType")]
    content_type: Option<String>,
}

impl TaskReply {
    /// Download info, either nested under `result` or at the top level.
    pub(crate) fn remote_file(&self, base_url: &str) -> Result<RemoteFile, Era5Error> {
        if let Some(result) = &self.result {
            if let Ok(r) = serde_json::from_value::<ResultLocation>(result.clone()) {
                return Ok(RemoteFile {
                    location: urljoin(base_url, &r.location),
                    content_length: r.content_length,
                    content_type: r.content_type,
                });
            }
        }

        match (&self.location, self.content_length) {
            (Some(location), Some(content_length)) => Ok(RemoteFile {
                location: urljoin(base_url, location),
                content_length,
                content_type: self.content_type.clone(),
            }),
            _ => Err(Era5Error::Transport(
                "completed task reply carries no download location".to_string(),
            )),
        }
    }

    pub(crate) fn failure_message(&self) -> String {
        let message = self
            .error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .unwrap_or("request failed");
        match self.error.as_ref().and_then(|e| e.reason.as_deref()) {
            Some(reason) if !reason.is_empty() => format!("{message}. {reason}"),
            _ => message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_result_location() {
        let reply: TaskReply = serde_json::from_str(
            r#"{"state": "completed", "request_id": "r1",
                "result": {"location": "/cache/x.nc", "contentLength": 42}}"#,
        )
        .unwrap();
        let file = reply.remote_file("https://cds.example/api/v2").unwrap();
        assert_eq!(file.location, "https://cds.example/cache/x.nc");
        assert_eq!(file.content_length, 42);
    }

    #[test]
    fn top_level_location() {
        let reply: TaskReply = serde_json::from_str(
            r#"{"state": "completed", "location": "https://dl.example/y.nc", "content_length": 7,
                "content_type": "application/x-netcdf"}"#,
        )
        .unwrap();
        let file = reply.remote_file("https://cds.example/api").unwrap();
        assert_eq!(file.location, "https://dl.example/y.nc");
        assert_eq!(file.content_type.as_deref(), Some("application/x-netcdf"));
    }

    #[test]
    fn failure_message_joins_reason() {
        let reply: TaskReply = serde_json::from_str(
            r#"{"state": "failed",
                "error": {"message": "no data", "reason": "year 1800 unavailable"}}"#,
        )
        .unwrap();
        assert_eq!(reply.failure_message(), "no data. year 1800 unavailable");
    }
}
