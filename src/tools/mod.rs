//! MCP tool implementations.
//!
//! Each tool validates its parameters on the async side, then moves the
//! blocking work (HTTP polling, file IO) onto tokio's blocking pool.

pub mod fetch_pressure_levels;
pub mod fetch_single_levels;
pub mod inspect_netcdf;

pub use fetch_pressure_levels::FetchPressureLevelsParams;
pub use fetch_single_levels::FetchSingleLevelsParams;
pub use inspect_netcdf::InspectNetcdfParams;

use std::path::Path;
use std::sync::Arc;

use log::{error, warn};
use rmcp::model::{CallToolResult, Content};

use crate::archive::ArchiveConnector;
use crate::error::Era5Error;
use crate::fetch::{FetchResult, fetch};
use crate::inspect::{DatasetReader, inspect_with};
use crate::request::{DatasetRequest, destination_path};

/// Runs `task` on the blocking pool. A panicking task becomes an error
/// result instead of taking the server down.
pub(crate) async fn run_blocking<F>(task: F) -> CallToolResult
where
    F: FnOnce() -> CallToolResult + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(e) => {
            error!("tool task did not complete: {}", e);
            CallToolResult::error(vec![Content::text(format!(
                "internal error: the tool task did not complete ({e})"
            ))])
        }
    }
}

fn error_result(e: &Era5Error) -> CallToolResult {
    CallToolResult::error(vec![Content::text(e.to_string())])
}

/// Shared body of the two fetch tools: fetch, then summarize the new file.
pub(crate) async fn fetch_and_summarize(
    connector: Arc<dyn ArchiveConnector>,
    reader: Arc<dyn DatasetReader>,
    request: Result<DatasetRequest, Era5Error>,
    output_filename: &str,
) -> CallToolResult {
    let prepared = request.and_then(|r| Ok((r, destination_path(output_filename)?)));
    let (request, destination) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => return error_result(&e),
    };

    run_blocking(move || {
        let result = match connector.connect() {
            Ok(service) => fetch(service.as_ref(), &request, &destination),
            Err(e) => {
                warn!("could not connect to the archive: {}", e);
                FetchResult::failure(&e)
            }
        };
        render_fetch(&result, reader.as_ref(), &destination)
    })
    .await
}

fn render_fetch(
    result: &FetchResult,
    reader: &dyn DatasetReader,
    destination: &Path,
) -> CallToolResult {
    if !result.is_success() {
        let message = result
            .error_message
            .clone()
            .unwrap_or_else(|| "fetch failed".to_string());
        return CallToolResult::error(vec![Content::text(message)]);
    }

    let local_path = result.local_path.as_deref().unwrap_or_default();
    let inspection = match inspect_with(reader, destination) {
        Ok(summary) => summary.to_string(),
        Err(e) => format!("Inspection of the downloaded file failed: {e}"),
    };
    CallToolResult::success(vec![Content::text(format!(
        "Successfully downloaded data to '{local_path}'.\n\n{inspection}"
    ))])
}
