//! inspect_netcdf tool implementation.

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars;

use crate::inspect::{DatasetReader, inspect_with};

/// Parameters for the inspect_netcdf tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct InspectNetcdfParams {
    /// Path to the .nc file to inspect.
    pub filepath: String,
}

/// Execute the inspect_netcdf tool.
///
/// Returns the dimensions, coordinates and data variables of the file.
pub async fn execute(
    reader: Arc<dyn DatasetReader>,
    params: InspectNetcdfParams,
) -> CallToolResult {
    info!("inspect_netcdf: filepath={}", params.filepath);
    let path = PathBuf::from(params.filepath);
    super::run_blocking(move || match inspect_with(reader.as_ref(), &path) {
        Ok(summary) => CallToolResult::success(vec![Content::text(summary.to_string())]),
        Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
    })
    .await
}
