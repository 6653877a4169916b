//! fetch_era5_single_levels tool implementation.

use std::sync::Arc;

use log::info;
use rmcp::model::CallToolResult;
use rmcp::schemars;

use crate::archive::ArchiveConnector;
use crate::inspect::DatasetReader;
use crate::request::{DatasetRequest, YearSelection};

/// Parameters for the fetch_era5_single_levels tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FetchSingleLevelsParams {
    /// The surface variable to download (e.g., "2m_temperature").
    pub variable: String,
    /// The year for the data (e.g., "2023").
    pub year: String,
    /// The month for the data, two digits (e.g., "01", "12").
    pub month: String,
    /// The local filename for the downloaded data (e.g., "data/2m_temp_2023_01.nc").
    pub output_filename: String,
}

/// Execute the fetch_era5_single_levels tool.
///
/// Downloads ERA5 monthly mean surface data and summarizes the file.
pub async fn execute(
    connector: Arc<dyn ArchiveConnector>,
    reader: Arc<dyn DatasetReader>,
    params: FetchSingleLevelsParams,
) -> CallToolResult {
    info!(
        "fetch_era5_single_levels: variable={}, year={}, month={}, output={}",
        params.variable, params.year, params.month, params.output_filename
    );
    let request = DatasetRequest::single_levels(
        &params.variable,
        YearSelection::Single(params.year),
        &params.month,
    );
    super::fetch_and_summarize(connector, reader, request, &params.output_filename).await
}
