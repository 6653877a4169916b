//! fetch_era5_pressure_levels tool implementation.

use std::sync::Arc;

use log::info;
use rmcp::model::CallToolResult;
use rmcp::schemars;

use crate::archive::ArchiveConnector;
use crate::inspect::DatasetReader;
use crate::request::{DatasetRequest, YearSelection};

/// Parameters for the fetch_era5_pressure_levels tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FetchPressureLevelsParams {
    /// The variable to download (e.g., "geopotential", "temperature").
    pub variable: String,
    /// The pressure level in hPa (e.g., 500, 850, 1000).
    pub pressure_level: Option<i64>,
    /// The year(s) for the data: "2023" or ["2021", "2022", "2023"].
    /// Several years are retrieved into one file for the given month.
    pub year: YearSelection,
    /// The month for the data, two digits (e.g., "01", "12").
    pub month: String,
    /// The local filename for the downloaded data
    /// (e.g., "data/geopotential_500hpa_multi_year.nc").
    pub output_filename: String,
}

/// Execute the fetch_era5_pressure_levels tool.
pub async fn execute(
    connector: Arc<dyn ArchiveConnector>,
    reader: Arc<dyn DatasetReader>,
    params: FetchPressureLevelsParams,
) -> CallToolResult {
    info!(
        "fetch_era5_pressure_levels: variable={}, level={:?}, year={:?}, month={}, output={}",
        params.variable, params.pressure_level, params.year, params.month, params.output_filename
    );
    let request = DatasetRequest::pressure_levels(
        &params.variable,
        params.pressure_level,
        params.year,
        &params.month,
    );
    super::fetch_and_summarize(connector, reader, request, &params.output_filename).await
}
