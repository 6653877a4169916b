//! MCP server exposing the ERA5 tools.

use std::sync::Arc;

use log::debug;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt, handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, tool, tool_handler, tool_router,
    transport::stdio,
};

use crate::archive::ArchiveConnector;
use crate::inspect::{DatasetReader, NetCdfReader};
use crate::tools::{self, FetchPressureLevelsParams, FetchSingleLevelsParams, InspectNetcdfParams};

/// Error type for MCP server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("MCP error: {0}")]
    Mcp(String),
}

/// MCP server for ERA5 retrieval and NetCDF inspection.
///
/// The server holds no mutable state. Every tool call connects to the archive
/// on its own and runs to completion independently of other calls.
#[derive(Clone)]
pub struct Era5McpServer {
    connector: Arc<dyn ArchiveConnector>,
    reader: Arc<dyn DatasetReader>,
    tool_router: ToolRouter<Era5McpServer>,
}

#[tool_router]
impl Era5McpServer {
    pub fn new(connector: Arc<dyn ArchiveConnector>) -> Self {
        Self::with_reader(connector, Arc::new(NetCdfReader))
    }

    pub fn with_reader(
        connector: Arc<dyn ArchiveConnector>,
        reader: Arc<dyn DatasetReader>,
    ) -> Self {
        Self {
            connector,
            reader,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Downloads ERA5 monthly mean surface (single-level) data for one month \
        of one year and returns a summary of the downloaded NetCDF file. Blocks until the \
        Climate Data Store has produced the file, which can take several minutes."
    )]
    async fn fetch_era5_single_levels(
        &self,
        Parameters(params): Parameters<FetchSingleLevelsParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool: fetch_era5_single_levels");
        let (connector, reader) = (self.connector.clone(), self.reader.clone());
        Ok(tools::fetch_single_levels::execute(connector, reader, params).await)
    }

    #[tool(
        description = "Downloads ERA5 monthly mean data on one pressure level (hPa) for a \
        given month across one or more years (year: \"2023\" or [\"2021\", \"2022\"]), as a \
        single NetCDF file, and returns a summary of it."
    )]
    async fn fetch_era5_pressure_levels(
        &self,
        Parameters(params): Parameters<FetchPressureLevelsParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool: fetch_era5_pressure_levels");
        let (connector, reader) = (self.connector.clone(), self.reader.clone());
        Ok(tools::fetch_pressure_levels::execute(connector, reader, params).await)
    }

    #[tool(
        description = "Inspects a NetCDF file and returns a summary of its dimensions, coordinates \
        (with value ranges) and data variables (with shapes and units)."
    )]
    async fn inspect_netcdf(
        &self,
        Parameters(params): Parameters<InspectNetcdfParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool: inspect_netcdf");
        Ok(tools::inspect_netcdf::execute(self.reader.clone(), params).await)
    }

    /// Serve MCP over stdio (stdin/stdout).
    ///
    /// This method blocks until the connection is closed.
    pub async fn serve_stdio(self) -> Result<(), ServerError> {
        debug!("Starting MCP server on stdio");
        let service = self
            .serve(stdio())
            .await
            .map_err(|e| ServerError::Mcp(format!("Failed to start server: {}", e)))?;
        service
            .waiting()
            .await
            .map_err(|e| ServerError::Mcp(format!("Server error: {}", e)))?;
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for Era5McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "ERA5 Climate Data Server. Use fetch_era5_single_levels or \
                 fetch_era5_pressure_levels to download ERA5 monthly means from the Copernicus \
                 Climate Data Store, and inspect_netcdf to summarize a downloaded file."
                    .into(),
            ),
        }
    }
}
