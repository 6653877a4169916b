//! An MCP server that fetches ERA5 monthly means from the Copernicus Climate
//! Data Store (CDS) and summarizes NetCDF files.
//!
//! A fetch tool call goes through three steps:
//! validate the parameters into a [`DatasetRequest`], submit it to CDS and
//! block until the job is done, then download the produced file. Inspection is
//! independent and only needs a local path.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`CDSAPI_URL`, `CDSAPI_KEY`) or a
//!   `.cdsapirc` file (supported in the current directory and in your home directory).
//! - Run the `era5-mcp` binary as a stdio MCP server, or drive the pieces directly:
//!
//! ```no_run
//! use std::path::Path;
//!
//! use era5_mcp::archive::{ArchiveConnector, CdsConnector};
//! use era5_mcp::{DatasetRequest, fetch, inspect};
//!
//! fn main() -> Result<(), era5_mcp::Era5Error> {
//!     let request = DatasetRequest::pressure_levels(
//!         "geopotential",
//!         Some(500),
//!         vec!["2021", "2022", "2023"].into(),
//!         "01",
//!     )?;
//!     let service = CdsConnector::default().connect()?;
//!     let result = fetch(service.as_ref(), &request, Path::new("data/z500.nc"));
//!     if result.is_success() {
//!         println!("{}", inspect(Path::new("data/z500.nc"))?);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod archive;
pub mod config;
mod error;
pub mod fetch;
pub mod inspect;
pub mod request;
mod server;
pub mod tools;
mod util;

pub use error::{Era5Error, ErrorCategory};
pub use fetch::{FetchResult, FetchStatus, fetch};
pub use inspect::{InspectionSummary, inspect};
pub use request::{DatasetKind, DatasetRequest, YearSelection};
pub use server::{Era5McpServer, ServerError};
