//! Structural summaries of downloaded NetCDF files.
//!
//! The summarizer only sees a [`DatasetReader`]: something that can open a
//! path and hand back the file's dimension and variable tables plus the values
//! of a single variable. [`NetCdfReader`] is the production reader: NetCDF
//! classic files go through `netcdf3`, NetCDF-4 files through libnetcdf.

mod classic;
mod netcdf4;
mod reader;
mod report;

pub use reader::NetCdfReader;
pub use report::{
    CoordinateSummary, DimensionSummary, InspectionSummary, ValueRange, VariableSummary,
};

use std::path::Path;

use log::debug;

use crate::error::Era5Error;

/// A dimension as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub size: usize,
    pub unlimited: bool,
}

/// A variable as stored in the file, with the attributes the summary uses.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
    /// CF `coordinates` attribute: names of auxiliary coordinate variables.
    pub coordinates: Option<String>,
    /// `_FillValue` or `missing_value`.
    pub fill_value: Option<f64>,
    /// False for character data, which has no numeric range.
    pub numeric: bool,
}

/// Metadata tables in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
}

/// An open file. Dropping it releases the underlying handle.
pub trait OpenDataset {
    fn metadata(&self) -> FileMetadata;

    /// All values of a numeric variable, widened to `f64`.
    fn read_values(&mut self, variable: &str) -> Result<Vec<f64>, Era5Error>;
}

pub trait DatasetReader: Send + Sync {
    /// Opens `path`. Fails with [`Era5Error::NotFound`] when it does not exist
    /// and [`Era5Error::FileFormat`] when it is not a readable file.
    fn open(&self, path: &Path) -> Result<Box<dyn OpenDataset>, Era5Error>;
}

/// Summarizes `path` with the NetCDF reader.
pub fn inspect(path: &Path) -> Result<InspectionSummary, Era5Error> {
    inspect_with(&NetCdfReader, path)
}

pub fn inspect_with(
    reader: &dyn DatasetReader,
    path: &Path,
) -> Result<InspectionSummary, Era5Error> {
    if !path.exists() {
        return Err(Era5Error::NotFound(path.to_path_buf()));
    }
    let mut dataset = reader.open(path)?;
    let metadata = dataset.metadata();
    debug!(
        "{}: {} dimension(s), {} variable(s)",
        path.display(),
        metadata.dimensions.len(),
        metadata.variables.len()
    );

    let dimensions = metadata
        .dimensions
        .iter()
        .map(|d| DimensionSummary {
            name: d.name.clone(),
            size: d.size,
            unlimited: d.unlimited,
        })
        .collect();

    let auxiliary: Vec<&str> = metadata
        .variables
        .iter()
        .filter_map(|v| v.coordinates.as_deref())
        .flat_map(str::split_whitespace)
        .collect();

    let mut coordinates = Vec::new();
    let mut data_variables = Vec::new();
    for var in &metadata.variables {
        if is_coordinate(var, &auxiliary) {
            let range = if var.numeric {
                let values = dataset.read_values(&var.name)?;
                ValueRange::of(&values, var.fill_value)
            } else {
                None
            };
            coordinates.push(CoordinateSummary {
                name: var.name.clone(),
                dimensions: var.dimensions.clone(),
                units: var.units.clone(),
                long_name: var.long_name.clone(),
                range,
            });
        } else {
            data_variables.push(VariableSummary {
                name: var.name.clone(),
                dimensions: var.dimensions.clone(),
                shape: shape_of(var, &metadata.dimensions),
                units: var.units.clone().unwrap_or_else(|| "unitless".to_string()),
                long_name: var.long_name.clone(),
            });
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(InspectionSummary {
        file_name,
        dimensions,
        coordinates,
        data_variables,
    })
}

/// A coordinate is a 1-D variable named after its dimension, or a variable
/// listed in another variable's `coordinates` attribute.
fn is_coordinate(var: &VariableInfo, auxiliary: &[&str]) -> bool {
    let dimension_coordinate = var.dimensions.len() == 1 && var.dimensions[0] == var.name;
    dimension_coordinate || auxiliary.contains(&var.name.as_str())
}

fn shape_of(var: &VariableInfo, dimensions: &[DimensionInfo]) -> Vec<usize> {
    var.dimensions
        .iter()
        .map(|name| {
            dimensions
                .iter()
                .find(|d| &d.name == name)
                .map_or(0, |d| d.size)
        })
        .collect()
}
