use std::path::{Path, PathBuf};

use netcdf::types::NcVariableType;
use netcdf::{AttributeValue, Variable};

use crate::error::Era5Error;
use crate::inspect::{DimensionInfo, FileMetadata, OpenDataset, VariableInfo};

/// A NetCDF-4 file, read through libnetcdf. This is what CDS delivers for
/// `data_format: netcdf`.
pub(crate) struct OpenNetCdf4 {
    path: PathBuf,
    file: netcdf::File,
}

impl OpenNetCdf4 {
    pub(crate) fn open(path: &Path) -> Result<Self, Era5Error> {
        let file = netcdf::open(path).map_err(|e| {
            Era5Error::file_format(path, format!("NetCDF-4/HDF5 file could not be opened: {e}"))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl OpenDataset for OpenNetCdf4 {
    fn metadata(&self) -> FileMetadata {
        let dimensions = self
            .file
            .dimensions()
            .map(|d| DimensionInfo {
                name: d.name(),
                size: d.len(),
                unlimited: d.is_unlimited(),
            })
            .collect();
        let variables = self.file.variables().map(|v| variable_info(&v)).collect();
        FileMetadata {
            dimensions,
            variables,
        }
    }

    fn read_values(&mut self, variable: &str) -> Result<Vec<f64>, Era5Error> {
        let var = self.file.variable(variable).ok_or_else(|| {
            Era5Error::file_format(&self.path, format!("no variable named '{variable}'"))
        })?;
        // libnetcdf converts every numeric type to double on read.
        var.get_values::<f64, _>(..).map_err(|e| {
            Era5Error::file_format(&self.path, format!("reading '{variable}': {e}"))
        })
    }
}

fn variable_info(var: &Variable) -> VariableInfo {
    let attr = |name: &str| var.attribute(name).and_then(|a| a.value().ok());
    let text = |name: &str| attr(name).and_then(as_text);
    VariableInfo {
        name: var.name(),
        dimensions: var.dimensions().iter().map(|d| d.name()).collect(),
        units: text("units"),
        long_name: text("long_name"),
        coordinates: text("coordinates"),
        fill_value: attr("_FillValue")
            .or_else(|| attr("missing_value"))
            .and_then(as_number),
        numeric: matches!(
            var.vartype(),
            NcVariableType::Int(_) | NcVariableType::Float(_)
        ),
    }
}

fn as_text(value: AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(v) => v.into_iter().next(),
        _ => None,
    }
}

fn as_number(value: AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Schar(x) => Some(f64::from(x)),
        AttributeValue::Uchar(x) => Some(f64::from(x)),
        AttributeValue::Short(x) => Some(f64::from(x)),
        AttributeValue::Ushort(x) => Some(f64::from(x)),
        AttributeValue::Int(x) => Some(f64::from(x)),
        AttributeValue::Uint(x) => Some(f64::from(x)),
        AttributeValue::Longlong(x) => Some(x as f64),
        AttributeValue::Ulonglong(x) => Some(x as f64),
        AttributeValue::Float(x) => Some(f64::from(x)),
        AttributeValue::Double(x) => Some(x),
        AttributeValue::Floats(v) => v.first().copied().map(f64::from),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Shorts(v) => v.first().copied().map(f64::from),
        AttributeValue::Ints(v) => v.first().copied().map(f64::from),
        _ => None,
    }
}
