use std::path::{Path, PathBuf};

use netcdf3::{Attribute, DataType, DataVector, FileReader, Variable};

use crate::error::Era5Error;
use crate::inspect::{DimensionInfo, FileMetadata, OpenDataset, VariableInfo};

/// A NetCDF classic or 64-bit offset file, read with `netcdf3`.
pub(crate) struct OpenClassic {
    path: PathBuf,
    reader: FileReader,
}

impl OpenClassic {
    pub(crate) fn open(path: &Path) -> Result<Self, Era5Error> {
        let reader = FileReader::open(path)
            .map_err(|e| Era5Error::file_format(path, format!("{e:?}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
        })
    }
}

impl OpenDataset for OpenClassic {
    fn metadata(&self) -> FileMetadata {
        let data_set = self.reader.data_set();
        let dimensions = data_set
            .get_dims()
            .iter()
            .map(|d| DimensionInfo {
                name: d.name(),
                size: d.size(),
                unlimited: d.is_unlimited(),
            })
            .collect();
        let variables = data_set.get_vars().into_iter().map(variable_info).collect();
        FileMetadata {
            dimensions,
            variables,
        }
    }

    fn read_values(&mut self, variable: &str) -> Result<Vec<f64>, Era5Error> {
        let data = self.reader.read_var(variable).map_err(|e| {
            Era5Error::file_format(&self.path, format!("reading '{variable}': {e:?}"))
        })?;
        Ok(match data {
            DataVector::I8(v) => v.into_iter().map(f64::from).collect(),
            DataVector::U8(v) => v.into_iter().map(f64::from).collect(),
            DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
            DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F64(v) => v,
        })
    }
}

fn variable_info(var: &Variable) -> VariableInfo {
    let text = |name: &str| var.get_attr(name).and_then(Attribute::get_as_string);
    VariableInfo {
        name: var.name().to_string(),
        dimensions: var.get_dims().iter().map(|d| d.name()).collect(),
        units: text("units"),
        long_name: text("long_name"),
        coordinates: text("coordinates"),
        fill_value: var
            .get_attr("_FillValue")
            .or_else(|| var.get_attr("missing_value"))
            .and_then(first_number),
        numeric: var.data_type() != DataType::U8,
    }
}

fn first_number(attr: &Attribute) -> Option<f64> {
    match attr.data_type() {
        DataType::I8 => attr.get_i8()?.first().copied().map(f64::from),
        DataType::U8 => None,
        DataType::I16 => attr.get_i16()?.first().copied().map(f64::from),
        DataType::I32 => attr.get_i32()?.first().copied().map(f64::from),
        DataType::F32 => attr.get_f32()?.first().copied().map(f64::from),
        DataType::F64 => attr.get_f64()?.first().copied(),
    }
}
