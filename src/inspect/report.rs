use std::fmt;

use serde::Serialize;

/// Summary of a NetCDF file's structure, in the file's own order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionSummary {
    pub file_name: String,
    pub dimensions: Vec<DimensionSummary>,
    pub coordinates: Vec<CoordinateSummary>,
    pub data_variables: Vec<VariableSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionSummary {
    pub name: String,
    pub size: usize,
    pub unlimited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateSummary {
    pub name: String,
    pub dimensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    /// The `units` attribute, or `"unitless"`.
    pub units: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
}

/// First/last and min/max of a coordinate, ignoring NaN and fill values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn of(values: &[f64], fill_value: Option<f64>) -> Option<Self> {
        let mut valid = values
            .iter()
            .copied()
            .filter(|v| !v.is_nan() && Some(*v) != fill_value);
        let first = valid.next()?;
        let (last, min, max) = valid.fold((first, first, first), |(_, min, max), v| {
            (v, min.min(v), max.max(v))
        });
        Some(Self {
            first,
            last,
            min,
            max,
        })
    }
}

impl InspectionSummary {
    /// Size of the named dimension.
    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().find(|d| d.name == name).map(|d| d.size)
    }

    pub fn coordinate(&self, name: &str) -> Option<&CoordinateSummary> {
        self.coordinates.iter().find(|c| c.name == name)
    }

    pub fn data_variable(&self, name: &str) -> Option<&VariableSummary> {
        self.data_variables.iter().find(|v| v.name == name)
    }
}

impl fmt::Display for InspectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- NetCDF Inspection Summary for {} ---", self.file_name)?;

        writeln!(f, "\n[Dimensions]")?;
        for d in &self.dimensions {
            if d.unlimited {
                writeln!(f, "- {}: {} (unlimited)", d.name, d.size)?;
            } else {
                writeln!(f, "- {}: {}", d.name, d.size)?;
            }
        }

        writeln!(f, "\n[Coordinates]")?;
        for c in &self.coordinates {
            write!(f, "- {} ({})", c.name, c.dimensions.join(", "))?;
            if let Some(long_name) = &c.long_name {
                write!(f, ": {long_name}")?;
            }
            if let Some(units) = &c.units {
                write!(f, " [{units}]")?;
            }
            if let Some(r) = &c.range {
                write!(f, " {} .. {} (min {}, max {})", r.first, r.last, r.min, r.max)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n[Variables]")?;
        for v in &self.data_variables {
            let shape = v
                .shape
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "- {} ({}) shape ({})", v.name, v.dimensions.join(", "), shape)?;
            if let Some(long_name) = &v.long_name {
                write!(f, ": {long_name}")?;
            }
            writeln!(f, " [{}]", v.units)?;
        }

        write!(f, "\n--- End of Summary ---")
    }
}
