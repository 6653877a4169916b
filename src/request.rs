//! Validation and normalization of tool parameters into CDS requests.

use std::fmt;
use std::path::PathBuf;

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::error::Era5Error;

/// Which ERA5 monthly-means product a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    SingleLevel,
    PressureLevel,
}

impl DatasetKind {
    /// CDS dataset (process) identifier.
    pub fn dataset_id(self) -> &'static str {
        match self {
            DatasetKind::SingleLevel => "reanalysis-era5-single-levels-monthly-means",
            DatasetKind::PressureLevel => "reanalysis-era5-pressure-levels-monthly-means",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset_id())
    }
}

/// Output format of the retrieved file. ERA5 requests are always NetCDF here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Netcdf,
}

impl OutputFormat {
    fn as_cds(self) -> &'static str {
        match self {
            OutputFormat::Netcdf => "netcdf",
        }
    }
}

/// A year parameter as sent by the caller: `"2023"` or `["2021", "2022"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum YearSelection {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for YearSelection {
    fn from(year: &str) -> Self {
        YearSelection::Single(year.to_string())
    }
}

impl From<Vec<&str>> for YearSelection {
    fn from(years: Vec<&str>) -> Self {
        YearSelection::Multiple(years.into_iter().map(str::to_string).collect())
    }
}

/// Non-empty set of four-digit years, in the order the caller gave them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Years(Vec<String>);

impl Years {
    pub fn parse(selection: YearSelection) -> Result<Self, Era5Error> {
        let raw = match selection {
            YearSelection::Single(year) => vec![year],
            YearSelection::Multiple(years) => years,
        };
        if raw.is_empty() {
            return Err(Era5Error::Validation(
                "year list is empty; give at least one year such as \"2023\"".to_string(),
            ));
        }

        let mut years: Vec<String> = Vec::with_capacity(raw.len());
        for year in raw {
            let year = year.trim();
            if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Era5Error::Validation(format!(
                    "year '{year}' is not a four-digit year"
                )));
            }
            if !years.iter().any(|y| y == year) {
                years.push(year.to_string());
            }
        }
        Ok(Years(years))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Two-digit calendar month, `01` through `12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Month(String);

impl Month {
    pub fn parse(month: &str) -> Result<Self, Era5Error> {
        let month = month.trim();
        let valid = month.len() == 2
            && month.bytes().all(|b| b.is_ascii_digit())
            && matches!(month.parse::<u8>(), Ok(1..=12));
        if !valid {
            return Err(Era5Error::Validation(format!(
                "month '{month}' must be two digits between 01 and 12"
            )));
        }
        Ok(Month(month.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated ERA5 monthly-means request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRequest {
    kind: DatasetKind,
    variable: String,
    pressure_level: Option<u32>,
    years: Years,
    month: Month,
    output_format: OutputFormat,
}

impl DatasetRequest {
    pub fn single_levels(
        variable: &str,
        year: YearSelection,
        month: &str,
    ) -> Result<Self, Era5Error> {
        Self::build(DatasetKind::SingleLevel, variable, None, year, month)
    }

    /// `pressure_level` is optional at this boundary so a missing level is a
    /// validation failure rather than a protocol error.
    pub fn pressure_levels(
        variable: &str,
        pressure_level: Option<i64>,
        year: YearSelection,
        month: &str,
    ) -> Result<Self, Era5Error> {
        let level = match pressure_level {
            None => {
                return Err(Era5Error::Validation(
                    "pressure_level is required for pressure-level requests (e.g. 500)".to_string(),
                ));
            }
            Some(level) => u32::try_from(level)
                .ok()
                .filter(|l| *l > 0)
                .ok_or_else(|| {
                    Era5Error::Validation(format!(
                        "pressure_level {level} must be a positive number of hPa"
                    ))
                })?,
        };
        Self::build(DatasetKind::PressureLevel, variable, Some(level), year, month)
    }

    fn build(
        kind: DatasetKind,
        variable: &str,
        pressure_level: Option<u32>,
        year: YearSelection,
        month: &str,
    ) -> Result<Self, Era5Error> {
        let variable = variable.trim();
        if variable.is_empty() {
            return Err(Era5Error::Validation("variable must not be empty".to_string()));
        }
        Ok(Self {
            kind,
            variable: variable.to_string(),
            pressure_level,
            years: Years::parse(year)?,
            month: Month::parse(month)?,
            output_format: OutputFormat::Netcdf,
        })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn pressure_level(&self) -> Option<u32> {
        self.pressure_level
    }

    pub fn years(&self) -> &[String] {
        self.years.as_slice()
    }

    pub fn month(&self) -> &str {
        self.month.as_str()
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// The `inputs` object understood by both CDS API flavours.
    pub fn to_cds_body(&self) -> CdsRequestBody {
        CdsRequestBody {
            product_type: vec!["monthly_averaged_reanalysis".to_string()],
            variable: vec![self.variable.clone()],
            pressure_level: self.pressure_level.map(|l| vec![l.to_string()]),
            year: self.years.as_slice().to_vec(),
            month: vec![self.month.as_str().to_string()],
            time: vec!["00:00".to_string()],
            data_format: self.output_format.as_cds().to_string(),
            download_format: "unarchived".to_string(),
        }
    }
}

/// Wire form of a request, as posted to CDS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdsRequestBody {
    pub product_type: Vec<String>,
    pub variable: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_level: Option<Vec<String>>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub time: Vec<String>,
    pub data_format: String,
    pub download_format: String,
}

/// Checks the caller-supplied output filename.
pub fn destination_path(output_filename: &str) -> Result<PathBuf, Era5Error> {
    if output_filename.trim().is_empty() {
        return Err(Era5Error::Validation(
            "output_filename must not be empty".to_string(),
        ));
    }
    Ok(PathBuf::from(output_filename))
}
