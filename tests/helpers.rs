//! Shared test helpers: fake archive, NetCDF fixtures, result accessors.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use era5_mcp::Era5Error;
use era5_mcp::archive::{
    ApiFlavor, ArchiveConnector, ArchiveService, JobHandle, RemoteFile,
};
use era5_mcp::request::DatasetRequest;
use netcdf3::{DataSet, FileWriter, Version};
use rmcp::model::{CallToolResult, RawContent};

/// Extract the text content from a CallToolResult.
pub fn get_text(result: &CallToolResult) -> String {
    assert_eq!(result.content.len(), 1, "Expected exactly one content item");
    match &result.content[0].raw {
        RawContent::Text(text_content) => text_content.text.clone(),
        _ => panic!("Expected text content"),
    }
}

/// Check if the result is a success.
pub fn is_success(result: &CallToolResult) -> bool {
    result.is_error == Some(false)
}

/// Check if the result is an error.
pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error == Some(true)
}

/// What the fake archive does with a submitted job.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed(Vec<u8>),
    FailJob(String),
    RefuseConnection,
    /// Job succeeds but the download breaks after writing some bytes.
    BreakDownload(Vec<u8>),
    /// Job succeeds but the download fails before any byte arrives.
    FailDownload,
}

/// Calls seen by the fake, in order.
#[derive(Debug, Default)]
pub struct CallLog {
    pub submitted: Vec<(String, serde_json::Value)>,
    pub waits: usize,
    pub downloads: usize,
}

#[derive(Clone)]
pub struct FakeArchive {
    pub behavior: Behavior,
    pub calls: Arc<Mutex<CallLog>>,
}

impl FakeArchive {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    pub fn submitted(&self) -> usize {
        self.calls.lock().unwrap().submitted.len()
    }
}

impl ArchiveService for FakeArchive {
    fn submit(&self, request: &DatasetRequest) -> Result<JobHandle, Era5Error> {
        if let Behavior::RefuseConnection = self.behavior {
            return Err(Era5Error::Transport(
                "could not connect to https://cds.test/api: connection refused".to_string(),
            ));
        }
        let body = serde_json::to_value(request.to_cds_body()).unwrap();
        self.calls
            .lock()
            .unwrap()
            .submitted
            .push((request.kind().dataset_id().to_string(), body));
        Ok(JobHandle {
            id: "job-1".to_string(),
            monitor_url: "https://cds.test/api/retrieve/v1/jobs/job-1".to_string(),
            base_url: "https://cds.test/api/retrieve/v1".to_string(),
            flavor: ApiFlavor::Processing,
        })
    }

    fn wait(&self, _job: &JobHandle) -> Result<RemoteFile, Era5Error> {
        self.calls.lock().unwrap().waits += 1;
        match &self.behavior {
            Behavior::FailJob(message) => Err(Era5Error::RemoteJob(message.clone())),
            Behavior::Succeed(bytes) | Behavior::BreakDownload(bytes) => Ok(RemoteFile {
                location: "https://cds.test/cache/out.nc".to_string(),
                content_length: bytes.len() as u64,
                content_type: Some("application/netcdf".to_string()),
            }),
            Behavior::FailDownload => Ok(RemoteFile {
                location: "https://cds.test/cache/out.nc".to_string(),
                content_length: 1024,
                content_type: Some("application/netcdf".to_string()),
            }),
            Behavior::RefuseConnection => unreachable!("submit already failed"),
        }
    }

    fn download(&self, _file: &RemoteFile, target: &Path) -> Result<u64, Era5Error> {
        self.calls.lock().unwrap().downloads += 1;
        match &self.behavior {
            Behavior::Succeed(bytes) => {
                std::fs::write(target, bytes).map_err(|e| Era5Error::Write {
                    path: target.to_path_buf(),
                    source: e,
                })?;
                Ok(bytes.len() as u64)
            }
            Behavior::BreakDownload(bytes) => {
                std::fs::write(target, &bytes[..bytes.len() / 2]).unwrap();
                Err(Era5Error::Transport("download failed: connection reset".to_string()))
            }
            Behavior::FailDownload => Err(Era5Error::Transport(
                "could not connect to https://cds.test/cache/out.nc: connection reset".to_string(),
            )),
            _ => unreachable!("no file to download"),
        }
    }
}

pub struct FakeConnector {
    pub archive: FakeArchive,
}

impl ArchiveConnector for FakeConnector {
    fn connect(&self) -> Result<Box<dyn ArchiveService>, Era5Error> {
        Ok(Box::new(self.archive.clone()))
    }
}

/// A connector whose credentials are unusable.
pub struct NoCredentials;

impl ArchiveConnector for NoCredentials {
    fn connect(&self) -> Result<Box<dyn ArchiveService>, Era5Error> {
        Err(Era5Error::Transport(
            "missing configuration: key (set CDSAPI_KEY or put `key:` in ~/.cdsapirc)".to_string(),
        ))
    }
}

/// Writes a NetCDF classic file shaped like an ERA5 2m temperature download:
/// time(12) x latitude(3) x longitude(3), `t2m` in K.
pub fn write_t2m_fixture(path: &Path) {
    let mut data_set = DataSet::new();
    data_set.add_fixed_dim("time", 12).unwrap();
    data_set.add_fixed_dim("latitude", 3).unwrap();
    data_set.add_fixed_dim("longitude", 3).unwrap();

    data_set.add_var_f64("time", &["time"]).unwrap();
    data_set
        .add_var_attr_string("time", "units", "hours since 1900-01-01 00:00:00.0")
        .unwrap();
    data_set.add_var_f32("latitude", &["latitude"]).unwrap();
    data_set
        .add_var_attr_string("latitude", "units", "degrees_north")
        .unwrap();
    data_set.add_var_f32("longitude", &["longitude"]).unwrap();
    data_set
        .add_var_attr_string("longitude", "units", "degrees_east")
        .unwrap();
    data_set
        .add_var_f32("t2m", &["time", "latitude", "longitude"])
        .unwrap();
    data_set.add_var_attr_string("t2m", "units", "K").unwrap();
    data_set
        .add_var_attr_string("t2m", "long_name", "2 metre temperature")
        .unwrap();

    let times: Vec<f64> = (0..12).map(|m| 1_078_800.0 + 730.0 * m as f64).collect();
    let t2m: Vec<f32> = (0..12 * 3 * 3).map(|i| 250.0 + i as f32 * 0.5).collect();

    let mut writer = FileWriter::open(path).unwrap();
    writer.set_def(&data_set, Version::Classic, 0).unwrap();
    writer.write_var_f64("time", &times).unwrap();
    writer.write_var_f32("latitude", &[50.0, 49.75, 49.5]).unwrap();
    writer.write_var_f32("longitude", &[10.0, 10.25, 10.5]).unwrap();
    writer.write_var_f32("t2m", &t2m).unwrap();
    writer.close().unwrap();
}

/// Writes a NetCDF-4 file laid out like a current CDS download:
/// valid_time(12) x latitude(3) x longitude(3), `t2m` in K.
pub fn write_netcdf4_fixture(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("valid_time", 12).unwrap();
    file.add_dimension("latitude", 3).unwrap();
    file.add_dimension("longitude", 3).unwrap();

    {
        let times: Vec<i64> = (0..12).map(|m| 1_672_531_200 + 2_678_400 * m).collect();
        let mut var = file.add_variable::<i64>("valid_time", &["valid_time"]).unwrap();
        var.put_attribute("units", "seconds since 1970-01-01").unwrap();
        var.put_values(&times, ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
        var.put_attribute("units", "degrees_north").unwrap();
        var.put_values(&[90.0, 89.75, 89.5], ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
        var.put_attribute("units", "degrees_east").unwrap();
        var.put_values(&[0.0, 0.25, 0.5], ..).unwrap();
    }
    {
        let t2m: Vec<f32> = (0..12 * 3 * 3).map(|i| 240.0 + i as f32).collect();
        let mut var = file
            .add_variable::<f32>("t2m", &["valid_time", "latitude", "longitude"])
            .unwrap();
        var.put_attribute("units", "K").unwrap();
        var.put_attribute("long_name", "2 metre temperature").unwrap();
        var.put_values(&t2m, ..).unwrap();
    }
}
