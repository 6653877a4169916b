use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::Era5Error;
use crate::inspect::classic::OpenClassic;
use crate::inspect::netcdf4::OpenNetCdf4;
use crate::inspect::{DatasetReader, OpenDataset};

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";
const CLASSIC_SIGNATURE: &[u8] = b"CDF";

/// On-disk flavour, told apart by the file signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// NetCDF classic or 64-bit offset.
    Classic,
    /// NetCDF-4, stored as HDF5.
    NetCdf4,
}

/// Reads NetCDF classic, 64-bit offset and NetCDF-4 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfReader;

impl DatasetReader for NetCdfReader {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenDataset>, Era5Error> {
        let format = sniff(path)?;
        debug!("{}: {:?} file", path.display(), format);
        Ok(match format {
            Format::Classic => Box::new(OpenClassic::open(path)?),
            Format::NetCdf4 => Box::new(OpenNetCdf4::open(path)?),
        })
    }
}

pub(crate) fn sniff(path: &Path) -> Result<Format, Era5Error> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Era5Error::NotFound(path.to_path_buf())
        } else {
            Era5Error::file_format(path, e.to_string())
        }
    })?;
    let mut magic = Vec::with_capacity(HDF5_SIGNATURE.len());
    file.take(HDF5_SIGNATURE.len() as u64)
        .read_to_end(&mut magic)
        .map_err(|e| Era5Error::file_format(path, e.to_string()))?;

    if magic.starts_with(HDF5_SIGNATURE) {
        Ok(Format::NetCdf4)
    } else if magic.starts_with(CLASSIC_SIGNATURE) {
        Ok(Format::Classic)
    } else {
        Err(Era5Error::file_format(
            path,
            "neither the NetCDF 'CDF' nor the HDF5 signature is present",
        ))
    }
}
