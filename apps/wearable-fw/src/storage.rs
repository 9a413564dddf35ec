//! RAM-backed storage used until the mass-storage layer is attached.
//!
//! Session rows are counted and traced, not kept; the calibration record
//! survives until reset.

use defmt::{debug, info};
use heapless::Vec;
use ph_recorder::{CALIBRATION_RECORD_LEN, FileName, Storage, StorageError};

/// Handle of an open session file.
pub struct RamFile {
    name: FileName,
    bytes: usize,
    rows: u32,
}

/// Storage that keeps only the calibration record.
pub struct RamStorage {
    calibration: Vec<u8, CALIBRATION_RECORD_LEN>,
}

impl RamStorage {
    pub const fn new() -> Self {
        Self {
            calibration: Vec::new(),
        }
    }
}

impl Storage for RamStorage {
    type File = RamFile;

    fn create_file(&mut self, name: &str) -> Result<RamFile, StorageError> {
        let name = FileName::try_from(name).map_err(|()| StorageError::Io)?;
        Ok(RamFile {
            name,
            bytes: 0,
            rows: 0,
        })
    }

    fn append(&mut self, file: &mut RamFile, bytes: &[u8]) -> Result<(), StorageError> {
        file.bytes += bytes.len();
        file.rows += 1;
        if let Ok(row) = core::str::from_utf8(bytes) {
            debug!("{}: {}", file.name.as_str(), row.trim_end());
        }
        Ok(())
    }

    fn close(&mut self, file: RamFile) -> Result<(), StorageError> {
        info!(
            "{} closed: {} rows, {} bytes",
            file.name.as_str(),
            file.rows,
            file.bytes
        );
        Ok(())
    }

    fn read_calibration(&mut self, buffer: &mut [u8]) -> Result<usize, StorageError> {
        if self.calibration.is_empty() {
            return Err(StorageError::Absent);
        }
        let len = self.calibration.len().min(buffer.len());
        buffer[..len].copy_from_slice(&self.calibration[..len]);
        Ok(len)
    }

    fn write_calibration(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.calibration = Vec::from_slice(bytes).map_err(|()| StorageError::Io)?;
        Ok(())
    }
}
