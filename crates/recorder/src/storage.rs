//! Storage collaborator interface.

use core::fmt::Write;

use heapless::String;

use crate::calibration_file::{CALIBRATION_RECORD_LEN, CalibrationRecord};

/// Capacity of a session file name (`SES00001.CSV`).
pub const FILE_NAME_CAPACITY: usize = 12;

/// Session file name.
pub type FileName = String<FILE_NAME_CAPACITY>;

/// Storage failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The requested file does not exist.
    Absent,
    /// The file exists but its content is not valid.
    Malformed,
    /// Low-level I/O failure.
    Io,
    /// The storage is in use by another context.
    Busy,
}

/// File storage used for session rows and the calibration record.
///
/// Calls are synchronous and may be made from the FIFO work context; a
/// failure is returned to the caller and never retried here.
pub trait Storage {
    /// Open file handle.
    type File;

    /// Creates (or truncates) a file.
    fn create_file(&mut self, name: &str) -> Result<Self::File, StorageError>;

    /// Appends bytes to an open file.
    fn append(&mut self, file: &mut Self::File, bytes: &[u8]) -> Result<(), StorageError>;

    /// Closes a file.
    fn close(&mut self, file: Self::File) -> Result<(), StorageError>;

    /// Reads the calibration file into `buffer` and returns the byte count.
    ///
    /// Returns [`StorageError::Absent`] when no calibration file exists.
    fn read_calibration(&mut self, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Replaces the calibration file.
    fn write_calibration(&mut self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Reads and decodes the calibration record.
///
/// A short read or a record of the wrong size is reported as
/// [`StorageError::Malformed`].
pub fn read_calibration<S: Storage>(storage: &mut S) -> Result<CalibrationRecord, StorageError> {
    // One spare byte so an oversized file is detected.
    let mut buffer = [0u8; CALIBRATION_RECORD_LEN + 1];
    let len = storage.read_calibration(&mut buffer)?;
    CalibrationRecord::parse(buffer.get(..len).ok_or(StorageError::Malformed)?)
}

/// Encodes and writes the calibration record.
pub fn write_calibration<S: Storage>(
    storage: &mut S,
    record: CalibrationRecord,
) -> Result<(), StorageError> {
    storage.write_calibration(record.format().as_bytes())
}

/// Session file name for a session number: `SES00001.CSV`.
pub fn session_file_name(number: u32) -> FileName {
    let mut name = FileName::new();
    // Five digits plus the extension always fit.
    let _ = write!(name, "SES{:05}.CSV", number % 100_000);
    name
}
