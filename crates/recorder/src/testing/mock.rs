extern crate std;

use std::string::{String, ToString};
use std::vec::Vec;

use ph_lsm6dsv16bx::{AcquisitionConfig, CalibrationConfig, Error, SessionId, Vector3};

use crate::sensor::Acquisition;
use crate::storage::{Storage, StorageError};

/// In-memory file store with failure injection.
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    files: Vec<(String, Vec<u8>)>,
    closed: Vec<String>,
    calibration: Option<Vec<u8>>,
    fail_appends: bool,
    fail_creates: bool,
}

impl MemoryStorage {
    pub(crate) fn set_calibration(&mut self, bytes: &[u8]) {
        self.calibration = Some(bytes.to_vec());
    }

    pub(crate) fn calibration(&self) -> Option<&[u8]> {
        self.calibration.as_deref()
    }

    pub(crate) fn file(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(file, _)| file == name)
            .map(|(_, data)| data.as_slice())
    }

    pub(crate) fn file_count(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn is_closed(&self, name: &str) -> bool {
        self.closed.iter().any(|file| file == name)
    }

    pub(crate) fn fail_appends(&mut self, enable: bool) {
        self.fail_appends = enable;
    }

    pub(crate) fn fail_creates(&mut self, enable: bool) {
        self.fail_creates = enable;
    }
}

impl Storage for MemoryStorage {
    type File = usize;

    fn create_file(&mut self, name: &str) -> Result<usize, StorageError> {
        if self.fail_creates {
            return Err(StorageError::Io);
        }
        self.files.push((name.to_string(), Vec::new()));
        Ok(self.files.len() - 1)
    }

    fn append(&mut self, file: &mut usize, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_appends {
            return Err(StorageError::Io);
        }
        let (_, data) = self.files.get_mut(*file).ok_or(StorageError::Io)?;
        data.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self, file: usize) -> Result<(), StorageError> {
        let (name, _) = self.files.get(file).ok_or(StorageError::Io)?;
        self.closed.push(name.clone());
        Ok(())
    }

    fn read_calibration(&mut self, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.calibration.as_deref().ok_or(StorageError::Absent)?;
        let len = data.len().min(buffer.len());
        buffer[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write_calibration(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.calibration = Some(bytes.to_vec());
        Ok(())
    }
}

/// Call recorded by [`MockAcquisition`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Call {
    StartRecording(AcquisitionConfig),
    Stop,
    StartCalibration(CalibrationConfig),
    SetGbias(Vector3),
}

/// Acquisition backend that records every call.
#[derive(Debug, Default)]
pub(crate) struct MockAcquisition {
    calls: Vec<Call>,
    fail_starts: Option<Error>,
    sessions: u32,
}

impl MockAcquisition {
    pub(crate) fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub(crate) fn fail_starts(&mut self, error: Error) {
        self.fail_starts = Some(error);
    }
}

impl Acquisition for MockAcquisition {
    async fn start_recording(&mut self, config: AcquisitionConfig) -> Result<(), Error> {
        if let Some(err) = self.fail_starts {
            return Err(err);
        }
        self.calls.push(Call::StartRecording(config));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Stop);
        Ok(())
    }

    async fn start_calibration(&mut self, config: CalibrationConfig) -> Result<SessionId, Error> {
        if let Some(err) = self.fail_starts {
            return Err(err);
        }
        self.calls.push(Call::StartCalibration(config));
        self.sessions += 1;
        Ok(SessionId(self.sessions))
    }

    async fn set_gbias(&mut self, bias: Vector3) {
        self.calls.push(Call::SetGbias(bias));
    }
}
