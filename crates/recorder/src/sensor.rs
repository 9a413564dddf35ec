//! Acquisition control seen by the state machine.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use ph_lsm6dsv16bx::{
    AcquisitionConfig, CalibrationConfig, Error, Interface, Lsm6dsv16bx, SampleHandler, SessionId,
    Vector3,
};

/// Start/stop operations the state machine drives on entry and exit.
///
/// Every call must have reached the device before it returns, so no FIFO
/// decode observes a half-applied configuration.
#[allow(async_fn_in_trait)]
pub trait Acquisition {
    /// Starts streaming samples through the FIFO.
    async fn start_recording(&mut self, config: AcquisitionConfig) -> Result<(), Error>;

    /// Stops streaming; the interrupt source is disabled first.
    async fn stop(&mut self) -> Result<(), Error>;

    /// Starts a gyro-bias calibration session.
    async fn start_calibration(&mut self, config: CalibrationConfig) -> Result<SessionId, Error>;

    /// Applies a gyro-bias correction (milli-deg/s).
    async fn set_gbias(&mut self, bias: Vector3);
}

impl<I, H, INT1> Acquisition for Lsm6dsv16bx<I, H, INT1>
where
    I: Interface,
    H: SampleHandler,
{
    async fn start_recording(&mut self, config: AcquisitionConfig) -> Result<(), Error> {
        self.start_acquisition(config).await
    }

    async fn stop(&mut self) -> Result<(), Error> {
        if self.calibration_state().is_active() {
            self.abort_calibration().await
        } else {
            self.stop_acquisition().await
        }
    }

    async fn start_calibration(&mut self, config: CalibrationConfig) -> Result<SessionId, Error> {
        Lsm6dsv16bx::start_calibration(self, config).await
    }

    async fn set_gbias(&mut self, bias: Vector3) {
        Lsm6dsv16bx::set_gbias(self, bias);
    }
}

/// Acquisition through a driver shared with the FIFO work task.
///
/// Each call holds the lock for its whole duration, so it never interleaves
/// with a FIFO drain.
pub struct SharedSensor<'a, M: RawMutex, T> {
    sensor: &'a Mutex<M, T>,
}

impl<'a, M: RawMutex, T> SharedSensor<'a, M, T> {
    /// Wraps a shared driver.
    pub const fn new(sensor: &'a Mutex<M, T>) -> Self {
        Self { sensor }
    }
}

impl<M: RawMutex, T: Acquisition> Acquisition for SharedSensor<'_, M, T> {
    async fn start_recording(&mut self, config: AcquisitionConfig) -> Result<(), Error> {
        let mut sensor = self.sensor.lock().await;
        sensor.start_recording(config).await
    }

    async fn stop(&mut self) -> Result<(), Error> {
        let mut sensor = self.sensor.lock().await;
        sensor.stop().await
    }

    async fn start_calibration(&mut self, config: CalibrationConfig) -> Result<SessionId, Error> {
        let mut sensor = self.sensor.lock().await;
        sensor.start_calibration(config).await
    }

    async fn set_gbias(&mut self, bias: Vector3) {
        let mut sensor = self.sensor.lock().await;
        sensor.set_gbias(bias).await;
    }
}
