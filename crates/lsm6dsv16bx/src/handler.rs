//! Sample delivery from the FIFO decoder to the application.

use crate::calibration::CalibrationError;
use crate::data::{Quaternion, Vector3};

/// Outcome of one armed FSM program after an embedded-function interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FsmEvent {
    /// Slot index (`0..FSM_SLOT_COUNT`).
    pub slot: u8,
    /// Whether the slot's program raised its interrupt.
    pub fired: bool,
}

/// Receives decoded samples.
///
/// Every method has a no-op default, so implementors only override the
/// sample kinds they consume. Methods run synchronously inside FIFO
/// draining and must not block.
pub trait SampleHandler {
    /// Sensor timestamp in nanoseconds.
    fn on_timestamp(&mut self, _ns: u64) {}

    /// Accelerometer sample in milli-g.
    fn on_accel(&mut self, _sample: Vector3) {}

    /// Bias-corrected gyroscope sample in milli-deg/s.
    fn on_gyro(&mut self, _sample: Vector3) {}

    /// QVAR sample in millivolts.
    fn on_qvar(&mut self, _mv: f32) {}

    /// SFLP gyro-bias estimate in milli-deg/s.
    ///
    /// Not delivered while a calibration session consumes the bias stream.
    fn on_gyro_bias(&mut self, _sample: Vector3) {}

    /// SFLP game rotation quaternion.
    fn on_game_rotation(&mut self, _rotation: Quaternion) {}

    /// SFLP gravity vector in milli-g.
    fn on_gravity(&mut self, _gravity: Vector3) {}

    /// Calibration finished. `Ok` carries the averaged bias in milli-deg/s,
    /// already applied as the active gyro-bias correction.
    fn on_calibration_result(&mut self, _result: Result<Vector3, CalibrationError>) {}

    /// Significant motion detected.
    fn on_significant_motion(&mut self) {}

    /// One armed FSM slot reported its status. Called for every armed slot
    /// when at least one of them fired.
    fn on_fsm_event(&mut self, _event: FsmEvent) {}
}

impl SampleHandler for () {}

impl<H: SampleHandler + ?Sized> SampleHandler for &mut H {
    fn on_timestamp(&mut self, ns: u64) {
        (**self).on_timestamp(ns);
    }

    fn on_accel(&mut self, sample: Vector3) {
        (**self).on_accel(sample);
    }

    fn on_gyro(&mut self, sample: Vector3) {
        (**self).on_gyro(sample);
    }

    fn on_qvar(&mut self, mv: f32) {
        (**self).on_qvar(mv);
    }

    fn on_gyro_bias(&mut self, sample: Vector3) {
        (**self).on_gyro_bias(sample);
    }

    fn on_game_rotation(&mut self, rotation: Quaternion) {
        (**self).on_game_rotation(rotation);
    }

    fn on_gravity(&mut self, gravity: Vector3) {
        (**self).on_gravity(gravity);
    }

    fn on_calibration_result(&mut self, result: Result<Vector3, CalibrationError>) {
        (**self).on_calibration_result(result);
    }

    fn on_significant_motion(&mut self) {
        (**self).on_significant_motion();
    }

    fn on_fsm_event(&mut self, event: FsmEvent) {
        (**self).on_fsm_event(event);
    }
}
