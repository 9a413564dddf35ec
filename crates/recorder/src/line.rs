//! Session row aggregation.
//!
//! A [`SessionLine`] collects the latest timestamp, accelerometer and
//! gyroscope samples and formats one CSV row once all three were updated
//! since the previous row.

use core::fmt::Write;

use heapless::String;
use ph_lsm6dsv16bx::{Quaternion, Vector3};

/// Capacity of one formatted row.
pub const ROW_CAPACITY: usize = 128;

/// One formatted session row, newline terminated.
pub type Row = String<ROW_CAPACITY>;

const NS_PER_US: u64 = 1_000;
const US_PER_MS: u64 = 1_000;

/// Latest samples of one session row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionLine {
    timestamp_ns: u64,
    accel: Vector3,
    gyro: Vector3,
    timestamp_updated: bool,
    accel_updated: bool,
    gyro_updated: bool,
    gyro_bias: Vector3,
    gravity: Vector3,
    game_rotation: Quaternion,
}

impl SessionLine {
    /// Creates an empty line with every flag cleared.
    pub const fn new() -> Self {
        Self {
            timestamp_ns: 0,
            accel: Vector3::ZERO,
            gyro: Vector3::ZERO,
            timestamp_updated: false,
            accel_updated: false,
            gyro_updated: false,
            gyro_bias: Vector3::ZERO,
            gravity: Vector3::ZERO,
            game_rotation: Quaternion::IDENTITY,
        }
    }

    /// Stores a timestamp (ns) and returns the row if it is now complete.
    pub fn mark_timestamp(&mut self, ns: u64) -> Option<Row> {
        self.timestamp_ns = ns;
        self.timestamp_updated = true;
        self.take_row()
    }

    /// Stores an accelerometer sample (mg) and returns the row if it is now
    /// complete.
    pub fn mark_accel(&mut self, sample: Vector3) -> Option<Row> {
        self.accel = sample;
        self.accel_updated = true;
        self.take_row()
    }

    /// Stores a gyroscope sample (mdps) and returns the row if it is now
    /// complete.
    pub fn mark_gyro(&mut self, sample: Vector3) -> Option<Row> {
        self.gyro = sample;
        self.gyro_updated = true;
        self.take_row()
    }

    /// Side channel: latest SFLP gyro-bias estimate.
    pub fn set_gyro_bias(&mut self, bias: Vector3) {
        self.gyro_bias = bias;
    }

    /// Side channel: latest SFLP gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.gravity = gravity;
    }

    /// Side channel: latest SFLP game rotation.
    pub fn set_game_rotation(&mut self, rotation: Quaternion) {
        self.game_rotation = rotation;
    }

    /// Latest gyro-bias estimate (mdps).
    pub const fn gyro_bias(&self) -> Vector3 {
        self.gyro_bias
    }

    /// Latest gravity vector (mg).
    pub const fn gravity(&self) -> Vector3 {
        self.gravity
    }

    /// Latest game rotation.
    pub const fn game_rotation(&self) -> Quaternion {
        self.game_rotation
    }

    /// Clears the three row flags; side-channel values are kept.
    pub fn reset(&mut self) {
        self.timestamp_updated = false;
        self.accel_updated = false;
        self.gyro_updated = false;
    }

    /// Returns true when timestamp, accel and gyro were all updated.
    pub const fn is_complete(&self) -> bool {
        self.timestamp_updated && self.accel_updated && self.gyro_updated
    }

    fn take_row(&mut self) -> Option<Row> {
        if !self.is_complete() {
            return None;
        }
        self.reset();
        Some(self.format_row())
    }

    /// Formats `timestamp_ms,ax,ay,az,gx,gy,gz\n` with the timestamp rounded
    /// to three decimals and the samples rounded to whole units.
    pub fn format_row(&self) -> Row {
        let mut row = Row::new();
        let us = self.timestamp_ns.saturating_add(NS_PER_US / 2) / NS_PER_US;
        let ms = us / US_PER_MS;
        let frac = us % US_PER_MS;
        // Cannot overflow: u64 + 6 * i32 + separators is under ROW_CAPACITY.
        let _ = writeln!(
            row,
            "{}.{:03},{},{},{},{},{},{}",
            ms,
            frac,
            whole(self.accel.x),
            whole(self.accel.y),
            whole(self.accel.z),
            whole(self.gyro.x),
            whole(self.gyro.y),
            whole(self.gyro.z),
        );
        row
    }
}

impl Default for SessionLine {
    fn default() -> Self {
        Self::new()
    }
}

fn whole(value: f32) -> i32 {
    libm::roundf(value) as i32
}
