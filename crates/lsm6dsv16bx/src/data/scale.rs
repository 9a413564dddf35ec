//! Raw-count to physical-unit conversion.
//!
//! Each full-scale range has its own conversion function. The driver picks
//! the function once when a range is configured and keeps it as a plain
//! `fn` pointer, so the decode path never matches on the range per sample.

use crate::config::common::{AccelRange, GyroRange};

/// Converts one raw signed axis reading to a physical unit.
pub type ScaleFn = fn(i16) -> f32;

/// Returns the accelerometer sensitivity in milli-g per LSB.
pub const fn accel_mg_per_lsb(range: AccelRange) -> f32 {
    match range {
        AccelRange::G2 => 0.061,
        AccelRange::G4 => 0.122,
        AccelRange::G8 => 0.244,
        AccelRange::G16 => 0.488,
    }
}

/// Returns the gyroscope sensitivity in milli-deg/s per LSB.
pub const fn gyro_mdps_per_lsb(range: GyroRange) -> f32 {
    match range {
        GyroRange::Dps125 => 4.375,
        GyroRange::Dps250 => 8.75,
        GyroRange::Dps500 => 17.5,
        GyroRange::Dps1000 => 35.0,
        GyroRange::Dps2000 => 70.0,
        GyroRange::Dps4000 => 140.0,
    }
}

/// QVAR sensitivity in LSB per millivolt.
pub const QVAR_LSB_PER_MV: f32 = 78.0;

fn accel_fs2_to_mg(raw: i16) -> f32 {
    f32::from(raw) * accel_mg_per_lsb(AccelRange::G2)
}

fn accel_fs4_to_mg(raw: i16) -> f32 {
    f32::from(raw) * accel_mg_per_lsb(AccelRange::G4)
}

fn accel_fs8_to_mg(raw: i16) -> f32 {
    f32::from(raw) * accel_mg_per_lsb(AccelRange::G8)
}

fn accel_fs16_to_mg(raw: i16) -> f32 {
    f32::from(raw) * accel_mg_per_lsb(AccelRange::G16)
}

fn gyro_fs125_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps125)
}

fn gyro_fs250_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps250)
}

fn gyro_fs500_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps500)
}

fn gyro_fs1000_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps1000)
}

fn gyro_fs2000_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps2000)
}

fn gyro_fs4000_to_mdps(raw: i16) -> f32 {
    f32::from(raw) * gyro_mdps_per_lsb(GyroRange::Dps4000)
}

/// Returns the milli-g conversion function for `range`.
pub const fn accel_converter(range: AccelRange) -> ScaleFn {
    match range {
        AccelRange::G2 => accel_fs2_to_mg,
        AccelRange::G4 => accel_fs4_to_mg,
        AccelRange::G8 => accel_fs8_to_mg,
        AccelRange::G16 => accel_fs16_to_mg,
    }
}

/// Returns the milli-deg/s conversion function for `range`.
pub const fn gyro_converter(range: GyroRange) -> ScaleFn {
    match range {
        GyroRange::Dps125 => gyro_fs125_to_mdps,
        GyroRange::Dps250 => gyro_fs250_to_mdps,
        GyroRange::Dps500 => gyro_fs500_to_mdps,
        GyroRange::Dps1000 => gyro_fs1000_to_mdps,
        GyroRange::Dps2000 => gyro_fs2000_to_mdps,
        GyroRange::Dps4000 => gyro_fs4000_to_mdps,
    }
}

/// Converts a raw accelerometer reading to milli-g.
pub fn convert_accel(raw: i16, range: AccelRange) -> f32 {
    accel_converter(range)(raw)
}

/// Converts a raw gyroscope reading to milli-deg/s.
pub fn convert_gyro(raw: i16, range: GyroRange) -> f32 {
    gyro_converter(range)(raw)
}

/// SFLP gravity is always reported at the +/-2 g sensitivity.
pub(crate) fn gravity_to_mg(raw: i16) -> f32 {
    accel_fs2_to_mg(raw)
}

/// SFLP gyro bias is always reported at the +/-125 dps sensitivity.
pub(crate) fn gbias_to_mdps(raw: i16) -> f32 {
    gyro_fs125_to_mdps(raw)
}

pub(crate) fn qvar_to_mv(raw: i16) -> f32 {
    f32::from(raw) / QVAR_LSB_PER_MV
}

/// Active conversion functions for the configured ranges.
#[derive(Clone, Copy, Debug)]
pub struct ScaleSelection {
    accel_range: AccelRange,
    gyro_range: GyroRange,
    accel: ScaleFn,
    gyro: ScaleFn,
}

impl ScaleSelection {
    /// Selects conversion functions for the given ranges.
    pub const fn new(accel_range: AccelRange, gyro_range: GyroRange) -> Self {
        Self {
            accel_range,
            gyro_range,
            accel: accel_converter(accel_range),
            gyro: gyro_converter(gyro_range),
        }
    }

    /// Returns the selected accelerometer range.
    pub const fn accel_range(&self) -> AccelRange {
        self.accel_range
    }

    /// Returns the selected gyroscope range.
    pub const fn gyro_range(&self) -> GyroRange {
        self.gyro_range
    }

    /// Converts a raw accelerometer reading with the cached function.
    #[inline]
    pub fn accel(&self, raw: i16) -> f32 {
        (self.accel)(raw)
    }

    /// Converts a raw gyroscope reading with the cached function.
    #[inline]
    pub fn gyro(&self, raw: i16) -> f32 {
        (self.gyro)(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEL_RANGES: [AccelRange; 4] =
        [AccelRange::G2, AccelRange::G4, AccelRange::G8, AccelRange::G16];
    const GYRO_RANGES: [GyroRange; 6] = [
        GyroRange::Dps125,
        GyroRange::Dps250,
        GyroRange::Dps500,
        GyroRange::Dps1000,
        GyroRange::Dps2000,
        GyroRange::Dps4000,
    ];
    const SAMPLES: [i16; 7] = [i16::MIN, -12_345, -1, 0, 1, 12_345, i16::MAX];

    #[test]
    fn converters_pass_through_zero() {
        for range in ACCEL_RANGES {
            assert_eq!(convert_accel(0, range), 0.0);
        }
        for range in GYRO_RANGES {
            assert_eq!(convert_gyro(0, range), 0.0);
        }
    }

    #[test]
    fn converters_are_monotonic() {
        for range in ACCEL_RANGES {
            for pair in SAMPLES.windows(2) {
                assert!(convert_accel(pair[0], range) < convert_accel(pair[1], range));
            }
        }
        for range in GYRO_RANGES {
            for pair in SAMPLES.windows(2) {
                assert!(convert_gyro(pair[0], range) < convert_gyro(pair[1], range));
            }
        }
    }

    #[test]
    fn known_sensitivities() {
        assert!((convert_accel(1000, AccelRange::G2) - 61.0).abs() < 1e-3);
        assert!((convert_gyro(2, GyroRange::Dps2000) - 140.0).abs() < 1e-3);
        assert!((qvar_to_mv(78) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn selection_caches_range_functions() {
        let scale = ScaleSelection::new(AccelRange::G8, GyroRange::Dps250);
        assert_eq!(scale.accel(100), convert_accel(100, AccelRange::G8));
        assert_eq!(scale.gyro(-100), convert_gyro(-100, GyroRange::Dps250));
        assert_eq!(scale.accel_range(), AccelRange::G8);
    }
}
