//! Calibration record codec: `x:±d.dd\ny:±d.dd\nz:±d.dd`.

use core::fmt::Write;

use heapless::String;
use ph_lsm6dsv16bx::Vector3;

use crate::storage::StorageError;

/// Exact size of an encoded record.
pub const CALIBRATION_RECORD_LEN: usize = 23;

/// Largest magnitude a record can hold (deg/s).
pub const CALIBRATION_LIMIT_DPS: f32 = 9.99;

const AXES: [u8; 3] = [b'x', b'y', b'z'];
const FIELD_LEN: usize = 7;

/// Persisted gyro bias in deg/s.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    /// X bias (deg/s).
    pub x: f32,
    /// Y bias (deg/s).
    pub y: f32,
    /// Z bias (deg/s).
    pub z: f32,
}

impl CalibrationRecord {
    /// Creates a record from deg/s values.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Converts a driver bias in milli-dps.
    pub fn from_mdps(bias: Vector3) -> Self {
        Self::new(bias.x / 1000.0, bias.y / 1000.0, bias.z / 1000.0)
    }

    /// Returns the bias in milli-dps, as the driver expects it.
    pub fn to_mdps(self) -> Vector3 {
        Vector3::new(self.x * 1000.0, self.y * 1000.0, self.z * 1000.0)
    }

    /// Encodes the record. Values are clamped to ±9.99 and rounded to
    /// hundredths.
    pub fn format(&self) -> String<CALIBRATION_RECORD_LEN> {
        let mut out = String::new();
        for (i, (axis, value)) in AXES.iter().zip([self.x, self.y, self.z]).enumerate() {
            let cents = centi(value);
            let sign = if cents < 0 { '-' } else { '+' };
            let abs = cents.unsigned_abs();
            let separator = if i + 1 < AXES.len() { "\n" } else { "" };
            // Fixed width: 3 * 7 bytes plus two separators.
            let _ = write!(
                out,
                "{}:{}{}.{:02}{}",
                char::from(*axis),
                sign,
                abs / 100,
                abs % 100,
                separator
            );
        }
        out
    }

    /// Decodes a record; anything but the exact fixed-size layout is
    /// [`StorageError::Malformed`].
    pub fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() != CALIBRATION_RECORD_LEN {
            return Err(StorageError::Malformed);
        }
        let mut values = [0.0f32; 3];
        for (i, axis) in AXES.iter().enumerate() {
            let start = i * (FIELD_LEN + 1);
            let field = &bytes[start..start + FIELD_LEN];
            if i + 1 < AXES.len() && bytes[start + FIELD_LEN] != b'\n' {
                return Err(StorageError::Malformed);
            }
            values[i] = parse_field(field, *axis)?;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

fn centi(value: f32) -> i32 {
    let clamped = value.clamp(-CALIBRATION_LIMIT_DPS, CALIBRATION_LIMIT_DPS);
    // NaN survives the clamp; store it as zero.
    if clamped.is_nan() {
        return 0;
    }
    libm::roundf(clamped * 100.0) as i32
}

fn parse_field(field: &[u8], axis: u8) -> Result<f32, StorageError> {
    let &[name, b':', sign, units, b'.', tenths, hundredths] = field else {
        return Err(StorageError::Malformed);
    };
    if name != axis {
        return Err(StorageError::Malformed);
    }
    let negative = match sign {
        b'+' => false,
        b'-' => true,
        _ => return Err(StorageError::Malformed),
    };
    let mut cents = 0i32;
    for digit in [units, tenths, hundredths] {
        if !digit.is_ascii_digit() {
            return Err(StorageError::Malformed);
        }
        cents = cents * 10 + i32::from(digit - b'0');
    }
    if negative {
        cents = -cents;
    }
    Ok(cents as f32 / 100.0)
}
