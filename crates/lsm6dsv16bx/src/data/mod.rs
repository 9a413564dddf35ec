//! Sample types and FIFO payload decoding.

pub(crate) mod fifo;
pub(crate) mod scale;

pub use fifo::{FifoConfig, FifoMode, FifoStatus, FifoTag, FifoWord, FifoWordIterator};
pub use fifo::{FIFO_WORD_LEN, TimestampBatch};
pub use scale::{
    QVAR_LSB_PER_MV, ScaleFn, ScaleSelection, accel_converter, accel_mg_per_lsb, convert_accel,
    convert_gyro, gyro_converter, gyro_mdps_per_lsb,
};

/// Nanoseconds per timestamp tick (21.75 us).
pub const TIMESTAMP_TICK_NS: u64 = 21_750;

/// Raw signed 3-axis reading as stored in a FIFO payload (little-endian).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawVector {
    /// X axis.
    pub x: i16,
    /// Y axis.
    pub y: i16,
    /// Z axis.
    pub z: i16,
}

impl RawVector {
    /// Decodes a 6-byte little-endian payload.
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([bytes[0], bytes[1]]),
            y: i16::from_le_bytes([bytes[2], bytes[3]]),
            z: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    /// Applies `convert` to each axis.
    pub fn scaled(self, convert: impl Fn(i16) -> f32) -> Vector3 {
        Vector3::new(convert(self.x), convert(self.y), convert(self.z))
    }
}

/// Converted 3-axis sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    /// X axis.
    pub x: f32,
    /// Y axis.
    pub y: f32,
    /// Z axis.
    pub z: f32,
}

impl Vector3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise subtraction.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Unit quaternion from the SFLP game-rotation output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quaternion {
    /// Scalar part.
    pub w: f32,
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Rebuilds a unit quaternion from the three half-float vector components
    /// the sensor batches; `w` is recovered as `sqrt(1 - x² - y² - z²)`.
    pub fn from_sflp_bytes(bytes: [u8; 6]) -> Self {
        let mut x = half_to_f32(u16::from_le_bytes([bytes[0], bytes[1]]));
        let mut y = half_to_f32(u16::from_le_bytes([bytes[2], bytes[3]]));
        let mut z = half_to_f32(u16::from_le_bytes([bytes[4], bytes[5]]));
        let sumsq = x * x + y * y + z * z;
        let w = if sumsq > 1.0 {
            let n = libm::sqrtf(sumsq);
            x /= n;
            y /= n;
            z /= n;
            0.0
        } else {
            libm::sqrtf(1.0 - sumsq)
        };
        Self { w, x, y, z }
    }
}

/// Converts an IEEE 754 binary16 value to `f32`.
pub(crate) fn half_to_f32(bits: u16) -> f32 {
    let negative = bits & 0x8000 != 0;
    let sign = u32::from(bits & 0x8000) << 16;
    let exponent = u32::from((bits >> 10) & 0x1F);
    let mantissa = u32::from(bits & 0x03FF);
    match (exponent, mantissa) {
        (0, 0) => f32::from_bits(sign),
        (0, _) => {
            // Subnormal: mantissa * 2^-24.
            let value = mantissa as f32 / 16_777_216.0;
            if negative { -value } else { value }
        }
        (0x1F, 0) => f32::from_bits(sign | 0x7F80_0000),
        (0x1F, _) => f32::from_bits(sign | 0x7FC0_0000 | (mantissa << 13)),
        _ => f32::from_bits(sign | ((exponent + 112) << 23) | (mantissa << 13)),
    }
}

/// Converts raw timestamp ticks to nanoseconds.
pub const fn timestamp_ticks_to_ns(ticks: u32) -> u64 {
    ticks as u64 * TIMESTAMP_TICK_NS
}
