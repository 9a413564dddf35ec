//! FIFO configuration, status and tagged-word parsing.

use crate::register::{fifo_ctrl4, fifo_status2, fifo_tag};

/// Size of one FIFO word: tag byte + 6-byte payload.
pub const FIFO_WORD_LEN: usize = 7;

/// FIFO operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoMode {
    /// FIFO disabled; contents are flushed.
    Bypass,
    /// Stops collecting when full.
    Fifo,
    /// Continuous mode (oldest words overwritten when full).
    Continuous,
}

impl FifoMode {
    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Bypass => 0b000,
            Self::Fifo => 0b001,
            Self::Continuous => 0b110,
        }
    }
}

/// Timestamp batching decimation (FIFO_CTRL4.DEC_TS_BATCH).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimestampBatch {
    /// Timestamp not batched.
    Off,
    /// One timestamp word per batch event.
    Every1,
    /// One timestamp word every 8 batch events.
    Every8,
    /// One timestamp word every 32 batch events.
    Every32,
}

impl TimestampBatch {
    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Off => 0b00,
            Self::Every1 => 0b01,
            Self::Every8 => 0b10,
            Self::Every32 => 0b11,
        }
    }
}

/// FIFO configuration (watermark + mode + timestamp batching).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoConfig {
    /// FIFO watermark level, in words.
    pub watermark: u8,
    /// FIFO mode used while acquisition runs.
    pub mode: FifoMode,
    /// Timestamp batching.
    pub timestamp: TimestampBatch,
}

impl FifoConfig {
    /// Default FIFO configuration: 200-word watermark, continuous, timestamp every batch.
    pub const DEFAULT: Self = Self {
        watermark: 200,
        mode: FifoMode::Continuous,
        timestamp: TimestampBatch::Every1,
    };

    /// Creates a new FIFO configuration.
    pub const fn new(mode: FifoMode, watermark: u8) -> Self {
        Self {
            watermark,
            mode,
            timestamp: TimestampBatch::Every1,
        }
    }

    /// Sets the FIFO mode.
    #[must_use]
    pub const fn with_mode(self, mode: FifoMode) -> Self {
        Self { mode, ..self }
    }

    /// Sets the FIFO watermark level (in words).
    #[must_use]
    pub const fn with_watermark(self, watermark: u8) -> Self {
        Self { watermark, ..self }
    }

    /// Sets timestamp batching.
    #[must_use]
    pub const fn with_timestamp(self, timestamp: TimestampBatch) -> Self {
        Self { timestamp, ..self }
    }

    pub(crate) const fn ctrl4_value(self, mode: FifoMode) -> u8 {
        (mode.bits() & fifo_ctrl4::FIFO_MODE_MASK)
            | ((self.timestamp.bits() << fifo_ctrl4::DEC_TS_BATCH_SHIFT)
                & fifo_ctrl4::DEC_TS_BATCH_MASK)
    }
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// FIFO status decoded from FIFO_STATUS1/2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoStatus {
    /// Watermark reached.
    pub watermark: bool,
    /// FIFO overrun (current).
    pub overrun: bool,
    /// FIFO will be full at the next ODR.
    pub full: bool,
    /// Overrun latched since the last status read.
    pub overrun_latched: bool,
    /// Unread words in FIFO.
    pub unread_words: u16,
}

impl FifoStatus {
    /// Decodes FIFO_STATUS1 and FIFO_STATUS2.
    pub const fn from_regs(status1: u8, status2: u8) -> Self {
        let high = if (status2 & fifo_status2::DIFF_FIFO_8) != 0 {
            0x100
        } else {
            0
        };
        Self {
            watermark: (status2 & fifo_status2::FIFO_WTM_IA) != 0,
            overrun: (status2 & fifo_status2::FIFO_OVR_IA) != 0,
            full: (status2 & fifo_status2::FIFO_FULL_IA) != 0,
            overrun_latched: (status2 & fifo_status2::FIFO_OVR_LATCHED) != 0,
            unread_words: high | status1 as u16,
        }
    }
}

/// Sensor tag carried in bits 7..3 of each FIFO word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoTag {
    /// Gyroscope sample.
    Gyro,
    /// Accelerometer sample.
    Accel,
    /// Timestamp.
    Timestamp,
    /// SFLP game rotation vector.
    GameRotation,
    /// SFLP gyroscope bias.
    GyroBias,
    /// SFLP gravity vector.
    Gravity,
    /// QVAR (analog hub) sample.
    Qvar,
    /// Any tag this driver does not decode.
    Unknown(u8),
}

impl FifoTag {
    /// Decodes the tag byte of a FIFO word.
    pub const fn from_tag_byte(byte: u8) -> Self {
        match byte >> fifo_tag::TAG_SENSOR_SHIFT {
            0x01 => Self::Gyro,
            0x02 => Self::Accel,
            0x04 => Self::Timestamp,
            0x13 => Self::GameRotation,
            0x16 => Self::GyroBias,
            0x17 => Self::Gravity,
            0x1F => Self::Qvar,
            other => Self::Unknown(other),
        }
    }

    /// Returns the 5-bit sensor tag value.
    pub const fn code(self) -> u8 {
        match self {
            Self::Gyro => 0x01,
            Self::Accel => 0x02,
            Self::Timestamp => 0x04,
            Self::GameRotation => 0x13,
            Self::GyroBias => 0x16,
            Self::Gravity => 0x17,
            Self::Qvar => 0x1F,
            Self::Unknown(code) => code,
        }
    }
}

/// One tagged FIFO word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoWord {
    /// Decoded tag.
    pub tag: FifoTag,
    /// Raw payload (little-endian).
    pub payload: [u8; 6],
}

impl FifoWord {
    /// Splits a 7-byte FIFO word into tag and payload.
    pub const fn from_bytes(bytes: [u8; FIFO_WORD_LEN]) -> Self {
        Self {
            tag: FifoTag::from_tag_byte(bytes[0]),
            payload: [bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6]],
        }
    }

    /// Timestamp ticks carried in the first four payload bytes.
    pub const fn timestamp_ticks(&self) -> u32 {
        u32::from_le_bytes([
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
        ])
    }

    /// First payload half-word as a signed value.
    pub const fn first_i16(&self) -> i16 {
        i16::from_le_bytes([self.payload[0], self.payload[1]])
    }
}

/// Iterator over complete 7-byte words of a FIFO batch buffer.
///
/// A trailing partial word is ignored.
pub struct FifoWordIterator<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl<'a> FifoWordIterator<'a> {
    /// Creates an iterator over `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            chunks: buffer.chunks_exact(FIFO_WORD_LEN),
        }
    }
}

impl Iterator for FifoWordIterator<'_> {
    type Item = FifoWord;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let mut bytes = [0u8; FIFO_WORD_LEN];
        bytes.copy_from_slice(chunk);
        Some(FifoWord::from_bytes(bytes))
    }
}
