use crate::register::{ctrl6, ctrl8};

/// Accelerometer full-scale range selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    /// +/-2 g range.
    G2,
    /// +/-4 g range.
    G4,
    /// +/-8 g range.
    G8,
    /// +/-16 g range.
    G16,
}

impl AccelRange {
    /// Returns the full-scale range in g.
    pub const fn g(self) -> u16 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }

    /// Returns the CTRL8.FS_XL bits.
    pub(crate) const fn bits(self) -> u8 {
        let bits = match self {
            Self::G2 => 0b00,
            Self::G4 => 0b01,
            Self::G8 => 0b10,
            Self::G16 => 0b11,
        };
        bits & ctrl8::FS_XL_MASK
    }
}

/// Gyroscope full-scale range selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    /// +/-125 deg/s.
    Dps125,
    /// +/-250 deg/s.
    Dps250,
    /// +/-500 deg/s.
    Dps500,
    /// +/-1000 deg/s.
    Dps1000,
    /// +/-2000 deg/s.
    Dps2000,
    /// +/-4000 deg/s.
    Dps4000,
}

impl GyroRange {
    /// Returns the full-scale range in degrees per second.
    pub const fn dps(self) -> u16 {
        match self {
            Self::Dps125 => 125,
            Self::Dps250 => 250,
            Self::Dps500 => 500,
            Self::Dps1000 => 1000,
            Self::Dps2000 => 2000,
            Self::Dps4000 => 4000,
        }
    }

    /// Returns the CTRL6.FS_G bits.
    pub(crate) const fn bits(self) -> u8 {
        let bits = match self {
            Self::Dps125 => 0x0,
            Self::Dps250 => 0x1,
            Self::Dps500 => 0x2,
            Self::Dps1000 => 0x3,
            Self::Dps2000 => 0x4,
            Self::Dps4000 => 0xC,
        };
        bits & ctrl6::FS_G_MASK
    }
}

/// Output data rate for the accelerometer, gyroscope and their FIFO batch rates.
///
/// CTRL1.ODR_XL, CTRL2.ODR_G and the FIFO_CTRL3 BDR fields share one encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDataRate {
    /// Sensor powered down / not batched.
    Off,
    /// 7.5 Hz.
    Hz7_5,
    /// 15 Hz.
    Hz15,
    /// 30 Hz.
    Hz30,
    /// 60 Hz.
    Hz60,
    /// 120 Hz.
    Hz120,
    /// 240 Hz.
    Hz240,
    /// 480 Hz.
    Hz480,
    /// 960 Hz.
    Hz960,
    /// 1920 Hz.
    Hz1920,
    /// 3840 Hz.
    Hz3840,
    /// 7680 Hz.
    Hz7680,
}

impl OutputDataRate {
    /// Returns the output data rate in milli-hertz.
    pub const fn hz_milli(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Hz7_5 => 7_500,
            Self::Hz15 => 15_000,
            Self::Hz30 => 30_000,
            Self::Hz60 => 60_000,
            Self::Hz120 => 120_000,
            Self::Hz240 => 240_000,
            Self::Hz480 => 480_000,
            Self::Hz960 => 960_000,
            Self::Hz1920 => 1_920_000,
            Self::Hz3840 => 3_840_000,
            Self::Hz7680 => 7_680_000,
        }
    }

    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Off => 0x0,
            Self::Hz7_5 => 0x2,
            Self::Hz15 => 0x3,
            Self::Hz30 => 0x4,
            Self::Hz60 => 0x5,
            Self::Hz120 => 0x6,
            Self::Hz240 => 0x7,
            Self::Hz480 => 0x8,
            Self::Hz960 => 0x9,
            Self::Hz1920 => 0xA,
            Self::Hz3840 => 0xB,
            Self::Hz7680 => 0xC,
        }
    }
}

/// SFLP (sensor fusion low power) game-rotation output data rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SflpOutputDataRate {
    /// 15 Hz.
    Hz15,
    /// 30 Hz.
    Hz30,
    /// 60 Hz.
    Hz60,
    /// 120 Hz.
    Hz120,
    /// 240 Hz.
    Hz240,
    /// 480 Hz.
    Hz480,
}

impl SflpOutputDataRate {
    /// Returns the output data rate in milli-hertz.
    pub const fn hz_milli(self) -> u32 {
        match self {
            Self::Hz15 => 15_000,
            Self::Hz30 => 30_000,
            Self::Hz60 => 60_000,
            Self::Hz120 => 120_000,
            Self::Hz240 => 240_000,
            Self::Hz480 => 480_000,
        }
    }

    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Hz15 => 0,
            Self::Hz30 => 1,
            Self::Hz60 => 2,
            Self::Hz120 => 3,
            Self::Hz240 => 4,
            Self::Hz480 => 5,
        }
    }
}

/// Accelerometer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelConfig {
    /// Accelerometer full-scale range.
    pub range: AccelRange,
    /// Accelerometer output data rate (also used as FIFO batch rate).
    pub odr: OutputDataRate,
}

impl AccelConfig {
    /// Default accelerometer configuration.
    pub const DEFAULT: Self = Self {
        range: AccelRange::G16,
        odr: OutputDataRate::Hz120,
    };

    /// Creates a new accelerometer configuration.
    pub const fn new(range: AccelRange, odr: OutputDataRate) -> Self {
        Self { range, odr }
    }

    /// Sets the accelerometer range.
    #[must_use]
    pub const fn with_range(mut self, range: AccelRange) -> Self {
        self.range = range;
        self
    }

    /// Sets the accelerometer output data rate.
    #[must_use]
    pub const fn with_odr(mut self, odr: OutputDataRate) -> Self {
        self.odr = odr;
        self
    }
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Gyroscope configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroConfig {
    /// Gyroscope full-scale range.
    pub range: GyroRange,
    /// Gyroscope output data rate (also used as FIFO batch rate).
    pub odr: OutputDataRate,
}

impl GyroConfig {
    /// Default gyroscope configuration.
    pub const DEFAULT: Self = Self {
        range: GyroRange::Dps2000,
        odr: OutputDataRate::Hz120,
    };

    /// Creates a new gyroscope configuration.
    pub const fn new(range: GyroRange, odr: OutputDataRate) -> Self {
        Self { range, odr }
    }

    /// Sets the gyroscope range.
    #[must_use]
    pub const fn with_range(mut self, range: GyroRange) -> Self {
        self.range = range;
        self
    }

    /// Sets the gyroscope output data rate.
    #[must_use]
    pub const fn with_odr(mut self, odr: OutputDataRate) -> Self {
        self.odr = odr;
        self
    }
}

impl Default for GyroConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
