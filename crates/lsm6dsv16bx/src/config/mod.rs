//! Configuration helpers for the LSM6DSV16BX.

pub(crate) mod common;

pub use common::{AccelConfig, AccelRange, GyroConfig, GyroRange};
pub use common::{OutputDataRate, SflpOutputDataRate};

use crate::register::{ctrl1, ctrl2, sflp_odr};

/// LSM6DSV16BX sensor configuration.
///
/// Ranges and output data rates are latched here and written when a channel
/// is enabled; the driver keeps channels off until acquisition starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Accelerometer configuration.
    pub accel: AccelConfig,
    /// Gyroscope configuration.
    pub gyro: GyroConfig,
    /// SFLP game-rotation output data rate.
    pub sflp_odr: SflpOutputDataRate,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a default configuration (+/-16 g, +/-2000 dps, 120 Hz, SFLP 120 Hz).
    pub const fn new() -> Self {
        Self {
            accel: AccelConfig::DEFAULT,
            gyro: GyroConfig::DEFAULT,
            sflp_odr: SflpOutputDataRate::Hz120,
        }
    }

    /// Sets the accelerometer configuration.
    #[must_use]
    pub const fn with_accel_config(mut self, accel: AccelConfig) -> Self {
        self.accel = accel;
        self
    }

    /// Sets the gyroscope configuration.
    #[must_use]
    pub const fn with_gyro_config(mut self, gyro: GyroConfig) -> Self {
        self.gyro = gyro;
        self
    }

    /// Sets the SFLP game-rotation output data rate.
    #[must_use]
    pub const fn with_sflp_odr(mut self, odr: SflpOutputDataRate) -> Self {
        self.sflp_odr = odr;
        self
    }

    pub(crate) const fn ctrl1_value(self, enabled: bool) -> u8 {
        if enabled {
            self.accel.odr.bits() & ctrl1::ODR_XL_MASK
        } else {
            0
        }
    }

    pub(crate) const fn ctrl2_value(self, enabled: bool) -> u8 {
        if enabled {
            self.gyro.odr.bits() & ctrl2::ODR_G_MASK
        } else {
            0
        }
    }

    pub(crate) const fn sflp_odr_value(self) -> u8 {
        ((self.sflp_odr.bits() << sflp_odr::SFLP_GAME_ODR_SHIFT) & sflp_odr::SFLP_GAME_ODR_MASK)
            | sflp_odr::RESERVED
    }
}

/// Which optional outputs to enable when acquisition starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Batch the SFLP gyro-bias estimate in FIFO.
    pub gbias: bool,
    /// Batch SFLP game rotation and gravity in FIFO.
    pub sflp: bool,
    /// Enable the QVAR (electrostatic) channel.
    pub qvar: bool,
}

impl AcquisitionConfig {
    /// Accelerometer + gyroscope only.
    pub const fn new() -> Self {
        Self {
            gbias: false,
            sflp: false,
            qvar: false,
        }
    }

    /// Enables the SFLP gyro-bias output.
    #[must_use]
    pub const fn with_gbias(mut self, enable: bool) -> Self {
        self.gbias = enable;
        self
    }

    /// Enables the SFLP game-rotation and gravity outputs.
    #[must_use]
    pub const fn with_sflp(mut self, enable: bool) -> Self {
        self.sflp = enable;
        self
    }

    /// Enables the QVAR channel.
    #[must_use]
    pub const fn with_qvar(mut self, enable: bool) -> Self {
        self.qvar = enable;
        self
    }

    pub(crate) const fn uses_sflp(self) -> bool {
        self.gbias || self.sflp
    }
}
