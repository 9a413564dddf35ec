//! Interface abstraction for register I/O.

pub(crate) mod address;
pub(crate) mod i2c;
pub(crate) mod spi;

pub use address::Lsm6dsv16bxAddress;
pub use i2c::{I2cConfig, I2cInterface};
pub use spi::{SpiConfig, SpiInterface};

use crate::error::Error;
use crate::register::{ctrl3, if_cfg};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Async register I/O for the device core.
///
/// Block reads rely on CTRL3.IF_INC; a 7-byte read at FIFO_DATA_OUT_TAG
/// returns one FIFO word.
#[allow(async_fn_in_trait)]
pub trait Interface: sealed::Sealed {
    /// Reads a contiguous block of registers into `buffer`.
    async fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error>;

    /// Writes a single register.
    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error>;

    /// Reads a single register.
    async fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buffer = [0u8];
        self.read_regs(reg, &mut buffer).await?;
        Ok(buffer[0])
    }
}

/// Serial interface settings applied via CTRL3 and IF_CFG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InterfaceSettings {
    pub(crate) auto_increment: bool,
    pub(crate) spi_3_wire: bool,
}

impl InterfaceSettings {
    pub(crate) const fn new(auto_increment: bool, spi_3_wire: bool) -> Self {
        Self {
            auto_increment,
            spi_3_wire,
        }
    }

    /// CTRL3 value: block data update is always on so FIFO words never tear.
    pub(crate) const fn ctrl3_value(self) -> u8 {
        let mut value = ctrl3::BDU;
        if self.auto_increment {
            value |= ctrl3::IF_INC;
        }
        value
    }

    pub(crate) const fn if_cfg_value(self) -> u8 {
        if self.spi_3_wire { if_cfg::SIM } else { 0 }
    }
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self::new(true, false)
    }
}
