//! SPI interface adapter for the LSM6DSV16BX.

use embedded_hal_async::spi::{Operation, SpiDevice};

use super::{Interface, InterfaceSettings, sealed};
use crate::error::Error;

/// SPI interface configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    pub(crate) auto_increment: bool,
    pub(crate) three_wire: bool,
}

impl SpiConfig {
    /// Creates a new SPI configuration (4-wire, auto-increment).
    pub const fn new() -> Self {
        Self {
            auto_increment: true,
            three_wire: false,
        }
    }

    /// Enables or disables address auto-increment (CTRL3.IF_INC).
    #[must_use]
    pub const fn with_auto_increment(mut self, enable: bool) -> Self {
        self.auto_increment = enable;
        self
    }

    /// Enables 3-wire SPI mode (IF_CFG.SIM).
    #[must_use]
    pub const fn with_three_wire(mut self, enable: bool) -> Self {
        self.three_wire = enable;
        self
    }

    pub(crate) const fn interface_settings(self) -> InterfaceSettings {
        InterfaceSettings::new(self.auto_increment, self.three_wire)
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// SPI register interface.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Creates a new SPI interface with the given device.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

/// RW bit of the SPI address byte (1 = read).
const SPI_RW_READ: u8 = 0x80;
const SPI_ADDR_MASK: u8 = 0x7F;

const fn read_command(reg: u8) -> u8 {
    (reg & SPI_ADDR_MASK) | SPI_RW_READ
}

const fn write_command(reg: u8) -> u8 {
    reg & SPI_ADDR_MASK
}

impl<SPI> Interface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    async fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.is_empty() {
            return Ok(());
        }
        let command = [read_command(reg)];
        let mut ops = [Operation::Write(&command), Operation::Read(buffer)];
        self.spi.transaction(&mut ops).await.map_err(|_| Error::Bus)
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.spi
            .write(&[write_command(reg), value])
            .await
            .map_err(|_| Error::Bus)
    }
}

impl<SPI> sealed::Sealed for SpiInterface<SPI> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sets_rw_bit_write_clears_it() {
        assert_eq!(read_command(0x78), 0xF8);
        assert_eq!(write_command(0xF8), 0x78);
        assert_eq!(read_command(0x0F), 0x8F);
    }
}
