//! I2C interface adapter for the LSM6DSV16BX.

use embedded_hal_async::i2c::{I2c, Operation};

use super::Lsm6dsv16bxAddress;
use super::{Interface, InterfaceSettings, sealed};
use crate::error::Error;

/// I2C interface configuration (address + serial settings).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    pub(crate) address: u8,
    pub(crate) auto_increment: bool,
}

impl I2cConfig {
    /// Creates a new I2C configuration for the provided address.
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            auto_increment: true,
        }
    }

    /// Sets the I2C address.
    #[must_use]
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Enables or disables address auto-increment (CTRL3.IF_INC).
    ///
    /// FIFO draining reads 7-byte words and needs auto-increment enabled.
    #[must_use]
    pub const fn with_auto_increment(mut self, enable: bool) -> Self {
        self.auto_increment = enable;
        self
    }

    pub(crate) const fn interface_settings(self) -> InterfaceSettings {
        InterfaceSettings::new(self.auto_increment, false)
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::new(Lsm6dsv16bxAddress::Primary.addr())
    }
}

/// I2C register interface.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new I2C interface with the given bus and 7-bit address.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Changes the 7-bit I2C address.
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Releases the underlying I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Interface for I2cInterface<I2C>
where
    I2C: I2c,
{
    async fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.is_empty() {
            return Ok(());
        }
        // Repeated start between the address write and the read.
        let command = [reg];
        let mut ops = [Operation::Write(&command), Operation::Read(buffer)];
        self.i2c
            .transaction(self.address, &mut ops)
            .await
            .map_err(|_| Error::Bus)
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.i2c
            .write(self.address, &[reg, value])
            .await
            .map_err(|_| Error::Bus)
    }
}

impl<I2C> sealed::Sealed for I2cInterface<I2C> {}
