//! Error type for the LSM6DSV16BX driver.

/// Error type for LSM6DSV16BX operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus communication error (I2C, SPI, etc.).
    Bus,
    /// Sensor not responding or not present.
    NotPresent,
    /// Invalid chip ID or wrong device.
    WrongDevice,
    /// Device did not leave reset/boot in time.
    NotReady,
    /// Invalid data or configuration.
    InvalidData,
    /// FSM slot index outside `0..FSM_SLOT_COUNT`.
    SlotOutOfRange,
    /// Writing the configuration of the contained FSM slot failed.
    ///
    /// Slots committed before this one stay written.
    FsmSlot(u8),
}
