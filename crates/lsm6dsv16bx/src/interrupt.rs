//! Interrupt routing and status decoding.

use crate::data::FifoStatus;
use crate::register::{all_int_src, emb_func_status, int1_ctrl};

/// Interrupt routing configuration.
///
/// The FIFO watermark is always routed to INT1 while acquisition runs; the
/// flags here add the overrun/full sources and pin aliasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptConfig {
    /// Mirror every INT2 source on INT1 (CTRL4.INT2_ON_INT1).
    pub int2_on_int1: bool,
    /// Also route FIFO overrun to INT1.
    pub fifo_overrun: bool,
    /// Also route FIFO full to INT1.
    pub fifo_full: bool,
}

impl InterruptConfig {
    /// Default interrupt configuration (watermark only, no aliasing).
    pub const DEFAULT: Self = Self {
        int2_on_int1: false,
        fifo_overrun: false,
        fifo_full: false,
    };

    /// Creates a new interrupt configuration.
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Enables or disables INT2-on-INT1 aliasing.
    #[must_use]
    pub const fn with_int2_on_int1(mut self, enable: bool) -> Self {
        self.int2_on_int1 = enable;
        self
    }

    /// Routes FIFO overrun to INT1.
    #[must_use]
    pub const fn with_fifo_overrun(mut self, enable: bool) -> Self {
        self.fifo_overrun = enable;
        self
    }

    /// Routes FIFO full to INT1.
    #[must_use]
    pub const fn with_fifo_full(mut self, enable: bool) -> Self {
        self.fifo_full = enable;
        self
    }

    pub(crate) const fn int1_ctrl_value(self) -> u8 {
        let mut value = int1_ctrl::INT1_FIFO_TH;
        if self.fifo_overrun {
            value |= int1_ctrl::INT1_FIFO_OVR;
        }
        if self.fifo_full {
            value |= int1_ctrl::INT1_FIFO_FULL;
        }
        value
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Decoded interrupt sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// FIFO status at the time of the interrupt.
    pub fifo: FifoStatus,
    /// An embedded function raised an interrupt.
    pub embedded: bool,
    /// Significant motion detected.
    pub significant_motion: bool,
    /// FSM_STATUS bit mask (one bit per program).
    pub fsm: u8,
}

impl InterruptStatus {
    pub(crate) const fn from_regs(
        fifo: FifoStatus,
        all_int_src_reg: u8,
        emb_func_status_reg: u8,
        fsm_status_reg: u8,
    ) -> Self {
        Self {
            fifo,
            embedded: (all_int_src_reg & all_int_src::EMB_FUNC_IA) != 0,
            significant_motion: (emb_func_status_reg & emb_func_status::IS_SIGMOT) != 0,
            fsm: fsm_status_reg,
        }
    }

    /// Returns true if the FIFO needs draining.
    pub const fn fifo_pending(self) -> bool {
        self.fifo.watermark || self.fifo.overrun || self.fifo.full || self.fifo.unread_words > 0
    }
}

/// Error returned when waiting on an interrupt pin.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptWaitError<E> {
    /// Interrupt pin was not provided to the driver.
    Missing,
    /// Underlying pin error.
    Pin(E),
}
