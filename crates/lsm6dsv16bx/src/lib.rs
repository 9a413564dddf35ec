//! Async `#![no_std]` driver for the
//! [LSM6DSV16BX](https://www.st.com/en/mems-and-sensors/lsm6dsv16bx.html)
//! 6-axis IMU (accelerometer + gyroscope + QVAR) from STMicroelectronics.
//!
//! The driver is built on `embedded-hal-async` and is meant for wearable
//! firmware that streams data through the sensor FIFO: samples are decoded
//! from tagged FIFO words, converted to physical units and handed to a
//! [`SampleHandler`].
//!
//! # Quick start (I2C)
//!
//! ```rust,no_run
//! use ph_lsm6dsv16bx::{AcquisitionConfig, Config, I2cConfig, Lsm6dsv16bxAddress, Lsm6dsv16bxI2c};
//! # use embedded_hal_async::delay::DelayNs;
//! # use embedded_hal_async::i2c::I2c;
//! #
//! # async fn example<I2C: I2c, D: DelayNs>(i2c: I2C, delay: &mut D) -> Result<(), ph_lsm6dsv16bx::Error> {
//! let config = Config::new();
//! let i2c_config = I2cConfig::new(Lsm6dsv16bxAddress::Primary.addr());
//! let mut imu: Lsm6dsv16bxI2c<I2C> =
//!     Lsm6dsv16bxI2c::with_i2c_config(i2c, (), None, config, i2c_config);
//! imu.init(delay).await?;
//! imu.start_acquisition(AcquisitionConfig::new().with_sflp(true)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # FIFO
//!
//! [`Lsm6dsv16bx::handle_interrupt`] reads the FIFO status on INT1 and drains
//! the unread words. Every word is dispatched by tag; unknown tags are
//! skipped. The first samples after a configuration change are dropped (see
//! [`Lsm6dsv16bx::set_discard_samples`]).
//!
//! # Gyro-bias calibration
//!
//! [`Lsm6dsv16bx::start_calibration`] batches the SFLP gyro-bias output and
//! averages it with a [`CalibrationEstimator`]. On completion the estimate
//! becomes the active correction and is reported through
//! [`SampleHandler::on_calibration_result`].
//!
//! # FSM / MLC programs
//!
//! Register sequences exported as UCF lines are stored per slot with
//! [`Lsm6dsv16bx::configure_fsm`] and written by [`Lsm6dsv16bx::start_fsm`].
//!
//! # Scaling helpers
//!
//! Use [`accel_mg_per_lsb`] and [`gyro_mdps_per_lsb`] for the sensitivities,
//! or [`ScaleSelection`] for conversion functions chosen once per range.

#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::items_after_statements,
    clippy::large_stack_frames
)]

mod calibration;
mod config;
mod data;
mod decoder;
mod device;
mod driver;
mod error;
mod fsm;
mod handler;
mod interface;
mod interrupt;
mod macros;
mod register;

#[cfg(test)]
mod testing;

// Interface layer
pub use interface::Interface;
pub use interface::Lsm6dsv16bxAddress;
pub use interface::{I2cConfig, I2cInterface};
pub use interface::{SpiConfig, SpiInterface};

// Configuration
pub use config::{AccelConfig, AccelRange, GyroConfig, GyroRange};
pub use config::{AcquisitionConfig, Config, OutputDataRate, SflpOutputDataRate};

// Driver
pub use driver::{DEFAULT_DISCARD_SAMPLES, FIFO_BUFFER_WORDS};
pub use driver::{Lsm6dsv16bx, Lsm6dsv16bxI2c, Lsm6dsv16bxSpi, SensorState, SflpState};

// Data types
pub use data::{
    FIFO_WORD_LEN, FifoConfig, FifoMode, FifoStatus, FifoTag, FifoWord, FifoWordIterator,
    TimestampBatch,
};
pub use data::{
    QVAR_LSB_PER_MV, ScaleFn, ScaleSelection, accel_converter, accel_mg_per_lsb, convert_accel,
    convert_gyro, gyro_converter, gyro_mdps_per_lsb,
};
pub use data::{Quaternion, RawVector, TIMESTAMP_TICK_NS, Vector3, timestamp_ticks_to_ns};
pub use decoder::DecodeSummary;

// Features
pub use calibration::{
    CalibrationConfig, CalibrationError, CalibrationEstimator, CalibrationState, SessionId,
};
pub use error::Error;
pub use fsm::{FSM_SLOT_COUNT, FsmLoader, FsmSlot, HOOK_WRITE_CAPACITY, HookContext, PreHook, UcfLine};
pub use handler::{FsmEvent, SampleHandler};
pub use interrupt::{InterruptConfig, InterruptStatus, InterruptWaitError};
