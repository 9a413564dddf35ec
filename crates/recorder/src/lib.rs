//! Session recording for LSM6DSV16BX wearables.
//!
//! This crate sits between the [`ph_lsm6dsv16bx`] driver and the firmware's
//! storage and radio collaborators:
//!
//! - [`Recorder`] is the driver's sample handler. While recording it
//!   aggregates timestamp, accelerometer and gyroscope samples into
//!   [`SessionLine`] rows and appends them to the session file; when a
//!   calibration completes it persists the [`CalibrationRecord`].
//! - [`EventQueue`] carries [`Event`]s from any context to the
//!   [`StateMachine`], which sequences Idle, Recording and Calibrating.
//! - [`Acquisition`] is the sensor surface the state machine drives; it is
//!   implemented for the driver and for a driver shared behind an async mutex
//!   ([`SharedSensor`]).
//!
//! # Storage failures
//!
//! A failed append stops aggregation and posts [`Event::StopRecording`], so
//! the session ends through the normal Recording exit path.

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
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]

#[macro_use]
mod fmt;

mod calibration_file;
mod event;
mod line;
mod recorder;
mod sensor;
mod state_machine;
mod storage;

#[cfg(test)]
mod testing;

pub use calibration_file::{CALIBRATION_LIMIT_DPS, CALIBRATION_RECORD_LEN, CalibrationRecord};
pub use event::{ApplicationState, EVENT_KINDS, Event, EventQueue};
pub use line::{ROW_CAPACITY, Row, SessionLine};
pub use recorder::{Recorder, Route};
pub use sensor::{Acquisition, SharedSensor};
pub use state_machine::{RecorderConfig, StateMachine};
pub use storage::{FILE_NAME_CAPACITY, FileName, Storage, StorageError};
pub use storage::{read_calibration, session_file_name, write_calibration};
