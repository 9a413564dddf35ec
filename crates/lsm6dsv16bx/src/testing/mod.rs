//! Testing infrastructure (mock interfaces, delays, handlers).

pub(crate) mod mock;

pub(crate) use mock::{MockDelay, MockInterface, RecordingHandler, fifo_word};
