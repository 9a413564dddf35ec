//! Testing infrastructure (in-memory storage, acquisition recorder).

pub(crate) mod mock;

pub(crate) use mock::{Call, MemoryStorage, MockAcquisition};
