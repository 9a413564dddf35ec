//! Application events and the queue that carries them to the state machine.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Deque;

/// Number of distinct event kinds; the queue never holds more.
pub const EVENT_KINDS: usize = 4;

/// Discrete request posted to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Begin a recording session.
    StartRecording,
    /// End the recording session.
    StopRecording,
    /// Begin a gyro-bias calibration.
    StartCalibrating,
    /// The calibration session has finished.
    CalibrationComplete,
}

/// Top-level application state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApplicationState {
    /// Nothing is acquired.
    #[default]
    Idle,
    /// Samples are aggregated into the session file.
    Recording,
    /// Gyro-bias samples feed the calibration estimator.
    Calibrating,
}

/// Event queue shared by the posting contexts and the state machine.
///
/// Posting never blocks and may happen from any context. An event kind that
/// is already pending is not queued twice; distinct kinds keep their posting
/// order.
pub struct EventQueue {
    pending: Mutex<CriticalSectionRawMutex, RefCell<Deque<Event, EVENT_KINDS>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    state: Mutex<CriticalSectionRawMutex, Cell<ApplicationState>>,
}

impl EventQueue {
    /// Creates an empty queue in the `Idle` state.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Deque::new())),
            wake: Signal::new(),
            state: Mutex::new(Cell::new(ApplicationState::Idle)),
        }
    }

    /// Posts an event. Returns `false` when the same kind was already pending.
    pub fn post(&self, event: Event) -> bool {
        let queued = self.pending.lock(|pending| {
            let mut pending = pending.borrow_mut();
            if pending.iter().any(|queued| *queued == event) {
                return false;
            }
            // Capacity equals the number of kinds, so a new kind always fits.
            pending.push_back(event).is_ok()
        });
        if queued {
            trace!("event posted: {}", event);
            self.wake.signal(());
        }
        queued
    }

    /// Pops the oldest pending event without waiting.
    pub fn try_next(&self) -> Option<Event> {
        self.pending
            .lock(|pending| pending.borrow_mut().pop_front())
    }

    /// Waits until an event is pending and pops it.
    pub async fn next(&self) -> Event {
        loop {
            if let Some(event) = self.try_next() {
                return event;
            }
            self.wake.wait().await;
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.lock(|pending| pending.borrow().len())
    }

    /// Returns true if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the authoritative application state.
    pub fn current_state(&self) -> ApplicationState {
        self.state.lock(Cell::get)
    }

    pub(crate) fn set_state(&self, state: ApplicationState) {
        self.state.lock(|cell| cell.set(state));
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
