//! Idle / Recording / Calibrating sequencer.
//!
//! The machine consumes events from an [`EventQueue`] in a single loop. Each
//! wake-up handles every pending event in posting order before waiting again.
//! Entry and exit actions drive the sensor through [`Acquisition`] and the
//! session file through the [`Recorder`].

use ph_lsm6dsv16bx::{AcquisitionConfig, CalibrationConfig};

use crate::event::{ApplicationState, Event, EventQueue};
use crate::recorder::Recorder;
use crate::sensor::Acquisition;
use crate::storage::{Storage, StorageError};

/// Acquisition settings used on state entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecorderConfig {
    /// Channels and SFLP outputs enabled while recording.
    pub acquisition: AcquisitionConfig,
    /// Settle and record window of a calibration.
    pub calibration: CalibrationConfig,
}

impl RecorderConfig {
    /// Recording with SFLP outputs, default calibration window.
    pub const DEFAULT: Self = Self {
        acquisition: AcquisitionConfig::new().with_sflp(true),
        calibration: CalibrationConfig::DEFAULT,
    };

    /// Creates the default configuration.
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the recording acquisition flags.
    #[must_use]
    pub const fn with_acquisition(mut self, acquisition: AcquisitionConfig) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Sets the calibration window.
    #[must_use]
    pub const fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Application state machine.
pub struct StateMachine<'a, A, S: Storage> {
    events: &'a EventQueue,
    recorder: &'a Recorder<'a, S>,
    sensor: A,
    config: RecorderConfig,
    state: ApplicationState,
}

impl<'a, A, S> StateMachine<'a, A, S>
where
    A: Acquisition,
    S: Storage,
{
    /// Creates the machine in `Idle`.
    pub fn new(
        events: &'a EventQueue,
        recorder: &'a Recorder<'a, S>,
        sensor: A,
        config: RecorderConfig,
    ) -> Self {
        events.set_state(ApplicationState::Idle);
        Self {
            events,
            recorder,
            sensor,
            config,
            state: ApplicationState::Idle,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ApplicationState {
        self.state
    }

    /// Returns the acquisition backend.
    pub fn sensor(&self) -> &A {
        &self.sensor
    }

    /// Restores the stored gyro bias. A missing or unreadable record posts
    /// [`Event::StartCalibrating`] instead.
    pub async fn start(&mut self) {
        match self.recorder.load_calibration().await {
            Ok(record) => {
                info!("calibration restored: x={} y={} z={} dps", record.x, record.y, record.z);
                self.sensor.set_gbias(record.to_mdps()).await;
            }
            Err(StorageError::Absent) => {
                warn!("no calibration record, calibrating");
                self.events.post(Event::StartCalibrating);
            }
            Err(err) => {
                warn!("calibration record unusable ({}), calibrating", err);
                self.events.post(Event::StartCalibrating);
            }
        }
    }

    /// Runs forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.run_once().await;
        }
    }

    /// Waits for at least one event, then handles every pending event.
    pub async fn run_once(&mut self) {
        let event = self.events.next().await;
        self.handle(event).await;
        self.process_pending().await;
    }

    /// Handles the pending events without waiting; returns how many ran.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.try_next() {
            self.handle(event).await;
            handled += 1;
        }
        handled
    }

    /// Applies one event to the current state.
    pub async fn handle(&mut self, event: Event) {
        let next = match (self.state, event) {
            (ApplicationState::Idle, Event::StartRecording) => self.enter_recording().await,
            (ApplicationState::Recording, Event::StopRecording) => self.exit_recording().await,
            (ApplicationState::Idle, Event::StartCalibrating) => self.enter_calibrating().await,
            (ApplicationState::Calibrating, Event::CalibrationComplete) => {
                self.exit_calibrating().await
            }
            (state, event) => {
                warn!("event {} ignored in {}", event, state);
                return;
            }
        };
        if next != self.state {
            info!("state {} -> {}", self.state, next);
            self.state = next;
            self.events.set_state(next);
        }
    }

    async fn enter_recording(&mut self) -> ApplicationState {
        if let Err(err) = self.recorder.begin_session().await {
            error!("session file not created: {}", err);
            return ApplicationState::Idle;
        }
        match self.sensor.start_recording(self.config.acquisition).await {
            Ok(()) => ApplicationState::Recording,
            Err(err) => {
                error!("acquisition start failed: {}", err);
                self.recorder.end_session().await;
                ApplicationState::Idle
            }
        }
    }

    async fn exit_recording(&mut self) -> ApplicationState {
        if let Err(err) = self.sensor.stop().await {
            error!("acquisition stop failed: {}", err);
        }
        self.recorder.end_session().await;
        ApplicationState::Idle
    }

    async fn enter_calibrating(&mut self) -> ApplicationState {
        self.recorder.begin_calibration();
        match self.sensor.start_calibration(self.config.calibration).await {
            Ok(session) => {
                info!("calibration session {} started", session.0);
                ApplicationState::Calibrating
            }
            Err(err) => {
                error!("calibration start failed: {}", err);
                self.recorder.end_calibration();
                ApplicationState::Idle
            }
        }
    }

    async fn exit_calibrating(&mut self) -> ApplicationState {
        // Bias is already applied by the driver and persisted by the recorder.
        if let Err(err) = self.sensor.stop().await {
            error!("acquisition stop failed: {}", err);
        }
        ApplicationState::Idle
    }
}
