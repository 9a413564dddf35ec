//! Gyroscope-bias calibration.
//!
//! A session discards `settle_samples` bias estimates while the sensor
//! warms up, then averages the next `target_samples` estimates. Sums are kept
//! in `f64` so hundreds of accumulated samples do not drift.

use crate::config::SflpOutputDataRate;
use crate::data::Vector3;

/// Calibration session sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    /// No session active.
    #[default]
    Idle,
    /// Discarding samples until the bias settles.
    Settling,
    /// Accumulating samples.
    Recording,
}

impl CalibrationState {
    /// Returns true while a session is settling or recording.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Calibration failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// The session completed without accumulating a single sample.
    NoSamples,
}

/// Identifies one calibration session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionId(pub u32);

/// Settle and record window, counted in gyro-bias samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// Samples discarded before averaging starts.
    pub settle_samples: u16,
    /// Samples averaged into the result.
    pub target_samples: u16,
}

impl CalibrationConfig {
    /// Default window: 2 s settle + 1 s record at the default 120 Hz SFLP rate.
    pub const DEFAULT: Self = Self::new(240, 120);

    /// Creates a configuration from sample counts.
    pub const fn new(settle_samples: u16, target_samples: u16) -> Self {
        Self {
            settle_samples,
            target_samples,
        }
    }

    /// Converts settle/record durations to sample counts at the SFLP rate.
    pub const fn from_durations(settle_ms: u32, record_ms: u32, rate: SflpOutputDataRate) -> Self {
        Self::new(
            samples_for(settle_ms, rate.hz_milli()),
            samples_for(record_ms, rate.hz_milli()),
        )
    }

    /// Sets the settle sample count.
    #[must_use]
    pub const fn with_settle_samples(mut self, samples: u16) -> Self {
        self.settle_samples = samples;
        self
    }

    /// Sets the target sample count.
    #[must_use]
    pub const fn with_target_samples(mut self, samples: u16) -> Self {
        self.target_samples = samples;
        self
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const fn samples_for(ms: u32, hz_milli: u32) -> u16 {
    let samples = ms as u64 * hz_milli as u64 / 1_000_000;
    if samples > u16::MAX as u64 {
        u16::MAX
    } else {
        samples as u16
    }
}

/// Averages gyro-bias samples over a settle-then-record window.
#[derive(Clone, Debug)]
pub struct CalibrationEstimator {
    config: CalibrationConfig,
    state: CalibrationState,
    session: SessionId,
    settled: u16,
    count: u32,
    sum: [f64; 3],
}

impl Default for CalibrationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationEstimator {
    /// Creates an idle estimator.
    pub const fn new() -> Self {
        Self {
            config: CalibrationConfig::DEFAULT,
            state: CalibrationState::Idle,
            session: SessionId(0),
            settled: 0,
            count: 0,
            sum: [0.0; 3],
        }
    }

    /// Returns the current sub-state.
    pub const fn state(&self) -> CalibrationState {
        self.state
    }

    /// Returns true while a session is settling or recording.
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Returns the number of samples accumulated in the current session.
    pub const fn samples(&self) -> u32 {
        self.count
    }

    /// Starts a new session, discarding any session in progress.
    pub fn start(&mut self, config: CalibrationConfig) -> SessionId {
        self.reset();
        self.config = config;
        self.session = SessionId(self.session.0.wrapping_add(1));
        self.state = if config.settle_samples == 0 {
            CalibrationState::Recording
        } else {
            CalibrationState::Settling
        };
        self.session
    }

    /// Feeds one gyro-bias sample.
    ///
    /// Returns the averaged bias once `target_samples` samples were recorded;
    /// the estimator is idle again afterwards.
    pub fn feed(&mut self, sample: Vector3) -> Option<Result<Vector3, CalibrationError>> {
        match self.state {
            CalibrationState::Idle => None,
            CalibrationState::Settling => {
                self.settled = self.settled.saturating_add(1);
                if self.settled >= self.config.settle_samples {
                    self.state = CalibrationState::Recording;
                }
                None
            }
            CalibrationState::Recording => {
                let target = u32::from(self.config.target_samples);
                if self.count < target {
                    self.sum[0] += f64::from(sample.x);
                    self.sum[1] += f64::from(sample.y);
                    self.sum[2] += f64::from(sample.z);
                    self.count += 1;
                }
                (self.count >= target).then(|| self.finish())
            }
        }
    }

    /// Discards the session without producing a result.
    pub fn abort(&mut self) {
        self.reset();
    }

    fn finish(&mut self) -> Result<Vector3, CalibrationError> {
        let count = self.count;
        let sum = self.sum;
        self.reset();
        if count == 0 {
            return Err(CalibrationError::NoSamples);
        }
        let n = f64::from(count);
        Ok(Vector3::new(
            (sum[0] / n) as f32,
            (sum[1] / n) as f32,
            (sum[2] / n) as f32,
        ))
    }

    fn reset(&mut self) {
        self.state = CalibrationState::Idle;
        self.settled = 0;
        self.count = 0;
        self.sum = [0.0; 3];
    }
}
