//! Routes decoded samples to the session file and the calibration record.
//!
//! Routing state lives behind a critical-section mutex and is only held for
//! bookkeeping. Storage calls run under a separate async mutex, so a slow
//! append never masks interrupts. The FIFO work context reaches the storage
//! with `try_lock`; contention is reported as [`StorageError::Busy`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use ph_lsm6dsv16bx::{CalibrationError, Quaternion, SampleHandler, Vector3};

use crate::calibration_file::CalibrationRecord;
use crate::event::{Event, EventQueue};
use crate::line::{Row, SessionLine};
use crate::storage::{self, Storage, StorageError, session_file_name};

/// What incoming samples are used for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// Samples are dropped.
    #[default]
    Idle,
    /// Samples are aggregated into session rows.
    Recording,
    /// A session write failed; samples are dropped until the session ends.
    Halted,
    /// A calibration result is awaited.
    Calibrating,
}

struct Routing {
    route: Route,
    line: SessionLine,
    next_session: u32,
}

struct Files<S: Storage> {
    storage: S,
    session: Option<S::File>,
}

/// Sample sink shared by the FIFO work context (as the driver's
/// [`SampleHandler`]) and the state machine.
pub struct Recorder<'a, S: Storage> {
    events: &'a EventQueue,
    routing: BlockingMutex<CriticalSectionRawMutex, RefCell<Routing>>,
    files: Mutex<CriticalSectionRawMutex, Files<S>>,
}

impl<'a, S: Storage> Recorder<'a, S> {
    /// Creates a recorder; the first session file is `SES00001.CSV`.
    pub const fn new(events: &'a EventQueue, storage: S) -> Self {
        Self {
            events,
            routing: BlockingMutex::new(RefCell::new(Routing {
                route: Route::Idle,
                line: SessionLine::new(),
                next_session: 1,
            })),
            files: Mutex::new(Files {
                storage,
                session: None,
            }),
        }
    }

    /// Sets the number of the next session file.
    pub fn set_next_session(&self, number: u32) {
        self.with_routing(|routing| routing.next_session = number);
    }

    /// Number of the next session file.
    pub fn next_session(&self) -> u32 {
        self.with_routing(|routing| routing.next_session)
    }

    /// Current routing of incoming samples.
    pub fn route(&self) -> Route {
        self.with_routing(|routing| routing.route)
    }

    /// Latest side-channel and row values.
    pub fn line(&self) -> SessionLine {
        self.with_routing(|routing| routing.line)
    }

    /// Runs `f` with exclusive access to the storage.
    pub async fn with_storage<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.files.lock().await.storage)
    }

    /// Creates the next session file and starts aggregating rows.
    pub async fn begin_session(&self) -> Result<(), StorageError> {
        let mut files = self.files.lock().await;
        let name = session_file_name(self.next_session());
        let file = files.storage.create_file(&name)?;
        info!("session file {} created", name.as_str());
        files.session = Some(file);
        drop(files);

        self.with_routing(|routing| {
            routing.next_session = routing.next_session.wrapping_add(1);
            routing.line.reset();
            routing.route = Route::Recording;
        });
        Ok(())
    }

    /// Stops aggregating and closes the session file.
    pub async fn end_session(&self) {
        self.with_routing(|routing| {
            routing.route = Route::Idle;
            routing.line.reset();
        });
        let mut files = self.files.lock().await;
        if let Some(file) = files.session.take()
            && let Err(err) = files.storage.close(file)
        {
            error!("session file close failed: {}", err);
        }
    }

    /// Routes the next calibration result to the calibration record.
    pub fn begin_calibration(&self) {
        self.with_routing(|routing| routing.route = Route::Calibrating);
    }

    /// Stops waiting for a calibration result.
    pub fn end_calibration(&self) {
        self.with_routing(|routing| {
            if routing.route == Route::Calibrating {
                routing.route = Route::Idle;
            }
        });
    }

    /// Reads the stored calibration record.
    pub async fn load_calibration(&self) -> Result<CalibrationRecord, StorageError> {
        storage::read_calibration(&mut self.files.lock().await.storage)
    }

    fn with_routing<R>(&self, f: impl FnOnce(&mut Routing) -> R) -> R {
        self.routing.lock(|routing| f(&mut routing.borrow_mut()))
    }

    fn try_files(&self) -> Result<MutexGuard<'_, CriticalSectionRawMutex, Files<S>>, StorageError> {
        self.files.try_lock().map_err(|_| StorageError::Busy)
    }

    fn append(&self, row: &Row) -> Result<(), StorageError> {
        let mut files = self.try_files()?;
        let Files { storage, session } = &mut *files;
        match session.as_mut() {
            Some(file) => storage.append(file, row.as_bytes()),
            None => Err(StorageError::Io),
        }
    }

    fn mark(&self, mark: impl FnOnce(&mut SessionLine) -> Option<Row>) {
        let row = self.with_routing(|routing| {
            if routing.route == Route::Recording {
                mark(&mut routing.line)
            } else {
                None
            }
        });
        let Some(row) = row else {
            return;
        };
        let Err(err) = self.append(&row) else {
            return;
        };
        // The session may have ended while the row was written.
        let halted = self.with_routing(|routing| {
            if routing.route != Route::Recording {
                return false;
            }
            routing.route = Route::Halted;
            true
        });
        if halted {
            error!("session append failed: {}", err);
            self.events.post(Event::StopRecording);
        }
    }

    fn side_channel(&self, set: impl FnOnce(&mut SessionLine)) {
        self.with_routing(|routing| {
            if routing.route == Route::Recording {
                set(&mut routing.line);
            }
        });
    }

    fn finish_calibration(&self, result: Result<Vector3, CalibrationError>) {
        let awaited = self.with_routing(|routing| {
            if routing.route != Route::Calibrating {
                return false;
            }
            routing.route = Route::Idle;
            true
        });
        if !awaited {
            return;
        }
        match result {
            Ok(bias) => {
                let record = CalibrationRecord::from_mdps(bias);
                info!("gyro bias x={} y={} z={} dps", record.x, record.y, record.z);
                let written = self
                    .try_files()
                    .and_then(|mut files| storage::write_calibration(&mut files.storage, record));
                if let Err(err) = written {
                    error!("calibration write failed: {}", err);
                }
            }
            Err(err) => error!("calibration failed: {}", err),
        }
        self.events.post(Event::CalibrationComplete);
    }
}

impl<S: Storage> SampleHandler for &Recorder<'_, S> {
    fn on_timestamp(&mut self, ns: u64) {
        self.mark(|line| line.mark_timestamp(ns));
    }

    fn on_accel(&mut self, sample: Vector3) {
        self.mark(|line| line.mark_accel(sample));
    }

    fn on_gyro(&mut self, sample: Vector3) {
        self.mark(|line| line.mark_gyro(sample));
    }

    fn on_gyro_bias(&mut self, sample: Vector3) {
        trace!("gbias {} {} {}", sample.x, sample.y, sample.z);
        self.side_channel(|line| line.set_gyro_bias(sample));
    }

    fn on_game_rotation(&mut self, rotation: Quaternion) {
        trace!("game rotation {} {} {} {}", rotation.w, rotation.x, rotation.y, rotation.z);
        self.side_channel(|line| line.set_game_rotation(rotation));
    }

    fn on_gravity(&mut self, gravity: Vector3) {
        trace!("gravity {} {} {}", gravity.x, gravity.y, gravity.z);
        self.side_channel(|line| line.set_gravity(gravity));
    }

    fn on_calibration_result(&mut self, result: Result<Vector3, CalibrationError>) {
        self.finish_calibration(result);
    }

    fn on_significant_motion(&mut self) {
        info!("significant motion");
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::testing::MemoryStorage;
    use futures::executor::block_on;

    fn feed_row<H: SampleHandler>(mut handler: H, ns: u64) {
        handler.on_timestamp(ns);
        handler.on_accel(Vector3::new(100.0, 200.0, 300.0));
        handler.on_gyro(Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rows_are_appended_while_recording() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        block_on(recorder.begin_session()).expect("session");

        feed_row(&recorder, 1_000_000);
        feed_row(&recorder, 2_000_000);
        block_on(recorder.end_session());

        block_on(recorder.with_storage(|storage| {
            assert_eq!(
                storage.file("SES00001.CSV"),
                Some(&b"1.000,100,200,300,1,2,3\n2.000,100,200,300,1,2,3\n"[..])
            );
            assert!(storage.is_closed("SES00001.CSV"));
        }));
        assert_eq!(recorder.next_session(), 2);
        assert!(events.is_empty());
    }

    #[test]
    fn samples_outside_a_session_are_dropped() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        feed_row(&recorder, 1_000_000);
        block_on(recorder.with_storage(|storage| assert_eq!(storage.file_count(), 0)));
    }

    #[test]
    fn append_failure_posts_stop_once() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        block_on(recorder.begin_session()).expect("session");
        block_on(recorder.with_storage(|storage| storage.fail_appends(true)));

        feed_row(&recorder, 1_000_000);
        assert_eq!(events.try_next(), Some(Event::StopRecording));
        assert_eq!(recorder.route(), Route::Halted);

        feed_row(&recorder, 2_000_000);
        assert!(events.is_empty());
        block_on(recorder.with_storage(|storage| {
            assert_eq!(storage.file("SES00001.CSV"), Some(&b""[..]));
        }));
    }

    #[test]
    fn contended_storage_halts_the_session() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        block_on(recorder.begin_session()).expect("session");

        let guard = block_on(recorder.files.lock());
        feed_row(&recorder, 1_000_000);
        drop(guard);

        assert_eq!(recorder.route(), Route::Halted);
        assert_eq!(events.try_next(), Some(Event::StopRecording));
    }

    #[test]
    fn create_failure_is_reported() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        block_on(recorder.with_storage(|storage| storage.fail_creates(true)));

        assert_eq!(block_on(recorder.begin_session()), Err(StorageError::Io));
        assert_eq!(recorder.route(), Route::Idle);
        assert_eq!(recorder.next_session(), 1);
    }

    /// Storage whose append checks that another thread can still enter a
    /// critical section while the write is in progress.
    #[derive(Default)]
    struct InterruptCheckStorage {
        appends: usize,
        blocked: bool,
    }

    impl Storage for InterruptCheckStorage {
        type File = ();

        fn create_file(&mut self, _name: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn append(&mut self, _file: &mut (), _bytes: &[u8]) -> Result<(), StorageError> {
            let (done, finished) = mpsc::channel();
            thread::spawn(move || {
                critical_section::with(|_| ());
                let _ = done.send(());
            });
            self.appends += 1;
            self.blocked |= finished.recv_timeout(Duration::from_millis(200)).is_err();
            Ok(())
        }

        fn close(&mut self, _file: ()) -> Result<(), StorageError> {
            Ok(())
        }

        fn read_calibration(&mut self, _buffer: &mut [u8]) -> Result<usize, StorageError> {
            Err(StorageError::Absent)
        }

        fn write_calibration(&mut self, _bytes: &[u8]) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn append_runs_outside_the_critical_section() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, InterruptCheckStorage::default());
        block_on(recorder.begin_session()).expect("session");

        feed_row(&recorder, 1_000_000);

        let (appends, blocked) =
            block_on(recorder.with_storage(|storage| (storage.appends, storage.blocked)));
        assert_eq!(appends, 1);
        assert!(!blocked);
        assert_eq!(recorder.route(), Route::Recording);
    }

    #[test]
    fn calibration_result_is_persisted() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        recorder.begin_calibration();

        let mut handler = &recorder;
        handler.on_calibration_result(Ok(Vector3::new(300.0, -120.0, 0.0)));

        block_on(recorder.with_storage(|storage| {
            assert_eq!(
                storage.calibration(),
                Some(&b"x:+0.30\ny:-0.12\nz:+0.00"[..])
            );
        }));
        assert_eq!(events.try_next(), Some(Event::CalibrationComplete));
        assert_eq!(recorder.route(), Route::Idle);
    }

    #[test]
    fn failed_calibration_keeps_previous_record() {
        let events = EventQueue::new();
        let mut storage = MemoryStorage::default();
        storage.set_calibration(b"x:+0.10\ny:+0.10\nz:+0.10");
        let recorder = Recorder::new(&events, storage);
        recorder.begin_calibration();

        let mut handler = &recorder;
        handler.on_calibration_result(Err(CalibrationError::NoSamples));

        assert_eq!(
            block_on(recorder.load_calibration()),
            Ok(CalibrationRecord::new(0.1, 0.1, 0.1))
        );
        assert_eq!(events.try_next(), Some(Event::CalibrationComplete));
    }

    #[test]
    fn unexpected_calibration_result_is_ignored() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        let mut handler = &recorder;
        handler.on_calibration_result(Ok(Vector3::ZERO));
        assert!(events.is_empty());
        block_on(recorder.with_storage(|storage| assert_eq!(storage.calibration(), None)));
    }

    #[test]
    fn side_channels_update_while_recording() {
        let events = EventQueue::new();
        let recorder = Recorder::new(&events, MemoryStorage::default());
        block_on(recorder.begin_session()).expect("session");
        let mut handler = &recorder;
        handler.on_gravity(Vector3::new(0.0, 0.0, 1000.0));
        assert_eq!(recorder.line().gravity(), Vector3::new(0.0, 0.0, 1000.0));
    }
}
