//! LSM6DSV16BX driver: the sensor context.
//!
//! [`Lsm6dsv16bx`] owns the bus interface, the channel-enable flags, the
//! scale selection, the gyro-bias correction, the calibration estimator, the
//! FSM slot table and the sample handler. Every operation takes `&mut self`,
//! so configuration changes and FIFO decoding never interleave.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::SpiDevice;

use crate::calibration::{CalibrationConfig, CalibrationEstimator, CalibrationState, SessionId};
use crate::config::{AcquisitionConfig, Config};
use crate::data::{FIFO_WORD_LEN, FifoConfig, FifoMode, ScaleSelection, Vector3};
use crate::decoder::{DecodeSummary, FifoDecoder, dispatch_embedded_events};
use crate::device::DeviceCore;
use crate::error::Error;
use crate::fsm::{FSM_SLOT_COUNT, FsmLoader, FsmSlot};
use crate::handler::SampleHandler;
use crate::interface::Interface;
use crate::interface::{I2cConfig, I2cInterface};
use crate::interface::{SpiConfig, SpiInterface};
use crate::interrupt::{InterruptConfig, InterruptStatus, InterruptWaitError};
use crate::register::Register;
use crate::register::all_int_src;

/// FIFO words read per drain.
pub const FIFO_BUFFER_WORDS: usize = 256;

/// Sensor samples dropped after a channel or scale change.
pub const DEFAULT_DISCARD_SAMPLES: u8 = 2;

const FIFO_BUFFER_LEN: usize = FIFO_BUFFER_WORDS * FIFO_WORD_LEN;

/// SFLP output flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SflpState {
    /// Gyro-bias estimate batched in FIFO.
    pub gbias: bool,
    /// Game rotation batched in FIFO.
    pub game_rotation: bool,
    /// Gravity batched in FIFO.
    pub gravity: bool,
}

/// Channel and function enable flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorState {
    /// Accelerometer running.
    pub accel: bool,
    /// Gyroscope running.
    pub gyro: bool,
    /// QVAR channel running.
    pub qvar: bool,
    /// SFLP outputs.
    pub sflp: SflpState,
    /// Significant motion detection armed.
    pub significant_motion: bool,
    /// FSM programs armed.
    pub fsm: bool,
    /// INT2 sources mirrored on INT1.
    pub int2_on_int1: bool,
}

impl SensorState {
    /// FIFO acquisition runs both channels; the accelerometer alone only
    /// feeds embedded functions.
    const fn acquiring(self) -> bool {
        self.accel && self.gyro
    }

    const fn embedded_armed(self) -> bool {
        self.significant_motion || self.fsm
    }
}

/// LSM6DSV16BX 6-axis IMU driver.
pub struct Lsm6dsv16bx<I, H = (), INT1 = ()> {
    core: DeviceCore<I>,
    handler: H,
    int1: Option<INT1>,
    config: Config,
    fifo: FifoConfig,
    interrupt: InterruptConfig,
    state: SensorState,
    scale: ScaleSelection,
    discard: u8,
    discard_samples: u8,
    gbias: Vector3,
    estimator: CalibrationEstimator,
    fsm: FsmLoader,
    buffer: [u8; FIFO_BUFFER_LEN],
}

/// I2C type alias for the LSM6DSV16BX driver.
pub type Lsm6dsv16bxI2c<I2C, H = (), INT1 = ()> = Lsm6dsv16bx<I2cInterface<I2C>, H, INT1>;
/// SPI type alias for the LSM6DSV16BX driver.
pub type Lsm6dsv16bxSpi<SPI, H = (), INT1 = ()> = Lsm6dsv16bx<SpiInterface<SPI>, H, INT1>;

impl<I2C, H, INT1> Lsm6dsv16bx<I2cInterface<I2C>, H, INT1>
where
    I2C: I2c,
    H: SampleHandler,
{
    /// Creates a new I2C-based driver with default settings.
    pub fn new_i2c(i2c: I2C, handler: H, int1: Option<INT1>) -> Self {
        Self::with_i2c_config(i2c, handler, int1, Config::default(), I2cConfig::default())
    }

    /// Creates a new I2C-based driver with a custom configuration.
    pub fn with_i2c_config(
        i2c: I2C,
        handler: H,
        int1: Option<INT1>,
        config: Config,
        i2c_config: I2cConfig,
    ) -> Self {
        let interface = I2cInterface::new(i2c, i2c_config.address);
        let core = DeviceCore::new(interface, i2c_config.interface_settings());
        Self::from_core(core, handler, int1, config)
    }

    /// Updates the I2C address used by the interface.
    pub fn set_i2c_address(&mut self, address: u8) {
        self.core.set_i2c_address(address);
    }

    /// Attempts initialization for one or more I2C addresses and returns the
    /// address that answered.
    pub async fn init_with_addresses<D: DelayNs>(
        &mut self,
        delay: &mut D,
        addresses: &[u8],
    ) -> Result<u8, Error> {
        let mut last_err = None;
        for &address in addresses {
            self.set_i2c_address(address);
            match self.init(delay).await {
                Ok(()) => return Ok(address),
                Err(Error::WrongDevice) => return Err(Error::WrongDevice),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(Error::NotPresent))
    }

    /// Releases the I2C bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.core.release().release()
    }

    /// Releases the I2C bus and interrupt pin, consuming the driver.
    pub fn release_with_int1(self) -> (I2C, Option<INT1>) {
        let interface = self.core.release();
        (interface.release(), self.int1)
    }
}

impl<SPI, H, INT1> Lsm6dsv16bx<SpiInterface<SPI>, H, INT1>
where
    SPI: SpiDevice,
    H: SampleHandler,
{
    /// Creates a new SPI-based driver with default settings.
    pub fn new_spi(spi: SPI, handler: H, int1: Option<INT1>) -> Self {
        Self::with_spi_config(spi, handler, int1, Config::default(), SpiConfig::default())
    }

    /// Creates a new SPI-based driver with a custom configuration.
    pub fn with_spi_config(
        spi: SPI,
        handler: H,
        int1: Option<INT1>,
        config: Config,
        spi_config: SpiConfig,
    ) -> Self {
        let interface = SpiInterface::new(spi);
        let core = DeviceCore::new(interface, spi_config.interface_settings());
        Self::from_core(core, handler, int1, config)
    }

    /// Releases the SPI device, consuming the driver.
    pub fn release(self) -> SPI {
        self.core.release().release()
    }

    /// Releases the SPI device and interrupt pin, consuming the driver.
    pub fn release_with_int1(self) -> (SPI, Option<INT1>) {
        let interface = self.core.release();
        (interface.release(), self.int1)
    }
}

impl<I, H, INT1> Lsm6dsv16bx<I, H, INT1>
where
    I: Interface,
    H: SampleHandler,
{
    fn from_core(core: DeviceCore<I>, handler: H, int1: Option<INT1>, config: Config) -> Self {
        Self {
            core,
            handler,
            int1,
            config,
            fifo: FifoConfig::DEFAULT,
            interrupt: InterruptConfig::DEFAULT,
            state: SensorState::default(),
            scale: ScaleSelection::new(config.accel.range, config.gyro.range),
            discard: 0,
            discard_samples: DEFAULT_DISCARD_SAMPLES,
            gbias: Vector3::ZERO,
            estimator: CalibrationEstimator::new(),
            fsm: FsmLoader::new(),
            buffer: [0u8; FIFO_BUFFER_LEN],
        }
    }

    /// Returns the sensor configuration.
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Updates the sensor configuration and the cached conversion functions.
    ///
    /// Ranges reach the device on the next [`apply_config`](Self::apply_config)
    /// or acquisition start.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.scale = ScaleSelection::new(config.accel.range, config.gyro.range);
    }

    /// Writes the configured ranges and re-arms the discard counter.
    pub async fn apply_config(&mut self) -> Result<(), Error> {
        self.core.apply_scale(self.config).await?;
        self.discard = self.discard_samples;
        Ok(())
    }

    /// Returns the channel and function flags.
    pub const fn state(&self) -> SensorState {
        self.state
    }

    /// Returns the active scale selection.
    pub const fn scale(&self) -> &ScaleSelection {
        &self.scale
    }

    /// Returns the calibration sub-state.
    pub const fn calibration_state(&self) -> CalibrationState {
        self.estimator.state()
    }

    /// Sets how many sensor samples are dropped after a configuration change.
    pub fn set_discard_samples(&mut self, samples: u8) {
        self.discard_samples = samples;
    }

    /// Returns the sample handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the sample handler mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Initializes the device: software reset, WHO_AM_I check, interface
    /// settings, ranges and timestamp counter. All channels stay off.
    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.core.soft_reset(delay).await?;
        self.core.verify_device().await?;
        self.configure_base().await
    }

    /// Resets the device and clears the sensor context.
    ///
    /// The gyro-bias correction and the FSM slot table survive a reset; the
    /// slots must be committed again with [`start_fsm`](Self::start_fsm).
    pub async fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.core.soft_reset(delay).await?;
        self.configure_base().await
    }

    async fn configure_base(&mut self) -> Result<(), Error> {
        self.state = SensorState::default();
        self.discard = 0;
        self.estimator.abort();
        self.core.apply_interface_settings().await?;
        self.core.apply_scale(self.config).await?;
        self.core.set_timestamp(true).await
    }

    /// Stores the interrupt routing; INT2-on-INT1 aliasing is written now, the
    /// FIFO routes when acquisition starts.
    pub async fn apply_interrupt_config(&mut self, config: InterruptConfig) -> Result<(), Error> {
        self.core.set_int2_on_int1(config.int2_on_int1).await?;
        self.interrupt = config;
        self.state.int2_on_int1 = config.int2_on_int1;
        if self.state.acquiring() {
            self.core
                .set_int1_routing(config.int1_ctrl_value())
                .await?;
        }
        Ok(())
    }

    /// Stores the FIFO configuration and writes the watermark.
    pub async fn apply_fifo_config(&mut self, config: FifoConfig) -> Result<(), Error> {
        self.fifo = config;
        self.core
            .write_reg(Register::FifoCtrl1, config.watermark)
            .await
    }

    /// Starts accelerometer + gyroscope acquisition through the FIFO.
    ///
    /// The FIFO watermark is routed to INT1 as the last step, after every
    /// channel flag and the discard counter are in place.
    pub async fn start_acquisition(&mut self, acquisition: AcquisitionConfig) -> Result<(), Error> {
        self.core.apply_scale(self.config).await?;
        self.core.apply_sflp(self.config, acquisition).await?;
        self.core.set_qvar(acquisition.qvar).await?;
        self.core
            .apply_fifo(self.fifo, self.config, self.fifo.mode)
            .await?;
        self.core.set_timestamp(true).await?;
        self.core.set_channels(self.config, true, true).await?;

        self.state.accel = true;
        self.state.gyro = true;
        self.state.qvar = acquisition.qvar;
        self.state.sflp = SflpState {
            gbias: acquisition.gbias,
            game_rotation: acquisition.sflp,
            gravity: acquisition.sflp,
        };
        self.discard = self.discard_samples;

        self.core
            .set_int1_routing(self.interrupt.int1_ctrl_value())
            .await
    }

    /// Stops acquisition. The INT1 FIFO route is removed first so no
    /// further watermark fires while the channels shut down.
    ///
    /// The accelerometer keeps running while significant motion detection
    /// or an FSM program is armed.
    pub async fn stop_acquisition(&mut self) -> Result<(), Error> {
        self.core.set_int1_routing(0).await?;
        let keep_accel = self.state.embedded_armed();
        self.state.accel = keep_accel;
        self.state.gyro = false;
        self.state.qvar = false;
        self.state.sflp = SflpState::default();

        self.core.set_channels(self.config, keep_accel, false).await?;
        self.core
            .apply_fifo(self.fifo, self.config, FifoMode::Bypass)
            .await?;
        self.core.set_qvar(false).await?;
        self.core
            .apply_sflp(self.config, AcquisitionConfig::new())
            .await
    }

    /// Starts a gyro-bias calibration session.
    ///
    /// Acquisition runs with only the SFLP gyro-bias output batched; bias
    /// samples feed the estimator until it completes or is aborted.
    pub async fn start_calibration(
        &mut self,
        config: CalibrationConfig,
    ) -> Result<SessionId, Error> {
        let session = self.estimator.start(config);
        if let Err(err) = self
            .start_acquisition(AcquisitionConfig::new().with_gbias(true))
            .await
        {
            self.estimator.abort();
            return Err(err);
        }
        Ok(session)
    }

    /// Aborts a calibration session (if any) and stops acquisition.
    pub async fn abort_calibration(&mut self) -> Result<(), Error> {
        self.estimator.abort();
        self.stop_acquisition().await
    }

    /// Enables significant motion detection on INT1.
    ///
    /// The accelerometer is powered if no acquisition is running.
    pub async fn start_significant_motion_detection(&mut self) -> Result<(), Error> {
        self.power_accel().await?;
        self.core.enable_significant_motion().await?;
        self.state.significant_motion = true;
        Ok(())
    }

    /// Stores the program of FSM slot `index`.
    pub fn configure_fsm(&mut self, index: usize, slot: FsmSlot) -> Result<(), Error> {
        self.fsm.configure(index, slot)
    }

    /// Writes every configured FSM slot and arms the listed ones. Arming
    /// powers the accelerometer if no acquisition is running.
    ///
    /// On a slot write failure returns [`Error::FsmSlot`]; earlier slots stay
    /// written and nothing is armed.
    pub async fn start_fsm(&mut self, slots: &[u8]) -> Result<(), Error> {
        let mut mask = 0u8;
        for &slot in slots {
            if usize::from(slot) >= FSM_SLOT_COUNT {
                return Err(Error::SlotOutOfRange);
            }
            mask |= 1 << slot;
        }
        self.fsm.commit(&mut self.core).await?;
        if mask != 0 {
            self.power_accel().await?;
        }
        self.fsm.enable(&mut self.core, mask).await?;
        self.core.route_embedded_to_int1().await?;
        self.state.fsm = mask != 0;
        Ok(())
    }

    async fn power_accel(&mut self) -> Result<(), Error> {
        if !self.state.accel {
            self.core
                .set_channels(self.config, true, self.state.gyro)
                .await?;
            self.state.accel = true;
        }
        Ok(())
    }

    /// Returns the mask of armed FSM slots.
    pub const fn fsm_armed(&self) -> u8 {
        self.fsm.armed()
    }

    /// Sets the gyro-bias correction (milli-deg/s) subtracted from every
    /// gyroscope sample.
    pub fn set_gbias(&mut self, bias: Vector3) {
        self.gbias = bias;
    }

    /// Returns the active gyro-bias correction (milli-deg/s).
    pub const fn gbias(&self) -> Vector3 {
        self.gbias
    }

    /// Services INT1: drains the FIFO and dispatches embedded-function
    /// events.
    pub async fn handle_interrupt(&mut self) -> Result<InterruptStatus, Error> {
        let fifo = self.core.fifo_status().await?;
        let (all_int_src_reg, emb_status, fsm_status) =
            if self.state.significant_motion || self.state.fsm {
                let all = self.core.read_reg(Register::AllIntSrc).await?;
                if (all & all_int_src::EMB_FUNC_IA) != 0 {
                    let (emb, fsm) = self.core.read_embedded_status().await?;
                    (all, emb, fsm)
                } else {
                    (all, 0, 0)
                }
            } else {
                (0, 0, 0)
            };
        let status = InterruptStatus::from_regs(fifo, all_int_src_reg, emb_status, fsm_status);

        if status.fifo_pending() && self.state.acquiring() {
            self.drain_fifo().await?;
        }
        if status.embedded {
            let significant_motion = status.significant_motion && self.state.significant_motion;
            dispatch_embedded_events(
                &mut self.handler,
                significant_motion,
                status.fsm,
                self.fsm.armed(),
            );
        }
        Ok(status)
    }

    /// Reads the unread FIFO words (up to [`FIFO_BUFFER_WORDS`]) and decodes
    /// them. A read failure is returned without retry; words already read in
    /// this batch are dropped.
    pub async fn drain_fifo(&mut self) -> Result<DecodeSummary, Error> {
        let status = self.core.fifo_status().await?;
        let words = usize::from(status.unread_words).min(FIFO_BUFFER_WORDS);
        let len = words * FIFO_WORD_LEN;
        for word in self.buffer[..len].chunks_exact_mut(FIFO_WORD_LEN) {
            self.core.read_fifo_word(word).await?;
        }
        let summary = FifoDecoder {
            scale: &self.scale,
            discard: &mut self.discard,
            gbias: &mut self.gbias,
            estimator: &mut self.estimator,
            handler: &mut self.handler,
        }
        .decode(&self.buffer[..len]);
        Ok(summary)
    }

    /// Waits for INT1 to go high.
    pub async fn wait_int1_high(&mut self) -> Result<(), InterruptWaitError<INT1::Error>>
    where
        INT1: Wait,
    {
        match self.int1.as_mut() {
            Some(pin) => pin.wait_for_high().await.map_err(InterruptWaitError::Pin),
            None => Err(InterruptWaitError::Missing),
        }
    }

    /// Waits for a rising edge on INT1.
    pub async fn wait_int1_rising_edge(&mut self) -> Result<(), InterruptWaitError<INT1::Error>>
    where
        INT1: Wait,
    {
        match self.int1.as_mut() {
            Some(pin) => pin
                .wait_for_rising_edge()
                .await
                .map_err(InterruptWaitError::Pin),
            None => Err(InterruptWaitError::Missing),
        }
    }

    /// Takes the INT1 pin out of the driver, e.g. to wait on it without
    /// holding the driver.
    pub fn take_int1(&mut self) -> Option<INT1> {
        self.int1.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccelConfig, AccelRange, OutputDataRate};
    use crate::data::convert_accel;
    use crate::fsm::UcfLine;
    use crate::interface::InterfaceSettings;
    use crate::register::{EmbRegister, ctrl3, emb_func_status, int1_ctrl};
    use crate::testing::{MockDelay, MockInterface, RecordingHandler, fifo_word};
    use futures::executor::block_on;

    type TestDriver = Lsm6dsv16bx<MockInterface, RecordingHandler, ()>;

    fn driver(interface: MockInterface) -> TestDriver {
        let core = DeviceCore::new(interface, InterfaceSettings::default());
        Lsm6dsv16bx::from_core(core, RecordingHandler::default(), None, Config::new())
    }

    fn mock(driver: &TestDriver) -> &MockInterface {
        driver.core.interface()
    }

    fn mock_mut(driver: &mut TestDriver) -> &mut MockInterface {
        driver.core.interface_mut()
    }

    #[test]
    fn init_resets_verifies_and_configures() {
        let interface = MockInterface::default().with_reg(Register::WhoAmI.addr(), 0x71);
        let mut imu = driver(interface);
        let mut delay = MockDelay::default();

        block_on(imu.init(&mut delay)).expect("init");

        let writes = mock(&imu).writes();
        assert_eq!(writes[0], (Register::Ctrl3.addr(), ctrl3::SW_RESET));
        assert!(writes.contains(&(Register::Ctrl3.addr(), ctrl3::BDU | ctrl3::IF_INC)));
        assert_eq!(imu.state(), SensorState::default());
        assert_eq!(delay.last_ns, Some(10_000_000));
    }

    #[test]
    fn init_rejects_wrong_device() {
        let interface = MockInterface::default().with_reg(Register::WhoAmI.addr(), 0x70);
        let mut imu = driver(interface);
        let mut delay = MockDelay::default();
        assert_eq!(block_on(imu.init(&mut delay)), Err(Error::WrongDevice));
    }

    #[test]
    fn start_acquisition_routes_int1_last() {
        let mut imu = driver(MockInterface::default());
        let acquisition = AcquisitionConfig::new().with_sflp(true).with_qvar(true);

        block_on(imu.start_acquisition(acquisition)).expect("start");

        let state = imu.state();
        assert!(state.accel && state.gyro && state.qvar);
        assert!(state.sflp.game_rotation && state.sflp.gravity && !state.sflp.gbias);
        assert_eq!(
            mock(&imu).writes().last(),
            Some(&(Register::Int1Ctrl.addr(), int1_ctrl::INT1_FIFO_TH))
        );
        assert_ne!(mock(&imu).reg(Register::Ctrl1.addr()), 0);
        assert_ne!(mock(&imu).reg(Register::Ctrl2.addr()), 0);
    }

    #[test]
    fn stop_acquisition_disables_interrupt_first() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_acquisition(AcquisitionConfig::new())).expect("start");
        mock_mut(&mut imu).clear_writes();

        block_on(imu.stop_acquisition()).expect("stop");

        assert_eq!(mock(&imu).writes()[0], (Register::Int1Ctrl.addr(), 0));
        assert_eq!(mock(&imu).reg(Register::Ctrl1.addr()), 0);
        assert_eq!(mock(&imu).reg(Register::Ctrl2.addr()), 0);
        assert!(!imu.state().accel && !imu.state().gyro);
    }

    #[test]
    fn drain_fifo_discards_then_delivers() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_acquisition(AcquisitionConfig::new())).expect("start");
        for _ in 0..DEFAULT_DISCARD_SAMPLES {
            mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 0, 0, 0));
        }
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x04, 0, 0, 0));
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 1000, 0, 0));
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x01, 0, 10, 0));

        let summary = block_on(imu.drain_fifo()).expect("drain");

        assert_eq!(summary.words, 5);
        assert_eq!(summary.discarded, u16::from(DEFAULT_DISCARD_SAMPLES));
        assert_eq!(mock(&imu).fifo_len(), 0);
        assert_eq!(imu.handler().timestamps.len(), 1);
        assert_eq!(imu.handler().accel.len(), 1);
        assert_eq!(imu.handler().gyro.len(), 1);
    }

    #[test]
    fn scale_change_rearms_discard_and_switches_conversion() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_acquisition(AcquisitionConfig::new())).expect("start");
        for _ in 0..DEFAULT_DISCARD_SAMPLES {
            mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 0, 0, 0));
        }
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 1000, 0, 0));
        block_on(imu.drain_fifo()).expect("drain");
        assert_eq!(imu.handler().accel.len(), 1);

        let config = imu
            .config()
            .with_accel_config(AccelConfig::new(AccelRange::G2, OutputDataRate::Hz120));
        imu.set_config(config);
        block_on(imu.apply_config()).expect("apply");
        assert_eq!(imu.scale().accel_range(), AccelRange::G2);

        for _ in 0..DEFAULT_DISCARD_SAMPLES {
            mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 500, 0, 0));
        }
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 1000, 0, 0));
        let summary = block_on(imu.drain_fifo()).expect("drain");

        assert_eq!(summary.discarded, u16::from(DEFAULT_DISCARD_SAMPLES));
        assert_eq!(
            imu.handler().accel,
            [
                Vector3::new(convert_accel(1000, AccelRange::G16), 0.0, 0.0),
                Vector3::new(convert_accel(1000, AccelRange::G2), 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn drain_fifo_reports_read_failure() {
        let mut imu = driver(MockInterface::default());
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x02, 1, 1, 1));
        mock_mut(&mut imu).fail_reads(true);

        assert_eq!(block_on(imu.drain_fifo()), Err(Error::Bus));
        assert!(imu.handler().accel.is_empty());
    }

    #[test]
    fn calibration_applies_bias_and_reports() {
        let mut imu = driver(MockInterface::default());
        imu.set_discard_samples(0);
        block_on(imu.start_calibration(CalibrationConfig::new(0, 2))).expect("start");
        assert_eq!(imu.calibration_state(), CalibrationState::Recording);
        assert!(imu.state().sflp.gbias);

        mock_mut(&mut imu).push_fifo_word(fifo_word(0x16, 2, 2, 2));
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x16, 2, 2, 2));
        let summary = block_on(imu.drain_fifo()).expect("drain");

        assert!(summary.calibration_done);
        assert_eq!(imu.gbias(), Vector3::new(8.75, 8.75, 8.75));
        assert_eq!(imu.handler().calibration, [Ok(Vector3::new(8.75, 8.75, 8.75))]);
        assert_eq!(imu.calibration_state(), CalibrationState::Idle);
    }

    #[test]
    fn abort_calibration_produces_no_result() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_calibration(CalibrationConfig::new(0, 2))).expect("start");
        block_on(imu.abort_calibration()).expect("abort");

        mock_mut(&mut imu).push_fifo_word(fifo_word(0x16, 2, 2, 2));
        mock_mut(&mut imu).push_fifo_word(fifo_word(0x16, 2, 2, 2));
        block_on(imu.drain_fifo()).expect("drain");

        assert!(imu.handler().calibration.is_empty());
        assert_eq!(imu.handler().gyro_bias.len(), 2);
        assert_eq!(imu.gbias(), Vector3::ZERO);
    }

    #[test]
    fn failed_start_leaves_calibration_idle() {
        let mut imu = driver(MockInterface::default());
        mock_mut(&mut imu).fail_writes_to(Register::Ctrl1.addr());
        assert_eq!(
            block_on(imu.start_calibration(CalibrationConfig::DEFAULT)),
            Err(Error::Bus)
        );
        assert_eq!(imu.calibration_state(), CalibrationState::Idle);
    }

    #[test]
    fn significant_motion_is_dispatched_from_interrupt() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_significant_motion_detection()).expect("sigmot");
        assert!(imu.state().significant_motion && imu.state().accel);

        mock_mut(&mut imu).set_reg(Register::AllIntSrc.addr(), all_int_src::EMB_FUNC_IA);
        mock_mut(&mut imu).set_emb_reg(EmbRegister::EmbFuncStatus.addr(), emb_func_status::IS_SIGMOT);

        let status = block_on(imu.handle_interrupt()).expect("irq");

        assert!(status.significant_motion);
        assert_eq!(imu.handler().significant_motion, 1);
        assert_eq!(mock(&imu).reg(Register::FuncCfgAccess.addr()), 0);
    }

    #[test]
    fn stop_keeps_accel_for_significant_motion() {
        let mut imu = driver(MockInterface::default());
        block_on(imu.start_significant_motion_detection()).expect("sigmot");
        block_on(imu.start_acquisition(AcquisitionConfig::new())).expect("start");

        block_on(imu.stop_acquisition()).expect("stop");

        let state = imu.state();
        assert!(state.significant_motion && state.accel && !state.gyro);
        assert_ne!(mock(&imu).reg(Register::Ctrl1.addr()), 0);
        assert_eq!(mock(&imu).reg(Register::Ctrl2.addr()), 0);
        assert_eq!(mock(&imu).reg(Register::Int1Ctrl.addr()), 0);
    }

    #[test]
    fn armed_fsm_powers_accel_and_survives_stop() {
        static PROGRAM: [UcfLine; 1] = [UcfLine::new(0x01, 0x80)];
        let mut imu = driver(MockInterface::default());
        imu.configure_fsm(0, FsmSlot::new(&PROGRAM)).expect("configure");
        block_on(imu.start_fsm(&[0])).expect("start fsm");
        assert!(imu.state().accel && !imu.state().gyro);

        block_on(imu.start_acquisition(AcquisitionConfig::new())).expect("start");
        block_on(imu.stop_acquisition()).expect("stop");

        assert!(imu.state().fsm && imu.state().accel);
        assert_ne!(mock(&imu).reg(Register::Ctrl1.addr()), 0);
    }

    #[test]
    fn fsm_start_commits_arms_and_dispatches() {
        static PROGRAM: [UcfLine; 2] = [UcfLine::new(0x01, 0x80), UcfLine::new(0x01, 0x00)];
        let mut imu = driver(MockInterface::default());
        imu.configure_fsm(1, FsmSlot::new(&PROGRAM)).expect("configure");

        block_on(imu.start_fsm(&[1])).expect("start fsm");
        assert_eq!(imu.fsm_armed(), 0b10);
        assert!(imu.state().fsm);

        mock_mut(&mut imu).set_reg(Register::AllIntSrc.addr(), all_int_src::EMB_FUNC_IA);
        mock_mut(&mut imu).set_emb_reg(EmbRegister::FsmStatus.addr(), 0b10);
        block_on(imu.handle_interrupt()).expect("irq");

        assert_eq!(
            imu.handler().fsm,
            [crate::handler::FsmEvent { slot: 1, fired: true }]
        );
    }

    #[test]
    fn start_fsm_rejects_out_of_range_slot() {
        let mut imu = driver(MockInterface::default());
        assert_eq!(block_on(imu.start_fsm(&[8])), Err(Error::SlotOutOfRange));
    }

    #[test]
    fn int2_on_int1_is_tracked() {
        let mut imu = driver(MockInterface::default());
        let irq = InterruptConfig::new().with_int2_on_int1(true);
        block_on(imu.apply_interrupt_config(irq)).expect("irq config");

        assert!(imu.state().int2_on_int1);
        assert_eq!(mock(&imu).reg(Register::Ctrl4.addr()), crate::register::ctrl4::INT2_ON_INT1);
        // Not acquiring yet: INT1 routing untouched.
        assert_eq!(mock(&imu).reg(Register::Int1Ctrl.addr()), 0);
    }
}
