#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
//! Wearable session recorder for the ESP32-S3 with an LSM6DSV16BX on I2C.
//!
//! Three tasks share the IMU:
//! - `fifo_task` waits on INT1 and drains the FIFO into the recorder.
//! - `state_machine_task` sequences Idle / Recording / Calibrating.
//! - `button_task` toggles recording from the BOOT button.
//!
//! The stored gyro bias is restored at boot; without one the firmware
//! calibrates first (keep the device still for three seconds).

mod storage;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use ph_lsm6dsv16bx::{
    AccelConfig,
    AccelRange,
    Config,
    Error as ImuError,
    FifoConfig,
    FifoMode,
    GyroConfig,
    GyroRange,
    InterruptConfig,
    Lsm6dsv16bxAddress,
    Lsm6dsv16bxI2c,
    OutputDataRate,
    SflpOutputDataRate,
    lsm6dsv16bx_init_sequence,
};
use ph_recorder::{
    ApplicationState,
    Event,
    EventQueue,
    Recorder,
    RecorderConfig,
    SharedSensor,
    StateMachine,
};
use static_cell::StaticCell;
use storage::RamStorage;
use {esp_backtrace as _, esp_println as _};

esp_bootloader_esp_idf::esp_app_desc!();

type ImuI2c = I2c<'static, esp_hal::Async>;
type ImuDriver = Lsm6dsv16bxI2c<ImuI2c, &'static Recorder<'static, RamStorage>>;
type SharedImu = Mutex<CriticalSectionRawMutex, ImuDriver>;
type AppStateMachine =
    StateMachine<'static, SharedSensor<'static, CriticalSectionRawMutex, ImuDriver>, RamStorage>;

defmt::timestamp!("{=u64:ms}", embassy_time::Instant::now().as_millis());

#[used]
static APP_DESC_REF: &esp_bootloader_esp_idf::EspAppDesc = &ESP_APP_DESC;

/// FIFO watermark in words; at 120 Hz with SFLP this is roughly half a second.
const FIFO_WATERMARK: u8 = 200;
/// Delay between init retries when the IMU reports `NotReady`.
const INIT_RETRY_DELAY_MS: u64 = 100;
/// Back-off after a failed FIFO service.
const FIFO_ERROR_DELAY_MS: u64 = 50;
/// Button debounce time.
const DEBOUNCE_MS: u64 = 50;

static EVENTS: EventQueue = EventQueue::new();
static RECORDER: Recorder<'static, RamStorage> = Recorder::new(&EVENTS, RamStorage::new());
static IMU: StaticCell<SharedImu> = StaticCell::new();

async fn configure_imu(imu: &mut ImuDriver, delay: &mut Delay) -> Result<u8, ImuError> {
    let config = Config::new()
        .with_accel_config(AccelConfig::new(AccelRange::G16, OutputDataRate::Hz120))
        .with_gyro_config(GyroConfig::new(GyroRange::Dps2000, OutputDataRate::Hz120))
        .with_sflp_odr(SflpOutputDataRate::Hz120);
    lsm6dsv16bx_init_sequence!(
        imu: imu,
        delay: delay,
        addresses: &[
            Lsm6dsv16bxAddress::Primary.addr(),
            Lsm6dsv16bxAddress::Secondary.addr()
        ],
        interrupt: InterruptConfig::new().with_fifo_overrun(true),
        config: config,
        fifo: FifoConfig::new(FifoMode::Continuous, FIFO_WATERMARK),
    )
}

#[embassy_executor::task]
async fn fifo_task(imu: &'static SharedImu, mut int1: Input<'static>) {
    loop {
        int1.wait_for_high().await;
        let result = imu.lock().await.handle_interrupt().await;
        match result {
            Ok(status) => {
                if status.fifo.overrun_latched {
                    warn!("FIFO overrun");
                }
            }
            Err(err) => {
                warn!("FIFO service failed: {}", err);
                Timer::after(Duration::from_millis(FIFO_ERROR_DELAY_MS)).await;
            }
        }
    }
}

#[embassy_executor::task]
async fn state_machine_task(mut machine: AppStateMachine) {
    machine.start().await;
    machine.run().await
}

#[embassy_executor::task]
async fn button_task(mut button: Input<'static>) {
    loop {
        button.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if button.is_high() {
            continue;
        }
        let event = match EVENTS.current_state() {
            ApplicationState::Idle => Event::StartRecording,
            ApplicationState::Recording => Event::StopRecording,
            ApplicationState::Calibrating => {
                warn!("calibrating, button ignored");
                continue;
            }
        };
        EVENTS.post(event);
        button.wait_for_high().await;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let int1 = Input::new(peripherals.GPIO10, InputConfig::default().with_pull(Pull::Down));
    let button = Input::new(peripherals.GPIO0, InputConfig::default().with_pull(Pull::Up));

    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(400));
    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_sda(peripherals.GPIO11)
        .with_scl(peripherals.GPIO12)
        .into_async();

    let mut imu: ImuDriver = Lsm6dsv16bxI2c::new_i2c(i2c, &RECORDER, None);
    let mut delay = Delay;
    let address = loop {
        match configure_imu(&mut imu, &mut delay).await {
            Ok(address) => break address,
            Err(ImuError::NotReady) => {
                warn!("IMU not ready, retrying...");
                Timer::after(Duration::from_millis(INIT_RETRY_DELAY_MS)).await;
            }
            Err(err) => {
                error!("IMU init failed: {}", err);
                loop {
                    Timer::after(Duration::from_secs(1)).await;
                }
            }
        }
    };
    info!("LSM6DSV16BX ready @0x{:02x}", address);

    let imu: &'static SharedImu = IMU.init(Mutex::new(imu));
    let machine = StateMachine::new(
        &EVENTS,
        &RECORDER,
        SharedSensor::new(imu),
        RecorderConfig::new(),
    );

    spawner.spawn(fifo_task(imu, int1).unwrap());
    spawner.spawn(state_machine_task(machine).unwrap());
    spawner.spawn(button_task(button).unwrap());

    loop {
        Timer::after(Duration::from_secs(60)).await;
        info!("state: {}", EVENTS.current_state());
    }
}
