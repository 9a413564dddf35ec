//! Convenience macros for common driver sequences.

/// Initialize an LSM6DSV16BX instance with a common configuration sequence.
///
/// This macro runs the typical initialization flow:
/// 1. `init_with_addresses`
/// 2. `apply_interrupt_config`
/// 3. `set_config` + `apply_config`
/// 4. Optional FIFO configuration
///
/// The macro expands to a `Result<u8, Error>` expression, returning the
/// detected I2C address on success. It must be invoked from an async context.
///
/// Example without FIFO:
/// ```rust,no_run
/// # use ph_lsm6dsv16bx::{Config, InterruptConfig, Lsm6dsv16bxAddress, lsm6dsv16bx_init_sequence};
/// # async fn example(imu: &mut ph_lsm6dsv16bx::Lsm6dsv16bxI2c<impl embedded_hal_async::i2c::I2c>, delay: &mut impl embedded_hal_async::delay::DelayNs)
/// # -> Result<(), ph_lsm6dsv16bx::Error> {
/// let config = Config::new();
/// let irq = InterruptConfig::new();
/// let address = lsm6dsv16bx_init_sequence!(
///     imu: imu,
///     delay: delay,
///     addresses: &[Lsm6dsv16bxAddress::Primary.addr(), Lsm6dsv16bxAddress::Secondary.addr()],
///     interrupt: irq,
///     config: config,
/// )?;
/// # Ok(())
/// # }
/// ```
///
/// Example with FIFO:
/// ```rust,no_run
/// # use ph_lsm6dsv16bx::{Config, FifoConfig, FifoMode, InterruptConfig, Lsm6dsv16bxAddress, lsm6dsv16bx_init_sequence};
/// # async fn example(imu: &mut ph_lsm6dsv16bx::Lsm6dsv16bxI2c<impl embedded_hal_async::i2c::I2c>, delay: &mut impl embedded_hal_async::delay::DelayNs)
/// # -> Result<(), ph_lsm6dsv16bx::Error> {
/// let config = Config::new();
/// let irq = InterruptConfig::new().with_int2_on_int1(true);
/// let fifo = FifoConfig::new(FifoMode::Continuous, 64);
/// let address = lsm6dsv16bx_init_sequence!(
///     imu: imu,
///     delay: delay,
///     addresses: &[Lsm6dsv16bxAddress::Primary.addr()],
///     interrupt: irq,
///     config: config,
///     fifo: fifo,
/// )?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! lsm6dsv16bx_init_sequence {
    (
        imu: $imu:expr,
        delay: $delay:expr,
        addresses: $addresses:expr,
        interrupt: $irq:expr,
        config: $config:expr,
        fifo: $fifo:expr $(,)?
    ) => {{
        let address = $imu.init_with_addresses($delay, $addresses).await?;
        $imu.apply_interrupt_config($irq).await?;
        $imu.set_config($config);
        $imu.apply_config().await?;
        $imu.apply_fifo_config($fifo).await?;
        Ok::<u8, $crate::Error>(address)
    }};
    (
        imu: $imu:expr,
        delay: $delay:expr,
        addresses: $addresses:expr,
        interrupt: $irq:expr,
        config: $config:expr $(,)?
    ) => {{
        let address = $imu.init_with_addresses($delay, $addresses).await?;
        $imu.apply_interrupt_config($irq).await?;
        $imu.set_config($config);
        $imu.apply_config().await?;
        Ok::<u8, $crate::Error>(address)
    }};
}
