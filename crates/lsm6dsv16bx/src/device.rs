//! Device core operations for the LSM6DSV16BX.

use embedded_hal_async::delay::DelayNs;

use crate::config::{AcquisitionConfig, Config};
use crate::data::{FIFO_WORD_LEN, FifoConfig, FifoMode, FifoStatus};
use crate::error::Error;
use crate::interface::I2cInterface;
use crate::interface::{Interface, InterfaceSettings};
use crate::register::{EmbRegister, Register};
use crate::register::{
    ctrl3, ctrl4, ctrl6, ctrl7, ctrl8, emb_func_en_a, emb_func_fifo_en_a, emb_func_init_a,
    emb_func_int1, fifo_ctrl3, func_cfg_access, functions_enable, md1_cfg, who_am_i,
};

/// Time the device needs after a software reset (10 ms).
pub(crate) const BOOT_TIME_NS: u32 = 10_000_000;

const RESET_POLL_RETRIES: u8 = 3;

pub(crate) struct DeviceCore<I> {
    interface: I,
    settings: InterfaceSettings,
}

impl<I> DeviceCore<I>
where
    I: Interface,
{
    pub(crate) fn new(interface: I, settings: InterfaceSettings) -> Self {
        Self {
            interface,
            settings,
        }
    }

    /// Issues CTRL3.SW_RESET and waits until the bit self-clears.
    pub(crate) async fn soft_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.write_reg(Register::Ctrl3, ctrl3::SW_RESET).await?;
        for _ in 0..RESET_POLL_RETRIES {
            delay.delay_ns(BOOT_TIME_NS).await;
            let ctrl3_value = self.read_reg(Register::Ctrl3).await?;
            if (ctrl3_value & ctrl3::SW_RESET) == 0 {
                return Ok(());
            }
        }
        Err(Error::NotReady)
    }

    pub(crate) async fn verify_device(&mut self) -> Result<(), Error> {
        match self.read_reg(Register::WhoAmI).await? {
            who_am_i::EXPECTED => Ok(()),
            0x00 | 0xFF => Err(Error::NotPresent),
            _ => Err(Error::WrongDevice),
        }
    }

    /// Writes the serial interface settings (IF_INC, BDU, 3-wire SPI).
    pub(crate) async fn apply_interface_settings(&mut self) -> Result<(), Error> {
        self.write_reg(Register::Ctrl3, self.settings.ctrl3_value())
            .await?;
        self.write_reg(Register::IfCfg, self.settings.if_cfg_value())
            .await
    }

    /// Writes the full-scale ranges (CTRL8.FS_XL, CTRL6.FS_G).
    pub(crate) async fn apply_scale(&mut self, config: Config) -> Result<(), Error> {
        self.modify_reg(Register::Ctrl8, ctrl8::FS_XL_MASK, config.accel.range.bits())
            .await?;
        self.modify_reg(Register::Ctrl6, ctrl6::FS_G_MASK, config.gyro.range.bits())
            .await
    }

    /// Writes the accelerometer and gyroscope output data rates; a disabled
    /// channel is powered down.
    pub(crate) async fn set_channels(
        &mut self,
        config: Config,
        accel: bool,
        gyro: bool,
    ) -> Result<(), Error> {
        self.write_reg(Register::Ctrl1, config.ctrl1_value(accel))
            .await?;
        self.write_reg(Register::Ctrl2, config.ctrl2_value(gyro))
            .await
    }

    pub(crate) async fn set_qvar(&mut self, enable: bool) -> Result<(), Error> {
        let set = if enable { ctrl7::AH_QVAR_EN } else { 0 };
        self.modify_reg(Register::Ctrl7, ctrl7::AH_QVAR_EN, set)
            .await
    }

    pub(crate) async fn set_timestamp(&mut self, enable: bool) -> Result<(), Error> {
        let set = if enable {
            functions_enable::TIMESTAMP_EN
        } else {
            0
        };
        self.modify_reg(Register::FunctionsEnable, functions_enable::TIMESTAMP_EN, set)
            .await
    }

    /// Writes the watermark, batch rates and FIFO mode.
    ///
    /// `Bypass` flushes the FIFO and clears the batch rates.
    pub(crate) async fn apply_fifo(
        &mut self,
        fifo: FifoConfig,
        config: Config,
        mode: FifoMode,
    ) -> Result<(), Error> {
        let batch = if matches!(mode, FifoMode::Bypass) {
            0
        } else {
            (config.accel.odr.bits() & fifo_ctrl3::BDR_XL_MASK)
                | ((config.gyro.odr.bits() << fifo_ctrl3::BDR_GY_SHIFT) & fifo_ctrl3::BDR_GY_MASK)
        };
        self.write_reg(Register::FifoCtrl1, fifo.watermark).await?;
        self.write_reg(Register::FifoCtrl3, batch).await?;
        self.write_reg(Register::FifoCtrl4, fifo.ctrl4_value(mode))
            .await
    }

    pub(crate) async fn fifo_status(&mut self) -> Result<FifoStatus, Error> {
        let mut buffer = [0u8; 2];
        self.read_regs(Register::FifoStatus1, &mut buffer).await?;
        Ok(FifoStatus::from_regs(buffer[0], buffer[1]))
    }

    /// Reads one tagged FIFO word.
    pub(crate) async fn read_fifo_word(&mut self, word: &mut [u8]) -> Result<(), Error> {
        debug_assert_eq!(word.len(), FIFO_WORD_LEN);
        self.read_regs(Register::FifoDataOutTag, word).await
    }

    pub(crate) async fn set_int1_routing(&mut self, int1_ctrl: u8) -> Result<(), Error> {
        self.write_reg(Register::Int1Ctrl, int1_ctrl).await
    }

    pub(crate) async fn set_int2_on_int1(&mut self, enable: bool) -> Result<(), Error> {
        let set = if enable { ctrl4::INT2_ON_INT1 } else { 0 };
        self.modify_reg(Register::Ctrl4, ctrl4::INT2_ON_INT1, set)
            .await
    }

    /// Configures the SFLP block and its FIFO outputs.
    pub(crate) async fn apply_sflp(
        &mut self,
        config: Config,
        acquisition: AcquisitionConfig,
    ) -> Result<(), Error> {
        let mut fifo_en = 0;
        if acquisition.gbias {
            fifo_en |= emb_func_fifo_en_a::SFLP_GBIAS_FIFO_EN;
        }
        if acquisition.sflp {
            fifo_en |= emb_func_fifo_en_a::SFLP_GAME_FIFO_EN
                | emb_func_fifo_en_a::SFLP_GRAVITY_FIFO_EN;
        }
        let enable = acquisition.uses_sflp();

        self.set_embedded_page(true).await?;
        let result = self.write_sflp_regs(config, fifo_en, enable).await;
        self.set_embedded_page(false).await?;
        result
    }

    async fn write_sflp_regs(&mut self, config: Config, fifo_en: u8, enable: bool) -> Result<(), Error> {
        if enable {
            self.write_emb_reg(EmbRegister::SflpOdr, config.sflp_odr_value())
                .await?;
        }
        self.write_emb_reg(EmbRegister::EmbFuncFifoEnA, fifo_en)
            .await?;
        let set = if enable { emb_func_en_a::SFLP_GAME_EN } else { 0 };
        self.modify_emb_reg(EmbRegister::EmbFuncEnA, emb_func_en_a::SFLP_GAME_EN, set)
            .await?;
        if enable {
            self.write_emb_reg(EmbRegister::EmbFuncInitA, emb_func_init_a::SFLP_GAME_INIT)
                .await?;
        }
        Ok(())
    }

    /// Enables significant motion detection and routes it to INT1.
    pub(crate) async fn enable_significant_motion(&mut self) -> Result<(), Error> {
        self.set_embedded_page(true).await?;
        let result = self.write_significant_motion_regs().await;
        self.set_embedded_page(false).await?;
        result?;
        self.route_embedded_to_int1().await
    }

    async fn write_significant_motion_regs(&mut self) -> Result<(), Error> {
        self.modify_emb_reg(EmbRegister::EmbFuncEnA, 0, emb_func_en_a::SIGN_MOTION_EN)
            .await?;
        self.modify_emb_reg(EmbRegister::EmbFuncInt1, 0, emb_func_int1::INT1_SIG_MOT)
            .await
    }

    /// Routes embedded-function interrupts to INT1 and enables interrupt generation.
    pub(crate) async fn route_embedded_to_int1(&mut self) -> Result<(), Error> {
        self.modify_reg(Register::Md1Cfg, 0, md1_cfg::INT1_EMB_FUNC)
            .await?;
        self.modify_reg(
            Register::FunctionsEnable,
            0,
            functions_enable::INTERRUPTS_ENABLE,
        )
        .await
    }

    /// Reads EMB_FUNC_STATUS and FSM_STATUS from the embedded page.
    pub(crate) async fn read_embedded_status(&mut self) -> Result<(u8, u8), Error> {
        self.set_embedded_page(true).await?;
        let emb = self.read_emb_reg(EmbRegister::EmbFuncStatus).await;
        let fsm = self.read_emb_reg(EmbRegister::FsmStatus).await;
        self.set_embedded_page(false).await?;
        Ok((emb?, fsm?))
    }

    pub(crate) async fn set_embedded_page(&mut self, enable: bool) -> Result<(), Error> {
        let value = if enable {
            func_cfg_access::EMB_FUNC_REG_ACCESS
        } else {
            0
        };
        self.write_reg(Register::FuncCfgAccess, value).await
    }

    pub(crate) fn release(self) -> I {
        self.interface
    }

    pub(crate) async fn read_reg(&mut self, reg: Register) -> Result<u8, Error> {
        self.interface.read_reg(reg.addr()).await
    }

    pub(crate) async fn read_regs(
        &mut self,
        reg: Register,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.interface.read_regs(reg.addr(), buffer).await
    }

    pub(crate) async fn write_reg(&mut self, reg: Register, value: u8) -> Result<(), Error> {
        self.interface.write_reg(reg.addr(), value).await
    }

    /// Writes an arbitrary address (UCF program lines).
    pub(crate) async fn write_raw(&mut self, address: u8, value: u8) -> Result<(), Error> {
        self.interface.write_reg(address, value).await
    }

    pub(crate) async fn modify_reg(&mut self, reg: Register, clear: u8, set: u8) -> Result<(), Error> {
        let value = self.read_reg(reg).await?;
        self.write_reg(reg, (value & !clear) | set).await
    }

    /// Embedded-page accessors; the caller must have selected the page.
    pub(crate) async fn read_emb_reg(&mut self, reg: EmbRegister) -> Result<u8, Error> {
        self.interface.read_reg(reg.addr()).await
    }

    pub(crate) async fn write_emb_reg(&mut self, reg: EmbRegister, value: u8) -> Result<(), Error> {
        self.interface.write_reg(reg.addr(), value).await
    }

    pub(crate) async fn modify_emb_reg(
        &mut self,
        reg: EmbRegister,
        clear: u8,
        set: u8,
    ) -> Result<(), Error> {
        let value = self.read_emb_reg(reg).await?;
        self.write_emb_reg(reg, (value & !clear) | set).await
    }

    #[cfg(test)]
    pub(crate) fn interface(&self) -> &I {
        &self.interface
    }

    #[cfg(test)]
    pub(crate) fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }
}

impl<I2C> DeviceCore<I2cInterface<I2C>> {
    pub(crate) fn set_i2c_address(&mut self, address: u8) {
        self.interface.set_address(address);
    }
}
