//! LSM6DSV16BX register definitions.
//!
//! Main-page registers used by the driver plus the embedded-functions page
//! (reached through `FUNC_CFG_ACCESS.EMB_FUNC_REG_ACCESS`).

#![allow(dead_code)] // Bit masks mirror the datasheet; not every field is driven yet.

/// Main-page register addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Embedded functions / sensor hub page access.
    FuncCfgAccess = 0x01,
    /// Pin control (pull-ups, SDO).
    PinCtrl = 0x02,
    /// Serial interface configuration.
    IfCfg = 0x03,
    /// FIFO watermark threshold (in words).
    FifoCtrl1 = 0x07,
    /// FIFO compression / stop-on-watermark.
    FifoCtrl2 = 0x08,
    /// Accelerometer and gyroscope batch data rates.
    FifoCtrl3 = 0x09,
    /// FIFO mode and timestamp batching.
    FifoCtrl4 = 0x0A,
    /// Batch counter register 1.
    CounterBdrReg1 = 0x0B,
    /// Batch counter register 2.
    CounterBdrReg2 = 0x0C,
    /// INT1 routing.
    Int1Ctrl = 0x0D,
    /// INT2 routing.
    Int2Ctrl = 0x0E,
    /// Device identifier.
    WhoAmI = 0x0F,
    /// Accelerometer ODR and operating mode.
    Ctrl1 = 0x10,
    /// Gyroscope ODR and operating mode.
    Ctrl2 = 0x11,
    /// Reset, boot, auto-increment, BDU.
    Ctrl3 = 0x12,
    /// Interrupt pin behaviour.
    Ctrl4 = 0x13,
    /// Interface control.
    Ctrl5 = 0x14,
    /// Gyroscope full scale and LPF1 bandwidth.
    Ctrl6 = 0x15,
    /// Analog hub / QVAR enable.
    Ctrl7 = 0x16,
    /// Accelerometer full scale.
    Ctrl8 = 0x17,
    /// Accelerometer filtering.
    Ctrl9 = 0x18,
    /// Self-test selection.
    Ctrl10 = 0x19,
    /// FIFO unread word count, low byte.
    FifoStatus1 = 0x1B,
    /// FIFO flags and unread word count, bit 8.
    FifoStatus2 = 0x1C,
    /// Aggregated interrupt sources.
    AllIntSrc = 0x1D,
    /// Data-ready status.
    StatusReg = 0x1E,
    /// Timestamp byte 0.
    Timestamp0 = 0x40,
    /// Timestamp byte 1.
    Timestamp1 = 0x41,
    /// Timestamp byte 2.
    Timestamp2 = 0x42,
    /// Timestamp byte 3.
    Timestamp3 = 0x43,
    /// Timestamp and interrupt enables.
    FunctionsEnable = 0x50,
    /// Functions routed to INT1.
    Md1Cfg = 0x5E,
    /// Functions routed to INT2.
    Md2Cfg = 0x5F,
    /// FIFO word tag.
    FifoDataOutTag = 0x78,
    /// FIFO word payload start (X low byte).
    FifoDataOutXL = 0x79,
}

impl Register {
    /// Returns the register address.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Embedded-functions page register addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EmbRegister {
    /// Advanced page selection.
    PageSel = 0x02,
    /// Embedded function enable A (SFLP, significant motion).
    EmbFuncEnA = 0x04,
    /// Embedded function enable B (FSM, MLC).
    EmbFuncEnB = 0x05,
    /// Advanced page address.
    PageAddress = 0x08,
    /// Advanced page value.
    PageValue = 0x09,
    /// Embedded functions routed to INT1.
    EmbFuncInt1 = 0x0A,
    /// FSM programs routed to INT1.
    FsmInt1 = 0x0B,
    /// Embedded function status.
    EmbFuncStatus = 0x12,
    /// FSM interrupt status.
    FsmStatus = 0x13,
    /// Advanced page read/write control.
    PageRw = 0x17,
    /// SFLP outputs batched in FIFO.
    EmbFuncFifoEnA = 0x44,
    /// FSM program enable.
    FsmEnable = 0x46,
    /// SFLP game rotation ODR.
    SflpOdr = 0x5E,
    /// Embedded function init A.
    EmbFuncInitA = 0x66,
}

impl EmbRegister {
    /// Returns the register address.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

pub mod func_cfg_access {
    pub const EMB_FUNC_REG_ACCESS: u8 = 1 << 7;
}

pub mod if_cfg {
    pub const SIM: u8 = 1 << 2;
}

pub mod fifo_ctrl3 {
    pub const BDR_XL_MASK: u8 = 0x0F;
    pub const BDR_GY_SHIFT: u8 = 4;
    pub const BDR_GY_MASK: u8 = 0xF0;
}

pub mod fifo_ctrl4 {
    pub const FIFO_MODE_MASK: u8 = 0x07;
    pub const DEC_TS_BATCH_SHIFT: u8 = 6;
    pub const DEC_TS_BATCH_MASK: u8 = 0xC0;
}

pub mod int1_ctrl {
    pub const INT1_FIFO_TH: u8 = 1 << 3;
    pub const INT1_FIFO_OVR: u8 = 1 << 4;
    pub const INT1_FIFO_FULL: u8 = 1 << 5;
}

pub mod who_am_i {
    pub const EXPECTED: u8 = 0x71;
}

pub mod ctrl1 {
    pub const ODR_XL_MASK: u8 = 0x0F;
    pub const OP_MODE_XL_SHIFT: u8 = 4;
    pub const OP_MODE_XL_MASK: u8 = 0x70;
}

pub mod ctrl2 {
    pub const ODR_G_MASK: u8 = 0x0F;
}

pub mod ctrl3 {
    pub const SW_RESET: u8 = 1 << 0;
    pub const IF_INC: u8 = 1 << 2;
    pub const BDU: u8 = 1 << 6;
    pub const BOOT: u8 = 1 << 7;
}

pub mod ctrl4 {
    pub const INT2_ON_INT1: u8 = 1 << 4;
}

pub mod ctrl6 {
    pub const FS_G_MASK: u8 = 0x0F;
}

pub mod ctrl7 {
    pub const AH_QVAR_EN: u8 = 1 << 7;
}

pub mod ctrl8 {
    pub const FS_XL_MASK: u8 = 0x03;
}

pub mod fifo_status2 {
    pub const DIFF_FIFO_8: u8 = 1 << 0;
    pub const FIFO_OVR_LATCHED: u8 = 1 << 3;
    pub const FIFO_FULL_IA: u8 = 1 << 5;
    pub const FIFO_OVR_IA: u8 = 1 << 6;
    pub const FIFO_WTM_IA: u8 = 1 << 7;
}

pub mod all_int_src {
    pub const EMB_FUNC_IA: u8 = 1 << 7;
}

pub mod functions_enable {
    pub const TIMESTAMP_EN: u8 = 1 << 6;
    pub const INTERRUPTS_ENABLE: u8 = 1 << 7;
}

pub mod md1_cfg {
    pub const INT1_EMB_FUNC: u8 = 1 << 1;
}

pub mod fifo_tag {
    pub const TAG_SENSOR_SHIFT: u8 = 3;
}

pub mod emb_func_en_a {
    pub const SFLP_GAME_EN: u8 = 1 << 1;
    pub const SIGN_MOTION_EN: u8 = 1 << 5;
}

pub mod emb_func_en_b {
    pub const FSM_EN: u8 = 1 << 0;
}

pub mod emb_func_int1 {
    pub const INT1_SIG_MOT: u8 = 1 << 5;
}

pub mod emb_func_status {
    pub const IS_SIGMOT: u8 = 1 << 5;
}

pub mod emb_func_fifo_en_a {
    pub const SFLP_GAME_FIFO_EN: u8 = 1 << 1;
    pub const SFLP_GRAVITY_FIFO_EN: u8 = 1 << 4;
    pub const SFLP_GBIAS_FIFO_EN: u8 = 1 << 5;
}

pub mod sflp_odr {
    /// Reserved bits that must keep their reset value.
    pub const RESERVED: u8 = 0x43;
    pub const SFLP_GAME_ODR_SHIFT: u8 = 3;
    pub const SFLP_GAME_ODR_MASK: u8 = 0x38;
}

pub mod emb_func_init_a {
    pub const SFLP_GAME_INIT: u8 = 1 << 1;
}
