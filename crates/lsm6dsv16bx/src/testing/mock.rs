extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::calibration::CalibrationError;
use crate::data::{FIFO_WORD_LEN, Quaternion, Vector3};
use crate::error::Error;
use crate::handler::{FsmEvent, SampleHandler};
use crate::interface::{Interface, sealed};
use crate::register::{Register, ctrl3, fifo_status2, func_cfg_access};

/// Register-file mock with a main and an embedded-functions page.
///
/// Writes to FUNC_CFG_ACCESS switch the page exactly like the device. Reads of
/// one FIFO word at FIFO_DATA_OUT_TAG pop from a word queue and keep the
/// FIFO_STATUS count in sync.
#[derive(Clone, Debug)]
pub(crate) struct MockInterface {
    regs: [u8; 256],
    emb_regs: [u8; 256],
    writes: Vec<(u8, u8)>,
    fifo: VecDeque<[u8; FIFO_WORD_LEN]>,
    fail_writes_to: Option<u8>,
    fail_reads: bool,
    hold_reset: bool,
}

impl Default for MockInterface {
    fn default() -> Self {
        Self {
            regs: [0u8; 256],
            emb_regs: [0u8; 256],
            writes: Vec::new(),
            fifo: VecDeque::new(),
            fail_writes_to: None,
            fail_reads: false,
            hold_reset: false,
        }
    }
}

impl MockInterface {
    pub(crate) fn with_reg(mut self, reg: u8, value: u8) -> Self {
        self.set_reg(reg, value);
        self
    }

    pub(crate) fn set_reg(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub(crate) fn reg(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    pub(crate) fn set_emb_reg(&mut self, reg: u8, value: u8) {
        self.emb_regs[reg as usize] = value;
    }

    pub(crate) fn emb_reg(&self, reg: u8) -> u8 {
        self.emb_regs[reg as usize]
    }

    /// Every single-register write, in order, regardless of page.
    pub(crate) fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    pub(crate) fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Makes every write to `reg` fail with `Error::Bus`.
    pub(crate) fn fail_writes_to(&mut self, reg: u8) {
        self.fail_writes_to = Some(reg);
    }

    pub(crate) fn fail_reads(&mut self, enable: bool) {
        self.fail_reads = enable;
    }

    /// Keeps CTRL3.SW_RESET latched instead of self-clearing.
    pub(crate) fn hold_reset(&mut self, enable: bool) {
        self.hold_reset = enable;
    }

    pub(crate) fn push_fifo_word(&mut self, word: [u8; FIFO_WORD_LEN]) {
        self.fifo.push_back(word);
        self.sync_fifo_status();
    }

    pub(crate) fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    fn sync_fifo_status(&mut self) {
        let count = self.fifo.len() as u16;
        let mut status2 = self.regs[Register::FifoStatus2.addr() as usize]
            & !(fifo_status2::DIFF_FIFO_8 | fifo_status2::FIFO_WTM_IA);
        if count > 0xFF {
            status2 |= fifo_status2::DIFF_FIFO_8;
        }
        if count > 0 {
            status2 |= fifo_status2::FIFO_WTM_IA;
        }
        self.regs[Register::FifoStatus1.addr() as usize] = (count & 0xFF) as u8;
        self.regs[Register::FifoStatus2.addr() as usize] = status2;
    }

    fn embedded_page(&self) -> bool {
        self.regs[Register::FuncCfgAccess.addr() as usize] & func_cfg_access::EMB_FUNC_REG_ACCESS
            != 0
    }

    fn bank(&mut self, reg: u8) -> &mut [u8; 256] {
        // FUNC_CFG_ACCESS is visible from both pages.
        if self.embedded_page() && reg != Register::FuncCfgAccess.addr() {
            &mut self.emb_regs
        } else {
            &mut self.regs
        }
    }
}

impl Interface for MockInterface {
    async fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        if self.fail_reads {
            return Err(Error::Bus);
        }
        if buffer.is_empty() {
            return Ok(());
        }
        if reg == Register::FifoDataOutTag.addr()
            && buffer.len() == FIFO_WORD_LEN
            && !self.embedded_page()
        {
            let word = self.fifo.pop_front().unwrap_or([0u8; FIFO_WORD_LEN]);
            buffer.copy_from_slice(&word);
            self.sync_fifo_status();
            return Ok(());
        }
        let bank = self.bank(reg);
        for (offset, slot) in buffer.iter_mut().enumerate() {
            let addr = reg.wrapping_add(offset as u8);
            *slot = bank[addr as usize];
        }
        Ok(())
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        if self.fail_writes_to == Some(reg) {
            return Err(Error::Bus);
        }
        let stored = if reg == Register::Ctrl3.addr() && !self.embedded_page() && !self.hold_reset {
            value & !(ctrl3::SW_RESET | ctrl3::BOOT)
        } else {
            value
        };
        self.bank(reg)[reg as usize] = stored;
        self.writes.push((reg, value));
        Ok(())
    }
}

impl sealed::Sealed for MockInterface {}

#[derive(Default, Debug)]
pub(crate) struct MockDelay {
    pub(crate) calls: u32,
    pub(crate) last_ns: Option<u32>,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.last_ns = Some(ns);
    }
}

/// Handler that records every delivered sample.
#[derive(Default, Debug)]
pub(crate) struct RecordingHandler {
    pub(crate) timestamps: Vec<u64>,
    pub(crate) accel: Vec<Vector3>,
    pub(crate) gyro: Vec<Vector3>,
    pub(crate) qvar: Vec<f32>,
    pub(crate) gyro_bias: Vec<Vector3>,
    pub(crate) game_rotation: Vec<Quaternion>,
    pub(crate) gravity: Vec<Vector3>,
    pub(crate) calibration: Vec<Result<Vector3, CalibrationError>>,
    pub(crate) significant_motion: u32,
    pub(crate) fsm: Vec<FsmEvent>,
}

impl SampleHandler for RecordingHandler {
    fn on_timestamp(&mut self, ns: u64) {
        self.timestamps.push(ns);
    }

    fn on_accel(&mut self, sample: Vector3) {
        self.accel.push(sample);
    }

    fn on_gyro(&mut self, sample: Vector3) {
        self.gyro.push(sample);
    }

    fn on_qvar(&mut self, mv: f32) {
        self.qvar.push(mv);
    }

    fn on_gyro_bias(&mut self, sample: Vector3) {
        self.gyro_bias.push(sample);
    }

    fn on_game_rotation(&mut self, rotation: Quaternion) {
        self.game_rotation.push(rotation);
    }

    fn on_gravity(&mut self, gravity: Vector3) {
        self.gravity.push(gravity);
    }

    fn on_calibration_result(&mut self, result: Result<Vector3, CalibrationError>) {
        self.calibration.push(result);
    }

    fn on_significant_motion(&mut self) {
        self.significant_motion += 1;
    }

    fn on_fsm_event(&mut self, event: FsmEvent) {
        self.fsm.push(event);
    }
}

/// Builds a FIFO word from a 5-bit tag and three signed axes.
pub(crate) fn fifo_word(tag: u8, x: i16, y: i16, z: i16) -> [u8; FIFO_WORD_LEN] {
    let [x0, x1] = x.to_le_bytes();
    let [y0, y1] = y.to_le_bytes();
    let [z0, z1] = z.to_le_bytes();
    [tag << 3, x0, x1, y0, y1, z0, z1]
}
