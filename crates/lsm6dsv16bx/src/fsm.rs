//! FSM/MLC program loading.
//!
//! Each of the eight slots holds a UCF line list (plain register writes as
//! exported by the vendor configuration tools) and an optional pre-hook.
//! `commit` writes the slots in ascending order; a slot that fails stops the
//! commit and is reported as [`Error::FsmSlot`]. Slots written before it are
//! not rolled back.

use crate::device::DeviceCore;
use crate::error::Error;
use crate::interface::Interface;
use crate::register::{EmbRegister, Register, emb_func_en_b, func_cfg_access};

/// Number of FSM program slots.
pub const FSM_SLOT_COUNT: usize = 8;

/// Register writes a pre-hook may queue.
pub const HOOK_WRITE_CAPACITY: usize = 8;

/// One register write of a UCF program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UcfLine {
    /// Register address.
    pub address: u8,
    /// Value written.
    pub data: u8,
}

impl UcfLine {
    /// Creates a UCF line.
    pub const fn new(address: u8, data: u8) -> Self {
        Self { address, data }
    }
}

/// Hook run right before a slot's lines are written.
pub type PreHook = fn(&mut HookContext) -> Result<(), Error>;

/// Write queue handed to a [`PreHook`].
///
/// Queued writes go out, in order, before the slot's UCF lines.
#[derive(Clone, Debug)]
pub struct HookContext {
    slot: u8,
    writes: [UcfLine; HOOK_WRITE_CAPACITY],
    len: usize,
}

impl HookContext {
    const fn new(slot: u8) -> Self {
        Self {
            slot,
            writes: [UcfLine::new(0, 0); HOOK_WRITE_CAPACITY],
            len: 0,
        }
    }

    /// Slot being configured.
    pub const fn slot(&self) -> u8 {
        self.slot
    }

    /// Queues a register write.
    pub fn write(&mut self, address: u8, data: u8) -> Result<(), Error> {
        let entry = self.writes.get_mut(self.len).ok_or(Error::InvalidData)?;
        *entry = UcfLine::new(address, data);
        self.len += 1;
        Ok(())
    }

    /// Queues a switch to (or away from) the embedded-functions page.
    pub fn select_embedded_page(&mut self, enable: bool) -> Result<(), Error> {
        let value = if enable {
            func_cfg_access::EMB_FUNC_REG_ACCESS
        } else {
            0
        };
        self.write(Register::FuncCfgAccess.addr(), value)
    }

    fn queued(&self) -> &[UcfLine] {
        &self.writes[..self.len]
    }
}

/// One configured FSM/MLC program.
#[derive(Clone, Copy, Debug)]
pub struct FsmSlot {
    /// Program lines, written in order.
    pub lines: &'static [UcfLine],
    /// Optional hook run before the lines.
    pub pre_hook: Option<PreHook>,
}

impl FsmSlot {
    /// Creates a slot without a pre-hook.
    pub const fn new(lines: &'static [UcfLine]) -> Self {
        Self {
            lines,
            pre_hook: None,
        }
    }

    /// Sets the pre-hook.
    #[must_use]
    pub const fn with_pre_hook(mut self, hook: PreHook) -> Self {
        self.pre_hook = Some(hook);
        self
    }
}

/// Holds the slot table and the armed mask.
#[derive(Clone, Debug, Default)]
pub struct FsmLoader {
    slots: [Option<FsmSlot>; FSM_SLOT_COUNT],
    armed: u8,
}

impl FsmLoader {
    /// Creates an empty loader.
    pub const fn new() -> Self {
        Self {
            slots: [None; FSM_SLOT_COUNT],
            armed: 0,
        }
    }

    /// Stores the configuration of slot `index`.
    pub fn configure(&mut self, index: usize, slot: FsmSlot) -> Result<(), Error> {
        let entry = self.slots.get_mut(index).ok_or(Error::SlotOutOfRange)?;
        *entry = Some(slot);
        Ok(())
    }

    /// Removes the configuration of slot `index`.
    pub fn clear(&mut self, index: usize) -> Result<(), Error> {
        let entry = self.slots.get_mut(index).ok_or(Error::SlotOutOfRange)?;
        *entry = None;
        Ok(())
    }

    /// Bit mask of slots that have at least one line.
    pub fn configured_mask(&self) -> u8 {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some_and(|slot| !slot.lines.is_empty()))
            .fold(0u8, |mask, (index, _)| mask | (1 << index))
    }

    /// Bit mask of slots armed for interrupt-driven events.
    pub const fn armed(&self) -> u8 {
        self.armed
    }

    /// Writes every configured slot in ascending order and returns the mask
    /// of slots written. Empty slots are skipped.
    pub(crate) async fn commit<I: Interface>(
        &self,
        core: &mut DeviceCore<I>,
    ) -> Result<u8, Error> {
        let mut written = 0u8;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            if slot.lines.is_empty() {
                continue;
            }
            let slot_id = index as u8;
            Self::write_slot(core, slot_id, slot)
                .await
                .map_err(|_| Error::FsmSlot(slot_id))?;
            written |= 1 << index;
        }
        Ok(written)
    }

    async fn write_slot<I: Interface>(
        core: &mut DeviceCore<I>,
        slot_id: u8,
        slot: &FsmSlot,
    ) -> Result<(), Error> {
        if let Some(hook) = slot.pre_hook {
            let mut ctx = HookContext::new(slot_id);
            hook(&mut ctx)?;
            for line in ctx.queued() {
                core.write_raw(line.address, line.data).await?;
            }
        }
        for line in slot.lines {
            core.write_raw(line.address, line.data).await?;
        }
        Ok(())
    }

    /// Enables the programs in `mask` and routes their interrupts to INT1.
    ///
    /// Every bit in `mask` must name a configured slot. A zero mask disarms
    /// all programs.
    pub(crate) async fn enable<I: Interface>(
        &mut self,
        core: &mut DeviceCore<I>,
        mask: u8,
    ) -> Result<(), Error> {
        if mask & !self.configured_mask() != 0 {
            return Err(Error::InvalidData);
        }
        core.set_embedded_page(true).await?;
        let result = Self::write_enables(core, mask).await;
        core.set_embedded_page(false).await?;
        result?;
        self.armed = mask;
        Ok(())
    }

    async fn write_enables<I: Interface>(core: &mut DeviceCore<I>, mask: u8) -> Result<(), Error> {
        let (clear, set) = if mask != 0 {
            (0, emb_func_en_b::FSM_EN)
        } else {
            (emb_func_en_b::FSM_EN, 0)
        };
        core.modify_emb_reg(EmbRegister::EmbFuncEnB, clear, set)
            .await?;
        core.write_emb_reg(EmbRegister::FsmEnable, mask).await?;
        core.write_emb_reg(EmbRegister::FsmInt1, mask).await
    }
}
