//! Breakpoint management module.
//!
//! Software breakpoints are planted by overwriting the instruction at each
//! address with [`TRAP_INSTRUCTION`]. The table only holds addresses while the
//! stub runs; trap words live in target memory only while the program runs.

use crate::error::BreakpointError;
use crate::memory::TargetMemory;

/// Number of slots, including the single-step slot.
pub const MAX_BREAKPOINTS: usize = 16;
/// Slot reserved for the one-shot single-step breakpoint.
pub const STEP_SLOT: usize = 0;
/// ARM `svc 0xaaaaaa`, routed by the vector table to the stub's trap entry.
pub const TRAP_INSTRUCTION: u32 = 0xefaa_aaaa;
/// Width of an ARM-state instruction.
pub const INSTRUCTION_SIZE: u32 = 4;

/// One table slot. `address == 0` marks the slot empty.
///
/// `saved_instruction` is only meaningful while `active` is set, that is
/// between activation and the next restoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakpointEntry {
    pub address: u32,
    pub saved_instruction: u32,
    /// The trap word is in memory and `saved_instruction` holds what it replaced.
    pub active: bool,
}

impl BreakpointEntry {
    pub const EMPTY: Self = Self {
        address: 0,
        saved_instruction: 0,
        active: false,
    };

    pub const fn is_empty(&self) -> bool {
        self.address == 0
    }
}

/// Fixed-capacity table of software breakpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointTable {
    slots: [BreakpointEntry; MAX_BREAKPOINTS],
}

impl BreakpointTable {
    pub const fn new() -> Self {
        Self {
            slots: [BreakpointEntry::EMPTY; MAX_BREAKPOINTS],
        }
    }

    /// Add a user breakpoint.
    ///
    /// Re-inserting an address that is already present succeeds without
    /// taking another slot. The step slot is never handed out.
    pub fn insert(&mut self, address: u32) -> Result<(), BreakpointError> {
        if address == 0 {
            return Err(BreakpointError::NullAddress);
        }
        let user = &mut self.slots[STEP_SLOT + 1..];
        if user.iter().any(|slot| slot.address == address) {
            log::debug!("breakpoint @ 0x{address:08x} already set");
            return Ok(());
        }
        let Some(slot) = user.iter_mut().find(|slot| slot.is_empty()) else {
            log::warn!("no free slot for breakpoint @ 0x{address:08x}");
            return Err(BreakpointError::TableFull);
        };
        slot.address = address;
        log::debug!("breakpoint set @ 0x{address:08x}");
        Ok(())
    }

    /// Remove a user breakpoint. Returns `false` if it was not set.
    pub fn remove(&mut self, address: u32) -> bool {
        let found = self.slots[STEP_SLOT + 1..]
            .iter_mut()
            .find(|slot| !slot.is_empty() && slot.address == address);
        match found {
            Some(slot) => {
                *slot = BreakpointEntry::EMPTY;
                log::debug!("breakpoint cleared @ 0x{address:08x}");
                true
            }
            None => false,
        }
    }

    /// Arm the one-shot step breakpoint.
    ///
    /// Stepping only ever plants a trap at the next sequential instruction, so
    /// stepping over a taken branch, call or return does not stop where the
    /// program actually goes.
    pub fn arm_step(&mut self, address: u32) {
        self.slots[STEP_SLOT] = BreakpointEntry {
            address,
            ..BreakpointEntry::EMPTY
        };
    }

    /// Drop the step breakpoint. Done on every trap entry.
    pub fn clear_step(&mut self) {
        self.slots[STEP_SLOT] = BreakpointEntry::EMPTY;
    }

    /// Put the original instructions back.
    ///
    /// Walks the table in reverse activation order so an address claimed by
    /// two slots ends up holding the genuine instruction. Slots that were never
    /// activated are left alone.
    pub fn restore_all<M: TargetMemory>(&mut self, memory: &mut M) {
        let mut restored = 0;
        for slot in self.slots.iter_mut().rev().filter(|slot| slot.active) {
            memory.write_32(slot.address, slot.saved_instruction);
            slot.active = false;
            restored += 1;
        }
        log::debug!("restored {restored} breakpoint(s)");
    }

    /// Save the instruction under every breakpoint and plant the trap.
    pub fn activate_all<M: TargetMemory>(&mut self, memory: &mut M) {
        for slot in self.slots.iter_mut().filter(|slot| !slot.is_empty() && !slot.active) {
            slot.saved_instruction = memory.read_32(slot.address);
            memory.write_32(slot.address, TRAP_INSTRUCTION);
            slot.active = true;
        }
        log::debug!("activated {} breakpoint(s)", self.len());
    }

    pub fn contains(&self, address: u32) -> bool {
        address != 0 && self.slots.iter().any(|slot| slot.address == address)
    }

    /// Number of occupied slots, step slot included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn step_address(&self) -> Option<u32> {
        match self.slots[STEP_SLOT].address {
            0 => None,
            address => Some(address),
        }
    }

    /// List active breakpoint addresses, step slot first.
    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .filter(|slot| !slot.is_empty())
            .map(|slot| slot.address)
    }

    pub const fn slots(&self) -> &[BreakpointEntry; MAX_BREAKPOINTS] {
        &self.slots
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::new()
    }
}
