//! Register snapshot of the halted program.
//!
//! Slot layout follows GDB's legacy ARM register numbering:
//!
//! | index  | contents                         |
//! |--------|----------------------------------|
//! | 0-12   | r0-r12                           |
//! | 13     | sp                               |
//! | 14     | lr                               |
//! | 15     | pc                               |
//! | 16-23  | f0-f7                            |
//! | 24-39  | reserved, stored but never read  |
//! | 40     | fps                              |
//! | 41     | cpsr                             |

use crate::codec::swap_byte_order;

/// Number of 32-bit slots in the snapshot.
pub const NUM_REGS: usize = 42;
/// Size of the snapshot on the wire, in bytes.
pub const REGISTER_BYTES: usize = NUM_REGS * 4;

pub const SP: usize = 13;
pub const LR: usize = 14;
pub const PC: usize = 15;
pub const F0: usize = 16;
pub const FPS: usize = 40;
pub const CPSR: usize = 41;

/// CPSR value of a freshly booted program: ARM state, user mode.
pub const CPSR_USER_MODE: u32 = 0x10;

/// Fixed-size snapshot of the target CPU state.
///
/// The trap-entry code fills it before the stub runs and reloads the CPU from
/// it on resume, so the layout is `repr(C)` and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct RegisterFile {
    words: [u32; NUM_REGS],
}

impl RegisterFile {
    /// Snapshot for a program that has not run yet.
    pub const fn new(stack_top: u32, entry: u32) -> Self {
        let mut words = [0; NUM_REGS];
        words[SP] = stack_top;
        words[PC] = entry;
        words[CPSR] = CPSR_USER_MODE;
        Self { words }
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.words.get(index).copied()
    }

    /// Store a value received in a `P` packet.
    ///
    /// `raw` was accumulated from the wire most-significant digit first, so
    /// its byte order is reversed before it is stored. Returns `false` and
    /// leaves the snapshot untouched when `index` is out of range.
    pub fn set_by_index(&mut self, index: usize, raw: u32) -> bool {
        if index < NUM_REGS {
            self.words[index] = swap_byte_order(raw);
            true
        } else {
            log::warn!("ignoring write to register {index}");
            false
        }
    }

    /// Serialize the whole snapshot in target (little-endian) layout.
    pub fn dump_all(&self) -> [u8; REGISTER_BYTES] {
        let mut bytes = [0u8; REGISTER_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Overwrite the whole snapshot from its serialized form.
    pub fn load_all(&mut self, bytes: &[u8; REGISTER_BYTES]) {
        for (word, chunk) in self.words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
    }

    pub const fn pc(&self) -> u32 {
        self.words[PC]
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.words[PC] = pc;
    }

    pub const fn sp(&self) -> u32 {
        self.words[SP]
    }

    pub const fn cpsr(&self) -> u32 {
        self.words[CPSR]
    }

    /// Raw words for the exception entry/exit code.
    pub fn as_words(&self) -> &[u32; NUM_REGS] {
        &self.words
    }

    pub fn as_words_mut(&mut self) -> &mut [u32; NUM_REGS] {
        &mut self.words
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
