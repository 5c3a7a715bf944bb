//! Simulated CPU.
//!
//! Enough of a processor to exercise the stub: every instruction word is a
//! no-op except the trap instruction, which halts back into the stub with the
//! program counter left on the trap word.

use std::thread;
use tether_core::debug::breakpoint::{INSTRUCTION_SIZE, TRAP_INSTRUCTION};
use tether_core::{RegisterFile, Signal, Stub, TargetMemory, Transport};

/// Non-blocking check for the debugger's break character.
pub trait BreakPoll: Transport {
    /// `true` once a break has arrived while detection is armed.
    fn poll_break(&mut self) -> Result<bool, Self::Error>;
}

pub struct SimCpu {
    yield_interval: u32,
}

impl SimCpu {
    pub fn new(yield_interval: u32) -> Self {
        Self {
            yield_interval: yield_interval.max(1),
        }
    }

    /// Execute one instruction. Returns the stop signal if it trapped.
    pub fn step<M: TargetMemory>(registers: &mut RegisterFile, memory: &mut M) -> Option<Signal> {
        let pc = registers.pc();
        if memory.read_32(pc) == TRAP_INSTRUCTION {
            return Some(Signal::Trap);
        }
        registers.set_pc(pc.wrapping_add(INSTRUCTION_SIZE));
        None
    }

    /// Run the resumed program until it traps or the debugger breaks in.
    pub fn run<T, M>(&self, stub: &mut Stub<T, M>) -> Result<Signal, T::Error>
    where
        T: BreakPoll,
        M: TargetMemory,
    {
        let mut executed: u32 = 0;
        loop {
            if stub.transport_mut().poll_break()? {
                log::debug!("Break received @ 0x{:08X}", stub.registers().pc());
                return Ok(Signal::Int);
            }
            let (registers, memory) = stub.target_mut();
            if let Some(signal) = Self::step(registers, memory) {
                return Ok(signal);
            }
            executed += 1;
            if executed == self.yield_interval {
                executed = 0;
                thread::yield_now();
            }
        }
    }
}
