//! Trap-entry and resume coordination.
//!
//! A [`Stub`] owns everything the debugger can see or change while the
//! program is halted. Every halt, whatever its cause, goes through
//! [`Stub::trap_entry`]: clean the trap words out of memory, report the stop,
//! serve commands, then plant the traps again and arm break detection.

use crate::codec::Link;
use crate::debug::{BreakpointTable, RegisterFile, Signal};
use crate::dispatch::ResumeKind;
use crate::error::StubError;
use crate::memory::TargetMemory;
use crate::transport::Transport;
use core::convert::Infallible;

/// Hands the CPU back to the interrupted program.
///
/// Implemented by the exception-return code: reload the CPU from the snapshot
/// and jump to its program counter. Control only comes back through the next
/// trap entry.
pub trait Handoff {
    fn switch_back(&mut self, registers: &RegisterFile) -> !;
}

/// The debug stub and all of its state.
pub struct Stub<T, M> {
    pub(crate) link: Link<T>,
    pub(crate) memory: M,
    pub(crate) registers: RegisterFile,
    pub(crate) breakpoints: BreakpointTable,
    pub(crate) last_signal: Signal,
}

impl<T: Transport, M: TargetMemory> Stub<T, M> {
    pub fn new(transport: T, memory: M, registers: RegisterFile) -> Self {
        Self {
            link: Link::new(transport),
            memory,
            registers,
            breakpoints: BreakpointTable::new(),
            last_signal: Signal::Trap,
        }
    }

    /// Run one trap cycle.
    ///
    /// The register snapshot must already hold the interrupted program's
    /// state. On `Ok` the breakpoints are planted, break detection is armed
    /// and the snapshot is what the program should resume with; the caller
    /// performs the actual hand-off. On a link failure memory is left clean,
    /// and a later trap entry on the same stub only restores what was planted.
    pub fn trap_entry(&mut self, signal: Signal) -> Result<ResumeKind, StubError<T::Error>> {
        self.link.transport_mut().disable_break_detection();
        self.breakpoints.restore_all(&mut self.memory);
        self.breakpoints.clear_step();
        self.last_signal = signal;
        log::debug!("trap entry: {signal:?} @ 0x{:08x}", self.registers.pc());

        self.link
            .send_stop_report(signal.as_raw())
            .map_err(StubError::Link)?;
        let kind = self.serve()?;

        self.breakpoints.activate_all(&mut self.memory);
        self.link.transport_mut().enable_break_detection();
        log::debug!("{kind:?} from 0x{:08x}", self.registers.pc());
        Ok(kind)
    }

    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Snapshot access for the trap-entry code that captures CPU state.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Registers and memory together, for code that plays the CPU while the
    /// program runs.
    pub fn target_mut(&mut self) -> (&mut RegisterFile, &mut M) {
        (&mut self.registers, &mut self.memory)
    }

    pub const fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    pub const fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub const fn transport(&self) -> &T {
        self.link.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    pub const fn last_signal(&self) -> Signal {
        self.last_signal
    }

    pub fn set_last_signal(&mut self, signal: Signal) {
        self.last_signal = signal;
    }
}

impl<T, M> Stub<T, M>
where
    T: Transport<Error = Infallible>,
    M: TargetMemory,
{
    /// Entry point for the exception vectors: run a trap cycle, then leave
    /// through `handoff`. Never returns.
    pub fn enter<H: Handoff>(&mut self, signal: Signal, handoff: &mut H) -> ! {
        let kind = match self.trap_entry(signal) {
            Ok(kind) => kind,
            Err(StubError::Link(never)) => match never {},
        };
        log::trace!("handing off for {kind:?}");
        handoff.switch_back(&self.registers)
    }
}
