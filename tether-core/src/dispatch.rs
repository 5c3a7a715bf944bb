//! Command dispatcher.
//!
//! One trap cycle runs the loop `AwaitingFrame -> CommandRead -> handler`
//! until a handler resumes the target. Each handler fully consumes its inbound
//! frame and acknowledges it before replying.

use crate::codec::{Link, FRAME_START};
use crate::debug::breakpoint::INSTRUCTION_SIZE;
use crate::debug::registers::REGISTER_BYTES;
use crate::error::StubError;
use crate::memory::TargetMemory;
use crate::session::Stub;
use crate::transport::Transport;

/// Success reply.
pub const REPLY_OK: &[u8] = b"OK";
/// Reply when the breakpoint table cannot take another entry.
pub const REPLY_TABLE_FULL: &[u8] = b"E01";
/// Empty payload: the protocol's "not supported".
pub const REPLY_UNSUPPORTED: &[u8] = b"";

/// How the debugger asked the target to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    Continue,
    Step,
}

/// A decoded command, with all its numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `?`
    Status,
    /// `g`
    ReadRegisters,
    /// `G`; the register payload is still on the link.
    WriteRegisters,
    /// `P index=value`
    WriteRegister { index: u32, value: u32 },
    /// `m addr,len`
    ReadMemory { address: u32, length: u32 },
    /// `M addr,len:`; the data is still on the link.
    WriteMemory { address: u32, length: u32 },
    /// `c`
    Continue,
    /// `s`
    Step,
    /// `Z0,addr,kind`
    InsertBreakpoint { address: u32 },
    /// `z0,addr,kind`
    RemoveBreakpoint { address: u32 },
    /// `D`
    Detach,
    /// `k`
    Kill,
    /// Anything else, keyed by its identifier byte.
    Unsupported(u8),
}

impl Command {
    /// Read the rest of a frame whose identifier byte was `id`.
    ///
    /// Every command except `G` and `M` comes back with its frame consumed and
    /// acknowledged. Those two leave their bulk payload, and the trailer after
    /// it, for the handler to stream.
    pub fn read<T: Transport>(id: u8, link: &mut Link<T>) -> Result<Self, T::Error> {
        let command = match id {
            b'?' => {
                link.acknowledge()?;
                Self::Status
            }
            b'g' => {
                link.acknowledge()?;
                Self::ReadRegisters
            }
            b'G' => Self::WriteRegisters,
            b'P' => {
                let index = link.read_variable_word(b'=')?;
                let value = link.read_variable_word(b'#')?;
                link.acknowledge_trailer()?;
                Self::WriteRegister { index, value }
            }
            b'm' => {
                let address = link.read_variable_word(b',')?;
                let length = link.read_variable_word(b'#')?;
                link.acknowledge_trailer()?;
                Self::ReadMemory { address, length }
            }
            b'M' => {
                let address = link.read_variable_word(b',')?;
                let length = link.read_variable_word(b':')?;
                Self::WriteMemory { address, length }
            }
            b'c' => {
                link.acknowledge()?;
                Self::Continue
            }
            b's' => {
                link.acknowledge()?;
                Self::Step
            }
            b'Z' | b'z' => {
                if link.get()? == b'0' {
                    // ','
                    link.get()?;
                    let address = link.read_variable_word(b',')?;
                    // kind is not needed: every breakpoint is one ARM word
                    link.acknowledge()?;
                    if id == b'Z' {
                        Self::InsertBreakpoint { address }
                    } else {
                        Self::RemoveBreakpoint { address }
                    }
                } else {
                    link.acknowledge()?;
                    Self::Unsupported(id)
                }
            }
            b'D' => {
                link.acknowledge()?;
                Self::Detach
            }
            b'k' => {
                link.acknowledge()?;
                Self::Kill
            }
            other => {
                link.acknowledge()?;
                Self::Unsupported(other)
            }
        };
        Ok(command)
    }
}

/// Dispatcher state within one trap cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingFrame,
    CommandRead(u8),
    Resumed(ResumeKind),
}

impl<T: Transport, M: TargetMemory> Stub<T, M> {
    /// Serve commands until the debugger resumes the target.
    pub(crate) fn serve(&mut self) -> Result<ResumeKind, StubError<T::Error>> {
        let mut state = State::AwaitingFrame;
        loop {
            state = match state {
                State::AwaitingFrame => {
                    self.link.skip_until(FRAME_START).map_err(StubError::Link)?;
                    State::CommandRead(self.link.get().map_err(StubError::Link)?)
                }
                State::CommandRead(id) => {
                    let command = Command::read(id, &mut self.link).map_err(StubError::Link)?;
                    log::trace!("command {command:?}");
                    self.execute(command).map_err(StubError::Link)?
                }
                State::Resumed(kind) => return Ok(kind),
            };
        }
    }

    fn execute(&mut self, command: Command) -> Result<State, T::Error> {
        match command {
            Command::Status => {
                self.link.send_stop_report(self.last_signal.as_raw())?;
            }
            Command::ReadRegisters => {
                self.link.send_block(&self.registers.dump_all())?;
            }
            Command::WriteRegisters => {
                let mut bytes = [0u8; REGISTER_BYTES];
                self.link.recv_block(&mut bytes)?;
                self.link.acknowledge()?;
                self.registers.load_all(&bytes);
                self.link.send_payload(REPLY_OK)?;
            }
            Command::WriteRegister { index, value } => {
                let index = usize::try_from(index).unwrap_or(usize::MAX);
                self.registers.set_by_index(index, value);
                self.link.send_payload(REPLY_OK)?;
            }
            Command::ReadMemory { address, length } => {
                let memory = &mut self.memory;
                self.link.send_block_with(length, |offset| {
                    memory.read_8(address.wrapping_add(offset))
                })?;
            }
            Command::WriteMemory { address, length } => {
                let memory = &mut self.memory;
                self.link.recv_block_with(length, |offset, byte| {
                    memory.write_8(address.wrapping_add(offset), byte);
                })?;
                self.link.acknowledge()?;
                self.link.send_payload(REPLY_OK)?;
            }
            Command::Continue => return Ok(State::Resumed(ResumeKind::Continue)),
            Command::Step => {
                let next = self.registers.pc().wrapping_add(INSTRUCTION_SIZE);
                self.breakpoints.arm_step(next);
                return Ok(State::Resumed(ResumeKind::Step));
            }
            Command::InsertBreakpoint { address } => {
                let reply = match self.breakpoints.insert(address) {
                    Ok(()) => REPLY_OK,
                    Err(_) => REPLY_TABLE_FULL,
                };
                self.link.send_payload(reply)?;
            }
            Command::RemoveBreakpoint { address } => {
                self.breakpoints.remove(address);
                self.link.send_payload(REPLY_OK)?;
            }
            Command::Detach | Command::Kill => {
                self.link.send_payload(REPLY_OK)?;
            }
            Command::Unsupported(id) => {
                log::trace!("unsupported command {:?}", char::from(id));
                self.link.send_payload(REPLY_UNSUPPORTED)?;
            }
        }
        Ok(State::AwaitingFrame)
    }
}
