//! Tether Core - the protocol engine of the in-target debug stub.
//!
//! This crate speaks the debugger side of the GDB remote serial protocol for a
//! halted bare-metal ARM program: frame codec, command dispatcher, register
//! snapshot and the software breakpoint table that patches target memory.
//! Hardware access is reached only through the [`Transport`] and
//! [`TargetMemory`] traits, so the same engine runs on the board and on a host.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod codec;
pub mod debug;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use codec::Link;
pub use debug::{BreakpointTable, RegisterFile, Signal};
pub use dispatch::{Command, ResumeKind};
pub use error::{BreakpointError, StubError};
pub use memory::TargetMemory;
pub use session::{Handoff, Stub};
pub use transport::Transport;

#[cfg(feature = "std")]
pub use memory::SparseMemory;
#[cfg(feature = "std")]
pub use transport::ScriptedTransport;
