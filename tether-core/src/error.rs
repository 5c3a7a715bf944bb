//! Error types shared across the stub.

use thiserror::Error;

/// A failure that aborts the current trap cycle.
///
/// Protocol-level problems (unsupported commands, malformed hex, bad register
/// indices) are answered on the wire and never show up here. The only fatal
/// condition is losing the link itself.
#[derive(Debug, Error)]
pub enum StubError<E> {
    #[error("link failure: {0}")]
    Link(E),
}

/// Why a breakpoint could not be installed in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakpointError {
    /// Address 0 marks an empty slot and can never be a breakpoint target.
    #[error("address 0 cannot hold a breakpoint")]
    NullAddress,
    #[error("breakpoint table is full")]
    TableFull,
}
