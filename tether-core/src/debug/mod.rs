//! Debug state module.
//!
//! Holds what the stub knows about the halted program: its register snapshot,
//! the software breakpoint table and the reason it last stopped.

pub mod breakpoint;
pub mod registers;

pub use breakpoint::{BreakpointEntry, BreakpointTable};
pub use registers::RegisterFile;

/// Stop signals reported to the debugger, in GDB numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Signal {
    Hup = 0x01,
    /// Interrupted by a break character from the debugger.
    Int = 0x02,
    Quit = 0x03,
    Ill = 0x04,
    /// Breakpoint or single-step completion.
    #[default]
    Trap = 0x05,
    Abrt = 0x06,
    Kill = 0x09,
    Sys = 0x0a,
    Segv = 0x0b,
    Term = 0x0f,
    Stop = 0x11,
}

impl Signal {
    /// Map a raw signal number back to a known signal.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0x01 => Self::Hup,
            0x02 => Self::Int,
            0x03 => Self::Quit,
            0x04 => Self::Ill,
            0x05 => Self::Trap,
            0x06 => Self::Abrt,
            0x09 => Self::Kill,
            0x0a => Self::Sys,
            0x0b => Self::Segv,
            0x0f => Self::Term,
            0x11 => Self::Stop,
            _ => return None,
        })
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

impl From<Signal> for u8 {
    fn from(signal: Signal) -> Self {
        signal.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_numbers_round_trip() {
        for signal in [
            Signal::Hup,
            Signal::Int,
            Signal::Quit,
            Signal::Ill,
            Signal::Trap,
            Signal::Abrt,
            Signal::Kill,
            Signal::Sys,
            Signal::Segv,
            Signal::Term,
            Signal::Stop,
        ] {
            assert_eq!(Signal::from_raw(signal.as_raw()), Some(signal));
        }
    }

    #[test]
    fn test_unknown_signal() {
        assert_eq!(Signal::from_raw(0x07), None);
        assert_eq!(Signal::from_raw(0xff), None);
    }

    #[test]
    fn test_default_is_trap() {
        assert_eq!(Signal::default(), Signal::Trap);
        assert_eq!(u8::from(Signal::Trap), 0x05);
    }
}
