//! Byte channel between the stub and the remote debugger.

/// Inline break character (Ctrl-C) the debugger sends to interrupt a running target.
pub const BREAK_CHAR: u8 = 0x03;

/// A blocking, byte-oriented link to the debugger.
///
/// Implementations busy-wait or block without timeout: a silent link stalls the
/// stub indefinitely. Break detection is armed only while the target runs and
/// disarmed for the whole time the stub executes.
pub trait Transport {
    /// Error raised when the link itself is gone. Bare-metal links use
    /// [`core::convert::Infallible`].
    type Error;

    /// Send one byte.
    fn send_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Block until one byte is received.
    fn receive_byte(&mut self) -> Result<u8, Self::Error>;

    /// Arm the asynchronous watch for [`BREAK_CHAR`].
    fn enable_break_detection(&mut self);

    /// Disarm the asynchronous break watch.
    fn disable_break_detection(&mut self);
}

#[cfg(feature = "std")]
pub use scripted::{ScriptError, ScriptedTransport};

#[cfg(feature = "std")]
mod scripted {
    use super::Transport;
    use std::collections::VecDeque;
    use thiserror::Error;

    /// Raised when a [`ScriptedTransport`] runs out of input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error("scripted input exhausted")]
    pub struct ScriptError;

    /// In-memory transport that replays a fixed input script and records
    /// everything the stub sends. Used by tests and benchmarks.
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        input: VecDeque<u8>,
        output: Vec<u8>,
        break_armed: bool,
    }

    impl ScriptedTransport {
        pub fn new(input: impl AsRef<[u8]>) -> Self {
            Self {
                input: input.as_ref().iter().copied().collect(),
                output: Vec::new(),
                break_armed: false,
            }
        }

        /// Append more bytes to the pending input.
        pub fn feed(&mut self, input: impl AsRef<[u8]>) {
            self.input.extend(input.as_ref());
        }

        /// Everything sent so far.
        pub fn output(&self) -> &[u8] {
            &self.output
        }

        /// Drain the recorded output.
        pub fn take_output(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.output)
        }

        pub fn remaining(&self) -> usize {
            self.input.len()
        }

        pub const fn break_armed(&self) -> bool {
            self.break_armed
        }
    }

    impl Transport for ScriptedTransport {
        type Error = ScriptError;

        fn send_byte(&mut self, byte: u8) -> Result<(), ScriptError> {
            self.output.push(byte);
            Ok(())
        }

        fn receive_byte(&mut self) -> Result<u8, ScriptError> {
            self.input.pop_front().ok_or(ScriptError)
        }

        fn enable_break_detection(&mut self) {
            self.break_armed = true;
        }

        fn disable_break_detection(&mut self) {
            self.break_armed = false;
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_transport_replays_and_records() {
        let mut link = ScriptedTransport::new(b"ab");
        assert_eq!(link.receive_byte(), Ok(b'a'));
        assert_eq!(link.receive_byte(), Ok(b'b'));
        assert_eq!(link.receive_byte(), Err(ScriptError));

        link.send_byte(b'+').unwrap();
        assert_eq!(link.output(), b"+");
        assert_eq!(link.take_output(), b"+".to_vec());
        assert!(link.output().is_empty());
    }

    #[test]
    fn test_scripted_transport_break_flag() {
        let mut link = ScriptedTransport::default();
        assert!(!link.break_armed());
        link.enable_break_detection();
        assert!(link.break_armed());
        link.disable_break_detection();
        assert!(!link.break_armed());
    }
}
