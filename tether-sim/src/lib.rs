//! Tether Sim - runs the debug stub on the host.
//!
//! The stub engine from `tether-core` is served over TCP against a simulated
//! target, so a stock `gdb` (`target remote :2345`) or the bundled
//! `tether-cli` can exercise the protocol without a board attached.

#![allow(clippy::doc_markdown)]

pub mod client;
pub mod config;
pub mod cpu;
pub mod server;
pub mod transport;

pub use client::{ClientError, StubClient};
pub use config::SimConfig;
pub use cpu::{BreakPoll, SimCpu};
pub use server::Simulator;
pub use transport::TcpTransport;
