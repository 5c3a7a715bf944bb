//! Debugger-facing TCP server.

use anyhow::{Context as _, Result};
use std::net::{TcpListener, TcpStream};
use tether_core::{RegisterFile, Signal, SparseMemory, Stub, StubError};

use crate::config::SimConfig;
use crate::cpu::SimCpu;
use crate::transport::TcpTransport;

/// A simulated board waiting for a debugger.
pub struct Simulator {
    config: SimConfig,
    image: SparseMemory,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self> {
        let image = config.initial_memory()?;
        Ok(Self { config, image })
    }

    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.config.listen)
            .with_context(|| format!("Failed to bind {}", self.config.listen))
    }

    /// Serve debuggers one after another, each against a freshly booted target.
    pub fn serve(&self, listener: &TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            let stream = stream.context("Failed to accept debugger connection")?;
            let peer = stream
                .peer_addr()
                .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
            log::info!("Debugger connected from {peer}");
            if let Err(e) = self.run_session(stream) {
                log::error!("Session with {peer} failed: {e:#}");
            }
        }
        Ok(())
    }

    /// Run trap cycles for one connection until the debugger goes away.
    pub fn run_session(&self, stream: TcpStream) -> Result<()> {
        let transport = TcpTransport::new(stream).context("Failed to set up link")?;
        let registers = RegisterFile::new(self.config.stack_top, self.config.load_address);
        let mut stub = Stub::new(transport, self.image.clone(), registers);
        let cpu = SimCpu::new(self.config.yield_interval);

        let mut signal = Signal::Trap;
        loop {
            match stub.trap_entry(signal) {
                Ok(kind) => log::debug!("Target resumed ({kind:?})"),
                Err(StubError::Link(e)) => {
                    log::info!("Debugger disconnected: {e}");
                    return Ok(());
                }
            }
            signal = match cpu.run(&mut stub) {
                Ok(signal) => signal,
                Err(e) => {
                    log::info!("Debugger disconnected while running: {e}");
                    return Ok(());
                }
            };
        }
    }
}
