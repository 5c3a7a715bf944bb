//! Simulator configuration.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_core::SparseMemory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimConfig {
    /// Address to accept debugger connections on.
    pub listen: String,
    /// Where the image is loaded and where the program counter starts.
    pub load_address: u32,
    /// Initial stack pointer.
    pub stack_top: u32,
    /// Raw binary copied to `load_address` for every session.
    pub image: Option<PathBuf>,
    /// Instructions executed between scheduler yields while the target runs.
    pub yield_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:2345".to_string(),
            load_address: 0x8000,
            stack_top: 0x8000,
            image: None,
            yield_interval: 4096,
        }
    }
}

impl SimConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Build the initial target memory: the image, if any, at `load_address`.
    pub fn initial_memory(&self) -> Result<SparseMemory> {
        let mut memory = SparseMemory::new();
        if let Some(path) = &self.image {
            let image = std::fs::read(path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            memory.load(self.load_address, &image);
            log::info!(
                "Loaded {} bytes from {} @ 0x{:08X}",
                image.len(),
                path.display(),
                self.load_address
            );
        }
        Ok(memory)
    }
}

/// Parse a hex number with or without a `0x` prefix.
pub fn parse_hex_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(s, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_takes_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "listen": "0.0.0.0:3333", "load_address": 65536 }"#).unwrap();
        assert_eq!(config.listen, "0.0.0.0:3333");
        assert_eq!(config.load_address, 0x10000);
        assert_eq!(config.stack_top, 0x8000);
        assert_eq!(config.yield_interval, 4096);
        assert!(config.image.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = SimConfig {
            image: Some(PathBuf::from("kernel.img")),
            ..SimConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let decoded: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let config = SimConfig {
            image: Some(PathBuf::from("/nonexistent/tether/image.bin")),
            ..SimConfig::default()
        };
        let err = config.initial_memory().unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x8000"), Ok(0x8000));
        assert_eq!(parse_hex_u32("DEADbeef"), Ok(0xdead_beef));
        assert!(parse_hex_u32("xyz").is_err());
    }
}
