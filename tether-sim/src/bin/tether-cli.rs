use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tether_core::debug::registers::{CPSR, LR, PC, SP};
use tether_sim::config::parse_hex_u32;
use tether_sim::StubClient;

#[derive(Parser)]
#[command(author, version, about = "Talk to a tether debug stub", long_about = None)]
struct Cli {
    /// Stub address
    #[arg(short, long, default_value = "127.0.0.1:2345")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the last stop signal
    Status,
    /// Dump the core registers
    Regs,
    /// Read memory
    Read {
        #[arg(value_parser = parse_hex_u32)]
        address: u32, // Hex string
        length: u32,
    },
    /// Write memory
    Write {
        #[arg(value_parser = parse_hex_u32)]
        address: u32, // Hex string
        data: String, // Hex string (e.g. "DEADBEEF")
    },
    /// Set breakpoint
    Break {
        #[arg(value_parser = parse_hex_u32)]
        address: u32,
    },
    /// Clear breakpoint
    Clear {
        #[arg(value_parser = parse_hex_u32)]
        address: u32,
    },
    /// Step one instruction and wait for the stop
    Step,
    /// Continue and wait for the next stop
    Cont,
    /// Send a raw packet payload and print the reply
    Raw { payload: String },
}

fn register_name(index: usize) -> String {
    match index {
        SP => "sp".to_string(),
        LR => "lr".to_string(),
        PC => "pc".to_string(),
        CPSR => "cpsr".to_string(),
        n => format!("r{n}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut client = StubClient::connect(&cli.addr)
        .with_context(|| format!("Failed to connect to {}", cli.addr))?;

    match cli.command {
        Commands::Status => {
            println!("Stop: {}", client.request("?")?);
        }
        Commands::Regs => {
            let regs = client.read_registers()?;
            for index in (0..=PC).chain([CPSR]) {
                if let Some(value) = regs.get(index) {
                    println!("{:>5}: 0x{:08X}", register_name(index), value);
                }
            }
        }
        Commands::Read { address, length } => {
            let data = client.read_memory(address, length)?;
            println!("0x{address:08X}: {data:02X?}");
        }
        Commands::Write { address, data } => {
            let bytes = hex::decode(data.trim_start_matches("0x"))?;
            client.write_memory(address, &bytes)?;
            println!("Written.");
        }
        Commands::Break { address } => {
            if client.set_breakpoint(address)? {
                println!("Breakpoint set at 0x{address:08X}");
            } else {
                println!("Breakpoint table full");
            }
        }
        Commands::Clear { address } => {
            client.clear_breakpoint(address)?;
            println!("Breakpoint cleared at 0x{address:08X}");
        }
        Commands::Step => {
            client.send_resume("s")?;
            println!("Stop: {}", client.wait_stop()?);
        }
        Commands::Cont => {
            client.send_resume("c")?;
            println!("Stop: {}", client.wait_stop()?);
        }
        Commands::Raw { payload } => {
            println!("{}", client.request(&payload)?);
        }
    }

    Ok(())
}
