use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tether_sim::config::parse_hex_u32;
use tether_sim::{SimConfig, Simulator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the tether debug stub against a simulated target", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Load address and initial PC, hex
    #[arg(long, value_parser = parse_hex_u32)]
    load_address: Option<u32>,

    /// Initial stack pointer, hex
    #[arg(long, value_parser = parse_hex_u32)]
    stack_top: Option<u32>,

    /// Raw binary image to load at the load address
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Simulated instructions between thread yields while the target runs
    #[arg(long)]
    yield_interval: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(load_address) = args.load_address {
        config.load_address = load_address;
    }
    if let Some(stack_top) = args.stack_top {
        config.stack_top = stack_top;
    }
    if args.image.is_some() {
        config.image = args.image;
    }
    if let Some(yield_interval) = args.yield_interval {
        config.yield_interval = yield_interval;
    }

    let simulator = Simulator::new(config)?;
    let listener = simulator.bind()?;
    info!(
        "Kernel Panic gdb stub (simulated) listening on {}",
        listener.local_addr()?
    );
    info!("Connect with: target remote {}", simulator.config().listen);

    simulator.serve(&listener)
}
