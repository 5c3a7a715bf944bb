//! Integration tests: the simulator served over TCP, driven by the packet client.

use std::net::SocketAddr;
use std::thread;
use tether_core::debug::breakpoint::TRAP_INSTRUCTION;
use tether_core::debug::registers::{CPSR, NUM_REGS, PC, SP};
use tether_sim::{SimConfig, Simulator, StubClient};

const LOAD: u32 = 0x8000;

/// Start a simulator on an ephemeral port; it lives until the test process exits.
fn start_simulator() -> SocketAddr {
    let sim = Simulator::new(SimConfig {
        listen: "127.0.0.1:0".to_string(),
        load_address: LOAD,
        stack_top: 0x7ff0,
        yield_interval: 256,
        ..SimConfig::default()
    })
    .expect("Failed to create simulator");
    let listener = sim.bind().expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    thread::spawn(move || sim.serve(&listener));
    addr
}

#[test]
fn test_attach_reports_trap_and_initial_registers() {
    let mut client = StubClient::connect(start_simulator()).unwrap();
    assert_eq!(client.initial_stop(), "S05");
    assert_eq!(client.request("?").unwrap(), "S05");

    let regs = client.read_registers().unwrap();
    assert_eq!(regs.len(), NUM_REGS);
    assert_eq!(regs[SP], 0x7ff0);
    assert_eq!(regs[PC], LOAD);
    assert_eq!(regs[CPSR], 0x10);
}

#[test]
fn test_breakpoint_memory_stays_clean_while_halted() {
    let mut client = StubClient::connect(start_simulator()).unwrap();
    client.write_memory(0x8010, &[0x00, 0x00, 0xa0, 0xe1]).unwrap();
    assert!(client.set_breakpoint(0x8010).unwrap());
    assert_eq!(client.read_memory(0x8010, 4).unwrap(), vec![0x00, 0x00, 0xa0, 0xe1]);

    client.send_resume("c").unwrap();
    assert_eq!(client.wait_stop().unwrap(), "S05");

    let regs = client.read_registers().unwrap();
    assert_eq!(regs[PC], 0x8010);
    // Trap words are never visible to the debugger.
    assert_eq!(client.read_memory(0x8010, 4).unwrap(), vec![0x00, 0x00, 0xa0, 0xe1]);

    client.clear_breakpoint(0x8010).unwrap();
    client.send_resume("s").unwrap();
    assert_eq!(client.wait_stop().unwrap(), "S05");
    assert_eq!(client.read_registers().unwrap()[PC], 0x8014);
}

#[test]
fn test_program_trap_instruction_halts() {
    let mut client = StubClient::connect(start_simulator()).unwrap();
    client
        .write_memory(0x8020, &TRAP_INSTRUCTION.to_le_bytes())
        .unwrap();
    client.send_resume("c").unwrap();
    assert_eq!(client.wait_stop().unwrap(), "S05");
    assert_eq!(client.read_registers().unwrap()[PC], 0x8020);
}

#[test]
fn test_break_character_interrupts_running_target() {
    let mut client = StubClient::connect(start_simulator()).unwrap();
    client.send_resume("c").unwrap();
    client.interrupt().unwrap();
    assert_eq!(client.wait_stop().unwrap(), "S02");
    assert_eq!(client.request("?").unwrap(), "S02");
}

#[test]
fn test_register_write_and_unsupported_packets() {
    let mut client = StubClient::connect(start_simulator()).unwrap();
    client.write_register(PC as u32, 0x9000).unwrap();
    assert_eq!(client.read_registers().unwrap()[PC], 0x9000);
    assert_eq!(client.request("qSupported:swbreak+").unwrap(), "");
    assert_eq!(client.request("D").unwrap(), "OK");
}

#[test]
fn test_reconnect_gets_fresh_target() {
    let addr = start_simulator();
    {
        let mut client = StubClient::connect(addr).unwrap();
        client.write_memory(0x9000, &[0xaa]).unwrap();
        assert!(client.set_breakpoint(0x9000).unwrap());
    }
    let mut client = StubClient::connect(addr).unwrap();
    assert_eq!(client.read_memory(0x9000, 1).unwrap(), vec![0x00]);
    assert_eq!(client.initial_stop(), "S05");
}
