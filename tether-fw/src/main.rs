//! Bare-metal debug stub for the BCM2835.
//!
//! The board assembly owns the exception vectors. On an undefined-instruction
//! trap (the breakpoint word) or a break interrupt it saves the user registers
//! into the block returned by `tether_registers` and branches to `gdb_main`
//! with the signal number in r0. `switch_back` restores that block and
//! returns to user mode.

#![no_std]
#![no_main]

mod bcm;
mod memory;
mod uart;

use core::panic::PanicInfo;
use core::ptr::{addr_of, addr_of_mut};
use tether_core::{Handoff, RegisterFile, Signal, Stub};

use crate::memory::RawMemory;
use crate::uart::MiniUart;

type BoardStub = Stub<MiniUart, RawMemory>;

extern "C" {
    /// Top of the supervisor stack; the debugged program starts with it.
    static stack_svr: u8;
    /// Where the program is loaded and starts executing.
    static load_addr: u8;

    /// Restore the user registers from `registers` and resume in user mode.
    fn switch_back(registers: *const u32) -> !;
}

static mut STUB: Option<BoardStub> = None;

fn stub() -> &'static mut BoardStub {
    // SAFETY: the stub runs with IRQs masked on a single core; only the trap
    // path touches `STUB`, and never re-entrantly.
    let slot = unsafe { &mut *addr_of_mut!(STUB) };
    slot.get_or_insert_with(|| {
        // SAFETY: linker symbols; only their addresses are used.
        let (stack_top, entry) = unsafe { (addr_of!(stack_svr) as u32, addr_of!(load_addr) as u32) };
        Stub::new(MiniUart::attach(), RawMemory, RegisterFile::new(stack_top, entry))
    })
}

struct Board;

impl Handoff for Board {
    fn switch_back(&mut self, registers: &RegisterFile) -> ! {
        // SAFETY: `registers` lives in the static stub and outlives the jump.
        unsafe { switch_back(registers.as_words().as_ptr()) }
    }
}

/// Register block the vectors save into and `switch_back` restores from.
#[no_mangle]
pub extern "C" fn tether_registers() -> *mut u32 {
    stub().registers_mut().as_words_mut().as_mut_ptr()
}

/// Trap entry from the exception vectors.
#[no_mangle]
pub extern "C" fn gdb_main(sig: u32) -> ! {
    let signal = u8::try_from(sig)
        .ok()
        .and_then(Signal::from_raw)
        .unwrap_or_default();
    stub().enter(signal, &mut Board)
}

#[no_mangle]
pub extern "C" fn main() -> ! {
    let mut uart = MiniUart::init();
    bcm::delay(100);
    uart.puts("Kernel Panic gdb stub\r\n");
    uart.puts("The risk is all yours\r\n");
    gdb_main(u32::from(Signal::Trap.as_raw()))
}

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    bcm::set_irq_enabled(false);
    stub().enter(Signal::Abrt, &mut Board)
}
