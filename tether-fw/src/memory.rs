use core::ptr::{read_volatile, write_volatile};
use tether_core::TargetMemory;

/// The physical address space, unchecked. A bad address from the debugger
/// faults the board.
pub struct RawMemory;

impl TargetMemory for RawMemory {
    fn read_8(&mut self, address: u32) -> u8 {
        // SAFETY: the debugger owns the target; addresses are taken as given.
        unsafe { read_volatile(address as usize as *const u8) }
    }

    fn write_8(&mut self, address: u32, value: u8) {
        // SAFETY: as above.
        unsafe { write_volatile(address as usize as *mut u8, value) }
    }

    fn read_32(&mut self, address: u32) -> u32 {
        // SAFETY: breakpoint addresses are instruction-aligned.
        unsafe { read_volatile(address as usize as *const u32) }
    }

    fn write_32(&mut self, address: u32, value: u32) {
        // SAFETY: as above.
        unsafe { write_volatile(address as usize as *mut u32, value) }
    }
}
