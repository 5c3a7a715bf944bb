//! BCM2835 peripheral registers used by the stub.

use core::ptr::{read_volatile, write_volatile};

const PERIPHERAL_BASE: usize = 0x2000_0000;

pub const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;
pub const GPFSEL1: usize = GPIO_BASE + 0x04;
pub const GPPUD: usize = GPIO_BASE + 0x94;
pub const GPPUDCLK0: usize = GPIO_BASE + 0x98;

pub const AUX_BASE: usize = PERIPHERAL_BASE + 0x21_5000;
pub const AUX_IRQ: usize = AUX_BASE;
pub const AUX_ENABLES: usize = AUX_BASE + 0x04;
pub const MU_IO: usize = AUX_BASE + 0x40;
pub const MU_IER: usize = AUX_BASE + 0x44;
pub const MU_IIR: usize = AUX_BASE + 0x48;
pub const MU_LCR: usize = AUX_BASE + 0x4c;
pub const MU_MCR: usize = AUX_BASE + 0x50;
pub const MU_LSR: usize = AUX_BASE + 0x54;
pub const MU_CNTL: usize = AUX_BASE + 0x60;
pub const MU_BAUD: usize = AUX_BASE + 0x68;

pub const IRQ_BASE: usize = PERIPHERAL_BASE + 0xb000;
pub const IRQ_PENDING_1: usize = IRQ_BASE + 0x204;
pub const IRQ_ENABLE_1: usize = IRQ_BASE + 0x210;
pub const IRQ_DISABLE_1: usize = IRQ_BASE + 0x21c;

/// Interrupt line of the AUX block (mini-UART) in the first IRQ bank.
pub const AUX_IRQ_LINE: u32 = 1 << 29;

#[inline(always)]
pub fn read(register: usize) -> u32 {
    // SAFETY: every caller passes one of the peripheral addresses above.
    unsafe { read_volatile(register as *const u32) }
}

#[inline(always)]
pub fn write(register: usize, value: u32) {
    // SAFETY: see `read`.
    unsafe { write_volatile(register as *mut u32, value) }
}

/// Busy-wait roughly `cycles` loop iterations.
pub fn delay(cycles: u32) {
    for _ in 0..cycles {
        core::hint::spin_loop();
    }
}

/// Unmask or mask IRQs at the core.
pub fn set_irq_enabled(enabled: bool) {
    // SAFETY: toggles only the CPSR I bit.
    unsafe {
        if enabled {
            core::arch::asm!("cpsie i", options(nomem, nostack));
        } else {
            core::arch::asm!("cpsid i", options(nomem, nostack));
        }
    }
}
