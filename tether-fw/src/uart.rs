//! Mini-UART link to the debugger, 8N1 at 115200 baud.

use core::convert::Infallible;
use core::sync::atomic::{AtomicU8, Ordering};
use tether_core::transport::BREAK_CHAR;
use tether_core::Transport;

use crate::bcm::{self, *};

const LSR_DATA_READY: u32 = 0x01;
const LSR_TX_EMPTY: u32 = 0x20;
/// Divisor for 115200 baud from the 250 MHz core clock.
const BAUD_115200: u32 = 270;

/// Last byte taken by the receive interrupt.
static LAST_RX: AtomicU8 = AtomicU8::new(0);

pub struct MiniUart {
    _private: (),
}

impl MiniUart {
    /// Route GPIO 14/15 to the mini-UART and bring it up with TX and RX enabled.
    pub fn init() -> Self {
        let mut sel = bcm::read(GPFSEL1);
        sel = (sel & !(7 << 12)) | (2 << 12);
        sel = (sel & !(7 << 15)) | (2 << 15);
        bcm::write(GPFSEL1, sel);

        bcm::write(GPPUD, 0);
        bcm::delay(150);
        bcm::write(GPPUDCLK0, (1 << 14) | (1 << 15));
        bcm::delay(150);
        bcm::write(GPPUDCLK0, 0);

        bcm::write(AUX_ENABLES, 1);
        bcm::write(MU_CNTL, 0);
        bcm::write(MU_IER, 0);
        bcm::write(MU_LCR, 3);
        bcm::write(MU_MCR, 0);
        bcm::write(MU_BAUD, BAUD_115200);
        bcm::write(MU_CNTL, 3);

        Self { _private: () }
    }

    /// Handle to an already initialised UART, for trap entries after boot.
    pub const fn attach() -> Self {
        Self { _private: () }
    }

    pub fn puts(&mut self, s: &str) {
        for byte in s.bytes() {
            put(byte);
        }
    }
}

fn put(byte: u8) {
    while bcm::read(MU_LSR) & LSR_TX_EMPTY == 0 {}
    bcm::write(MU_IO, u32::from(byte));
}

impl Transport for MiniUart {
    type Error = Infallible;

    fn send_byte(&mut self, byte: u8) -> Result<(), Infallible> {
        put(byte);
        Ok(())
    }

    fn receive_byte(&mut self) -> Result<u8, Infallible> {
        while bcm::read(MU_LSR) & LSR_DATA_READY == 0 {}
        Ok(bcm::read(MU_IO) as u8)
    }

    fn enable_break_detection(&mut self) {
        LAST_RX.store(0, Ordering::Relaxed);
        bcm::write(MU_IER, bcm::read(MU_IER) | 1);
        bcm::write(IRQ_ENABLE_1, AUX_IRQ_LINE);
        bcm::set_irq_enabled(true);
    }

    fn disable_break_detection(&mut self) {
        bcm::write(MU_IER, bcm::read(MU_IER) & !1);
        bcm::write(IRQ_DISABLE_1, AUX_IRQ_LINE);
        bcm::set_irq_enabled(false);
    }
}

/// Called from the IRQ vector. Returns 1 when the debugger sent a break and the
/// vector should save the registers and enter `gdb_main` with `INT`.
#[no_mangle]
pub extern "C" fn tether_irq() -> u32 {
    if bcm::read(IRQ_PENDING_1) & AUX_IRQ_LINE != 0
        && bcm::read(AUX_IRQ) & 1 != 0
        && (bcm::read(MU_IIR) >> 1) & 0x03 == 2
    {
        LAST_RX.store(bcm::read(MU_IO) as u8, Ordering::Relaxed);
    }
    u32::from(LAST_RX.load(Ordering::Relaxed) == BREAK_CHAR)
}
