/*
 * Legacy Interrupt-Controller Driver
 *
 * Programs the cascaded master/slave 8259 pair and exposes the
 * operations the scheduler and timer handler need as a dispatch
 * table (`PicDriver`), so a future second controller implementation
 * (e.g. APIC) could be selected at init without the core depending
 * on which one is in use.
 */

use spin::Mutex;
use x86_64::instructions::port::Port;

const MASTER_COMMAND: u16 = 0x20;
const MASTER_DATA: u16 = 0x21;
const SLAVE_COMMAND: u16 = 0xA0;
const SLAVE_DATA: u16 = 0xA1;

const ICW1_INIT: u8 = 0x11; // edge triggered, cascade, ICW4 needed
const ICW4_8086: u8 = 0x01;
const CMD_EOI: u8 = 0x20;
const CMD_READ_IRR: u8 = 0x0A;
const CMD_READ_ISR: u8 = 0x0B;

const MASTER_VECTOR_BASE: u8 = 0x20;
const SLAVE_VECTOR_BASE: u8 = 0x28;
const CASCADE_IRQ: u8 = 2;

/// Dispatch table exposed by an interrupt-controller driver.
/// Callers depend only on this trait, never on a concrete chip.
pub trait PicDriver: Send + Sync {
    fn enable_all(&self);
    fn disable_all(&self);
    fn enable_irq(&self, n: u8);
    fn disable_irq(&self, n: u8);
    fn eoi(&self, n: u8);
    fn read_in_service(&self) -> u16;
    fn read_request(&self) -> u16;
}

struct Ports {
    master_command: Port<u8>,
    master_data: Port<u8>,
    slave_command: Port<u8>,
    slave_data: Port<u8>,
}

impl Ports {
    const fn new() -> Self {
        Ports {
            master_command: Port::new(MASTER_COMMAND),
            master_data: Port::new(MASTER_DATA),
            slave_command: Port::new(SLAVE_COMMAND),
            slave_data: Port::new(SLAVE_DATA),
        }
    }
}

/// The legacy cascaded 8259 pair, remapped to vectors 0x20..0x2F.
pub struct Legacy8259 {
    ports: Mutex<Ports>,
}

impl Legacy8259 {
    pub const fn new() -> Self {
        Legacy8259 { ports: Mutex::new(Ports::new()) }
    }

    /// Remaps IRQ0-7 to 0x20-0x27 and IRQ8-15 to 0x28-0x2F, wires the
    /// cascade on line 2, selects 8086 mode, and leaves every line
    /// masked. Must run once before `enable_irq`/`enable_all`.
    pub fn init(&self) {
        let mut p = self.ports.lock();
        unsafe {
            p.master_command.write(ICW1_INIT);
            p.slave_command.write(ICW1_INIT);

            p.master_data.write(MASTER_VECTOR_BASE);
            p.slave_data.write(SLAVE_VECTOR_BASE);

            p.master_data.write(1 << CASCADE_IRQ);
            p.slave_data.write(CASCADE_IRQ);

            p.master_data.write(ICW4_8086);
            p.slave_data.write(ICW4_8086);

            // Leave all lines masked; callers enable individually.
            p.master_data.write(0xFF);
            p.slave_data.write(0xFF);
        }
        log::info!("8259 PIC remapped to vectors 0x20-0x2F, all lines masked");
    }

    fn controller_port(&self, n: u8) -> Option<bool> {
        // true => slave controller, false => master.
        match n {
            0..=7 => Some(false),
            8..=15 => Some(true),
            _ => None,
        }
    }
}

impl PicDriver for Legacy8259 {
    fn enable_all(&self) {
        let mut p = self.ports.lock();
        unsafe {
            p.master_data.write(0x00);
            p.slave_data.write(0x00);
        }
    }

    fn disable_all(&self) {
        let mut p = self.ports.lock();
        unsafe {
            p.master_data.write(0xFF);
            p.slave_data.write(0xFF);
        }
    }

    fn enable_irq(&self, n: u8) {
        let Some(slave) = self.controller_port(n) else { return };
        let bit = 1u8 << (n % 8);
        let mut p = self.ports.lock();
        let data = if slave { &mut p.slave_data } else { &mut p.master_data };
        unsafe {
            let mask = data.read();
            data.write(mask & !bit);
        }
    }

    fn disable_irq(&self, n: u8) {
        let Some(slave) = self.controller_port(n) else { return };
        let bit = 1u8 << (n % 8);
        let mut p = self.ports.lock();
        let data = if slave { &mut p.slave_data } else { &mut p.master_data };
        unsafe {
            let mask = data.read();
            data.write(mask | bit);
        }
    }

    fn eoi(&self, n: u8) {
        if n > 15 {
            return;
        }
        let mut p = self.ports.lock();
        unsafe {
            if n >= 8 {
                p.slave_command.write(CMD_EOI);
            }
            p.master_command.write(CMD_EOI);
        }
    }

    fn read_in_service(&self) -> u16 {
        self.read_register(CMD_ISR_SELECTOR)
    }

    fn read_request(&self) -> u16 {
        self.read_register(CMD_IRR_SELECTOR)
    }
}

// Not part of the public trait: the OCW3 command byte to latch
// either the in-service or request register onto the next read.
const CMD_ISR_SELECTOR: u8 = CMD_READ_ISR;
const CMD_IRR_SELECTOR: u8 = CMD_READ_IRR;

impl Legacy8259 {
    fn read_register(&self, ocw3: u8) -> u16 {
        let mut p = self.ports.lock();
        unsafe {
            p.master_command.write(ocw3);
            p.slave_command.write(ocw3);
            let master: u16 = p.master_command.read() as u16;
            let slave: u16 = p.slave_command.read() as u16;
            (slave << 8) | master
        }
    }
}

static DRIVER: Legacy8259 = Legacy8259::new();

/// Returns the active interrupt-controller driver.
pub fn driver() -> &'static dyn PicDriver {
    &DRIVER
}

/// Initializes the legacy driver. Called once from scheduler init.
pub fn init() {
    DRIVER.init();
}

/// Programs the Programmable Interval Timer to fire at `frequency_hz`.
pub fn init_pit(frequency_hz: u32) {
    const PIT_BASE_FREQUENCY: u32 = 1_193_182;
    let divisor = (PIT_BASE_FREQUENCY / frequency_hz) as u16;

    log::info!("programming PIT for {}Hz (divisor {})", frequency_hz, divisor);

    let mut command: Port<u8> = Port::new(0x43);
    let mut channel0: Port<u8> = Port::new(0x40);
    unsafe {
        command.write(0x36); // channel 0, lo/hi access, mode 3, binary
        channel0.write((divisor & 0xFF) as u8);
        channel0.write((divisor >> 8) as u8);
    }
}
