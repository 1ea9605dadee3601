use crate::drivers::serial::COM2;
use core::fmt;

/// A simple writer that writes to the debug console's serial port.
pub struct Writer<'a> {
    serial: spin::MutexGuard<'a, crate::drivers::serial::SerialPort<crate::io::Pio<u8>>>,
}

impl<'a> Writer<'a> {
    /// Locks the serial port and returns a writer over it.
    pub fn new() -> Writer<'a> {
        Writer { serial: COM2.lock() }
    }

    pub fn write(&mut self, byte: u8) {
        self.serial.write(byte);
    }
}

impl<'a> fmt::Write for Writer<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write(byte);
        }
        Ok(())
    }
}
