/*
 * Kernel Logging System
 *
 * Implements the `log` crate facade over the serial debug console.
 * Installing the logger is gated by the `dbg-console` feature
 * (SPEC_FULL §12, the spec's DISABLE_DBG_CONSOLE switch); every
 * log::info!/warn!/error! call site elsewhere stays unconditional,
 * since with the feature off `log`'s default no-op logger just
 * swallows them.
 */

use core::fmt::Write;
use log::{Level, LevelFilter, Metadata, Record};

use crate::serial_println;

struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            serial_println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Initializes the logger and optionally clears the screen.
///
/// With the `dbg-console` feature disabled this is a no-op: `log`
/// keeps its default no-op logger installed and every call site
/// elsewhere in the kernel is silently swallowed.
pub fn init(clearscr: bool) {
    #[cfg(feature = "dbg-console")]
    {
        if clearscr {
            _ = crate::utils::writer::Writer::new().write_str("\u{001B}[2J\u{001B}[H");
        }

        match log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info)) {
            Ok(_) => serial_println!("Logger initialized correctly"),
            Err(err) => panic!("Error with initializing logger: {}", err),
        }
    }
    #[cfg(not(feature = "dbg-console"))]
    {
        let _ = clearscr;
    }
}
