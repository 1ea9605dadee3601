/*
 * Kernel Utilities and Support Functions
 *
 * Debug console plumbing used throughout the kernel: a raw serial
 * writer, the print!/serial_println! macros built on it, the `log`
 * facade logger, and the IRQ-safe raw logging path for interrupt and
 * fault contexts.
 */

pub mod writer;
#[macro_use]
pub mod macros;
pub mod debug;
