/*
 * Low-Level I/O
 *
 * Port-mapped I/O primitives for hardware communication. The
 * syscall-era device/file-descriptor/VFS abstraction layer this
 * module used to re-export is gone along with the syscall interface
 * itself (no filesystem, no shell, no user processes in this kernel's
 * scope) — only the `Io`/`Pio`/`ReadOnly` port wrappers survive, used
 * by the PIC and UART drivers.
 */

pub mod pio;

pub use pio::{Io, Pio, ReadOnly};
