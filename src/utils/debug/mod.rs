/*
 * Debugging and Logging Utilities
 */

pub mod irq_log;
pub mod logger;

/// Initialize debug infrastructure (COM2 port) before anything logs.
pub fn init_debug_infrastructure() {
    crate::drivers::serial::init_debug_port();
}
