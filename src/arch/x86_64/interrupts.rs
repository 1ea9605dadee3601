/*
 * Interrupt Management
 *
 * Thin wrapper over the `x86_64` crate's interrupt control
 * instructions. `without_interrupts` is the one every critical
 * section in `process`/`scheduler` goes through to keep the timer
 * tick from reentering `with_core` mid-update.
 */

use x86_64::instructions::interrupts;

/// Enables interrupts globally. Must run only after the IDT is loaded.
pub fn enable() {
    interrupts::enable();
}

/// Executes `f` with interrupts disabled, restoring the prior state
/// (not unconditionally re-enabling) on return.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    interrupts::without_interrupts(f)
}
