/*
 * Architecture Support
 *
 * Only x86_64 is implemented; this indirection exists so the core
 * (process/scheduler/timer) can eventually be ported without
 * touching its own code, per the teacher's existing module split.
 */

#[cfg(target_arch = "x86_64")]
pub mod x86_64;
