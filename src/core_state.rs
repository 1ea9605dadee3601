/*
 * Shared Process/Scheduler Core State
 *
 * The process module and scheduler are one tightly coupled unit: the
 * descriptor arena, the global registry, the five ready queues, the
 * wait queue, and the tick/enabled bookkeeping all move under a
 * single critical section. Real mutual exclusion comes from disabling
 * interrupts around every public entry point, not from the `Mutex`
 * below — on this single-processor kernel the lock never contends;
 * it exists purely to get safe `&mut` access to `static` state past
 * the borrow checker, the same role `spin::Mutex<Option<Scheduler>>`
 * played in the teacher's own scheduler.
 */

use spin::{Mutex, MutexGuard};

use crate::process::Descriptor;
use crate::queue::Queue;

pub const MAX_PROCESSES: usize = 64;
pub const NO_CURRENT: usize = usize::MAX;

pub struct Core {
    pub slots: [Option<Descriptor>; MAX_PROCESSES],
    pub next_pid: u64,
    pub current: usize,
    pub registry: Queue,
    pub ready: [Queue; 5],
    pub wait: Queue,
    pub enabled: bool,
    pub tick_count: u64,
}

impl Core {
    const fn new() -> Self {
        Core {
            slots: [None; MAX_PROCESSES],
            next_pid: 1,
            current: NO_CURRENT,
            registry: Queue::new(),
            ready: [Queue::new(), Queue::new(), Queue::new(), Queue::new(), Queue::new()],
            wait: Queue::new(),
            enabled: false,
            tick_count: 0,
        }
    }

    /// Finds the first unoccupied arena slot, if any.
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }
}

static CORE: Mutex<Core> = Mutex::new(Core::new());

/// Runs `f` with exclusive access to the core state. Every call site
/// in `process` and `scheduler` wraps this in
/// `arch::x86_64::interrupts::without_interrupts` so the critical
/// section is never preempted by the timer tick.
pub fn with_core<R>(f: impl FnOnce(&mut Core) -> R) -> R {
    let mut guard: MutexGuard<Core> = CORE.lock();
    f(&mut guard)
}
