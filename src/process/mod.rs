/*
 * Process Module
 *
 * Owns the flat process descriptor, the fixed-capacity arena it lives
 * in, and the global registry linking every descriptor regardless of
 * scheduling state. The scheduler (`crate::scheduler`) owns what
 * happens to a descriptor's `status_link` field; this module owns the
 * descriptor's content and lifecycle (creation, priority/quantum
 * bookkeeping, termination, reclamation).
 */

use core::ptr::NonNull;

use crate::arch::x86_64::interrupts::without_interrupts;
use crate::core_state::{with_core, MAX_PROCESSES};
use crate::frame::RegisterFrame;
use crate::memory::stack;
use crate::queue::{Link, LinkKind};

pub const NAME_LEN: usize = 16;

pub const PTY_IDLE: u8 = 1;
pub const PTY_LOW: u8 = 2;
pub const PTY_NORM: u8 = 4;
pub const PTY_HIGH: u8 = 8;
pub const PTY_KERN: u8 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Init,
    Ready,
    Running,
    Ending,
    Zombie,
}

/// Doubles as the descriptor's initial quantum, per
/// `priority.value()`: higher priority, bigger slice.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Priority {
    Kern,
    High,
    Norm,
    Low,
    Idle,
}

impl Priority {
    pub fn value(self) -> u8 {
        match self {
            Priority::Kern => PTY_KERN,
            Priority::High => PTY_HIGH,
            Priority::Norm => PTY_NORM,
            Priority::Low => PTY_LOW,
            Priority::Idle => PTY_IDLE,
        }
    }

    /// Maps a raw priority byte onto one of the five defined levels,
    /// or `None` if it names none of them.
    pub fn from_value(v: u8) -> Option<Priority> {
        match v {
            PTY_KERN => Some(Priority::Kern),
            PTY_HIGH => Some(Priority::High),
            PTY_NORM => Some(Priority::Norm),
            PTY_LOW => Some(Priority::Low),
            PTY_IDLE => Some(Priority::Idle),
            _ => None,
        }
    }

    /// Index into the scheduler's ready-queue array, highest
    /// priority first.
    pub fn index(self) -> usize {
        match self {
            Priority::Kern => 0,
            Priority::High => 1,
            Priority::Norm => 2,
            Priority::Low => 3,
            Priority::Idle => 4,
        }
    }
}

pub type DescriptorId = usize;

/// Which of the scheduler's queues, if any, a descriptor's
/// `status_link` currently threads through. A link only encodes its
/// neighbors, not which queue they belong to, so this is what lets
/// `scheduler::dequeue` find the right one instead of guessing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Membership {
    None,
    Wait,
    Ready(usize),
}

/// Entry point signature for a freshly created process: argument
/// count and an argv-style array of borrowed C strings, matching the
/// bootstrap calling convention `create_process` lays out on the new
/// stack. Never returns — falling off the end goes through
/// `process_exit`, not a plain `ret`.
pub type EntryPoint = extern "C" fn(argc: usize, argv: *const *const u8) -> !;

#[derive(Clone, Copy)]
pub struct Descriptor {
    pub pid: u64,
    name: [u8; NAME_LEN],
    pub status: Status,
    pub priority: Priority,
    pub quantum: u8,
    pub total_quantum: u64,
    pub stack_base: usize,
    pub saved_rsp: u64,
    pub saved_ss: u16,
    pub saved_page_root: u64,
    pub(crate) status_link: Link,
    pub(crate) global_link: Link,
    pub(crate) membership: Membership,
}

impl Descriptor {
    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }

    fn set_name(&mut self, name: &str) {
        self.name = [0; NAME_LEN];
        let bytes = name.as_bytes();
        let copy_len = bytes.len().min(NAME_LEN - 1);
        self.name[..copy_len].copy_from_slice(&bytes[..copy_len]);
    }
}

/// Creates the bootstrap descriptor ("butler"): pid 1, KERN priority,
/// already RUNNING, self-looped (current, in no queue). Must run
/// exactly once, before the scheduler is initialized.
pub fn process_init() -> DescriptorId {
    without_interrupts(|| {
        with_core(|core| {
            let id = core.free_slot().expect("arena exhausted during process_init");
            let pid = core.next_pid;
            core.next_pid += 1;
            let mut d = Descriptor {
                pid,
                name: [0; NAME_LEN],
                status: Status::Running,
                priority: Priority::Kern,
                quantum: Priority::Kern.value(),
                total_quantum: 0,
                stack_base: 0,
                saved_rsp: 0,
                saved_ss: 0,
                saved_page_root: 0,
                status_link: Link::self_looped(id),
                global_link: Link::detached(),
                membership: Membership::None,
            };
            d.set_name("butler");
            core.slots[id] = Some(d);
            core.registry.push_back(&mut core.slots, LinkKind::Global, id);
            core.current = id;
            id
        })
    })
}

/// Marks `id` READY and enqueues it on its priority's ready queue,
/// first unlinking it from wherever it currently sits (the wait
/// queue, a stale ready queue, or nowhere). If `id`'s priority outranks
/// the descriptor presently running, this performs a synchronous
/// yield: the caller falls straight into the scheduler and does not
/// return here until it is chosen again. Otherwise `id` merely waits
/// its turn and the caller keeps running.
pub fn ready_process(id: DescriptorId) {
    let should_yield = without_interrupts(|| {
        with_core(|core| {
            let still_live = matches!(
                core.slots[id].map(|d| d.status),
                Some(Status::Init) | Some(Status::Ready) | Some(Status::Running)
            );
            if !still_live {
                return false;
            }
            crate::scheduler::dequeue(core, id);
            let priority = {
                let d = core.slots[id].as_mut().expect("checked live above");
                d.status = Status::Ready;
                d.priority
            };
            crate::scheduler::ready_add_by_priority(core, id, priority);

            let running_priority = core.slots[core.current].map(|d| d.priority);
            running_priority.is_none_or(|running| priority.value() > running.value())
        })
    });

    if should_yield {
        crate::scheduler::yield_now();
    }
}

/// Refills `id`'s quantum from its current priority. Called whenever
/// a descriptor is handed the CPU.
pub fn process_reset_quantum(id: DescriptorId) {
    without_interrupts(|| {
        with_core(|core| {
            if let Some(d) = core.slots[id].as_mut() {
                d.quantum = d.priority.value();
            }
        })
    });
}

/// Sets `id`'s priority. An unrecognized raw value silently coerces
/// to NORM. Does not relocate `id` between ready queues if it is
/// already enqueued — see `DESIGN.md`'s Open Question decisions.
pub fn process_set_priority(id: DescriptorId, pty: u8) {
    let priority = Priority::from_value(pty).unwrap_or(Priority::Norm);
    without_interrupts(|| {
        with_core(|core| {
            if let Some(d) = core.slots[id].as_mut() {
                d.priority = priority;
            }
        })
    });
}

/// Allocates a stack, lays out an initial register frame on it so the
/// first `switch_to` resumes straight into `entry(argc, argv)`, and
/// registers a new INIT descriptor at NORM priority. Returns `None`
/// (a null handle) on stack exhaustion or a full arena, never a
/// partially constructed descriptor.
pub fn create_process(
    name: &str,
    entry: EntryPoint,
    argc: usize,
    argv: *const *const u8,
) -> Option<DescriptorId> {
    let stack_ptr: NonNull<u8> = stack::alloc_stack()?;
    let stack_base = stack_ptr.as_ptr() as usize;
    let stack_top = stack_base + stack::STACK_SIZE;

    let frame_addr = stack_top - core::mem::size_of::<RegisterFrame>();
    let frame = frame_addr as *mut RegisterFrame;
    unsafe {
        core::ptr::write_bytes(frame, 0, 1);
        (*frame).rdi = argc as u64;
        (*frame).rsi = argv as u64;
        (*frame).rip = entry as usize as u64;
        (*frame).cs = crate::arch::x86_64::gdt::kernel_code_selector().0 as u64;
        (*frame).ss = crate::arch::x86_64::gdt::kernel_data_selector().0 as u64;
        (*frame).rflags = 0x202; // interrupts enabled on resume
        (*frame).rsp = stack_top as u64;
    }

    without_interrupts(|| {
        with_core(|core| {
            let Some(id) = core.free_slot() else {
                unsafe { stack::free_stack(stack_ptr) };
                return None;
            };
            let pid = core.next_pid;
            core.next_pid += 1;
            let mut d = Descriptor {
                pid,
                name: [0; NAME_LEN],
                status: Status::Init,
                priority: Priority::Norm,
                quantum: Priority::Norm.value(),
                total_quantum: 0,
                stack_base,
                saved_rsp: frame_addr as u64,
                saved_ss: crate::arch::x86_64::gdt::kernel_data_selector().0,
                saved_page_root: 0,
                status_link: Link::self_looped(id),
                global_link: Link::detached(),
                membership: Membership::None,
            };
            d.set_name(name);
            core.slots[id] = Some(d);
            core.registry.push_back(&mut core.slots, LinkKind::Global, id);
            Some(id)
        })
    })
}

/// Marks the currently running descriptor ENDING and falls into the
/// scheduler. Never returns: a descriptor that somehow gets resumed
/// after this is a scheduler invariant violation.
pub fn process_exit() -> ! {
    without_interrupts(|| {
        with_core(|core| {
            let id = core.current;
            if let Some(d) = core.slots[id].as_mut() {
                d.status = Status::Ending;
            }
            crate::scheduler::dequeue(core, id);
        })
    });
    crate::scheduler::yield_now();
    unreachable!("process_exit: scheduler resumed a descriptor marked ENDING");
}

/// Reclaims descriptors left ENDING or ZOMBIE: an ENDING descriptor
/// is demoted to ZOMBIE (giving the scheduler one more tick's worth
/// of grace in case anything still references it mid-switch), and a
/// ZOMBIE descriptor's stack is freed and its slot released. The
/// bootstrap descriptor calls this every time it is scheduled, since
/// nothing else in this kernel frees a terminated descriptor.
pub fn reap_finished() {
    without_interrupts(|| {
        with_core(|core| {
            for id in 0..MAX_PROCESSES {
                let Some(d) = core.slots[id] else { continue };
                match d.status {
                    Status::Ending => {
                        crate::scheduler::dequeue(core, id);
                        core.slots[id].as_mut().expect("checked Some above").status = Status::Zombie;
                    }
                    Status::Zombie => {
                        if let Some(base) = NonNull::new(d.stack_base as *mut u8) {
                            unsafe { stack::free_stack(base) };
                        }
                        core.registry.remove(&mut core.slots, LinkKind::Global, id);
                        core.slots[id] = None;
                    }
                    _ => {}
                }
            }
        })
    });
}

/// The descriptor currently holding the CPU.
pub fn current_id() -> DescriptorId {
    with_core(|core| core.current)
}

/// A snapshot of `id`'s descriptor, if the slot is occupied. Intended
/// for diagnostics and tests; scheduler code that needs to mutate a
/// descriptor goes through `with_core` directly.
pub fn snapshot(id: DescriptorId) -> Option<Descriptor> {
    with_core(|core| core.slots[id])
}
