/*
 * Scheduler
 *
 * Owns the five priority ready queues and the wait queue, the
 * priority-fallback selection algorithm, and the machine-level context
 * switch. The process module owns descriptor content; this module
 * owns what a descriptor's `status_link` field means.
 */

use crate::arch::x86_64::interrupts::without_interrupts;
use crate::arch::x86_64::pic;
use crate::core_state::{Core, with_core};
use crate::process::{self, DescriptorId, Membership, Priority, Status};
use crate::queue::{Link, LinkKind};

pub const TIMER_HZ: u32 = 500;
pub const TIMER_IRQ: u8 = 0;

/// Unlinks `id` from whichever queue (if any) it is currently a
/// member of, per its own `membership` tag, and clears the tag. The
/// single point every other operation in this module goes through
/// rather than guessing which of the six queues to call `remove` on.
pub fn dequeue(core: &mut Core, id: DescriptorId) {
    let membership = core.slots[id].map(|d| d.membership).unwrap_or(Membership::None);
    match membership {
        Membership::None => return,
        Membership::Wait => core.wait.remove(&mut core.slots, LinkKind::Status, id),
        Membership::Ready(idx) => core.ready[idx].remove(&mut core.slots, LinkKind::Status, id),
    }
    if let Some(d) = core.slots[id].as_mut() {
        d.membership = Membership::None;
    }
}

/// Queue-add primitives, one per ready level, exposed for the process
/// module (`ready_process` calls into these through
/// `ready_add_by_priority` rather than touching the ready array
/// directly).
pub fn ready_kern_add(core: &mut Core, id: DescriptorId) {
    ready_add(core, id, Priority::Kern);
}
pub fn ready_high_add(core: &mut Core, id: DescriptorId) {
    ready_add(core, id, Priority::High);
}
pub fn ready_norm_add(core: &mut Core, id: DescriptorId) {
    ready_add(core, id, Priority::Norm);
}
pub fn ready_low_add(core: &mut Core, id: DescriptorId) {
    ready_add(core, id, Priority::Low);
}
pub fn ready_idle_add(core: &mut Core, id: DescriptorId) {
    ready_add(core, id, Priority::Idle);
}

/// Appends `id` onto the wait queue. Not yet reachable from any
/// caller in this kernel (no blocking I/O or IPC is in scope), but
/// kept as a real primitive alongside the five ready-queue adders
/// rather than an empty placeholder.
pub fn wait_add(core: &mut Core, id: DescriptorId) {
    core.wait.push_back(&mut core.slots, LinkKind::Status, id);
    if let Some(d) = core.slots[id].as_mut() {
        d.membership = Membership::Wait;
    }
}

fn ready_add(core: &mut Core, id: DescriptorId, priority: Priority) {
    let idx = priority.index();
    core.ready[idx].push_back(&mut core.slots, LinkKind::Status, id);
    if let Some(d) = core.slots[id].as_mut() {
        d.membership = Membership::Ready(idx);
    }
}

pub fn ready_add_by_priority(core: &mut Core, id: DescriptorId, priority: Priority) {
    ready_add(core, id, priority);
}

/// Selects the next descriptor to run: the head of the highest
/// non-empty ready queue, KERN first and IDLE last. If every ready
/// queue is empty, there is nothing else to run, and the currently
/// running descriptor (not a member of any ready queue by invariant)
/// keeps the CPU.
pub fn get_next_process(core: &mut Core) -> DescriptorId {
    for q in core.ready.iter_mut() {
        if let Some(id) = q.pop_front(&mut core.slots, LinkKind::Status) {
            if let Some(d) = core.slots[id].as_mut() {
                d.membership = Membership::None;
            }
            return id;
        }
    }
    core.current
}

/// Performs a full context switch onto `next`. `eoi_flag` is set by
/// the timer handler (this switch happens inside an IRQ0 handler that
/// still owes the PIC an end-of-interrupt) and clear for a synchronous
/// yield. Never returns: the caller resumes only when something
/// switches back to its descriptor, landing inside whichever frame
/// `switch_to` or `create_process` prepared, not inside this call.
///
/// Precondition: `next` must be a genuinely different descriptor from
/// the one currently running, and must hold a freshly valid
/// `saved_rsp` — either a register frame the timer handler just
/// captured for some other outgoing descriptor, or a descriptor that
/// has never run and is resuming via `create_process`'s initial
/// frame. The case where the current descriptor simply keeps running
/// (quantum not expired, or expired with nothing else ready) never
/// reaches this function — the timer handler's EOI path and
/// `yield_now`'s `next != current` guard both short-circuit before
/// calling in, since no frame exists to resume into and quantum must
/// not be refilled for a descriptor that never stopped running.
pub fn switch_to(next: DescriptorId, eoi_flag: bool) -> ! {
    let next_rsp = without_interrupts(|| {
        with_core(|core| {
            let outgoing = core.current;
            debug_assert_ne!(next, outgoing, "switch_to must switch to a different descriptor");

            if let Some(d) = core.slots[outgoing].as_mut() {
                if d.status == Status::Running {
                    d.status = Status::Ready;
                }
            }
            if matches!(core.slots[outgoing].map(|d| d.status), Some(Status::Ready)) {
                let priority = core.slots[outgoing].expect("checked Some above").priority;
                ready_add_by_priority(core, outgoing, priority);
            }

            if eoi_flag {
                pic::driver().eoi(TIMER_IRQ);
            }

            dequeue(core, next);

            let d = core.slots[next]
                .as_mut()
                .expect("switch_to: target descriptor must exist");
            d.status = Status::Running;
            d.quantum = d.priority.value();
            d.status_link = Link::self_looped(next);
            core.current = next;
            d.saved_rsp
        })
    });

    unsafe { resume(next_rsp) }
}

/// Synchronous yield: picks the next descriptor and switches to it
/// immediately if there is one other than the caller. Returns
/// normally (without switching) if nothing else is ready — the
/// caller simply keeps running.
pub fn yield_now() {
    let current = process::current_id();
    let next = without_interrupts(|| with_core(get_next_process));
    if next != current {
        switch_to(next, false);
    }
}

/// Reprograms the PIC, arms the PIT at `TIMER_HZ`, and unmasks the
/// timer line. The IDT already wires vector 0x20 to
/// `timer::preemptive_timer_interrupt_handler` at load time; this
/// just brings the hardware up to match. Must run after `gdt::init`,
/// `idt::init`, and `process::process_init`, and before interrupts are
/// enabled globally.
pub fn init() {
    pic::init();
    pic::init_pit(TIMER_HZ);
    pic::driver().enable_irq(TIMER_IRQ);
    with_core(|core| core.enabled = true);
    log::info!("scheduler initialized, timer armed at {}Hz", TIMER_HZ);
}

/// Resumes execution at `rsp`, overlaying a `RegisterFrame` on the
/// stack it points to. The mirror image of the push sequence in
/// `timer::preemptive_timer_interrupt_handler` and of the frame
/// `process::create_process` builds by hand. `pub(crate)` so the timer
/// handler's EOI path can resume the same captured frame directly,
/// without going through `switch_to`, when the interrupted descriptor
/// simply keeps running.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn resume(rsp: u64) -> ! {
    core::arch::naked_asm!(
        "mov rsp, rdi",
        "pop rax",
        "pop rbx",
        "pop rcx",
        "pop rdx",
        "pop rsi",
        "pop rdi",
        "pop rbp",
        "pop r8",
        "pop r9",
        "pop r10",
        "pop r11",
        "pop r12",
        "pop r13",
        "pop r14",
        "pop r15",
        "add rsp, 32", // reserved ds/es/fs/gs padding, never restored
        "add rsp, 8",  // vector, diagnostic only
        "iretq",
    );
}
