/*
 * Timer-Tick Preemption Handler
 *
 * The naked-asm entry point for IRQ0 (remapped to vector 0x20). Builds
 * a `RegisterFrame` on the interrupted descriptor's own stack, hands
 * it to ordinary Rust code to do the quantum bookkeeping and pick the
 * next descriptor. If nothing needs to change, it issues EOI and
 * resumes the frame it just captured directly; otherwise it falls
 * into `scheduler::switch_to`. This function never returns the
 * ordinary way: control leaves it through one resume path or the
 * other, whichever descriptor ends up on the other end.
 */

use crate::arch::x86_64::interrupts::without_interrupts;
use crate::core_state::with_core;
use crate::frame::RegisterFrame;
use crate::process;
use crate::scheduler;

/// IRQ0 entry point, wired directly into the IDT by
/// `arch::x86_64::idt`. Pushes a full `RegisterFrame` (see
/// `crate::frame`) on top of whatever stack was active when the timer
/// fired, then calls into `tick` with a pointer to it.
#[unsafe(naked)]
pub unsafe extern "C" fn preemptive_timer_interrupt_handler() -> ! {
    core::arch::naked_asm!(
        "push 0x20",   // vector, diagnostic only
        "sub rsp, 32", // reserved ds/es/fs/gs padding, never captured
        "push r15",
        "push r14",
        "push r13",
        "push r12",
        "push r11",
        "push r10",
        "push r9",
        "push r8",
        "push rbp",
        "push rdi",
        "push rsi",
        "push rdx",
        "push rcx",
        "push rbx",
        "push rax",
        "mov rdi, rsp",
        "call {tick}",
        tick = sym tick,
    );
}

/// Bookkeeping half of the timer handler, running with an ordinary
/// Rust calling convention. `frame` points at the `RegisterFrame` the
/// naked preamble just built; its address doubles as the interrupted
/// descriptor's `saved_rsp`.
///
/// Three outcomes, matching the current descriptor's quantum state:
/// quantum not yet expired, quantum expired but nothing else ready, or
/// quantum expired with a genuinely different descriptor to run. Only
/// the last one calls `switch_to`; the first two fall straight through
/// to the EOI path and resume the frame just captured, since there is
/// no other descriptor to switch away from. Strict-priority preemption
/// ahead of quantum expiry is not this handler's job — it happens
/// synchronously in `process::ready_process` when a higher-priority
/// descriptor becomes ready.
extern "C" fn tick(frame: *mut RegisterFrame) -> ! {
    let current = process::current_id();

    let next = without_interrupts(|| {
        with_core(|core| {
            if let Some(d) = core.slots[current].as_mut() {
                d.saved_rsp = frame as u64;
                d.total_quantum += 1;
                if d.quantum > 0 {
                    d.quantum -= 1;
                }
            }
            core.tick_count += 1;

            let quantum_expired = core.slots[current].expect("current descriptor must exist").quantum == 0;
            if !quantum_expired {
                return current;
            }

            let candidate = scheduler::get_next_process(core);
            if candidate == current {
                if let Some(d) = core.slots[current].as_mut() {
                    d.quantum = d.priority.value();
                }
            }
            candidate
        })
    });

    if next == current {
        crate::arch::x86_64::pic::driver().eoi(scheduler::TIMER_IRQ);
        unsafe { scheduler::resume(frame as u64) }
    } else {
        scheduler::switch_to(next, true)
    }
}
