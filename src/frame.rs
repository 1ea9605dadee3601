/*
 * Register Frame
 *
 * The fixed layout both a freshly created descriptor's initial stack
 * contents and a descriptor preempted mid-flight by the timer tick
 * share, so `scheduler::switch_to` can resume either one the same
 * way. 25 general-purpose/segment/control fields at 8 bytes each:
 * exactly 200 bytes.
 */

/// Snapshot of everything `switch_to` needs to resume a descriptor.
/// Field order matches the push order
/// `timer::preemptive_timer_interrupt_handler` uses, last-pushed
/// field first, so the struct can be overlaid directly on the saved
/// `rsp`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RegisterFrame {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub ds: u64,
    pub es: u64,
    pub fs: u64,
    pub gs: u64,
    pub vector: u64,
    // Hardware-shaped interrupt return frame, always last.
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

pub const FRAME_SIZE: usize = core::mem::size_of::<RegisterFrame>();

const _: () = assert!(FRAME_SIZE == 200, "RegisterFrame must stay exactly 200 bytes");
