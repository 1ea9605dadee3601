/*
 * Interrupt Descriptor Table
 *
 * CPU exception vectors report through the IRQ-safe raw logger and
 * halt — there is no process to deliver a signal to and no
 * filesystem to core-dump into, so "log and stop" is the only
 * sensible policy here. IRQ0 (the remapped timer line) is the one
 * hardware vector this kernel services; it is wired directly to the
 * naked-asm preemptive timer handler in `crate::timer`.
 */

use lazy_static::lazy_static;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame};

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();

        idt.divide_error.set_handler_fn(divide_error_handler);
        idt.debug.set_handler_fn(debug_handler);
        idt.non_maskable_interrupt.set_handler_fn(nmi_handler);
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        idt.overflow.set_handler_fn(overflow_handler);
        idt.bound_range_exceeded.set_handler_fn(bound_range_exceeded_handler);
        idt.invalid_opcode.set_handler_fn(invalid_opcode_handler);
        idt.device_not_available.set_handler_fn(device_not_available_handler);
        unsafe {
            idt.double_fault
                .set_handler_fn(double_fault_handler)
                .set_stack_index(crate::arch::x86_64::gdt::DOUBLE_FAULT_IST_INDEX);
        }
        idt.invalid_tss.set_handler_fn(invalid_tss_handler);
        idt.segment_not_present.set_handler_fn(segment_not_present_handler);
        idt.stack_segment_fault.set_handler_fn(stack_segment_fault_handler);
        idt.general_protection_fault.set_handler_fn(general_protection_fault_handler);
        idt.page_fault.set_handler_fn(page_fault_handler);
        idt.x87_floating_point.set_handler_fn(x87_floating_point_handler);
        idt.alignment_check.set_handler_fn(alignment_check_handler);
        idt.machine_check.set_handler_fn(machine_check_handler);
        idt.simd_floating_point.set_handler_fn(simd_floating_point_handler);
        idt.virtualization.set_handler_fn(virtualization_handler);
        idt.security_exception.set_handler_fn(security_exception_handler);

        // IRQ0 / timer, remapped to vector 0x20 by the PIC driver.
        unsafe {
            idt[0x20].set_handler_addr(core::mem::transmute::<*const (), x86_64::VirtAddr>(
                crate::timer::preemptive_timer_interrupt_handler as *const (),
            ));
        }

        idt
    };
}

/// Loads the IDT. Must run after the GDT (the double-fault handler's
/// IST index depends on the TSS being installed) and before
/// interrupts are enabled.
pub fn init() {
    IDT.load();
    log::info!("IDT loaded");
}

macro_rules! trap_and_halt {
    ($name:ident, $msg:literal) => {
        extern "x86-interrupt" fn $name(_stack_frame: InterruptStackFrame) {
            crate::utils::debug::irq_log::irq_log_simple($msg);
            loop {
                x86_64::instructions::hlt();
            }
        }
    };
}

macro_rules! trap_and_halt_err {
    ($name:ident, $msg:literal) => {
        extern "x86-interrupt" fn $name(_stack_frame: InterruptStackFrame, _error_code: u64) {
            crate::utils::debug::irq_log::irq_log_simple($msg);
            loop {
                x86_64::instructions::hlt();
            }
        }
    };
}

trap_and_halt!(divide_error_handler, "DIVIDE_ERROR");
trap_and_halt!(nmi_handler, "NMI");
trap_and_halt!(overflow_handler, "OVERFLOW");
trap_and_halt!(bound_range_exceeded_handler, "BOUND_RANGE_EXCEEDED");
trap_and_halt!(invalid_opcode_handler, "INVALID_OPCODE");
trap_and_halt!(device_not_available_handler, "DEVICE_NOT_AVAILABLE");
trap_and_halt_err!(invalid_tss_handler, "INVALID_TSS");
trap_and_halt_err!(segment_not_present_handler, "SEGMENT_NOT_PRESENT");
trap_and_halt_err!(stack_segment_fault_handler, "STACK_SEGMENT_FAULT");
trap_and_halt_err!(general_protection_fault_handler, "GENERAL_PROTECTION_FAULT");
trap_and_halt_err!(alignment_check_handler, "ALIGNMENT_CHECK");
trap_and_halt_err!(security_exception_handler, "SECURITY_EXCEPTION");

extern "x86-interrupt" fn debug_handler(_stack_frame: InterruptStackFrame) {
    crate::utils::debug::irq_log::irq_log_simple("DEBUG_EXCEPTION");
}

extern "x86-interrupt" fn breakpoint_handler(_stack_frame: InterruptStackFrame) {
    crate::utils::debug::irq_log::irq_log_simple("BREAKPOINT");
}

extern "x86-interrupt" fn double_fault_handler(
    _stack_frame: InterruptStackFrame,
    _error_code: u64,
) -> ! {
    crate::utils::debug::irq_log::irq_log_simple("DOUBLE_FAULT");
    loop {
        x86_64::instructions::hlt();
    }
}

extern "x86-interrupt" fn page_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: x86_64::structures::idt::PageFaultErrorCode,
) {
    use x86_64::registers::control::Cr2;

    crate::utils::debug::irq_log::irq_log_simple("PAGE_FAULT");
    if let Ok(addr) = Cr2::read() {
        log::error!("page fault at {:?}, error code {:?}", addr, error_code);
    }
    log::error!("instruction pointer: {:?}", stack_frame.instruction_pointer);
    panic!("unrecoverable page fault");
}

extern "x86-interrupt" fn x87_floating_point_handler(_stack_frame: InterruptStackFrame) {
    crate::utils::debug::irq_log::irq_log_simple("X87_FP_EXCEPTION");
    panic!("x87 floating point exception");
}

extern "x86-interrupt" fn machine_check_handler(_stack_frame: InterruptStackFrame) -> ! {
    crate::utils::debug::irq_log::irq_log_simple("MACHINE_CHECK");
    loop {
        x86_64::instructions::hlt();
    }
}

extern "x86-interrupt" fn simd_floating_point_handler(_stack_frame: InterruptStackFrame) {
    crate::utils::debug::irq_log::irq_log_simple("SIMD_FP_EXCEPTION");
    panic!("SIMD floating point exception");
}

extern "x86-interrupt" fn virtualization_handler(_stack_frame: InterruptStackFrame) {
    crate::utils::debug::irq_log::irq_log_simple("VIRTUALIZATION_EXCEPTION");
    panic!("virtualization exception");
}
