/*
 * Global Descriptor Table
 *
 * x86_64 runs a flat memory model, so the GDT here exists only for
 * two things the core still needs: a kernel code/data segment pair
 * to put in the register frames the scheduler and timer handler
 * construct, and a TSS carrying the Interrupt Stack Table entry the
 * double-fault handler runs on.
 */

use lazy_static::lazy_static;
use x86_64::{
    VirtAddr,
    structures::{
        gdt::{Descriptor, GlobalDescriptorTable, SegmentSelector},
        tss::TaskStateSegment,
    },
};

pub const DOUBLE_FAULT_IST_INDEX: u16 = 0;

lazy_static! {
    static ref TSS: TaskStateSegment = {
        let mut tss = TaskStateSegment::new();
        tss.interrupt_stack_table[DOUBLE_FAULT_IST_INDEX as usize] = {
            const STACK_SIZE: usize = 4096;
            static mut STACK: [u8; STACK_SIZE] = [0; STACK_SIZE];
            let stack_start = VirtAddr::from_ptr(&raw const STACK);
            stack_start + STACK_SIZE as u64
        };
        tss
    };
}

lazy_static! {
    static ref GDT: (GlobalDescriptorTable, Selectors) = {
        let mut gdt = GlobalDescriptorTable::new();
        let code_selector = gdt.append(Descriptor::kernel_code_segment());
        let data_selector = gdt.append(Descriptor::kernel_data_segment());
        let tss_selector = gdt.append(Descriptor::tss_segment(&TSS));
        (gdt, Selectors { code_selector, data_selector, tss_selector })
    };
}

struct Selectors {
    code_selector: SegmentSelector,
    data_selector: SegmentSelector,
    tss_selector: SegmentSelector,
}

/// Returns the kernel code segment selector, used verbatim as `cs`
/// in every hardware return-frame `create_process` lays out.
pub fn kernel_code_selector() -> SegmentSelector {
    GDT.1.code_selector
}

/// Returns the kernel data segment selector, used as `ss` and as the
/// four data/extra segment slots in every descriptor's register frame.
pub fn kernel_data_selector() -> SegmentSelector {
    GDT.1.data_selector
}

/// Loads the GDT, reloads every segment register, and loads the TSS.
/// Must run before the IDT is loaded.
pub fn init() {
    use x86_64::instructions::{
        segmentation::{CS, DS, ES, FS, GS, Segment, SS},
        tables::load_tss,
    };

    GDT.0.load();
    unsafe {
        CS::set_reg(GDT.1.code_selector);
        DS::set_reg(GDT.1.data_selector);
        ES::set_reg(GDT.1.data_selector);
        SS::set_reg(GDT.1.data_selector);
        FS::set_reg(GDT.1.data_selector);
        GS::set_reg(GDT.1.data_selector);
        load_tss(GDT.1.tss_selector);
    }
    log::info!("GDT loaded, TSS installed");
}
