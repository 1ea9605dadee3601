/*
 * Kernel Entry Point
 *
 * `multiboot_main` (in `arch::x86_64::multiboot`) hands off here once
 * the CPU is in 64-bit mode with a valid stack. `kstart` brings up the
 * debug console, GDT/IDT, heap, the process module, and the scheduler
 * in that order, runs the boot-time test suite, then idles — timer
 * interrupts do the rest.
 */

#![no_std]
#![no_main]
#![feature(abi_x86_interrupt)]
#![feature(alloc_error_handler)]
#![allow(dead_code)]

extern crate alloc;

use core::panic::PanicInfo;

mod arch;
mod core_state;
mod drivers;
mod frame;
mod io;
mod memory;
mod process;
mod queue;
mod scheduler;
mod tests;
mod timer;
mod utils;

/// Reached from `arch::x86_64::multiboot::multiboot_main` once long
/// mode and a stack are already set up. `info_addr` is the physical
/// address of the Multiboot2 boot information structure; this kernel
/// does not need anything out of it beyond what already passed
/// through as the boot stub's argument.
#[unsafe(no_mangle)]
pub extern "C" fn kstart(info_addr: u32) -> ! {
    utils::debug::init_debug_infrastructure();
    utils::debug::logger::init(true);
    log::info!("kernel starting (multiboot info at 0x{:x})", info_addr);

    arch::x86_64::gdt::init();
    arch::x86_64::idt::init();

    memory::init();
    log::info!("heap initialized");

    let butler = process::process_init();
    log::info!("bootstrap descriptor ready, pid={}", process::snapshot(butler).unwrap().pid);

    scheduler::init();

    x86_64::instructions::interrupts::enable();
    log::info!("interrupts enabled");

    tests::run_all();

    log::info!("entering idle loop");
    loop {
        process::reap_finished();
        x86_64::instructions::hlt();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    x86_64::instructions::interrupts::disable();

    if let Some(location) = info.location() {
        log::error!("PANIC at {}:{}: {}", location.file(), location.line(), info.message());
    } else {
        log::error!("PANIC: {}", info.message());
    }

    loop {
        x86_64::instructions::hlt();
    }
}
