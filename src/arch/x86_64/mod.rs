/*
 * x86_64 Architecture Support
 *
 * - multiboot: boot header and the Multiboot2 entry trampoline
 * - gdt: Global Descriptor Table and TSS
 * - idt: Interrupt Descriptor Table and exception/IRQ handlers
 * - interrupts: interrupt enable/disable utilities
 * - pic: legacy 8259 interrupt-controller dispatch table
 */

pub mod gdt;
pub mod idt;
pub mod interrupts;
pub mod multiboot;
pub mod pic;
