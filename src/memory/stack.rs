/*
 * Stack Allocator
 *
 * Hands out fixed-size, page-aligned kernel stacks for process
 * descriptors and the scheduler's own interrupt-handler stack
 * (SPEC_FULL §11). Backed by the kernel heap; there is no separate
 * stack arena.
 */

use core::alloc::Layout;
use core::ptr::NonNull;

/// Size of a kernel stack. A multiple of the page size, per the
/// spec's `STACK_SIZE` constant.
pub const STACK_SIZE: usize = 64 * 1024;

const STACK_ALIGN: usize = 4096;

fn stack_layout() -> Layout {
    Layout::from_size_align(STACK_SIZE, STACK_ALIGN).expect("STACK_SIZE/STACK_ALIGN is valid")
}

/// Allocates one stack region, returning its base address, or `None`
/// on exhaustion. The stack's top (the initial stack pointer) is
/// `base + STACK_SIZE`.
pub fn alloc_stack() -> Option<NonNull<u8>> {
    let layout = stack_layout();
    // SAFETY: layout is non-zero sized and alignment is a power of two.
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    NonNull::new(ptr)
}

/// Frees a stack region previously returned by `alloc_stack`.
///
/// # Safety
/// `base` must be a pointer returned by `alloc_stack` that has not
/// already been freed.
pub unsafe fn free_stack(base: NonNull<u8>) {
    unsafe { alloc::alloc::dealloc(base.as_ptr(), stack_layout()) };
}
