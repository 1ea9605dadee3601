/*
 * Kernel Heap Allocator
 *
 * A fixed-size static backing region, handed to a free-list
 * allocator at boot. No paging or physical frame allocator is
 * involved (virtual-memory management is out of scope for this
 * kernel) — the region is just ordinary `.bss` space.
 */

use linked_list_allocator::LockedHeap;

/// Size of the kernel heap (8 MiB): descriptor stacks (64 KiB each)
/// dominate usage, so this supports on the order of a hundred
/// concurrently live descriptors plus bookkeeping.
pub const HEAP_SIZE: usize = 8 * 1024 * 1024;

#[repr(align(4096))]
struct HeapRegion([u8; HEAP_SIZE]);

static mut HEAP_REGION: HeapRegion = HeapRegion([0; HEAP_SIZE]);

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Initializes the kernel heap. Must be called exactly once, before
/// any allocation (including the first descriptor or stack).
pub fn init() {
    log::info!("Initializing kernel heap ({} KiB)...", HEAP_SIZE / 1024);
    unsafe {
        let region_ptr = core::ptr::addr_of_mut!(HEAP_REGION) as *mut u8;
        ALLOCATOR.lock().init(region_ptr, HEAP_SIZE);
    }
    log::info!("Kernel heap initialized");
}

#[alloc_error_handler]
fn alloc_error(layout: core::alloc::Layout) -> ! {
    panic!("kernel heap allocation failed: {:?}", layout);
}
