/*
 * Memory Collaborators
 *
 * The core (process/scheduler/timer) treats memory as two external
 * collaborators (SPEC_FULL §11): a heap allocator and a stack
 * allocator. Neither involves paging or a physical frame allocator
 * — virtual-memory management is out of scope for this kernel.
 */

pub mod heap;
pub mod stack;

/// Brings up the memory collaborators. Must run before any call that
/// allocates (descriptor creation, stack allocation, logging setup
/// that touches the heap).
pub fn init() {
    heap::init();
}
