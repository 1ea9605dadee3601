/*
 * Intrusive Doubly-Linked Circular Queue
 *
 * Shared by the process module's global registry (over each
 * descriptor's `global_link`) and the scheduler's five ready queues
 * plus wait queue (over `status_link`). Elements are arena indices
 * into the process descriptor table rather than pointers or a
 * self-referential node type — SPEC_FULL §9(a)'s recommendation for
 * strict-aliasing safety in a language like Rust. `SENTINEL` stands
 * in for the list's sentinel head, which owns no descriptor slot of
 * its own.
 */

use crate::process::Descriptor;

pub const SENTINEL: usize = usize::MAX;

/// One doubly-linked-list membership link: `SENTINEL` on either side
/// means "the queue's own sentinel head", closing the circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub prev: usize,
    pub next: usize,
}

impl Link {
    /// Not a member of any queue and never was.
    pub const fn detached() -> Self {
        Link { prev: SENTINEL, next: SENTINEL }
    }

    /// Points at itself: the RUNNING/current descriptor's state per
    /// invariant 1 (SPEC_FULL §3) — present in no queue, but its
    /// link is well-formed rather than left dangling.
    pub const fn self_looped(id: usize) -> Self {
        Link { prev: id, next: id }
    }
}

/// Which of a descriptor's two link fields a `Queue` operates over.
#[derive(Clone, Copy)]
pub enum LinkKind {
    Status,
    Global,
}

impl LinkKind {
    fn get(self, d: &Descriptor) -> Link {
        match self {
            LinkKind::Status => d.status_link,
            LinkKind::Global => d.global_link,
        }
    }

    fn set(self, d: &mut Descriptor, link: Link) {
        match self {
            LinkKind::Status => d.status_link = link,
            LinkKind::Global => d.global_link = link,
        }
    }
}

/// A circular queue with a sentinel head. The sentinel itself is not
/// a descriptor; `sentinel.next` is the head element (or `SENTINEL`
/// if empty) and `sentinel.prev` is the tail.
#[derive(Clone, Copy)]
pub struct Queue {
    sentinel: Link,
}

impl Queue {
    pub const fn new() -> Self {
        Queue { sentinel: Link { prev: SENTINEL, next: SENTINEL } }
    }

    pub fn is_empty(&self) -> bool {
        self.sentinel.next == SENTINEL
    }

    pub fn head(&self) -> Option<usize> {
        if self.is_empty() { None } else { Some(self.sentinel.next) }
    }

    /// Appends `id` at the tail. `id` must not already be a member
    /// of this or any other queue.
    pub fn push_back(&mut self, slots: &mut [Option<Descriptor>], kind: LinkKind, id: usize) {
        if self.is_empty() {
            kind.set(slots[id].as_mut().expect("push_back: id must be occupied"), Link::detached());
            self.sentinel = Link::self_looped(id);
        } else {
            let tail = self.sentinel.prev;
            let mut tail_link = kind.get(slots[tail].as_ref().expect("queue tail occupied"));
            tail_link.next = id;
            kind.set(slots[tail].as_mut().expect("queue tail occupied"), tail_link);
            kind.set(slots[id].as_mut().expect("push_back: id must be occupied"), Link { prev: tail, next: SENTINEL });
            self.sentinel.prev = id;
        }
    }

    /// Unlinks `id` from this queue; `id` must actually be a member of
    /// it (callers track membership explicitly — see
    /// `process::Membership` — since a link only encodes neighbors,
    /// not which queue it belongs to). Safe no-op if `id`'s link is
    /// already self-looped. Leaves `id` self-looped afterward, so a
    /// second `remove` call on the same id is always safe.
    pub fn remove(&mut self, slots: &mut [Option<Descriptor>], kind: LinkKind, id: usize) {
        let link = kind.get(slots[id].as_ref().expect("remove: id must be occupied"));
        if link.prev == id && link.next == id {
            return; // not a member of any queue.
        }
        match link.prev {
            SENTINEL => self.sentinel.next = link.next,
            prev => {
                let mut l = kind.get(slots[prev].as_ref().expect("prev occupied"));
                l.next = link.next;
                kind.set(slots[prev].as_mut().expect("prev occupied"), l);
            }
        }
        match link.next {
            SENTINEL => self.sentinel.prev = link.prev,
            next => {
                let mut l = kind.get(slots[next].as_ref().expect("next occupied"));
                l.prev = link.prev;
                kind.set(slots[next].as_mut().expect("next occupied"), l);
            }
        }
        kind.set(slots[id].as_mut().expect("id occupied"), Link::self_looped(id));
    }

    /// Removes and returns the head (already left self-looped by
    /// `remove`).
    pub fn pop_front(&mut self, slots: &mut [Option<Descriptor>], kind: LinkKind) -> Option<usize> {
        let head = self.head()?;
        self.remove(slots, kind, head);
        Some(head)
    }
}
