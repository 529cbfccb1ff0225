//! Bounded action queue with priority front insert.
//!
//! Back inserts are FIFO among themselves; front inserts are LIFO among
//! themselves and go ahead of everything already queued. Both are
//! non-blocking and safe to call from interrupt context. A full queue drops
//! the newest action and counts it; the consumer logs the count later
//! because interrupt context must not log.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use heapless::{Deque, Vec as FixedVec};

use crate::action::Action;

pub struct CommandQueue<const N: usize> {
    items: Mutex<RefCell<Deque<Action, N>>>,
    dropped: AtomicU32,
}

impl<const N: usize> CommandQueue<N> {
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(RefCell::new(Deque::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Routine enqueue. Returns `false` if the action was dropped.
    pub fn push_back(&self, action: Action) -> bool {
        let pushed = critical_section::with(|cs| {
            self.items.borrow(cs).borrow_mut().push_back(action).is_ok()
        });
        self.count_drop(pushed)
    }

    /// Priority enqueue. Returns `false` if the action was dropped.
    pub fn push_front(&self, action: Action) -> bool {
        let pushed = critical_section::with(|cs| {
            self.items.borrow(cs).borrow_mut().push_front(action).is_ok()
        });
        self.count_drop(pushed)
    }

    pub fn pop(&self) -> Option<Action> {
        critical_section::with(|cs| self.items.borrow(cs).borrow_mut().pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.items.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Queued actions in dequeue order.
    pub fn snapshot(&self) -> FixedVec<Action, N> {
        critical_section::with(|cs| self.items.borrow(cs).borrow().iter().copied().collect())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.items.borrow(cs).borrow_mut().clear());
    }

    /// Drops since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    fn count_drop(&self, pushed: bool) -> bool {
        if !pushed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pushed
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
