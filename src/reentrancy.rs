//! Debug-only reentrancy check for map entry points.
//!
//! Public methods of `ChainedHashMap` call into user code (`K: Hash`,
//! `K: Eq`, `V: PartialEq`, `Clone`) while buckets are being scanned.
//! Calling back into the same map from there is a bug; in debug builds the
//! check panics naming both operations. In release builds it is a no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map record of the operation currently running.
#[derive(Debug)]
pub(crate) struct ReentrancyCheck {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Cell is already !Sync; this also covers release builds.
    _not_sync: PhantomData<Cell<()>>,
}

impl ReentrancyCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _not_sync: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ActiveOp<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.replace(Some(op)) {
                // Leave the outer op recorded; its guard clears it on unwind.
                self.active.set(Some(outer));
                panic!("reentrant call to ChainedHashMap::{op} while ChainedHashMap::{outer} is running");
            }
            return ActiveOp { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ActiveOp { _z: PhantomData };
        }
    }
}

/// Guard returned by [`ReentrancyCheck::enter`].
pub(crate) struct ActiveOp<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ActiveOp<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.active.take();
            debug_assert!(prev.is_some());
        }
    }
}
