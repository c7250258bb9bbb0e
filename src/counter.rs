use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::sched;

/// The thing under test: something many threads bump at once.
pub trait Counter: Send + Sync {
    fn increment(&self);
    fn read(&self) -> u64;
}

// Trials run side by side, so keep each counter on its own cache line.
#[repr(C, align(64))]
struct CachePad<T> {
    _pre: MaybeUninit<[u8; 64]>,
    value: T,
    _post: MaybeUninit<[u8; 64]>,
}

impl<T> CachePad<T> {
    #[inline]
    const fn new(value: T) -> Self {
        Self {
            _pre: MaybeUninit::uninit(),
            value,
            _post: MaybeUninit::uninit(),
        }
    }
}

impl<T> core::ops::Deref for CachePad<T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

/// Counter whose read-modify-write happens under a mutex. Never loses an
/// update.
pub struct LockedCounter {
    x: CachePad<Mutex<u64>>,
}

impl LockedCounter {
    pub const fn new() -> Self {
        Self {
            x: CachePad::new(Mutex::new(0)),
        }
    }
}

impl Default for LockedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for LockedCounter {
    fn increment(&self) {
        let mut g = self.x.lock().unwrap_or_else(PoisonError::into_inner);
        *g += 1;
    }

    fn read(&self) -> u64 {
        *self.x.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counter that does `x = x + 1` as a separate load and store.
///
/// Two increments that both load before either stores collapse into one.
/// The atomics are relaxed, so this is a lost-update race and not a data race:
/// no UB, just a wrong answer.
pub struct RacyCounter {
    x: CachePad<AtomicU64>,
    window: bool,
}

impl RacyCounter {
    pub const fn new() -> Self {
        Self {
            x: CachePad::new(AtomicU64::new(0)),
            window: false,
        }
    }

    /// Like [`RacyCounter::new`], but every increment perturbs the scheduler
    /// between its load and its store, which makes lost updates show up even
    /// on machines with few cores.
    pub const fn with_window() -> Self {
        Self {
            x: CachePad::new(AtomicU64::new(0)),
            window: true,
        }
    }
}

impl Default for RacyCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for RacyCounter {
    fn increment(&self) {
        let x = self.x.load(Ordering::Relaxed);
        if self.window {
            sched::perturb();
        }
        self.x.store(x + 1, Ordering::Relaxed);
    }

    fn read(&self) -> u64 {
        self.x.load(Ordering::Relaxed)
    }
}
