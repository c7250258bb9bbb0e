//! Blocking rendezvous primitives.
//!
//! A [`Gate`] holds any number of threads until it is opened once. A [`Latch`]
//! holds its waiters until it has received a fixed number of signals. Put
//! together in a [`Rendezvous`] they give the "release everybody at once, then
//! wait for everybody to finish" shape that makes races show up.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Interrupted,
}

/// One-shot start barrier.
///
/// The first of [`Gate::open`] and [`Gate::interrupt`] wins; later calls are
/// ignored.
#[derive(Debug)]
pub struct Gate {
    cv: Condvar,
    mtx: Mutex<GateState>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self {
            cv: Condvar::new(),
            mtx: Mutex::new(GateState::Closed),
        }
    }

    /// Blocks until the gate opens. Returns [`Error::Interrupted`] if the gate
    /// was interrupted instead.
    pub fn wait(&self) -> Result<(), Error> {
        let g = self.mtx.lock().unwrap_or_else(PoisonError::into_inner);
        let g = self
            .cv
            .wait_while(g, |s| *s == GateState::Closed)
            .unwrap_or_else(PoisonError::into_inner);
        match *g {
            GateState::Open => Ok(()),
            _ => Err(Error::Interrupted),
        }
    }

    pub fn open(&self) {
        self.settle(GateState::Open);
    }

    pub fn interrupt(&self) {
        self.settle(GateState::Interrupted);
    }

    pub fn is_open(&self) -> bool {
        *self.mtx.lock().unwrap_or_else(PoisonError::into_inner) == GateState::Open
    }

    fn settle(&self, to: GateState) {
        let mut g = self.mtx.lock().unwrap_or_else(PoisonError::into_inner);
        if *g == GateState::Closed {
            *g = to;
            self.cv.notify_all();
        }
    }
}

#[derive(Debug)]
struct LatchState {
    remaining: usize,
    forfeited: usize,
}

/// Count-down completion barrier.
///
/// Every party signals exactly once, either by [`Latch::count_down`] (it did
/// its job) or by [`Latch::forfeit`] (it didn't). Both count toward release,
/// so a party that gives up can't leave waiters hanging.
#[derive(Debug)]
pub struct Latch {
    cv: Condvar,
    mtx: Mutex<LatchState>,
}

impl Latch {
    pub fn new(count: usize) -> Self {
        Self {
            cv: Condvar::new(),
            mtx: Mutex::new(LatchState {
                remaining: count,
                forfeited: 0,
            }),
        }
    }

    pub fn new_shared(count: usize) -> Arc<Self> {
        Arc::new(Self::new(count))
    }

    /// A guard that signals this latch exactly once.
    pub fn guard(this: &Arc<Self>) -> LatchGuard {
        LatchGuard {
            latch: Arc::clone(this),
            done: false,
        }
    }

    pub fn count_down(&self) {
        self.signal(false);
    }

    pub fn forfeit(&self) {
        self.signal(true);
    }

    fn signal(&self, forfeit: bool) {
        let mut g = self.mtx.lock().unwrap_or_else(PoisonError::into_inner);
        // extra signals past zero are dropped
        if g.remaining == 0 {
            return;
        }
        g.remaining -= 1;
        if forfeit {
            g.forfeited += 1;
        }
        if g.remaining == 0 {
            self.cv.notify_all();
        }
    }

    pub fn wait(&self) {
        let g = self.mtx.lock().unwrap_or_else(PoisonError::into_inner);
        let _g = self
            .cv
            .wait_while(g, |s| s.remaining != 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Returns `true` if the latch was released before `dur` ran out.
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        let g = self.mtx.lock().unwrap_or_else(PoisonError::into_inner);
        let (g, _) = self
            .cv
            .wait_timeout_while(g, dur, |s| s.remaining != 0)
            .unwrap_or_else(PoisonError::into_inner);
        g.remaining == 0
    }

    pub fn remaining(&self) -> usize {
        self.mtx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining
    }

    pub fn forfeited(&self) -> usize {
        self.mtx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .forfeited
    }
}

/// Signals its [`Latch`] once: a count-down on [`LatchGuard::complete`], a
/// forfeit if dropped any other way (early return, panic, a queued job that
/// never ran).
#[derive(Debug)]
#[must_use = "dropping a LatchGuard forfeits immediately"]
pub struct LatchGuard {
    latch: Arc<Latch>,
    done: bool,
}

impl LatchGuard {
    pub fn complete(mut self) {
        self.done = true;
        self.latch.count_down();
    }
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        if !self.done {
            self.latch.forfeit();
        }
    }
}

/// Start gate plus completion latch for a fixed number of parties.
///
/// The driver hands each party an [`Rendezvous::arrival`] guard, lets them
/// block in [`Rendezvous::wait_start`], calls [`Rendezvous::release`] once
/// everyone has been handed out, then [`Rendezvous::await_all`].
#[derive(Debug)]
pub struct Rendezvous {
    start: Gate,
    done: Arc<Latch>,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            start: Gate::new(),
            done: Latch::new_shared(parties),
        }
    }

    pub fn arrival(&self) -> LatchGuard {
        Latch::guard(&self.done)
    }

    /// Give up on `parties` arrivals that will never be handed out.
    pub fn abandon(&self, parties: usize) {
        for _ in 0..parties {
            self.done.forfeit();
        }
    }

    pub fn wait_start(&self) -> Result<(), Error> {
        self.start.wait()
    }

    pub fn release(&self) {
        self.start.open();
    }

    pub fn interrupt(&self) {
        self.start.interrupt();
    }

    pub fn await_all(&self) {
        self.done.wait();
    }

    pub fn forfeited(&self) -> usize {
        self.done.forfeited()
    }

    /// Runs `each` on `parties` threads released together, returning once
    /// all of them are done. Threads that panic are counted as forfeits.
    pub fn release_all_then_await_all<F>(parties: usize, each: F) -> Result<usize, Error>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let rv = Arc::new(Self::new(parties));
        let each = Arc::new(each);
        let mut handles = Vec::with_capacity(parties);
        for i in 0..parties {
            let arrival = rv.arrival();
            let rv2 = Arc::clone(&rv);
            let each = Arc::clone(&each);
            let spawned = std::thread::Builder::new()
                .name(format!("rendezvous party {}", i))
                .spawn(move || {
                    if rv2.wait_start().is_ok() {
                        each(i);
                        arrival.complete();
                    }
                });
            match spawned {
                Ok(jh) => handles.push(jh),
                Err(e) => {
                    rv.abandon(parties - i - 1);
                    rv.interrupt();
                    rv.await_all();
                    for jh in handles {
                        let _ = jh.join();
                    }
                    return Err(Error::Spawn(e));
                }
            }
        }
        rv.release();
        rv.await_all();
        for jh in handles {
            let _ = jh.join();
        }
        Ok(rv.forfeited())
    }
}
