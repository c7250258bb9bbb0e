use std::fmt;
use std::sync::Arc;

use crate::gate::Rendezvous;
use crate::{Counter, Error, ThreadPool};

/// What one trial saw once every worker had checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub expected: u64,
    pub observed: u64,
    /// Workers that checked in without incrementing (interrupted or panicked).
    pub forfeited: usize,
}

impl TrialOutcome {
    pub fn passed(&self) -> bool {
        self.forfeited == 0 && self.observed == self.expected
    }
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected: x = {}, actual x = {} => passed: {}",
            self.expected,
            self.observed,
            self.passed()
        )?;
        if self.forfeited > 0 {
            write!(f, " ({} workers forfeited)", self.forfeited)?;
        }
        Ok(())
    }
}

/// Release `workers` jobs on `pool` at once, each incrementing `counter`
/// exactly once, and check the total once they've all finished.
///
/// If the pool stops taking jobs part way through, the workers already queued
/// are interrupted instead of released, the trial still waits for all of them
/// to check in, and the submission error is returned.
pub fn run_trial<C>(
    counter: &Arc<C>,
    workers: usize,
    pool: &ThreadPool,
) -> Result<TrialOutcome, Error>
where
    C: Counter + 'static,
{
    let rv = Arc::new(Rendezvous::new(workers));
    for i in 0..workers {
        let arrival = rv.arrival();
        let rv2 = Arc::clone(&rv);
        let counter = Arc::clone(counter);
        let submitted = pool.execute(move || {
            // an interrupted worker never increments; dropping `arrival` forfeits
            if rv2.wait_start().is_ok() {
                counter.increment();
                arrival.complete();
            }
        });
        if let Err(e) = submitted {
            tracing::warn!(
                "{}: submitted {}/{} workers before failing: {}",
                pool.name(),
                i,
                workers,
                e
            );
            // the rejected job already forfeited its own arrival
            rv.abandon(workers - i - 1);
            rv.interrupt();
            rv.await_all();
            return Err(e);
        }
    }
    rv.release();
    rv.await_all();

    let outcome = TrialOutcome {
        expected: workers as u64,
        observed: counter.read(),
        forfeited: rv.forfeited(),
    };
    if outcome.forfeited > 0 {
        tracing::warn!("{} of {} workers forfeited", outcome.forfeited, workers);
    }
    tracing::trace!("{}", outcome);
    Ok(outcome)
}
