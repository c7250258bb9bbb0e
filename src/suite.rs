use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::gate::Latch;
use crate::{run_trial, Counter, Error, PoolCfg, SuiteCfg, SuiteReport, ThreadPool};

/// The two pools a suite runs on.
///
/// A trial spends its whole life blocked on its completion latch, so trials
/// get their own threads; the increment workers run on the other pool, where
/// a burst of one trial's workers can't starve the trials themselves.
pub struct Pools {
    // drop order matters: trial jobs hold handles to the worker pool
    trials: ThreadPool,
    workers: Arc<ThreadPool>,
}

impl Pools {
    pub fn new(cfg: &PoolCfg) -> Result<Self, Error> {
        Ok(Self {
            trials: ThreadPool::new("trial", cfg.trial_threads)?,
            workers: Arc::new(ThreadPool::new("increment", cfg.worker_threads)?),
        })
    }

    pub fn trial_pool(&self) -> &ThreadPool {
        &self.trials
    }

    pub fn worker_pool(&self) -> &ThreadPool {
        &self.workers
    }

    /// Stop both pools from taking new jobs. Suites run afterwards still
    /// finish, with every trial counted as failed.
    pub fn shutdown(&self) {
        self.trials.shutdown();
        self.workers.shutdown();
    }
}

/// Run `cfg.trials` trials side by side on `pools`, each against a fresh
/// counter from `factory`, and report how many came out right.
///
/// Never fails and never hangs on account of a single trial: a trial that
/// errors, panics, or can't be scheduled is just a failed trial.
pub fn run_suite<C, F>(factory: F, cfg: &SuiteCfg, pools: &Pools) -> SuiteReport
where
    C: Counter + 'static,
    F: Fn() -> C + Send + Sync + 'static,
{
    let name = cfg.name.unwrap_or("racerate");
    let trials = cfg.trials;
    let workers = cfg.workers;
    let factory = Arc::new(factory);
    let success = Arc::new(AtomicUsize::new(0));
    let worst = Arc::new(AtomicU64::new(u64::MAX));
    let done = Latch::new_shared(trials);

    tracing::info!(
        "{}: running {} trials of {} workers ({} trial threads, {} worker threads)",
        name,
        trials,
        workers,
        pools.trials.size(),
        pools.workers.size()
    );
    let start = Instant::now();
    for t in 0..trials {
        let guard = Latch::guard(&done);
        let factory = Arc::clone(&factory);
        let success = Arc::clone(&success);
        let worst = Arc::clone(&worst);
        let worker_pool = Arc::clone(&pools.workers);
        let submitted = pools.trials.execute(move || {
            let counter = Arc::new(factory());
            match run_trial(&counter, workers, &worker_pool) {
                Ok(out) if out.passed() => {
                    success.fetch_add(1, Ordering::SeqCst);
                }
                Ok(out) => {
                    if out.forfeited == 0 {
                        worst.fetch_min(out.observed, Ordering::SeqCst);
                    }
                    tracing::debug!("{}: trial {} failed, {}", name, t, out);
                }
                Err(e) => tracing::warn!("{}: trial {} aborted: {}", name, t, e),
            }
            guard.complete();
        });
        if let Err(e) = submitted {
            tracing::warn!(
                "{}: could not schedule trials {}..{}: {}",
                name,
                t,
                trials,
                e
            );
            for _ in t + 1..trials {
                done.forfeit();
            }
            break;
        }
    }
    done.wait();
    let elapsed = start.elapsed();

    if done.forfeited() > 0 {
        tracing::warn!(
            "{}: {} trials never reported a result",
            name,
            done.forfeited()
        );
    }
    let report = SuiteReport {
        name,
        trials,
        passed: success.load(Ordering::SeqCst),
        elapsed,
        worst: match worst.load(Ordering::SeqCst) {
            u64::MAX => None,
            w => Some(w),
        },
    };
    tracing::info!(
        "{}: {}/{} trials passed in {:?}",
        name,
        report.passed,
        report.trials,
        report.elapsed
    );
    report
}
