use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use racerate::{
    run_suite, Counter, Latch, LockedCounter, PoolCfg, Pools, RacyCounter, SuiteCfg, SuiteReport,
};

fn pools() -> Pools {
    Pools::new(&PoolCfg {
        trial_threads: 4,
        worker_threads: 8,
    })
    .unwrap()
}

fn cfg(trials: usize, workers: usize) -> SuiteCfg {
    SuiteCfg {
        trials,
        workers,
        name: Some("it"),
    }
}

/// Runs a suite on a helper thread and fails the test instead of hanging if it
/// doesn't come back in time.
fn within<F>(limit: Duration, f: F) -> SuiteReport
where
    F: FnOnce() -> SuiteReport + Send + 'static,
{
    let done = Latch::new_shared(1);
    let slot = Arc::new(Mutex::new(None));
    let guard = Latch::guard(&done);
    let slot2 = Arc::clone(&slot);
    let jh = thread::spawn(move || {
        *slot2.lock().unwrap() = Some(f());
        guard.complete();
    });
    assert!(done.wait_timeout(limit), "suite did not finish within {:?}", limit);
    jh.join().unwrap();
    let report = slot.lock().unwrap().take().unwrap();
    report
}

#[test]
fn locked_counter_always_passes() {
    let report = within(Duration::from_secs(120), || {
        run_suite(LockedCounter::new, &cfg(100, 1000), &pools())
    });
    assert_eq!(report.trials, 100);
    assert_eq!(report.passed, 100);
    assert_eq!(report.success_rate(), 100.0);
    assert!(report.all_passed());
}

#[test]
fn locked_counter_passes_for_small_shapes() {
    let pools = pools();
    for &(m, n) in &[(1, 1), (1, 1000), (7, 3), (30, 64)] {
        let r = run_suite(LockedCounter::new, &cfg(m, n), &pools);
        assert_eq!(r.success_rate(), 100.0, "m={} n={}", m, n);
    }
}

#[test]
fn racy_counter_loses_updates() {
    // statistical: a single suite can get lucky, several in a row won't
    let mut lossy = None;
    for _ in 0..5 {
        let r = within(Duration::from_secs(120), || {
            run_suite(RacyCounter::with_window, &cfg(50, 1000), &pools())
        });
        if r.success_rate() < 100.0 {
            lossy = Some(r);
            break;
        }
    }
    let r = lossy.expect("racy counter passed every trial of every suite");
    let worst = r.worst.expect("a failing trial should have a final value");
    assert!(worst > 0 && worst < 1000, "worst = {}", worst);
}

#[test]
fn suites_do_not_share_state() {
    let pools = pools();
    let a = run_suite(LockedCounter::new, &cfg(20, 500), &pools);
    let b = run_suite(LockedCounter::new, &cfg(20, 500), &pools);
    assert_eq!(a.passed, 20);
    assert_eq!(b.passed, 20);
    assert_eq!(a.success_rate(), 100.0);
    assert_eq!(b.success_rate(), 100.0);
}

#[test]
fn zero_workers_pass_trivially() {
    let r = within(Duration::from_secs(30), || {
        run_suite(RacyCounter::new, &cfg(10, 0), &pools())
    });
    assert_eq!(r.passed, 10);
}

#[test]
fn zero_trials_report_zero() {
    let r = within(Duration::from_secs(30), || {
        run_suite(LockedCounter::new, &cfg(0, 1000), &pools())
    });
    assert_eq!(r.trials, 0);
    assert_eq!(r.passed, 0);
    assert_eq!(r.success_rate(), 0.0);
    assert!(r.to_string().contains("0.0%"));
}

#[test]
fn single_thread_pools_do_not_deadlock() {
    let r = within(Duration::from_secs(60), || {
        let pools = Pools::new(&PoolCfg {
            trial_threads: 1,
            worker_threads: 1,
        })
        .unwrap();
        run_suite(LockedCounter::new, &cfg(10, 200), &pools)
    });
    assert_eq!(r.passed, 10);
}

struct Pinned(u64);

impl Counter for Pinned {
    fn increment(&self) {}
    fn read(&self) -> u64 {
        self.0
    }
}

#[test]
fn any_trait_impl_can_be_tested() {
    let pools = pools();
    let r = run_suite(|| Pinned(16), &cfg(6, 16), &pools);
    assert_eq!(r.passed, 6);
    let r = run_suite(|| Pinned(3), &cfg(6, 16), &pools);
    assert_eq!(r.passed, 0);
    assert_eq!(r.worst, Some(3));
}

#[test]
fn report_line_has_rate_and_millis() {
    let r = run_suite(LockedCounter::new, &cfg(2, 10), &pools());
    let line = r.to_string();
    assert!(line.starts_with("[it] passed rate: 100.0%"), "{}", line);
    assert!(line.ends_with(" ms"), "{}", line);
}
