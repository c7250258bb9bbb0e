//! Turn a lost-update race into a number.
//!
//! A *trial* hands one fresh [`Counter`] to a crowd of workers, lets them all
//! go at once, and checks that the counter ends up at the number of workers. A
//! *suite* runs many trials side by side and reports what fraction passed.
//! A correctly synchronized counter scores 100%; a racy one usually doesn't.
//!
//! ```no_run
//! use racerate::{run_suite, LockedCounter, PoolCfg, Pools, SuiteCfg};
//!
//! let pools = Pools::new(&PoolCfg::default()).unwrap();
//! let report = run_suite(LockedCounter::new, &SuiteCfg::default(), &pools);
//! assert_eq!(report.success_rate(), 100.0);
//! ```

pub mod config;
pub mod counter;
pub mod error;
pub mod gate;
pub mod pool;
pub mod report;
pub mod sched;
pub mod suite;
pub mod trial;

pub use config::{PoolCfg, SuiteCfg};
pub use counter::{Counter, LockedCounter, RacyCounter};
pub use error::Error;
pub use gate::{Gate, Latch, LatchGuard, Rendezvous};
pub use pool::ThreadPool;
pub use report::SuiteReport;
pub use suite::{run_suite, Pools};
pub use trial::{run_trial, TrialOutcome};
