/// How many trials to run and how many workers each trial releases.
#[derive(Debug, Clone)]
pub struct SuiteCfg {
    pub trials: usize,
    pub workers: usize,
    pub name: Option<&'static str>,
}

impl Default for SuiteCfg {
    fn default() -> Self {
        Self {
            trials: env_or("RACERATE_TRIALS", option_env!("RACERATE_TRIALS"), 100),
            workers: env_or("RACERATE_WORKERS", option_env!("RACERATE_WORKERS"), 1000),
            name: None,
        }
    }
}

/// Sizes of the two pools: one that runs whole trials, and one that runs the
/// individual increment workers of every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCfg {
    pub trial_threads: usize,
    pub worker_threads: usize,
}

impl Default for PoolCfg {
    fn default() -> Self {
        Self {
            trial_threads: env_or(
                "RACERATE_TRIAL_THREADS",
                option_env!("RACERATE_TRIAL_THREADS"),
                5,
            ),
            worker_threads: env_or(
                "RACERATE_WORKER_THREADS",
                option_env!("RACERATE_WORKER_THREADS"),
                5,
            ),
        }
    }
}

// Unset, empty and "0" all mean "use the default", same as an unparsable value
// (which also gets a warning).
fn env_or(key: &str, val: Option<&str>, default: usize) -> usize {
    match val {
        None | Some("") | Some("0") => default,
        Some(n) => n.parse::<usize>().unwrap_or_else(|_| {
            tracing::warn!("couldn't parse {}={:?}, using {}", key, n, default);
            default
        }),
    }
}
