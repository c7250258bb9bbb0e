use racerate::{run_suite, LockedCounter, PoolCfg, Pools, RacyCounter, SuiteCfg};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), racerate::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let pools = Pools::new(&PoolCfg::default())?;

    // every increment happens under a lock, so this should always be 100%
    let safe = run_suite(
        LockedCounter::new,
        &SuiteCfg {
            name: Some("thread-safe"),
            ..Default::default()
        },
        &pools,
    );
    println!("{}", safe);

    // load and store are separate here, so concurrent increments get lost
    let racy = run_suite(
        RacyCounter::with_window,
        &SuiteCfg {
            name: Some("thread-unsafe"),
            ..Default::default()
        },
        &pools,
    );
    println!("{}", racy);
    if let Some(worst) = racy.worst {
        tracing::info!("lowest final value in a failed trial: {}", worst);
    }
    Ok(())
}
