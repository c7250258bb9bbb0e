use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A wait on a start gate was cut short before the gate opened.
    #[error("wait interrupted before the gate opened")]
    Interrupted,
    #[error("thread pool has been shut down")]
    PoolShutDown,
    #[error("thread pool needs at least one thread")]
    EmptyPool,
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[source] io::Error),
}

impl Error {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}
