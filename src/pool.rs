use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of named threads pulling jobs off one FIFO queue.
///
/// Jobs that panic are logged and swallowed; the thread keeps serving. After
/// [`ThreadPool::shutdown`] no new jobs are accepted but everything already
/// queued still runs. Dropping the pool shuts it down and joins its threads.
pub struct ThreadPool {
    name: String,
    tx: Mutex<Option<Sender<Job>>>,
    threads: Vec<(JoinHandle<()>, usize)>,
}

impl ThreadPool {
    pub fn new(name: &str, size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::EmptyPool);
        }
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let mut pool = Self {
            name: name.to_string(),
            tx: Mutex::new(Some(tx)),
            threads: Vec::with_capacity(size),
        };
        for index in 0..size {
            let rx = Arc::clone(&rx);
            let thread_name = format!("{} worker {}", name, index);
            // on failure, dropping `pool` shuts down and joins what we spawned
            let jh = thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || serve(&thread_name, &rx))
                .map_err(Error::Spawn)?;
            pool.threads.push((jh, index));
        }
        tracing::debug!("pool {} started with {} threads", name, size);
        Ok(pool)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.threads.len()
    }

    /// Queue `job`. If the pool is shut down the job is dropped unrun and
    /// [`Error::PoolShutDown`] is returned.
    pub fn execute<F>(&self, job: F) -> Result<(), Error>
    where
        F: FnOnce() + Send + 'static,
    {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match &*tx {
            Some(tx) => tx.send(Box::new(job)).map_err(|_| Error::PoolShutDown),
            None => Err(Error::PoolShutDown),
        }
    }

    pub fn shutdown(&self) {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if tx.is_some() {
            tracing::debug!("pool {} shutting down", self.name);
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
        for (jh, index) in self.threads.drain(..) {
            if let Err(e) = jh.join() {
                tracing::error!(
                    "{}: thread {} failed with error: {}",
                    self.name,
                    index,
                    extract_msg(&*e)
                );
            }
        }
    }
}

fn serve(thread_name: &str, rx: &Mutex<Receiver<Job>>) {
    loop {
        let job = {
            let rx = rx.lock().unwrap_or_else(PoisonError::into_inner);
            rx.recv()
        };
        let job = match job {
            Ok(job) => job,
            // every sender is gone and the queue is drained
            Err(_) => break,
        };
        if let Err(e) = panic::catch_unwind(AssertUnwindSafe(job)) {
            tracing::error!("{}: job panicked: {}", thread_name, extract_msg(&*e));
        }
    }
}

fn extract_msg(e: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = e.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(e) = e.downcast_ref::<String>() {
        e.clone()
    } else {
        "Unknown Any".to_string()
    }
}
