use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Tasks owned by one screen. Dropping the scope aborts whatever is still running.
#[derive(Debug, Default)]
pub struct TaskScope {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskScope {
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    #[cfg(test)]
    pub fn active(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.iter().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

/// Store writes started by a screen. They outlive the screen: dropping this
/// detaches them, and `flush` waits for whatever is still running.
#[derive(Debug, Default)]
pub struct PendingWrites {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingWrites {
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    pub async fn flush(&self) {
        let tasks = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *tasks)
        };
        for task in tasks {
            if let Err(err) = task.await {
                warn!(%err, "pending write did not complete");
            }
        }
    }
}

/// Observable state written by generation-tagged requests.
///
/// Each `begin` supersedes every earlier request; a superseded request's
/// `finish` is dropped so a slow response cannot overwrite a newer one.
#[derive(Debug)]
pub struct RequestCell<T> {
    state: Arc<watch::Sender<T>>,
    latest: Arc<AtomicU64>,
}

#[derive(Debug)]
pub struct Request<T> {
    state: Arc<watch::Sender<T>>,
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl<T> RequestCell<T> {
    pub fn new(initial: T) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.state.borrow()
    }

    /// Start a request: bump the generation, then publish `pending`.
    pub fn begin(&self, pending: T) -> Request<T> {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(pending);
        Request {
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.latest),
            generation,
        }
    }
}

impl<T> Request<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publish the outcome if no newer request has started. Returns whether it was published.
    pub fn finish(self, value: T) -> bool {
        let latest = &self.latest;
        let generation = self.generation;
        // The check runs under the channel's write lock, which `begin` also takes.
        self.state.send_if_modified(move |current| {
            if latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = value;
            true
        })
    }
}
