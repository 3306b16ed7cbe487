use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use log::trace;

/// Counting permit pool built on a mutex and condvar. A wait that wakes
/// without a free permit simply retries.
struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Self { permits: Mutex::new(permits), available: Condvar::new() }
    }

    fn acquire(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *permits -= 1;
    }

    fn release(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *permits += 1;
        self.available.notify_one();
    }
}

/// Releases its permit when dropped, so a unit that panics still frees its
/// slot before the worker exits.
struct PermitGuard(Arc<Semaphore>);

impl Drop for PermitGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Executes each submitted search unit on a freshly spawned thread, gated by
/// a counting permit pool of fixed size.
///
/// At most `num_threads` units run at once; threads are not reused across
/// units. Submission blocks the submitting thread until a permit is free.
pub(crate) struct SubTaskExecutor {
    semaphore: Arc<Semaphore>,
}

impl SubTaskExecutor {
    pub(crate) fn new(num_threads: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(num_threads.max(1))) }
    }

    pub(crate) fn execute<F>(&self, unit: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.semaphore.acquire();
        let guard = PermitGuard(Arc::clone(&self.semaphore));
        thread::spawn(move || {
            let _guard = guard;
            trace!("search unit started on {:?}", thread::current().id());
            unit();
        });
    }
}
