//! Work-stealing thread pool.
//!
//! One bounded deque per worker. Submission pushes to a round-robin-chosen
//! deque bottom, spilling to the next deque when one is full and running the
//! task on the calling thread as a last resort. Workers scan their own deque
//! first, then the others, stealing the oldest task; `wait_all` helps drain
//! from the bottom (newest first) before parking until the in-flight count
//! reaches zero.
//!
//! Tasks never spawn subtasks, so the submitting thread is the only
//! bottom-end producer; the deque owner handles therefore live with the
//! pool, and every worker consumes through its stealer.
//!
//! Task cells are fixed-size records allocated from a shared [`Slab`], with
//! heap fallback once the slab is exhausted.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::deque::{deque, Stealer, Worker};
use crate::error::TransformError;
use crate::slab::{Slab, SlabBox};

/// Per-worker ring capacity.
pub const DEQUE_CAPACITY: usize = 1024;

/// Hard clamp on worker counts, explicit or auto-detected.
pub const MAX_THREADS: usize = 128;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size task record; the slab population for the executor.
struct TaskCell {
    job: Option<Job>,
}

type Task = SlabBox<TaskCell>;

struct Shared {
    stealers: Box<[Stealer<Task>]>,
    inflight: AtomicUsize,
    shutdown: AtomicBool,
    // One lock guards both condvars; it serializes visibility checks against
    // notifications so neither side can miss a wakeup.
    sync: Mutex<()>,
    work_cv: Condvar,
    done_cv: Condvar,
}

impl Shared {
    fn has_visible_work(&self) -> bool {
        self.stealers.iter().any(|s| !s.is_empty())
    }
}

/// Resolve a requested thread count: `None` or `Some(0)` means auto (half
/// the logical cores); everything is clamped to `[1, MAX_THREADS]`.
pub fn resolve_threads(requested: Option<usize>) -> usize {
    let n = match requested {
        None | Some(0) => {
            let logical = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            logical / 2
        }
        Some(n) => n,
    };
    n.clamp(1, MAX_THREADS)
}

/// Work-stealing executor. Submit from the owning thread; workers run tasks
/// to completion with no cancellation.
pub(crate) struct ThreadPool {
    shared: Arc<Shared>,
    slab: Arc<Slab<TaskCell>>,
    locals: Vec<Worker<Task>>,
    handles: Vec<JoinHandle<()>>,
    next: Cell<usize>,
}

impl ThreadPool {
    /// Spawn `threads` workers (already resolved/clamped by the caller).
    pub(crate) fn new(threads: usize) -> Result<Self, TransformError> {
        let threads = threads.clamp(1, MAX_THREADS);
        let mut locals = Vec::with_capacity(threads);
        let mut stealers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let (worker, stealer) = deque(DEQUE_CAPACITY);
            locals.push(worker);
            stealers.push(stealer);
        }
        let shared = Arc::new(Shared {
            stealers: stealers.into_boxed_slice(),
            inflight: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            sync: Mutex::new(()),
            work_cv: Condvar::new(),
            done_cv: Condvar::new(),
        });
        let slab = Slab::with_capacity(threads * DEQUE_CAPACITY)?;

        let mut handles = Vec::with_capacity(threads);
        for index in 0..threads {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("json-tools-worker-{index}"))
                .spawn(move || worker_loop(shared, index))
                .map_err(|_| TransformError::AllocFailed {
                    what: "worker thread spawn",
                })?;
            handles.push(handle);
        }
        trace!(threads, "thread pool started");

        Ok(Self {
            shared,
            slab,
            locals,
            handles,
            next: Cell::new(0),
        })
    }

    /// Number of workers.
    pub(crate) fn threads(&self) -> usize {
        self.locals.len()
    }

    /// Queue a task. If every deque is full, the task runs on the caller
    /// before `submit` returns.
    pub(crate) fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.inflight.fetch_add(1, Ordering::AcqRel);
        let mut task = self.slab.alloc(TaskCell {
            job: Some(Box::new(job)),
        });

        let n = self.locals.len();
        let start = self.next.get();
        self.next.set((start + 1) % n);
        for k in 0..n {
            match self.locals[(start + k) % n].push(task) {
                Ok(()) => {
                    // Lock before notifying so a worker that just checked
                    // for work and is about to sleep cannot miss the push.
                    drop(self.shared.sync.lock());
                    self.shared.work_cv.notify_one();
                    return;
                }
                Err(rejected) => task = rejected,
            }
        }

        trace!("all deques full; running task on the submitter");
        run_task(task, &self.shared);
    }

    /// Block until every submitted task has finished, helping drain the
    /// deques (newest task first) along the way.
    pub(crate) fn wait_all(&self) {
        loop {
            let task = self.locals.iter().find_map(|w| w.pop());
            match task {
                Some(task) => run_task(task, &self.shared),
                None => break,
            }
        }

        if self.shared.inflight.load(Ordering::Acquire) == 0 {
            return;
        }
        let mut guard = self.shared.sync.lock();
        while self.shared.inflight.load(Ordering::Acquire) != 0 {
            self.shared.done_cv.wait(&mut guard);
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        drop(self.shared.sync.lock());
        self.shared.work_cv.notify_all();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn run_task(mut task: Task, shared: &Shared) {
    if let Some(job) = task.job.take() {
        job();
    }
    drop(task);
    if shared.inflight.fetch_sub(1, Ordering::AcqRel) == 1 {
        drop(shared.sync.lock());
        shared.done_cv.notify_all();
    }
}

fn worker_loop(shared: Arc<Shared>, index: usize) {
    let n = shared.stealers.len();
    loop {
        // Own deque first (oldest task), then the other victims.
        let task = (0..n).find_map(|k| shared.stealers[(index + k) % n].steal());
        if let Some(task) = task {
            run_task(task, &shared);
            continue;
        }

        let mut guard = shared.sync.lock();
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        if shared.has_visible_work() {
            // A steal race was lost but work remains; go around again.
            continue;
        }
        shared.work_cv.wait(&mut guard);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
