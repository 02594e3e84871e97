use crate::exec::work_item::{Kernel, WorkItem};
use crate::foundation::error::{TilekitError, TilekitResult};
use crate::foundation::simd::cpu_supports_simd;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Default bytes per tile.
pub const DEFAULT_TARGET_TILE_BYTES: usize = 16 * 1024;

/// Upper bound on the total participating threads accepted from configuration.
pub const MAX_THREADS: usize = 256;

/// Auto-detection never asks for more pool threads than this.
const AUTO_POOL_THREADS_CAP: usize = 6;

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerOpts {
    /// Total participating threads including the caller. `0` picks a value from the host's
    /// available parallelism.
    pub threads: usize,
    /// Target tile size in bytes. Values below 1000 are treated as 1000.
    pub target_tile_bytes: usize,
    /// Report SIMD support to kernels when the CPU has it. `false` forces scalar paths.
    pub simd: bool,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            threads: 0,
            target_tile_bytes: DEFAULT_TARGET_TILE_BYTES,
            simd: true,
        }
    }
}

impl SchedulerOpts {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> TilekitResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| TilekitError::config(format!("invalid scheduler options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check that the options describe a pool that can be built.
    pub fn validate(&self) -> TilekitResult<()> {
        if self.threads > MAX_THREADS {
            return Err(TilekitError::config(format!(
                "threads must be <= {MAX_THREADS}, got {}",
                self.threads
            )));
        }
        Ok(())
    }

    /// Number of pool threads to spawn, excluding the caller.
    pub fn pool_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads - 1;
        }
        let hw = std::thread::available_parallelism().map_or(1, |n| n.get());
        hw.saturating_sub(1).clamp(1, AUTO_POOL_THREADS_CAP)
    }
}

/// Type-erased reference to the work item of the current run.
#[derive(Clone, Copy)]
struct ActiveItem {
    item: *const (),
    run_tile: unsafe fn(*const (), usize, usize),
}

// SAFETY: the pointee is a `WorkItem<K>` with `K: Sync`, only accessed through `&`, and it
// outlives every use because `Scheduler::run` does not return before all claimed tiles finish.
unsafe impl Send for ActiveItem {}

impl ActiveItem {
    fn new<K: Kernel>(item: &WorkItem<K>) -> Self {
        Self {
            item: (item as *const WorkItem<K>).cast(),
            run_tile: run_tile_erased::<K>,
        }
    }
}

/// # Safety
///
/// `item` must point to a live `WorkItem<K>`.
unsafe fn run_tile_erased<K: Kernel>(item: *const (), thread_index: usize, tile_index: usize) {
    // SAFETY: guaranteed by the caller.
    let item = unsafe { &*item.cast::<WorkItem<K>>() };
    item.run_tile(thread_index, tile_index);
}

struct QueueState {
    active: Option<ActiveItem>,
    tiles_not_started: usize,
    tiles_in_flight: usize,
    stop: bool,
    panic: Option<Box<dyn Any + Send>>,
}

impl QueueState {
    fn claim(&mut self) -> Option<(ActiveItem, usize)> {
        if self.stop || self.tiles_not_started == 0 {
            return None;
        }
        let item = self.active?;
        // Tiles are handed out in decreasing order; they are independent so order is moot.
        self.tiles_not_started -= 1;
        self.tiles_in_flight += 1;
        Some((item, self.tiles_not_started))
    }

    fn is_done(&self) -> bool {
        self.tiles_not_started == 0 && self.tiles_in_flight == 0
    }
}

struct Shared {
    queue: Mutex<QueueState>,
    work_available_or_stop: Condvar,
    work_finished: Condvar,
}

/// Observes pool thread liveness independently of the scheduler's lifetime.
#[derive(Clone, Debug)]
pub struct PoolProbe {
    live: Arc<AtomicUsize>,
}

impl PoolProbe {
    /// Pool threads spawned and not yet exited.
    pub fn live_threads(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Persistent thread pool that executes one [`WorkItem`] at a time.
///
/// Pool threads get indices `1..thread_count()`; the thread calling [`Scheduler::run`] works
/// as index `0`. Concurrent `run` calls from different threads are serialized.
pub struct Scheduler {
    shared: Arc<Shared>,
    task_lock: Mutex<()>,
    workers: Vec<JoinHandle<()>>,
    uses_simd: bool,
    target_tile_bytes: usize,
    live: Arc<AtomicUsize>,
}

impl Scheduler {
    /// Spawn the pool described by `opts`.
    pub fn new(opts: SchedulerOpts) -> TilekitResult<Self> {
        opts.validate()?;
        let pool_threads = opts.pool_threads();
        let uses_simd = opts.simd && cpu_supports_simd();

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                active: None,
                tiles_not_started: 0,
                tiles_in_flight: 0,
                stop: false,
                panic: None,
            }),
            work_available_or_stop: Condvar::new(),
            work_finished: Condvar::new(),
        });
        let live = Arc::new(AtomicUsize::new(0));

        let mut scheduler = Self {
            shared,
            task_lock: Mutex::new(()),
            workers: Vec::with_capacity(pool_threads),
            uses_simd,
            target_tile_bytes: opts.target_tile_bytes,
            live,
        };

        for thread_index in 1..=pool_threads {
            let shared = Arc::clone(&scheduler.shared);
            let live = Arc::clone(&scheduler.live);
            live.fetch_add(1, Ordering::AcqRel);
            let spawned = std::thread::Builder::new()
                .name(format!("tilekit-{thread_index}"))
                .spawn(move || {
                    let _live = LiveGuard(live);
                    tracing::trace!(thread_index, "pool thread started");
                    work_loop(&shared, thread_index, false);
                    tracing::trace!(thread_index, "pool thread exiting");
                });
            match spawned {
                Ok(handle) => scheduler.workers.push(handle),
                Err(e) => {
                    scheduler.live.fetch_sub(1, Ordering::AcqRel);
                    // Dropping `scheduler` stops and joins the threads spawned so far.
                    return Err(TilekitError::pool(format!(
                        "failed to spawn pool thread {thread_index}: {e}"
                    )));
                }
            }
        }

        tracing::info!(
            pool_threads,
            uses_simd,
            target_tile_bytes = opts.target_tile_bytes,
            "scheduler started"
        );
        Ok(scheduler)
    }

    /// Spawn a pool with `threads` total participants (`0` = auto) and default options.
    pub fn with_threads(threads: usize) -> TilekitResult<Self> {
        Self::new(SchedulerOpts {
            threads,
            ..SchedulerOpts::default()
        })
    }

    /// Total threads that may execute tiles: pool threads plus the caller.
    ///
    /// Kernels size per-thread scratch storage with this.
    pub fn thread_count(&self) -> usize {
        self.workers.len() + 1
    }

    /// Whether work items are told the host supports SIMD.
    pub fn uses_simd(&self) -> bool {
        self.uses_simd
    }

    /// Liveness handle for the pool threads; stays valid after the scheduler is dropped.
    pub fn probe(&self) -> PoolProbe {
        PoolProbe {
            live: Arc::clone(&self.live),
        }
    }

    /// Execute every tile of `item` exactly once and return when all of them have finished.
    ///
    /// The calling thread processes tiles too. If a kernel panics, the remaining tiles still
    /// run and the first panic is resumed here once the run is complete.
    pub fn run<K: Kernel>(&self, item: &mut WorkItem<K>) {
        let task_guard = lock(&self.task_lock);
        item.set_uses_simd(self.uses_simd);

        {
            let mut state = lock(&self.shared.queue);
            debug_assert!(state.active.is_none() && state.is_done());
            let tiles = item.compute_tiling(self.target_tile_bytes);
            tracing::debug!(
                tiles,
                size_x = item.size_x(),
                size_y = item.size_y(),
                cell_size = item.cell_size(),
                "dispatching work item"
            );
            state.active = Some(ActiveItem::new(item));
            state.tiles_not_started = tiles;
            self.shared.work_available_or_stop.notify_all();
        }

        work_loop(&self.shared, 0, true);

        let panic = {
            let state = lock(&self.shared.queue);
            let mut state = self
                .shared
                .work_finished
                .wait_while(state, |s| !s.is_done())
                .unwrap_or_else(PoisonError::into_inner);
            state.active = None;
            state.panic.take()
        };
        drop(task_guard);

        if let Some(payload) = panic {
            panic::resume_unwind(payload);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.queue);
            state.stop = true;
            self.shared.work_available_or_stop.notify_all();
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("pool thread terminated by panic");
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Claim and run tiles until told to stop. With `return_when_idle`, also return as soon as
/// no unclaimed tile is left.
fn work_loop(shared: &Shared, thread_index: usize, return_when_idle: bool) {
    let mut state = lock(&shared.queue);
    loop {
        state = shared
            .work_available_or_stop
            .wait_while(state, |s| {
                !(s.stop || s.tiles_not_started > 0 || return_when_idle)
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.stop || (return_when_idle && state.tiles_not_started == 0) {
            return;
        }

        while let Some((item, tile_index)) = state.claim() {
            drop(state);
            // SAFETY: `item` was published by `Scheduler::run`, which keeps the work item alive
            // until this tile is accounted for in `tiles_in_flight`.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
                (item.run_tile)(item.item, thread_index, tile_index)
            }));
            state = lock(&shared.queue);

            if let Err(payload) = outcome {
                tracing::error!(thread_index, tile_index, "kernel panicked");
                if state.panic.is_none() {
                    state.panic = Some(payload);
                }
            }
            state.tiles_in_flight -= 1;
            if state.is_done() {
                shared.work_finished.notify_all();
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/scheduler.rs"]
mod tests;
