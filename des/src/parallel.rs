//! Parallel execution of independent EventLoop runs
//!
//! Replicated simulations share nothing: each run owns its clock, its pools
//! and its world. This module fans such runs out over a rayon thread pool and
//! collects their final worlds in run order.
//!
//! # Example: 100 replications of a model
//!
//! ```rust
//! use des::parallel::{ParallelRunner, progress_reporter};
//! # use des::{Context, DesError, EventLoop, Process, Status, Wakeup};
//! # struct Tick;
//! # impl Process<u32> for Tick {
//! #     fn resume(&mut self, ctx: &mut Context<'_, u32>, _: Wakeup) -> Result<Status, DesError> {
//! #         *ctx.world_mut() += 1;
//! #         ctx.timeout(1.0)?;
//! #         Ok(Status::Suspended)
//! #     }
//! # }
//!
//! let results = ParallelRunner::new(100, |run_id| {
//!     // derive the run's seed from `run_id` here
//!     let mut event_loop = EventLoop::new(0u32);
//!     event_loop.spawn(Tick);
//!     Ok(event_loop)
//! })
//! .progress(progress_reporter(10))
//! .num_threads(8)
//! .run(10.0);
//!
//! for (id, result) in results.iter().enumerate() {
//!     match result {
//!         Ok(ticks) => println!("Run {} ticked {} times", id, ticks),
//!         Err(e) => eprintln!("Run {} failed: {}", id, e),
//!     }
//! }
//! ```
//!
//! # Determinism
//!
//! Results are deterministic when:
//! 1. The builder derives each run's seed from `run_id`
//! 2. Processes draw from that seeded RNG only
//! 3. No state is shared between runs
//!
//! Running the same batch twice then gives identical results regardless of
//! execution order or thread count.
//!
//! # Error Handling
//!
//! A run that returns a `DesError` yields `Err(RunError::Sim)`. A run that
//! panics is caught and yields `Err(RunError::Panicked)`. Other runs carry on
//! either way.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::{DesError, EventLoop};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("simulation error: {0}")]
    Sim(#[from] DesError),

    #[error("run panicked: {0}")]
    Panicked(String),
}

/// Executes many independent EventLoop runs in parallel
///
/// Generic over:
/// - `W`: the world each run returns when it reaches the horizon
/// - `F`: builder function type
///
/// The builder `F` takes a run id and returns a fresh, fully populated
/// `EventLoop`. It is called from worker threads, hence `Send + Sync`.
pub struct ParallelRunner<W, F>
where
    F: Fn(usize) -> Result<EventLoop<W>, DesError> + Send + Sync,
    W: Send,
{
    num_runs: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
    _world: PhantomData<fn() -> W>,
}

impl<W, F> ParallelRunner<W, F>
where
    F: Fn(usize) -> Result<EventLoop<W>, DesError> + Send + Sync,
    W: Send,
{
    /// Create a new parallel runner
    ///
    /// # Arguments
    ///
    /// * `num_runs` - Number of independent runs
    /// * `builder` - Closure that creates a fresh EventLoop for a given run id
    pub fn new(num_runs: usize, builder: F) -> Self {
        ParallelRunner {
            num_runs,
            builder,
            num_threads: None,
            progress_callback: None,
            _world: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each run
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all runs up to `horizon` and return their worlds in run order
    pub fn run(self, horizon: f64) -> Vec<Result<W, RunError>> {
        let progress_counter = AtomicUsize::new(0);

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| warn!(threads = n, error = %e, "falling back to global rayon pool"))
                .ok()
        });

        let execute = || {
            (0..self.num_runs)
                .into_par_iter()
                .map(|run_id| {
                    let simulate = || -> Result<W, DesError> {
                        let mut event_loop = (self.builder)(run_id)?;
                        event_loop.run_until(horizon)?;
                        Ok(event_loop.into_world())
                    };
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(simulate));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_runs);
                    }

                    match result {
                        Ok(outcome) => outcome.map_err(RunError::Sim),
                        Err(panic) => Err(RunError::Panicked(panic_message(panic))),
                    }
                })
                .collect()
        };

        if let Some(pool) = pool {
            pool.install(execute)
        } else {
            execute()
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run `num_runs` runs with default settings
///
/// For thread count or progress reporting, use `ParallelRunner`.
pub fn run_parallel<W, F>(num_runs: usize, builder: F, horizon: f64) -> Vec<Result<W, RunError>>
where
    F: Fn(usize) -> Result<EventLoop<W>, DesError> + Send + Sync,
    W: Send,
{
    ParallelRunner::new(num_runs, builder).run(horizon)
}

/// Progress callback that logs every `interval` completed runs
pub fn progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            info!(completed, total, "runs completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Process, Status, Wakeup};

    // Counts its own wakeups, one per minute
    struct Counter;

    #[derive(Debug, Clone, PartialEq)]
    struct CounterWorld {
        id: usize,
        count: usize,
    }

    impl Process<CounterWorld> for Counter {
        fn resume(
            &mut self,
            ctx: &mut Context<'_, CounterWorld>,
            _wakeup: Wakeup,
        ) -> Result<Status, DesError> {
            ctx.world_mut().count += 1;
            ctx.timeout(1.0)?;
            Ok(Status::Suspended)
        }
    }

    fn counter_run(run_id: usize) -> Result<EventLoop<CounterWorld>, DesError> {
        let mut event_loop = EventLoop::new(CounterWorld {
            id: run_id,
            count: 0,
        });
        event_loop.spawn(Counter);
        Ok(event_loop)
    }

    #[test]
    fn test_parallel_basic() {
        let results = run_parallel(10, counter_run, 9.0);

        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            let world = result.as_ref().unwrap();
            assert_eq!(world.id, i);
            assert_eq!(world.count, 10);
        }
    }

    #[test]
    fn test_parallel_determinism() {
        let run1 = run_parallel(20, counter_run, 50.0);
        let run2 = run_parallel(20, counter_run, 50.0);

        assert_eq!(run1, run2);
    }

    #[test]
    fn test_parallel_panic_isolation() {
        let results = run_parallel(
            10,
            |run_id| {
                if run_id == 5 {
                    panic!("Test panic");
                }
                counter_run(run_id)
            },
            10.0,
        );

        assert_eq!(results.len(), 10);
        assert_eq!(results[5], Err(RunError::Panicked("Test panic".to_string())));
        for (i, result) in results.iter().enumerate() {
            if i != 5 {
                assert!(result.is_ok());
            }
        }
    }

    #[test]
    fn test_builder_error_is_reported() {
        let results = run_parallel(
            3,
            |run_id| {
                let mut event_loop = counter_run(run_id)?;
                if run_id == 1 {
                    event_loop.add_pool(0)?;
                }
                Ok(event_loop)
            },
            10.0,
        );

        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(RunError::Sim(DesError::InvalidCapacity(0)))
        );
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_parallel_progress_callback() {
        use std::sync::Mutex;
        let completed = Arc::new(Mutex::new(0));
        let completed_clone = completed.clone();

        ParallelRunner::new(5, counter_run)
            .progress(move |count, _total| {
                let mut last = completed_clone.lock().unwrap();
                *last = (*last).max(count);
            })
            .run(10.0);

        assert_eq!(*completed.lock().unwrap(), 5);
    }

    #[test]
    fn test_parallel_custom_threads() {
        let results = ParallelRunner::new(8, counter_run).num_threads(2).run(10.0);

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_progress_reporter() {
        let reporter = progress_reporter(10);
        reporter(10, 100);
        reporter(100, 100);
        progress_reporter(0)(1, 1);
    }

    #[test]
    fn test_empty_batch() {
        let results = run_parallel(0, counter_run, 100.0);
        assert_eq!(results.len(), 0);
    }
}
