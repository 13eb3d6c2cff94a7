//! Progress hooks for pipeline runs.
//!
//! A [`PipelineObserver`] is told when each phase of a run makes progress, so a host can drive
//! a progress bar or collect timings without touching the diagnostics stream.
//!
//! # Call Order
//!
//! For one run the hooks fire in this order:
//! 1. [`PipelineObserver::run_started`] once, after the scan mode gate
//! 2. [`PipelineObserver::unit_scanned`] once per selected unit
//! 3. [`PipelineObserver::merged`] once, unless the run was cancelled before merging ended
//! 4. [`PipelineObserver::order_started`] and [`PipelineObserver::order_finished`] once per
//!    dispatched order key, in ascending key order
//!
//! Every `unit_scanned` call happens before `merged`, and every `order_finished(k)` happens
//! before `order_started` of the next key. A disabled run fires nothing.
//!
//! # Thread Safety
//!
//! `unit_scanned` is called from the run's worker threads. Calls for different units may
//! arrive concurrently and out of unit order; `completed` still counts up from 1 to `total`
//! without gaps. The other hooks are called from the thread that called
//! [`crate::Pipeline::run`]. Observers must therefore be [`Send`] and [`Sync`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};
//! use symcheck::prelude::*;
//!
//! #[derive(Default)]
//! struct Progress {
//!     units: AtomicUsize,
//! }
//!
//! impl PipelineObserver for Progress {
//!     fn unit_scanned(&self, _unit: &str, _completed: usize, _total: usize) {
//!         self.units.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let progress = Arc::new(Progress::default());
//! let pipeline = Pipeline::new(PipelineConfig::everything()).with_observer(progress.clone());
//! let units = vec![Module::new("Game").into_unit(), Module::new("Tools").into_unit()];
//!
//! pipeline.run(&units, &DiagnosticLog::new(), &CancellationToken::new())?;
//! assert_eq!(progress.units.load(Ordering::Relaxed), 2);
//! # Ok::<(), symcheck::Error>(())
//! ```

use crate::catalog::CatalogStatistics;

/// Observes the progress of a run.
///
/// Every method has an empty default, so observers only implement what they need.
pub trait PipelineObserver: Send + Sync {
    /// A run is starting with `units` units after the mode gate
    fn run_started(&self, _units: usize) {}

    /// A unit was scanned; `completed` of `total` units are done
    fn unit_scanned(&self, _unit: &str, _completed: usize, _total: usize) {}

    /// Partitions were merged into one catalog with `registrations` validators
    fn merged(&self, _statistics: &CatalogStatistics, _registrations: usize) {}

    /// Dispatch of an order key is starting
    fn order_started(&self, _order: i32) {}

    /// Every lane of an order key has finished
    fn order_finished(&self, _order: i32) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
