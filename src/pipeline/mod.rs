//! Scan, merge and dispatch.
//!
//! A run walks through three phases, all sharing one [`PipelineContext`]:
//!
//! 1. **Scan** - every unit admitted by the [`ScanMode`] becomes a partition, in parallel
//! 2. **Merge** - partitions fold into one catalog and registry, in unit order, after the
//!    explicit registrations of the [`Pipeline`]
//! 3. **Dispatch** - validators run one order key after the other, lanes in parallel
//!
//! Runs are stateless: nothing but the configuration, the explicit registrations and the
//! observer carries over from one run to the next.
//!
//! # Examples
//!
//! ```rust
//! use symcheck::prelude::*;
//!
//! let unit = Module::new("Game")
//!     .with_type(TypeDefinition::class("Game", "Player"))
//!     .into_unit();
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default());
//! pipeline.register(Registration::new(
//!     "Game.Naming",
//!     "naming",
//!     Validator::each_type(TypeFilter::NonEnumLike, |symbol, reporter| {
//!         if symbol.namespace.is_empty() {
//!             reporter.violation(symbol.clone(), "types need a namespace");
//!         }
//!         Ok(())
//!     }),
//! ));
//!
//! let log = DiagnosticLog::new();
//! let report = pipeline.run(&[unit], &log, &CancellationToken::new())?;
//!
//! assert_eq!(report.invocations, 1);
//! assert!(log.is_empty());
//! # Ok::<(), symcheck::Error>(())
//! ```

mod cancel;
mod config;
mod context;
mod dispatcher;
mod merger;
mod observer;
mod scanner;

pub use cancel::CancellationToken;
pub use config::{PipelineConfig, ScanMode};
pub use context::PipelineContext;
pub use observer::{NoopObserver, PipelineObserver};

use std::{
    fmt,
    sync::Arc,
    thread::{self, JoinHandle},
};

use rayon::ThreadPoolBuilder;
use strum::Display;

use crate::{
    catalog::CatalogStatistics,
    corpus::CompilationUnit,
    diagnostics::DiagnosticSink,
    pipeline::{dispatcher::Dispatcher, scanner::CorpusScanner},
    registry::{Registration, Registry},
    Error, Result,
};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RunOutcome {
    /// Every order key was dispatched
    Completed,
    /// The token was cancelled; results are truncated
    Cancelled,
    /// The scan mode is [`ScanMode::Disabled`]; nothing ran
    Disabled,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// Units handed to the run
    pub units_total: usize,
    /// Units left out by the scan mode
    pub units_filtered: usize,
    /// Units scanned to the end
    pub units_scanned: usize,
    /// Units whose scan stopped early because the run was cancelled
    pub units_truncated: usize,
    /// Units marked `DoNotInspect`
    pub units_skipped: usize,
    /// Unreadable records that were skipped or read as empty
    pub malformed: usize,
    /// Bucket sizes of the merged catalog
    pub catalog: CatalogStatistics,
    /// Validators in the merged registry
    pub registrations: usize,
    /// Order keys that were started, ascending
    pub orders: Vec<i32>,
    /// Validator calls
    pub invocations: usize,
    /// Calls left out because the symbol excluded the validator's kind
    pub skipped: usize,
    /// Calls that returned an error or panicked
    pub failures: usize,
}

impl RunReport {
    fn new(outcome: RunOutcome, units_total: usize) -> Self {
        RunReport {
            outcome,
            units_total,
            units_filtered: 0,
            units_scanned: 0,
            units_truncated: 0,
            units_skipped: 0,
            malformed: 0,
            catalog: CatalogStatistics::default(),
            registrations: 0,
            orders: Vec::new(),
            invocations: 0,
            skipped: 0,
            failures: 0,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {}: {}/{} units scanned ({} skipped, {} truncated, {} filtered), {}, {} validators over {} order keys, {} calls ({} excluded, {} failed)",
            self.outcome,
            self.units_scanned,
            self.units_total,
            self.units_skipped,
            self.units_truncated,
            self.units_filtered,
            self.catalog,
            self.registrations,
            self.orders.len(),
            self.invocations,
            self.skipped,
            self.failures
        )
    }
}

/// Entry point of the engine.
///
/// A pipeline holds the configuration, the explicitly registered validators and an
/// optional progress observer. Each call to [`Pipeline::run`] is an independent full
/// re-scan; validators discovered in the corpus only live for that run.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    registrations: Vec<Registration>,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    /// Creates a pipeline without explicit registrations
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            registrations: Vec::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Adds a validator to every future run.
    ///
    /// Explicit registrations precede validators discovered in the corpus at the same
    /// category and order key.
    pub fn register(&mut self, registration: Registration) -> &mut Self {
        self.registrations.push(registration);
        self
    }

    /// Sets the progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the configuration
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the explicit registrations
    #[must_use]
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Scans `units`, then runs every validator over the resulting catalog.
    ///
    /// Diagnostics go to `sink`. Cancelling `token` truncates the run; the report then has
    /// [`RunOutcome::Cancelled`] and the call still returns `Ok`.
    ///
    /// # Arguments
    ///
    /// * `units` - The compilation units of the corpus, in a stable order
    /// * `sink` - Receives violations, invalid registrations and validator failures
    /// * `token` - Polled by every phase
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ThreadPool`] if the worker pool cannot be created.
    pub fn run(
        &self,
        units: &[Arc<dyn CompilationUnit>],
        sink: &dyn DiagnosticSink,
        token: &CancellationToken,
    ) -> Result<RunReport> {
        if self.config.mode == ScanMode::Disabled {
            log::debug!("Scan mode is disabled, skipping run");
            return Ok(RunReport::new(RunOutcome::Disabled, units.len()));
        }

        let mut report = RunReport::new(RunOutcome::Completed, units.len());

        let selected: Vec<Arc<dyn CompilationUnit>> = units
            .iter()
            .filter(|unit| self.config.mode.includes(unit.origin()))
            .cloned()
            .collect();
        report.units_filtered = units.len() - selected.len();

        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("symcheck-worker-{index}"));
        if self.config.threads > 0 {
            builder = builder.num_threads(self.config.threads);
        }
        let thread_pool = builder.build()?;

        let context = PipelineContext::new(
            &self.config,
            sink,
            token,
            self.observer.as_ref(),
            &thread_pool,
        );
        context.observer().run_started(selected.len());

        let partitions = CorpusScanner::new(&context).scan(&selected);
        report.units_skipped = partitions.iter().filter(|p| p.skipped).count();
        report.units_truncated = partitions.iter().filter(|p| p.cancelled).count();
        report.units_scanned = partitions.len() - report.units_skipped - report.units_truncated;
        report.malformed = partitions.iter().map(|p| p.malformed).sum();

        let mut explicit = Registry::default();
        for registration in &self.registrations {
            explicit.register(registration.clone());
        }

        let (catalog, registry) = match merger::merge(&context, explicit, partitions) {
            Ok(merged) => merged,
            Err(Error::Cancelled) => {
                report.outcome = RunOutcome::Cancelled;
                log::info!("{report}");
                return Ok(report);
            }
            Err(error) => return Err(error),
        };
        report.catalog = catalog.statistics();
        report.registrations = registry.len();

        let stats = Dispatcher::new(&context, &catalog, &registry).dispatch();
        report.orders = stats.orders;
        report.invocations = stats.invocations;
        report.skipped = stats.skipped;
        report.failures = stats.failures;
        if stats.cancelled || token.is_cancelled() {
            report.outcome = RunOutcome::Cancelled;
        }

        log::info!("{report}");
        Ok(report)
    }

    /// Runs the pipeline on a background thread.
    ///
    /// The returned handle owns the run's cancellation token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Error`] if the thread cannot be spawned.
    pub fn spawn(
        &self,
        units: Vec<Arc<dyn CompilationUnit>>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<PipelineHandle> {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let pipeline = self.clone();

        let thread = thread::Builder::new()
            .name("symcheck-pipeline".to_string())
            .spawn(move || pipeline.run(&units, sink.as_ref(), &worker_token))
            .map_err(|error| Error::Error(format!("Failed to spawn pipeline thread - {error}")))?;

        Ok(PipelineHandle { token, thread })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}

/// A run in progress on a background thread
#[derive(Debug)]
pub struct PipelineHandle {
    token: CancellationToken,
    thread: JoinHandle<Result<RunReport>>,
}

impl PipelineHandle {
    /// Requests cancellation of the run
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The cancellation token of the run
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once the run has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the run to end
    ///
    /// # Errors
    ///
    /// Returns the error of the run, or [`crate::Error::Error`] if the run panicked.
    pub fn join(self) -> Result<RunReport> {
        self.thread
            .join()
            .map_err(|_| Error::Error("Pipeline thread panicked".to_string()))?
    }
}
