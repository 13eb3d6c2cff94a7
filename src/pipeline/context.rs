//! Per-run pipeline context.
//!
//! A [`PipelineContext`] bundles everything one run shares between its phases: the
//! configuration, the diagnostics sink, the cancellation token, the progress observer and
//! the dedicated worker pool. It is built at the start of [`crate::Pipeline::run`] and
//! dropped when the run ends, so nothing survives from one run to the next.

use rayon::ThreadPool;

use crate::{
    diagnostics::{Diagnostic, DiagnosticSink},
    pipeline::{CancellationToken, PipelineConfig, PipelineObserver},
};

/// Shared state of one run.
///
/// # Thread Safety
///
/// This struct is [`Send`] and [`Sync`]; phases hand `&PipelineContext` to their workers.
pub struct PipelineContext<'a> {
    /// Configuration of the run
    config: &'a PipelineConfig,
    /// Where diagnostics go
    sink: &'a dyn DiagnosticSink,
    /// Polled by every phase
    token: &'a CancellationToken,
    /// Progress hook
    observer: &'a dyn PipelineObserver,
    /// Dedicated thread pool for this run
    thread_pool: &'a ThreadPool,
}

impl<'a> PipelineContext<'a> {
    /// Creates a context for one run.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration of the run
    /// * `sink` - Receives every diagnostic
    /// * `token` - Cancellation token polled by all phases
    /// * `observer` - Progress hook
    /// * `thread_pool` - Pool all parallel work of the run is installed on
    #[must_use]
    pub fn new(
        config: &'a PipelineConfig,
        sink: &'a dyn DiagnosticSink,
        token: &'a CancellationToken,
        observer: &'a dyn PipelineObserver,
        thread_pool: &'a ThreadPool,
    ) -> Self {
        Self {
            config,
            sink,
            token,
            observer,
            thread_pool,
        }
    }

    /// Returns the configuration of this run
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    /// Returns the diagnostics sink
    #[must_use]
    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink
    }

    /// Sends one diagnostic to the sink
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    /// Returns the progress observer
    #[must_use]
    pub fn observer(&self) -> &dyn PipelineObserver {
        self.observer
    }

    /// Returns `true` once cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the dedicated thread pool of this run.
    ///
    /// All parallel work of the run is installed on this pool so concurrent runs do not
    /// compete for the global rayon pool.
    #[must_use]
    pub fn thread_pool(&self) -> &ThreadPool {
        self.thread_pool
    }
}
