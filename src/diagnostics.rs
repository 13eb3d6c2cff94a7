//! Diagnostics produced by a run.
//!
//! Nothing a validator does can abort a run: violations, invalid registrations and
//! validator failures all flow through a [`DiagnosticSink`]. Sinks are written to from many
//! worker threads at once and must never block for long or panic.
//!
//! [`DiagnosticLog`] is an append-only, lock-free sink that keeps everything in memory.
//! [`LogSink`] forwards to the [`log`] facade instead.
//!
//! # Examples
//!
//! ```rust
//! use symcheck::diagnostics::{DiagnosticKind, DiagnosticLog, Reporter};
//!
//! let log = DiagnosticLog::new();
//! let reporter = Reporter::new(&log, "Game.Rules::Check");
//! reporter.report("Scene has no camera", None);
//!
//! assert_eq!(log.len(), 1);
//! assert_eq!(log.of_kind(DiagnosticKind::Violation).len(), 1);
//! ```

use std::{fmt, sync::Arc};

use strum::{Display, EnumIter, IntoStaticStr};

use crate::catalog::SymbolRef;

/// What a diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum DiagnosticKind {
    /// A validator found a misuse of the annotation vocabulary
    #[strum(serialize = "violation")]
    Violation,
    /// A registration annotation sits on a routine of the wrong shape
    #[strum(serialize = "invalid registration")]
    InvalidRegistration,
    /// A validator returned an error or panicked
    #[strum(serialize = "validator failure")]
    ValidatorFailure,
}

/// A single non-fatal report
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// What is reported
    pub kind: DiagnosticKind,
    /// Human readable text
    pub message: String,
    /// The symbol the report is about, if any
    pub symbol: Option<SymbolRef>,
    /// The validator or routine that produced the report, if any
    pub source: Option<Arc<str>>,
}

impl Diagnostic {
    /// A diagnostic without symbol or source
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            symbol: None,
            source: None,
        }
    }

    /// Attaches the symbol the diagnostic is about
    #[must_use]
    pub fn with_symbol(mut self, symbol: SymbolRef) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Attaches the producing validator or routine
    #[must_use]
    pub fn with_source(mut self, source: Arc<str>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(source) = &self.source {
            write!(f, " [{source}]")?;
        }
        if let Some(symbol) = &self.symbol {
            write!(f, " at {symbol}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Receives diagnostics from any worker thread.
pub trait DiagnosticSink: Send + Sync {
    /// Accepts one diagnostic. Must not panic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Keeps every diagnostic in memory, in arrival order.
#[derive(Default)]
pub struct DiagnosticLog {
    entries: boxcar::Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// An empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics received
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// All diagnostics in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, diagnostic)| diagnostic)
    }

    /// Diagnostics of one kind
    #[must_use]
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|diagnostic| diagnostic.kind == kind)
            .collect()
    }

    /// The messages of all diagnostics, in arrival order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect()
    }
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade: violations at `warn`, failures at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::Violation => log::warn!(target: "symcheck", "{diagnostic}"),
            DiagnosticKind::InvalidRegistration | DiagnosticKind::ValidatorFailure => {
                log::error!(target: "symcheck", "{diagnostic}");
            }
        }
    }
}

/// The handle validators report through.
///
/// A reporter tags everything it sends with the validator it was created for.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    sink: &'a dyn DiagnosticSink,
    source: &'a str,
}

impl<'a> Reporter<'a> {
    /// A reporter sending to `sink` on behalf of `source`
    pub fn new(sink: &'a dyn DiagnosticSink, source: &'a str) -> Self {
        Reporter { sink, source }
    }

    /// Reports a violation, optionally about a symbol
    pub fn report(&self, message: impl Into<String>, symbol: Option<SymbolRef>) {
        let mut diagnostic =
            Diagnostic::new(DiagnosticKind::Violation, message).with_source(Arc::from(self.source));
        diagnostic.symbol = symbol;
        self.sink.report(diagnostic);
    }

    /// Reports a violation about `symbol`
    pub fn violation(&self, symbol: impl Into<SymbolRef>, message: impl Into<String>) {
        self.report(message, Some(symbol.into()));
    }

    /// Name of the validator this reporter belongs to
    #[must_use]
    pub fn source(&self) -> &str {
        self.source
    }
}

impl fmt::Debug for Reporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
