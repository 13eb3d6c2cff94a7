//! Pipeline configuration
//!
//! Which compilation units a run covers, and how many workers it uses. Persisting the
//! chosen mode is up to the host; [`ScanMode`] round-trips through its string form.

use strum::{Display, EnumIter, EnumString};

use crate::corpus::UnitOrigin;

/// Which compilation units a run scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ScanMode {
    /// Runs do nothing
    Disabled,
    /// Only units built from the project itself
    #[default]
    ProjectOnly,
    /// Every unit the host supplies, dependencies included
    Everything,
}

impl ScanMode {
    /// Returns `true` if units of the given origin are scanned in this mode
    #[must_use]
    pub fn includes(self, origin: UnitOrigin) -> bool {
        match self {
            ScanMode::Disabled => false,
            ScanMode::ProjectOnly => origin == UnitOrigin::Project,
            ScanMode::Everything => true,
        }
    }
}

/// Configuration of a [`crate::Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Which units a run scans
    pub mode: ScanMode,

    /// Worker threads of the per-run pool; 0 lets rayon decide
    pub threads: usize,

    /// Catch panics raised by validators and report them as failures.
    /// When disabled, a panicking validator aborts the run.
    pub catch_panics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::project()
    }
}

impl PipelineConfig {
    /// Creates a configuration under which runs do nothing
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            mode: ScanMode::Disabled,
            threads: 0,
            catch_panics: true,
        }
    }

    /// Creates a configuration scanning only the project's own units
    #[must_use]
    pub fn project() -> Self {
        Self {
            mode: ScanMode::ProjectOnly,
            threads: 0,
            catch_panics: true,
        }
    }

    /// Creates a configuration scanning every supplied unit
    #[must_use]
    pub fn everything() -> Self {
        Self {
            mode: ScanMode::Everything,
            threads: 0,
            catch_panics: true,
        }
    }

    /// Sets the number of worker threads
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets whether validator panics are caught
    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}
