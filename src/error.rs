use thiserror::Error;

use crate::registry::Shape;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Very few of these ever leave a pipeline run. Malformed metadata is skipped, registration
/// problems and validator failures become diagnostics, and cancellation silently truncates
/// the run. What remains visible to callers is setup failure (for example the worker pool
/// could not be created) and the errors validator authors return from their own callbacks.
///
/// # Examples
///
/// ```rust
/// use symcheck::{Error, Result};
///
/// fn check_range(value: i64) -> Result<()> {
///     if value < 0 {
///         return Err(Error::Validator(format!("{value} must not be negative")));
///     }
///     Ok(())
/// }
///
/// assert!(check_range(-1).is_err());
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A metadata record could not be decoded.
    ///
    /// Raised by [`crate::corpus::Record::resolve`] when a compilation unit hands out a
    /// corrupt type, member or annotation list. The scanner catches this locally and skips
    /// (or, for annotation lookups, fails open on) the affected symbol.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A routine carries a registration annotation, but its callback shape does not match the
    /// shape required by the annotation's category.
    #[error("Validator '{routine}' must have the signature {expected}, found {}", .found.map_or("no body", |shape| shape.signature()))]
    ShapeMismatch {
        /// Display name of the offending routine
        routine: String,
        /// The shape the category requires
        expected: Shape,
        /// The shape the routine actually has, `None` if it has no bindable body
        found: Option<Shape>,
    },

    /// A validator rejected a symbol.
    ///
    /// Intended for validator authors; the dispatcher reports it as a validator failure
    /// attached to the symbol being visited.
    #[error("{0}")]
    Validator(String),

    /// The run was cancelled before this step could complete.
    #[error("The pipeline run was cancelled")]
    Cancelled,

    /// The worker pool for a run could not be created.
    #[error("{0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
