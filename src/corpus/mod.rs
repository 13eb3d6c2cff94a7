//! The corpus: compilation units and the definitions they contain.
//!
//! The engine never owns or parses compiled artifacts itself. A host exposes each loaded
//! module, assembly or library as a [`CompilationUnit`], and the scanner reads it through
//! that trait only. Units are read concurrently (one worker per unit), so implementations
//! must be [`Send`] + [`Sync`] and must not require mutation to be read.
//!
//! # Malformed metadata
//!
//! Real metadata is sometimes broken. Every record the scanner reads can therefore fail:
//! - [`CompilationUnit::type_at`] returns an error for a type that cannot be read, and the
//!   scanner skips that type
//! - [`TypeDefinition::members`] holds [`Record`]s, and corrupt members are skipped
//! - annotation lists are [`Record`]s as well; when they cannot be decoded the symbol is
//!   treated as *not* excluded and is still scanned
//!
//! # Examples
//!
//! ```rust
//! use symcheck::corpus::{Annotation, CompilationUnit, Module, TypeDefinition, UnitOrigin};
//!
//! let module = Module::new("ThirdParty.Json")
//!     .with_origin(UnitOrigin::External)
//!     .annotated(Annotation::DoNotInspect)
//!     .with_type(TypeDefinition::class("Json", "Reader"));
//!
//! assert_eq!(module.type_count(), 1);
//! assert_eq!(module.origin(), UnitOrigin::External);
//! ```

mod annotation;
mod definition;
mod module;

pub(crate) use annotation::is_do_not_inspect;
pub use annotation::{Annotation, AnnotationKind};
pub(crate) use definition::full_name;
pub use definition::{
    FieldDefinition, MemberDefinition, MethodDefinition, MethodModifiers, PropertyDefinition,
    TypeDefinition,
};
pub use module::Module;

use std::sync::Arc;

use crate::Result;

/// Where a compilation unit comes from. Used by [`crate::ScanMode::ProjectOnly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitOrigin {
    /// Built from the host project's own sources
    #[default]
    Project,
    /// A dependency, plugin or platform library
    External,
}

/// A metadata record that may fail to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<T> {
    /// The record was read successfully
    Decoded(T),
    /// The record is corrupt; the reason is kept for diagnostics
    Corrupt(String),
}

impl<T> Record<T> {
    /// Access the decoded value
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for corrupt records.
    pub fn resolve(&self) -> Result<&T> {
        match self {
            Record::Decoded(value) => Ok(value),
            Record::Corrupt(reason) => Err(malformed_error!("{}", reason)),
        }
    }

    /// Returns `true` if the record could not be decoded
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Record::Corrupt(_))
    }
}

impl<T> Record<Vec<T>> {
    pub(crate) fn push(&mut self, value: T) {
        if let Record::Decoded(values) = self {
            values.push(value);
        }
    }
}

/// A compilation unit: an externally owned, read-only bundle of type definitions.
///
/// # Thread Safety
///
/// Units are scanned from worker threads, one unit per worker.
pub trait CompilationUnit: Send + Sync {
    /// Name of the unit, used in logs and carried by every symbol scanned from it
    fn name(&self) -> &str;

    /// Where this unit comes from
    fn origin(&self) -> UnitOrigin {
        UnitOrigin::Project
    }

    /// Annotations declared on the unit itself
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if they cannot be decoded.
    fn annotations(&self) -> Result<&[Annotation]>;

    /// Number of type slots in this unit, including unreadable ones
    fn type_count(&self) -> usize;

    /// Reads the type definition at `index`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the type cannot be read.
    fn type_at(&self, index: usize) -> Result<Arc<TypeDefinition>>;
}
