//! In-memory compilation unit.

use std::sync::Arc;

use crate::{
    corpus::{Annotation, CompilationUnit, Record, TypeDefinition, UnitOrigin},
    Result,
};

/// A compilation unit held entirely in memory.
///
/// Hosts that already have their metadata in plain data structures (or tests) build one
/// `Module` per loaded unit and hand them to [`crate::Pipeline::run`].
///
/// # Examples
///
/// ```rust
/// use symcheck::corpus::{CompilationUnit, FieldDefinition, Module, TypeDefinition};
///
/// let unit = Module::new("Game.Scripts")
///     .with_type(
///         TypeDefinition::class("Game", "Enemy")
///             .with_field(FieldDefinition::new("speed", "float").serializable(true)),
///     )
///     .with_corrupt_type("row 7 references a missing blob");
///
/// assert_eq!(unit.type_count(), 2);
/// assert!(unit.type_at(0).is_ok());
/// assert!(unit.type_at(1).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    origin: UnitOrigin,
    annotations: Record<Vec<Annotation>>,
    types: Vec<Record<Arc<TypeDefinition>>>,
}

impl Module {
    /// An empty project module
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            origin: UnitOrigin::Project,
            annotations: Record::Decoded(Vec::new()),
            types: Vec::new(),
        }
    }

    /// Sets the origin of this module
    #[must_use]
    pub fn with_origin(mut self, origin: UnitOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Adds a module level annotation. Ignored if the annotation list is corrupt.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks the module level annotation list as undecodable
    #[must_use]
    pub fn with_corrupt_annotations(mut self, reason: &str) -> Self {
        self.annotations = Record::Corrupt(reason.to_string());
        self
    }

    /// Appends a type definition
    #[must_use]
    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        self.types.push(Record::Decoded(Arc::new(definition)));
        self
    }

    /// Appends a type slot that cannot be read
    #[must_use]
    pub fn with_corrupt_type(mut self, reason: &str) -> Self {
        self.types.push(Record::Corrupt(reason.to_string()));
        self
    }

    /// Wraps this module for [`crate::Pipeline::run`]
    #[must_use]
    pub fn into_unit(self) -> Arc<dyn CompilationUnit> {
        Arc::new(self)
    }
}

impl CompilationUnit for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> UnitOrigin {
        self.origin
    }

    fn annotations(&self) -> Result<&[Annotation]> {
        self.annotations.resolve().map(Vec::as_slice)
    }

    fn type_count(&self) -> usize {
        self.types.len()
    }

    fn type_at(&self, index: usize) -> Result<Arc<TypeDefinition>> {
        match self.types.get(index) {
            Some(record) => record.resolve().cloned(),
            None => Err(malformed_error!(
                "Type index {} out of range for unit '{}' ({} types)",
                index,
                self.name,
                self.types.len()
            )),
        }
    }
}
