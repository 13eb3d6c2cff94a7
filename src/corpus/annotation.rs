//! Annotations attached to compilation units, types and members.
//!
//! The vocabulary has three parts:
//! - **Registration annotations** (`OnEach*`, `Once`) mark a static routine as a validator
//!   and carry the order key it runs at
//! - **Scan control** (`Exclude`, `DoNotInspect`) hides symbols from some or all validators
//! - **Custom annotations** are the host's own vocabulary, the things validators police

use std::{fmt, sync::Arc};

use crate::registry::{Category, FieldFilter, TypeFilter};

/// The name of an annotation kind.
///
/// Validators are declared by a kind (the fully qualified name of the type declaring the
/// routine, or an explicit name for registered validators). `Exclude` lists kinds, and a
/// symbol is never handed to a validator whose kind it excludes.
///
/// Cloning is a reference count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationKind(Arc<str>);

impl AnnotationKind {
    /// Create a new kind from its name
    pub fn new(name: &str) -> Self {
        AnnotationKind(Arc::from(name))
    }

    /// The name of this kind
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationKind {
    fn from(name: &str) -> Self {
        AnnotationKind::new(name)
    }
}

impl From<String> for AnnotationKind {
    fn from(name: String) -> Self {
        AnnotationKind(Arc::from(name))
    }
}

/// A single annotation as read from metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Run the annotated routine once per type matching `filter`
    OnEachType {
        /// Which types the routine receives
        filter: TypeFilter,
        /// Order key, lower runs first
        order: i32,
    },
    /// Run the annotated routine once per member (field, property or method)
    OnEachMember {
        /// Order key, lower runs first
        order: i32,
    },
    /// Run the annotated routine once per field matching `filter`
    OnEachField {
        /// Which fields the routine receives
        filter: FieldFilter,
        /// Order key, lower runs first
        order: i32,
    },
    /// Run the annotated routine once per property
    OnEachProperty {
        /// Order key, lower runs first
        order: i32,
    },
    /// Run the annotated routine once per method
    OnEachMethod {
        /// Order key, lower runs first
        order: i32,
    },
    /// Run the annotated routine once per run, without a symbol
    Once {
        /// Order key, lower runs first
        order: i32,
    },
    /// Keep validators declared by any of these kinds away from the annotated symbol.
    /// On a type, this also applies to all of its members.
    Exclude(Vec<AnnotationKind>),
    /// Remove the annotated unit, type or member from the catalog entirely
    DoNotInspect,
    /// An annotation from the host vocabulary
    Custom {
        /// The annotation kind
        kind: AnnotationKind,
        /// Positional arguments, already rendered to text
        args: Vec<String>,
    },
}

impl Annotation {
    /// A custom annotation without arguments
    pub fn custom(kind: impl Into<AnnotationKind>) -> Self {
        Annotation::Custom {
            kind: kind.into(),
            args: Vec::new(),
        }
    }

    /// A custom annotation with positional arguments
    pub fn custom_with<I, S>(kind: impl Into<AnnotationKind>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Annotation::Custom {
            kind: kind.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// An `Exclude` annotation for the given kinds
    pub fn exclude<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AnnotationKind>,
    {
        Annotation::Exclude(kinds.into_iter().map(Into::into).collect())
    }

    /// The validator category and order key, if this is a registration annotation.
    #[must_use]
    pub fn registration(&self) -> Option<(Category, i32)> {
        match *self {
            Annotation::OnEachType { filter, order } => Some((Category::EachType(filter), order)),
            Annotation::OnEachMember { order } => Some((Category::EachMember, order)),
            Annotation::OnEachField { filter, order } => {
                Some((Category::EachField(filter), order))
            }
            Annotation::OnEachProperty { order } => Some((Category::EachProperty, order)),
            Annotation::OnEachMethod { order } => Some((Category::EachMethod, order)),
            Annotation::Once { order } => Some((Category::Once, order)),
            Annotation::Exclude(_) | Annotation::DoNotInspect | Annotation::Custom { .. } => None,
        }
    }

    /// The kind of a custom annotation, `None` for the built-in vocabulary
    #[must_use]
    pub fn custom_kind(&self) -> Option<&AnnotationKind> {
        match self {
            Annotation::Custom { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Returns `true` if any annotation in the list is `DoNotInspect`
pub(crate) fn is_do_not_inspect(annotations: &[Annotation]) -> bool {
    annotations
        .iter()
        .any(|annotation| matches!(annotation, Annotation::DoNotInspect))
}
