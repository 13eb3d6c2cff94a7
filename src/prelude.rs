//! # symcheck Prelude
//!
//! Re-exports the types needed to describe a corpus, register validators and run a
//! pipeline. Import everything with:
//!
//! ```rust
//! use symcheck::prelude::*;
//! ```

// Core
pub use crate::{Error, Result};

// Pipeline
pub use crate::pipeline::{
    CancellationToken, NoopObserver, Pipeline, PipelineConfig, PipelineHandle, PipelineObserver,
    RunOutcome, RunReport, ScanMode,
};

// Corpus
pub use crate::corpus::{
    Annotation, AnnotationKind, CompilationUnit, FieldDefinition, MemberDefinition,
    MethodDefinition, MethodModifiers, Module, PropertyDefinition, Record, TypeDefinition,
    UnitOrigin,
};

// Catalog
pub use crate::catalog::{
    Catalog, CatalogStatistics, FieldSymbol, FieldSymbolRc, MemberSymbol, MethodSymbol,
    MethodSymbolRc, PropertySymbol, PropertySymbolRc, SkipSet, Symbol, SymbolRef, TypeSymbol,
    TypeSymbolRc,
};

// Registry
pub use crate::registry::{
    Category, FieldFilter, Registration, Registry, Routine, Shape, TypeFilter, Validator,
};

// Diagnostics
pub use crate::diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticLog, DiagnosticSink, LogSink, Reporter,
};
