// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! # symcheck
//!
//! A declarative, concurrent verification engine for compiled type metadata.
//!
//! `symcheck` scans every type definition a host hands it, discovers validator routines
//! that were registered against categories of symbols (types, members, fields, properties,
//! methods), and runs those validators over every matching symbol. Violations of the
//! host's annotation vocabulary are reported as non-fatal diagnostics; nothing a single
//! validator does can abort a run.
//!
//! ## Features
//!
//! - **Parallel scanning** - One partition per compilation unit, scanned on a dedicated worker pool
//! - **Deterministic merge** - Partitions fold into one catalog in unit order, pre-sized in a counting pass
//! - **Ordered dispatch** - Validators run in ascending order-key phases, categories in parallel within a phase
//! - **Typed registration** - Callback shapes are checked when a routine is bound, never at call time
//! - **Cooperative cancellation** - A single token is polled per type, per partition and per symbol
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use symcheck::prelude::*;
//!
//! let unit = Module::new("Game.Scripts")
//!     .with_type(
//!         TypeDefinition::class("Game", "Player")
//!             .with_field(FieldDefinition::new("health", "float").serializable(true))
//!             .with_field(FieldDefinition::new("cache", "object")),
//!     )
//!     .into_unit();
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::everything());
//! pipeline.register(Registration::new(
//!     "Game.Required",
//!     "required-fields",
//!     Validator::each_field(FieldFilter::NonSerializable, |field, reporter| {
//!         reporter.violation(field.clone(), format!("'{}' is never saved", field.name));
//!         Ok(())
//!     }),
//! ));
//!
//! let log = DiagnosticLog::new();
//! let report = pipeline.run(&[unit], &log, &CancellationToken::new())?;
//!
//! assert_eq!(report.outcome, RunOutcome::Completed);
//! assert_eq!(log.len(), 1);
//! # Ok::<(), symcheck::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`corpus`] - The input model: compilation units, type and member definitions, annotations
//! - [`catalog`] - Scanned symbols, classified into the buckets validators register against
//! - [`registry`] - Validator callbacks, their categories and the order-keyed registration table
//! - [`diagnostics`] - The append-only report channel
//! - [`pipeline`] - Scanner, merger, dispatcher, configuration and cancellation
//!
//! ### Pipeline Phases
//!
//! ```text
//! units --(parallel scan)--> partitions --(sequential merge)--> catalog + registry
//!       --(order key 0, lanes in parallel)--> --(order key 1)--> ... --> diagnostics
//! ```
//!
//! Registrations are either discovered from static routines that carry a registration
//! annotation (see [`corpus::Annotation`]) or added up front through
//! [`Pipeline::register`]. Both end up in the same per-run registry.
//!
//! ## Error Handling
//!
//! Runs only fail when they cannot start (for example when the worker pool cannot be
//! built). Everything else becomes a [`diagnostics::Diagnostic`]:
//!
//! - Registration shape mismatches - [`diagnostics::DiagnosticKind::InvalidRegistration`]
//! - Validators returning errors or panicking - [`diagnostics::DiagnosticKind::ValidatorFailure`]
//! - Violations reported by validators - [`diagnostics::DiagnosticKind::Violation`]
//!
//! Malformed metadata is logged through the [`log`] facade and skipped.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use symcheck::prelude::*;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.mode, ScanMode::ProjectOnly);
/// ```
pub mod prelude;

/// The input model the scanner walks.
///
/// Compilation units are owned by the host. The engine only reads them through the
/// [`corpus::CompilationUnit`] trait; [`corpus::Module`] is an in-memory implementation
/// for hosts that already hold their metadata as plain data.
pub mod corpus;

/// Scanned symbols and the catalog that buckets them.
pub mod catalog;

/// Validator callbacks and the order-keyed registration table.
pub mod registry;

/// Diagnostics sinks and the reporter handed to validators.
pub mod diagnostics;

/// Scan, merge and dispatch.
///
/// # Key Types
///
/// - [`pipeline::Pipeline`] - Entry point, owns the configuration and explicit registrations
/// - [`pipeline::PipelineConfig`] - Scan mode gate and worker settings
/// - [`pipeline::CancellationToken`] - Cooperative cancellation shared by all phases
/// - [`pipeline::RunReport`] - What a run did
pub mod pipeline;

/// `symcheck` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// Validator callbacks return this type as well.
pub type Result<T> = std::result::Result<T, Error>;

/// `symcheck` Error type
///
/// Most failures inside a run are turned into diagnostics rather than surfaced as errors.
pub use error::Error;

pub use pipeline::{
    CancellationToken, Pipeline, PipelineConfig, PipelineHandle, RunOutcome, RunReport, ScanMode,
};
