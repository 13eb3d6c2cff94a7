//! Ordered dispatcher
//!
//! Runs the validators of the merged registry over the merged catalog, one order key at a
//! time in ascending order. Within an order key the seven symbol lanes and the `Once` lane
//! run in parallel on the run's pool; every lane of a key has returned before the next key
//! starts.
//!
//! Inside a lane, symbols are visited in bucket order and, for each symbol, validators in
//! registration order. A validator is skipped for a symbol whose skip set contains the
//! validator's kind. Errors and panics of a single call become `ValidatorFailure`
//! diagnostics and the lane moves on. Cancellation is polled before every call.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    catalog::{Catalog, Symbol, SymbolRef},
    diagnostics::{Diagnostic, DiagnosticKind, Reporter},
    pipeline::PipelineContext,
    registry::{OnceCallback, Registered, Registry},
    Result,
};

/// One parallel lane of an order key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum Lane {
    EnumTypes,
    ObjectTypes,
    Members,
    SerializableFields,
    NonSerializableFields,
    Properties,
    Methods,
    Once,
}

/// Counters of one lane at one order key
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LaneStats {
    pub invocations: usize,
    pub skipped: usize,
    pub failures: usize,
    pub cancelled: bool,
}

/// Counters of a whole dispatch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct DispatchStats {
    /// Order keys that were started, ascending
    pub orders: Vec<i32>,
    pub invocations: usize,
    pub skipped: usize,
    pub failures: usize,
    pub cancelled: bool,
}

impl DispatchStats {
    fn add(&mut self, lane: &LaneStats) {
        self.invocations += lane.invocations;
        self.skipped += lane.skipped;
        self.failures += lane.failures;
        self.cancelled |= lane.cancelled;
    }
}

/// Runs a registry over a catalog.
pub(crate) struct Dispatcher<'a> {
    context: &'a PipelineContext<'a>,
    catalog: &'a Catalog,
    registry: &'a Registry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        context: &'a PipelineContext<'a>,
        catalog: &'a Catalog,
        registry: &'a Registry,
    ) -> Self {
        Dispatcher {
            context,
            catalog,
            registry,
        }
    }

    /// Dispatches every order key, ascending. Stops at the first cancelled key.
    pub fn dispatch(&self) -> DispatchStats {
        let mut stats = DispatchStats::default();

        for order in self.registry.order_keys() {
            if self.context.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            self.context.observer().order_started(order);
            stats.orders.push(order);

            let lanes: Vec<LaneStats> = self.context.thread_pool().install(|| {
                Lane::iter()
                    .collect::<Vec<_>>()
                    .into_par_iter()
                    .map(|lane| self.run_lane(lane, order))
                    .collect()
            });

            for lane in &lanes {
                stats.add(lane);
            }

            log::debug!(
                "Order key {}: {} calls, {} skipped, {} failed",
                order,
                lanes.iter().map(|lane| lane.invocations).sum::<usize>(),
                lanes.iter().map(|lane| lane.skipped).sum::<usize>(),
                lanes.iter().map(|lane| lane.failures).sum::<usize>()
            );

            self.context.observer().order_finished(order);

            if stats.cancelled {
                break;
            }
        }

        stats
    }

    fn run_lane(&self, lane: Lane, order: i32) -> LaneStats {
        let catalog = self.catalog;
        let registry = self.registry;

        match lane {
            Lane::EnumTypes => self.run_symbols(
                catalog.enum_types(),
                registry.enum_types().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::ObjectTypes => self.run_symbols(
                catalog.object_types(),
                registry.object_types().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::Members => self.run_symbols(
                catalog.members(),
                registry.members().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::SerializableFields => self.run_symbols(
                catalog.serializable_fields(),
                registry.serializable_fields().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::NonSerializableFields => self.run_symbols(
                catalog.non_serializable_fields(),
                registry.non_serializable_fields().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::Properties => self.run_symbols(
                catalog.properties(),
                registry.properties().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::Methods => self.run_symbols(
                catalog.methods(),
                registry.methods().at(order),
                |callback, symbol, reporter| callback(symbol, reporter),
            ),
            Lane::Once => self.run_once(registry.once().at(order)),
        }
    }

    fn run_symbols<S, F, C>(
        &self,
        symbols: &[S],
        validators: &[Registered<F>],
        call: C,
    ) -> LaneStats
    where
        S: Symbol + Clone + Into<SymbolRef>,
        C: Fn(&F, &S, &Reporter<'_>) -> Result<()>,
    {
        let mut stats = LaneStats::default();
        if validators.is_empty() {
            return stats;
        }

        for symbol in symbols {
            for validator in validators {
                if self.context.is_cancelled() {
                    stats.cancelled = true;
                    return stats;
                }

                if symbol.skip_set().contains(&validator.kind) {
                    stats.skipped += 1;
                    continue;
                }

                let reporter = Reporter::new(self.context.sink(), &validator.name);
                stats.invocations += 1;

                if let Err(message) = self.invoke(|| call(&validator.callback, symbol, &reporter)) {
                    stats.failures += 1;
                    self.context.report(
                        Diagnostic::new(DiagnosticKind::ValidatorFailure, message)
                            .with_symbol(symbol.clone().into())
                            .with_source(validator.name.clone()),
                    );
                }
            }
        }

        stats
    }

    fn run_once(&self, validators: &[Registered<OnceCallback>]) -> LaneStats {
        let mut stats = LaneStats::default();

        for validator in validators {
            if self.context.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let reporter = Reporter::new(self.context.sink(), &validator.name);
            stats.invocations += 1;

            if let Err(message) = self.invoke(|| (validator.callback)(&reporter)) {
                stats.failures += 1;
                self.context.report(
                    Diagnostic::new(DiagnosticKind::ValidatorFailure, message)
                        .with_source(validator.name.clone()),
                );
            }
        }

        stats
    }

    /// Runs one validator call, turning errors and (optionally) panics into a message
    fn invoke<C>(&self, call: C) -> std::result::Result<(), String>
    where
        C: FnOnce() -> Result<()>,
    {
        if !self.context.config().catch_panics {
            return call().map_err(|error| error.to_string());
        }

        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(error.to_string()),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                Err(format!("Validator panicked: {reason}"))
            }
        }
    }
}
