//! Partition merger
//!
//! Folds the partitions of a scan into the catalog and registry of the run. The fold is
//! sequential and follows partition order, which makes the merged bucket order independent
//! of how the scan was scheduled. Explicit registrations form a leading pseudo-partition, so
//! they precede discovered validators at the same category and order. A cancelled merge
//! yields no catalog.

use crate::{
    catalog::{Catalog, CatalogStatistics},
    pipeline::{scanner::ScanPartition, PipelineContext},
    registry::Registry,
    Error, Result,
};

/// Merges partitions into one catalog and registry.
///
/// The first pass sums bucket sizes so the second can append into buckets that never
/// reallocate. Cancellation is polled before each partition of the second pass.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if the token was cancelled; nothing is merged then.
pub(crate) fn merge(
    context: &PipelineContext<'_>,
    explicit: Registry,
    partitions: Vec<ScanPartition>,
) -> Result<(Catalog, Registry)> {
    let mut statistics = CatalogStatistics::default();
    for partition in &partitions {
        statistics.add(&partition.catalog.statistics());
    }

    let mut catalog = Catalog::with_capacity(&statistics);
    let mut registry = explicit;

    for partition in partitions {
        if context.is_cancelled() {
            log::debug!("Merge cancelled before unit '{}'", partition.unit);
            return Err(Error::Cancelled);
        }

        catalog.extend(partition.catalog);
        registry.append(partition.registry);
    }

    context
        .observer()
        .merged(&catalog.statistics(), registry.len());

    Ok((catalog, registry))
}
