//! Accumulates per-file hit counts from an arbitrary trace stream.

use alloy_primitives::map::FxHashMap;
use tracing::{debug, trace};

use crate::{
    bytecode::PcIndex,
    locator::CoverageLocation,
    range::SourceRange,
};

/// A tally of ignorable events skipped during aggregation, off by default:
/// [`HitAggregator::new`] only populates this when `diagnostics` is
/// requested.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipReasons {
    /// Trace event referenced a bytecode fingerprint not in the contract
    /// index.
    pub unknown_contract: u64,
    /// Trace event's pc was not the first byte of an instruction.
    pub misaligned_pc: u64,
    /// The resolved source range was null (no file, or zero length).
    pub null_range: u64,
    /// No coverage location had a range exactly equal to the resolved one.
    pub no_matching_location: u64,
}

/// Everything needed to resolve one contract's trace events into coverage
/// location hits: its pc index, its per-operation source ranges, and which
/// source file each range belongs to.
pub struct ContractCoverage {
    pub pc_index: PcIndex,
    pub operation_map: Vec<SourceRange>,
}

/// Accumulates hit counts, per source file, across arbitrarily many traces.
///
/// Aggregation is additive and commutative: the order traces (or events
/// within a trace) are processed in does not affect the final counts.
#[derive(Debug, Default)]
pub struct HitAggregator {
    diagnostics: bool,
    skipped: SkipReasons,
}

impl HitAggregator {
    /// Creates an aggregator. When `diagnostics` is true, ignorable events
    /// are tallied into [`SkipReasons`] instead of being silently dropped.
    pub fn new(diagnostics: bool) -> Self {
        Self { diagnostics, skipped: SkipReasons::default() }
    }

    /// The accumulated diagnostic counter, if this aggregator was built with
    /// `diagnostics: true`.
    pub fn skip_reasons(&self) -> Option<SkipReasons> {
        self.diagnostics.then_some(self.skipped)
    }

    /// Processes a single trace event `(contract, pc)` against the coverage
    /// locations for the file `contract`'s resolved range belongs to,
    /// incrementing `hits` for the unique matching location.
    ///
    /// `locations_by_file` holds every source file's coverage locations;
    /// this is the whole report's location map, not a single file's.
    /// Unknown contracts, misaligned pcs, and null source ranges are
    /// discarded rather than treated as errors.
    pub fn record(
        &mut self,
        contract: Option<&ContractCoverage>,
        pc: u32,
        locations_by_file: &mut std::collections::BTreeMap<String, Vec<CoverageLocation>>,
    ) {
        let Some(contract) = contract else {
            self.skipped.unknown_contract += 1;
            trace!(pc, "discarding event: unknown contract fingerprint");
            return;
        };

        let Some(&op_index) = contract.pc_index.get(&pc) else {
            self.skipped.misaligned_pc += 1;
            trace!(pc, "discarding event: pc not aligned to an instruction boundary");
            return;
        };

        let Some(range) = contract.operation_map.get(op_index as usize) else {
            self.skipped.misaligned_pc += 1;
            trace!(pc, op_index, "discarding event: operation index out of range");
            return;
        };

        if range.is_null() {
            self.skipped.null_range += 1;
            trace!(pc, op_index, "discarding event: null source range");
            return;
        }

        // `is_null` already ruled out `source_file: None`.
        let file = range.source_file.as_ref().expect("non-null range has a source file");
        let Some(locations) = locations_by_file.get_mut(file.as_ref()) else {
            self.skipped.no_matching_location += 1;
            debug!(pc, op_index, file = %file, "discarding event: unknown source file");
            return;
        };

        match locations.iter_mut().find(|loc| &loc.coverage_range == range) {
            Some(loc) => loc.hits += 1,
            None => {
                self.skipped.no_matching_location += 1;
                debug!(
                    pc,
                    op_index,
                    offset = range.byte_offset,
                    length = range.byte_length,
                    "discarding event: no coverage location has this exact range \
                     (source-map detail finer than AST-derived locations)"
                );
            }
        }
    }

    /// Merges another aggregator's diagnostic counters into this one.
    /// Useful when trace processing is parallelized and partial counters are
    /// reduced at the end.
    pub fn merge(&mut self, other: &Self) {
        self.skipped.unknown_contract += other.skipped.unknown_contract;
        self.skipped.misaligned_pc += other.skipped.misaligned_pc;
        self.skipped.null_range += other.skipped.null_range;
        self.skipped.no_matching_location += other.skipped.no_matching_location;
    }
}

/// Looks up a [`ContractCoverage`] by its zeroed-metadata bytecode
/// fingerprint. Built once per compilation; see [`crate::report::ContractIndex`].
pub type ContractsByFingerprint = FxHashMap<String, ContractCoverage>;
