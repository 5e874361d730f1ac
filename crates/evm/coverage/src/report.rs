//! The driver that wires the leaf components together: decode compiler
//! output, build coverage locations, then fold trace events into hit
//! counts. Pure in-memory assembly — no I/O, no transport, no rendering.

use std::{collections::BTreeMap, sync::Arc};

use eyre::{Context, Result};
use rayon::prelude::*;

use crate::{
    artifacts::{CompilerOutput, Trace},
    ast::AstBuilder,
    aggregator::{ContractCoverage, ContractsByFingerprint, HitAggregator, SkipReasons},
    bytecode::BytecodeScanner,
    locator::{CoverageLocation, CoverageLocator},
    sourcemap::SourceMapCodec,
};

/// Whether ignorable events should be tallied into a diagnostic counter.
/// Threaded explicitly through the driver, never global.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverageOptions {
    pub diagnostics: bool,
}

/// Maps a contract's zeroed-metadata bytecode fingerprint to its decoded
/// pc index and operation-indexed source ranges. Built once per
/// compilation so that resolving a trace's contract never re-decodes a
/// source map or bytecode string.
pub struct ContractIndex {
    by_fingerprint: ContractsByFingerprint,
}

impl ContractIndex {
    /// Builds the index from a single compiler output document: decodes
    /// every contract's source map and pc index up front.
    pub fn build(output: &CompilerOutput) -> Result<Self> {
        let source_list: Vec<Arc<str>> = output.source_list.iter().map(|s| Arc::from(s.as_str())).collect();

        let mut by_fingerprint = ContractsByFingerprint::default();
        for (name, contract) in &output.contracts {
            if contract.bin_runtime.is_empty() || contract.bin_runtime == "0x" {
                // A zero-instruction contract (interface, abstract contract)
                // is not an error; its coverage map is simply empty.
                continue;
            }

            let fingerprint = BytecodeScanner::zero_metadata(&contract.bin_runtime)
                .with_context(|| format!("zeroing metadata for contract {name}"))?;
            let pc_index = BytecodeScanner::pc_index(&contract.bin_runtime)
                .with_context(|| format!("building pc index for contract {name}"))?;
            let operation_map = SourceMapCodec::decode(&contract.srcmap_runtime, &source_list)
                .with_context(|| format!("decoding source map for contract {name}"))?;

            by_fingerprint.insert(fingerprint, ContractCoverage { pc_index, operation_map });
        }

        Ok(Self { by_fingerprint })
    }

    /// Looks up a contract by a trace's (not-yet-zeroed) runtime bytecode.
    pub fn lookup(&self, trace_code: &str) -> Result<Option<&ContractCoverage>> {
        let fingerprint = BytecodeScanner::zero_metadata(trace_code)
            .context("zeroing metadata for trace bytecode")?;
        Ok(self.by_fingerprint.get(&fingerprint))
    }
}

/// The in-memory result of folding a set of traces into a compiler output's
/// AST-derived coverage locations: a map from source file to its
/// [`CoverageLocation`]s.
#[derive(Debug, Default)]
pub struct CoverageReport {
    pub locations: BTreeMap<String, Vec<CoverageLocation>>,
    skip_reasons: Option<SkipReasons>,
}

impl CoverageReport {
    /// Builds the initial, all-zero-hit location set for every source file
    /// in `output`, from its AST.
    pub fn from_compiler_output(output: &CompilerOutput) -> Result<Self> {
        let source_list: Vec<Arc<str>> = output.source_list.iter().map(|s| Arc::from(s.as_str())).collect();

        let locations = output
            .sources
            .par_iter()
            .map(|(file, source)| -> Result<(String, Vec<CoverageLocation>)> {
                let ast = AstBuilder::build(&source.ast, &source_list)
                    .with_context(|| format!("building AST for {file}"))?;
                Ok((file.clone(), CoverageLocator::locate(&ast)))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { locations, skip_reasons: None })
    }

    /// Folds a single trace's events into this report's coverage locations.
    ///
    /// A contract's source ranges may point into several imported files, so
    /// the aggregator resolves which file's location list an event belongs
    /// to per-event rather than per-trace.
    pub fn record_trace(&mut self, index: &ContractIndex, trace: &Trace, options: CoverageOptions) -> Result<()> {
        let contract = index.lookup(&trace.code)?;
        let mut aggregator = HitAggregator::new(options.diagnostics);

        for op in &trace.ops {
            aggregator.record(contract, op.pc, &mut self.locations);
        }

        if let Some(reasons) = aggregator.skip_reasons() {
            let merged = self.skip_reasons.get_or_insert_with(SkipReasons::default);
            merged.unknown_contract += reasons.unknown_contract;
            merged.misaligned_pc += reasons.misaligned_pc;
            merged.null_range += reasons.null_range;
            merged.no_matching_location += reasons.no_matching_location;
        }

        Ok(())
    }

    /// The accumulated diagnostic counter across every trace folded so far,
    /// if diagnostics were requested for at least one of them.
    pub fn skip_reasons(&self) -> Option<SkipReasons> {
        self.skip_reasons
    }

    /// Flattens this report into a rendering-ready shape: per source file, a
    /// list of `(byte_offset, byte_length, hits)` triples sorted by offset,
    /// with null ranges dropped.
    pub fn flatten(&self) -> BTreeMap<String, Vec<(u32, u32, u64)>> {
        self.locations
            .iter()
            .map(|(file, locs)| {
                let mut triples: Vec<(u32, u32, u64)> = locs
                    .iter()
                    .flat_map(|loc| {
                        loc.residual_ranges
                            .iter()
                            .filter(|r| !r.is_null())
                            .map(|r| (r.byte_offset, r.byte_length, loc.hits))
                    })
                    .collect();
                triples.sort_by_key(|(offset, _, _)| *offset);
                (file.clone(), triples)
            })
            .collect()
    }
}
