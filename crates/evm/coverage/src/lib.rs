//! Line- and range-level execution coverage for programs compiled to a
//! byte-addressed stack machine (EVM-family bytecode) from a higher-level
//! source language (Solidity-family).
//!
//! Given compiler output providing per-instruction source-map entries,
//! per-contract runtime bytecode, and an AST keyed by byte ranges in the
//! original sources, together with a VM execution trace enumerating program
//! counters visited during a test run, this crate attributes each visited
//! instruction back to the smallest syntactic construct that contains it,
//! aggregates hit counts per construct, and hands back a flat,
//! hit-countable set of byte ranges per source file.
//!
//! This crate is the algorithmic core only. It does not fetch traces over
//! JSON-RPC, does not invoke the compiler, does not run a test command, and
//! does not render a report — those are external collaborators (see
//! [`artifacts`] for the JSON shapes they're expected to hand over).
//!
//! The pipeline, leaves first:
//!
//! - [`range::SourceRange`] — a half-open byte interval with the
//!   containment/disjoint/partial-overlap predicate trio.
//! - [`bytecode::BytecodeScanner`] — pc-to-operation-index mapping and
//!   metadata-tail stripping.
//! - [`sourcemap::SourceMapCodec`] — decompresses the compiler's source map.
//! - [`ast::AstBuilder`] — builds a range-keyed tree from the compiler AST.
//! - [`tree::CoverageTree`] — builds the same shape of tree from *observed*
//!   ranges, validating containment instead of trusting it.
//! - [`locator::CoverageLocator`] — turns an AST into flat, hit-countable
//!   [`locator::CoverageLocation`]s.
//! - [`aggregator::HitAggregator`] — folds trace events into hit counts.
//! - [`report::CoverageReport`] / [`report::ContractIndex`] — the driver
//!   that wires the above into a runnable report.

pub mod aggregator;
pub mod artifacts;
pub mod ast;
pub mod bytecode;
pub mod error;
pub mod locator;
pub mod range;
pub mod report;
pub mod sourcemap;
pub mod tree;

pub use aggregator::{ContractCoverage, HitAggregator, SkipReasons};
pub use ast::{AstBuilder, AstNode};
pub use bytecode::{BytecodeScanner, PcIndex};
pub use error::{CoverageError, Result};
pub use locator::{CoverageLocation, CoverageLocator};
pub use range::{Jump, SourceRange};
pub use report::{ContractIndex, CoverageOptions, CoverageReport};
pub use sourcemap::SourceMapCodec;
pub use tree::{CoverageTree, TreeNode};
