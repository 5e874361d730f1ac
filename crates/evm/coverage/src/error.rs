//! Fatal error taxonomy for a single coverage report run.
//!
//! Every variant here corresponds to a condition the core cannot recover
//! from: the pipeline unwinds and the run produces no partial report.
//! Ignorable conditions (unknown contract, misaligned pc, null ranges) are
//! *not* represented here — they are logged and skipped, see
//! [`crate::aggregator::HitAggregator`].

/// Errors fatal to an in-progress coverage report.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// Runtime bytecode did not start with `0x`.
    #[error("bytecode must start with `0x`")]
    BadBytecodePrefix,

    /// The bytecode hex string had an odd number of hex digits.
    #[error("bytecode has an odd number of hex digits")]
    MalformedBytecode,

    /// The compiler metadata marker was found but not followed by the
    /// expected `0029` CBOR-length trailer.
    #[error("bytecode metadata marker found but trailer is malformed")]
    MalformedMetadata,

    /// A source map element referenced a source file index that could not
    /// be resolved, or contained a non-integer, non-`-1` field.
    #[error("invalid source map: {0}")]
    InvalidSourceMap(String),

    /// A candidate range crossed the boundary of an existing sibling during
    /// [`crate::tree::CoverageTree`] insertion. This can only happen with
    /// corrupt input, since a valid language grammar never produces crossing
    /// constructs.
    #[error("range {new:?} partially overlaps existing range {existing:?}")]
    PartialOverlap {
        /// The range being inserted.
        new: crate::range::SourceRange,
        /// The existing range it crosses.
        existing: crate::range::SourceRange,
    },

    /// A candidate range shared no interior point with the tree's root and
    /// so cannot be placed anywhere in it.
    #[error("range {0:?} is disjoint from the coverage tree root")]
    DisjointInsertion(crate::range::SourceRange),

    /// The compiler's JSON AST document could not be deserialized.
    #[error("failed to parse compiler AST: {0}")]
    InvalidAstJson(#[from] serde_json::Error),

    /// An AST node's `"src"` field was not a well-formed `offset:length:fileIndex` triple.
    #[error("malformed AST src field: {0}")]
    MalformedAstSrc(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoverageError>;
