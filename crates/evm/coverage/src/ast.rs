//! Reconstructs a tree of [`SourceRange`]-keyed nodes from the compiler's
//! JSON AST, preserving child order.

use std::sync::Arc;

use crate::{
    artifacts::JsonAstNode,
    error::{CoverageError, Result},
    range::SourceRange,
};

/// A node of the compiler's abstract syntax tree, reduced to its byte range
/// and children.
///
/// The AST as delivered by the compiler already satisfies the containment
/// invariant (siblings pairwise disjoint, every child contained in its
/// parent); [`AstBuilder`] does not re-validate it. [`crate::tree::CoverageTree`]
/// is the path that validates observed ranges instead of trusting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub id: u64,
    pub range: SourceRange,
    pub children: Vec<AstNode>,
}

impl AstNode {
    /// True iff this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Builds [`AstNode`] trees from the compiler's [`JsonAstNode`] documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstBuilder;

impl AstBuilder {
    /// Parses a single `"src"` field of the form `offset:length:fileIndex`.
    fn parse_src(src: &str, source_list: &[Arc<str>]) -> Result<SourceRange> {
        let mut parts = src.split(':');
        let offset = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CoverageError::MalformedAstSrc(format!("malformed src: {src:?}")))?;
        let length = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CoverageError::MalformedAstSrc(format!("malformed src: {src:?}")))?;
        let file_index: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CoverageError::MalformedAstSrc(format!("malformed src: {src:?}")))?;

        let source_file = if file_index == -1 {
            None
        } else {
            let idx = usize::try_from(file_index)
                .map_err(|_| CoverageError::MalformedAstSrc(format!("bad file index: {src:?}")))?;
            Some(
                source_list
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| CoverageError::MalformedAstSrc(format!("file index {idx} out of range")))?,
            )
        };

        Ok(SourceRange::new(offset, length, source_file))
    }

    /// Recursively converts a [`JsonAstNode`] into an [`AstNode`] tree.
    pub fn build(node: &JsonAstNode, source_list: &[Arc<str>]) -> Result<AstNode> {
        let range = Self::parse_src(&node.src, source_list)?;
        let children = node
            .children
            .iter()
            .map(|child| Self::build(child, source_list))
            .collect::<Result<Vec<_>>>()?;
        Ok(AstNode { id: node.id, range, children })
    }
}
