//! Partitions an AST node's range into the child-subtracted residual
//! regions used for hit-count attribution.

use crate::{ast::AstNode, range::SourceRange};

/// An AST node's byte range together with the sub-ranges of it not covered
/// by any descendant syntactic construct. The unit of hit-count
/// attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageLocation {
    /// The syntactic construct's full range.
    pub coverage_range: SourceRange,
    /// The portions of `coverage_range` not covered by any descendant.
    pub residual_ranges: Vec<SourceRange>,
    /// Accumulated hits, monotonically non-decreasing within a report run.
    pub hits: u64,
}

/// Produces the flat, non-overlapping [`CoverageLocation`] set for an AST.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverageLocator;

impl CoverageLocator {
    /// Walks `node` and every descendant, producing one [`CoverageLocation`]
    /// per node whose residual range is non-empty and either the node is a
    /// leaf or its children didn't fully partition it.
    pub fn locate(node: &AstNode) -> Vec<CoverageLocation> {
        let mut out = Vec::new();
        Self::locate_into(node, &mut out);
        out.sort_by(|a, b| {
            a.coverage_range
                .byte_offset
                .cmp(&b.coverage_range.byte_offset)
                .then(a.coverage_range.byte_length.cmp(&b.coverage_range.byte_length))
        });
        out
    }

    fn locate_into(node: &AstNode, out: &mut Vec<CoverageLocation>) {
        let mut residual = vec![node.range.clone()];

        let mut children: Vec<&AstNode> = node.children.iter().filter(|c| c.range.byte_length > 0).collect();
        children.sort_by(|a, b| {
            a.range.byte_offset.cmp(&b.range.byte_offset).then(a.range.byte_length.cmp(&b.range.byte_length))
        });

        // A child whose range equals its parent's is expected to be the
        // *only* non-empty child, since it fully partitions the parent on
        // its own. Flag it rather than silently mis-attributing hits if a
        // malformed AST ever violates that.
        if children.len() > 1 && children.iter().any(|c| c.range == node.range) {
            tracing::warn!(
                node_id = node.id,
                "AST child shares its parent's exact range alongside other non-empty siblings; \
                 coverage attribution for this node may be unreliable"
            );
        }

        for child in &children {
            if let Some(split_idx) = residual.iter().position(|r| r.contains(&child.range)) {
                let containing = residual.remove(split_idx);
                let left_len = child.range.byte_offset - containing.byte_offset;
                let right_start = child.range.end();
                let right_len = containing.end() - right_start;

                if left_len > 0 {
                    residual.insert(
                        split_idx,
                        SourceRange {
                            byte_offset: containing.byte_offset,
                            byte_length: left_len,
                            source_file: containing.source_file.clone(),
                            jump: None,
                        },
                    );
                }
                if right_len > 0 {
                    let at = if left_len > 0 { split_idx + 1 } else { split_idx };
                    residual.insert(
                        at,
                        SourceRange {
                            byte_offset: right_start,
                            byte_length: right_len,
                            source_file: containing.source_file.clone(),
                            jump: None,
                        },
                    );
                }
            }
            Self::locate_into(child, out);
        }

        let residual_len: u32 = residual.iter().map(|r| r.byte_length).sum();
        let is_leaf = node.is_leaf();
        if !residual.is_empty() && residual_len > 0 && (residual_len < node.range.byte_length || is_leaf) {
            out.push(CoverageLocation { coverage_range: node.range.clone(), residual_ranges: residual, hits: 0 });
        }
    }
}
