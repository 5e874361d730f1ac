//! Builds a tree of observed source ranges from a set of per-operation
//! ranges, when no (or an untrusted) AST is available.
//!
//! Unlike [`crate::ast::AstBuilder`], which trusts the compiler's AST to
//! already satisfy the containment invariant, insertion here actively
//! enforces it and fails loudly on corrupt input.

use crate::{
    error::{CoverageError, Result},
    range::SourceRange,
};

/// A node of a tree built by repeated, containment-based insertion of
/// observed ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub range: SourceRange,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(range: SourceRange) -> Self {
        Self { range, children: Vec::new() }
    }
}

/// A tree of observed [`SourceRange`]s for a single source file, rooted at
/// `[0, file_size)`.
#[derive(Debug, Clone)]
pub struct CoverageTree {
    root: TreeNode,
}

impl CoverageTree {
    /// Seeds an empty tree rooted at `[0, file_size)` for `source_file`.
    pub fn new(source_file: std::sync::Arc<str>, file_size: u32) -> Self {
        Self { root: TreeNode::leaf(SourceRange::new(0, file_size, Some(source_file))) }
    }

    /// The tree's root node.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Inserts `range` into the tree:
    ///
    /// 1. Exact match with the root it's being inserted under: no-op.
    /// 2. `range` strictly contains the node's range: the node is rewrapped
    ///    as a child of a new node keyed by `range`.
    /// 3. The node's range strictly contains `range`: recurse into the
    ///    single containing child, or collect every child `range` contains
    ///    into a new intermediate node.
    /// 4. Otherwise: fails with `DisjointInsertion` (only valid at the
    ///    root; a clean crossing deeper in the tree is `PartialOverlap`).
    pub fn insert(&mut self, range: SourceRange) -> Result<()> {
        if range == self.root.range {
            return Ok(());
        }
        if range.contains(&self.root.range) {
            let old_root = std::mem::replace(&mut self.root, TreeNode::leaf(range.clone()));
            self.root.children.push(old_root);
            return Ok(());
        }
        if self.root.range.contains(&range) {
            Self::insert_into(&mut self.root, range)?;
            return Ok(());
        }
        Err(CoverageError::DisjointInsertion(range))
    }

    /// Inserts `range` (already known to be contained in `node.range`) into
    /// `node`'s subtree.
    fn insert_into(node: &mut TreeNode, range: SourceRange) -> Result<()> {
        if range == node.range {
            return Ok(());
        }

        // A child that itself contains `range`: recurse into it. Siblings
        // are pairwise disjoint, so at most one child can contain `range`.
        let container = node.children.iter().position(|c| c.range.contains(&range));
        if let Some(idx) = container {
            return Self::insert_into(&mut node.children[idx], range);
        }

        // Otherwise, every child `range` itself contains gets absorbed under
        // a new intermediate node keyed by `range`.
        let absorbed_indices: Vec<usize> = node
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| range.contains(&c.range))
            .map(|(i, _)| i)
            .collect();

        for (i, child) in node.children.iter().enumerate() {
            if !absorbed_indices.contains(&i) && child.range.partially_overlaps(&range) {
                return Err(CoverageError::PartialOverlap {
                    new: range,
                    existing: child.range.clone(),
                });
            }
        }

        if absorbed_indices.is_empty() {
            let insert_at = node
                .children
                .iter()
                .position(|c| c.range.byte_offset > range.byte_offset)
                .unwrap_or(node.children.len());
            node.children.insert(insert_at, TreeNode::leaf(range));
            return Ok(());
        }

        let insert_at = absorbed_indices[0];
        let mut absorbed = Vec::with_capacity(absorbed_indices.len());
        for &idx in absorbed_indices.iter().rev() {
            absorbed.push(node.children.remove(idx));
        }
        absorbed.reverse();
        node.children.insert(insert_at, TreeNode { range, children: absorbed });
        Ok(())
    }
}
