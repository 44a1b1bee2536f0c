//! Placeholder lookup tables for layouts and masters.

use std::collections::HashMap;

use crate::model::{Shape, ShapeTree, TreeNode};

/// Positions of shapes in a shape tree, keyed by id, placeholder index and
/// placeholder type. Built once per layout or master.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderIndex {
    by_id: HashMap<String, usize>,
    by_idx: HashMap<String, usize>,
    by_type: HashMap<String, usize>,
}

impl PlaceholderIndex {
    /// Index the direct shape children of a tree.
    ///
    /// A shape lands in zero to three maps depending on which of id, idx and
    /// type it declares. Later shapes replace earlier ones with the same key.
    pub fn index(tree: &ShapeTree) -> Self {
        let mut index = Self::default();

        for (pos, node) in tree.nodes.iter().enumerate() {
            let TreeNode::Shape(shape) = node else {
                continue;
            };
            if shape.connector {
                continue;
            }

            if let Some(id) = &shape.nv.id {
                index.by_id.insert(id.clone(), pos);
            }
            if let Some(ph) = shape.placeholder() {
                if let Some(idx) = &ph.idx {
                    index.by_idx.insert(idx.clone(), pos);
                }
                if let Some(kind) = &ph.kind {
                    index.by_type.insert(kind.clone(), pos);
                }
            }
        }

        index
    }

    pub fn id_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn idx_count(&self) -> usize {
        self.by_idx.len()
    }

    pub fn type_count(&self) -> usize {
        self.by_type.len()
    }

    pub fn by_id<'t>(&self, tree: &'t ShapeTree, id: &str) -> Option<&'t Shape> {
        self.by_id.get(id).and_then(|&pos| shape_at(tree, pos))
    }

    pub fn by_idx<'t>(&self, tree: &'t ShapeTree, idx: &str) -> Option<&'t Shape> {
        self.by_idx.get(idx).and_then(|&pos| shape_at(tree, pos))
    }

    pub fn by_type<'t>(&self, tree: &'t ShapeTree, kind: &str) -> Option<&'t Shape> {
        self.by_type.get(kind).and_then(|&pos| shape_at(tree, pos))
    }

    /// Find the ancestor shape for a slide placeholder.
    ///
    /// A declared type is matched by type; otherwise a declared index is
    /// matched by index.
    pub fn lookup<'t>(
        &self,
        tree: &'t ShapeTree,
        kind: Option<&str>,
        idx: Option<&str>,
    ) -> Option<&'t Shape> {
        match (kind, idx) {
            (Some(kind), _) => self.by_type(tree, kind),
            (None, Some(idx)) => self.by_idx(tree, idx),
            (None, None) => None,
        }
    }
}

fn shape_at(tree: &ShapeTree, pos: usize) -> Option<&Shape> {
    match tree.nodes.get(pos) {
        Some(TreeNode::Shape(shape)) => Some(shape),
        _ => None,
    }
}
