// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, VisualId};
use super::store::VisualTree;

/// An iterator over the direct children of a visual, in z-order
/// (back to front).
///
/// Created by [`Composition::children`](crate::Composition::children).
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a VisualTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(VisualId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}
