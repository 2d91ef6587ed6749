// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual identity.

use core::fmt;

/// Sentinel value indicating "no visual" in topology index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// A handle to a visual in the composition's tree.
///
/// Contains both a slot index and a generation counter so that stale handles
/// are detected after a visual is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl VisualId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({}@gen{})", self.idx, self.generation)
    }
}
