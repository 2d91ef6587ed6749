// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logical resource identity.

use core::fmt;

/// A handle to a logical resource in the [`ResourceArena`](super::ResourceArena).
///
/// Logical resources (brushes, images, media, drawings) exist once on the
/// owner side regardless of how many channels they are realized on. The
/// handle carries a generation counter so stale handles are detected after a
/// resource is unregistered and its slot reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ResourceId {
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

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}@gen{})", self.idx, self.generation)
    }
}
