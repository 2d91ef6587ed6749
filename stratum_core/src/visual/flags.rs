// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel realization dirty bits.
//!
//! Each realized visual carries one bit per property category on each
//! channel it is realized on. A property setter marks only its own bit (on
//! every channel holding the visual); the compile pass for a channel reads
//! exactly the bits set for that channel, emits the matching update
//! commands, and clears them. [`RealizationFlags::SUBTREE`] is the
//! walk-gating bit: it is raised up the ancestor proxies of the same channel
//! with the usual early-stopping upward propagation, and never set by
//! anything else.

use bitflags::bitflags;

bitflags! {
    /// Dirty bits for one visual on one channel.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RealizationFlags: u16 {
        /// Offset in the parent's space changed.
        const OFFSET = 1 << 0;
        /// Transform changed.
        const TRANSFORM = 1 << 1;
        /// Clip geometry changed.
        const CLIP = 1 << 2;
        /// Opacity changed.
        const OPACITY = 1 << 3;
        /// Opacity mask changed.
        const OPACITY_MASK = 1 << 4;
        /// Drawing content changed.
        const CONTENT = 1 << 5;
        /// Bitmap scaling mode changed.
        const SCALING_MODE = 1 << 6;
        /// Effect changed.
        const EFFECT = 1 << 7;
        /// Cache mode changed.
        const CACHE_MODE = 1 << 8;
        /// Guideline set changed.
        const GUIDELINES = 1 << 9;
        /// ClearType hint changed.
        const CLEARTYPE_HINT = 1 << 10;
        /// Text rendering mode changed.
        const TEXT_RENDERING = 1 << 11;
        /// Text hinting mode changed.
        const TEXT_HINTING = 1 << 12;
        /// Child list or z-order changed.
        const CHILDREN = 1 << 13;
        /// Something below this visual needs the compile walk to descend.
        const SUBTREE = 1 << 14;
    }
}

impl RealizationFlags {
    /// Every property category (everything except [`Self::SUBTREE`]).
    pub const PROPERTIES: Self = Self::SUBTREE.complement();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_exclude_subtree() {
        assert!(!RealizationFlags::PROPERTIES.contains(RealizationFlags::SUBTREE));
        assert!(RealizationFlags::PROPERTIES.contains(RealizationFlags::CHILDREN));
        assert!(RealizationFlags::PROPERTIES.contains(RealizationFlags::OFFSET));
    }
}
