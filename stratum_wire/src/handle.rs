// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Channel identity and channel-scoped resource handles.

use alloc::vec::Vec;
use core::fmt;

/// Identifies one render channel.
///
/// The composition assigns channel ids; consumers treat them as opaque.
/// Handles are scoped to the channel that issued them — using a handle on a
/// different channel is a protocol violation the consumer is free to reject.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChannelId(pub u32);

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

/// An opaque, channel-scoped identifier for a realized resource.
///
/// The zero value is the *null handle*: a documented "omit this reference"
/// value used wherever a composed resource is optional (a null brush or pen),
/// never an error signal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceHandle(u32);

impl ResourceHandle {
    /// The null handle: "omit this reference".
    pub const NULL: Self = Self(0);

    /// Returns whether this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw slot value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ResourceHandle(NULL)")
        } else {
            write!(f, "ResourceHandle({})", self.0)
        }
    }
}

/// Allocates handles for one channel from a free list.
///
/// Released slots are recycled. Slot zero is reserved for
/// [`ResourceHandle::NULL`] and never handed out.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: u32,
    free: Vec<u32>,
}

impl HandleAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 0,
            free: Vec::new(),
        }
    }

    /// Allocates a fresh (or recycled) non-null handle.
    pub fn alloc(&mut self) -> ResourceHandle {
        if let Some(slot) = self.free.pop() {
            ResourceHandle(slot)
        } else {
            self.next += 1;
            ResourceHandle(self.next)
        }
    }

    /// Returns a handle's slot to the free list.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is the null handle.
    pub fn release(&mut self, handle: ResourceHandle) {
        assert!(!handle.is_null(), "cannot release the null handle");
        self.free.push(handle.0);
    }

    /// Number of live handles.
    #[must_use]
    pub fn live(&self) -> u32 {
        self.next - self.free.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_null() {
        assert!(ResourceHandle::NULL.is_null());
        assert_eq!(ResourceHandle::NULL.raw(), 0);
    }

    #[test]
    fn alloc_skips_null_slot() {
        let mut a = HandleAllocator::new();
        let h = a.alloc();
        assert!(!h.is_null());
        assert_eq!(h.raw(), 1);
    }

    #[test]
    fn released_slots_are_recycled() {
        let mut a = HandleAllocator::new();
        let h1 = a.alloc();
        let h2 = a.alloc();
        assert_ne!(h1, h2);
        a.release(h1);
        let h3 = a.alloc();
        assert_eq!(h3, h1);
        assert_eq!(a.live(), 2);
    }

    #[test]
    #[should_panic(expected = "cannot release the null handle")]
    fn releasing_null_panics() {
        let mut a = HandleAllocator::new();
        a.release(ResourceHandle::NULL);
    }
}
