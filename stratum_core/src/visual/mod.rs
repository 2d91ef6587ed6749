// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owner-side visual tree.
//!
//! A *visual* is a node in the composed tree. Each visual has:
//!
//! - An identity ([`VisualId`]) — a generational handle that becomes stale
//!   when the visual is destroyed.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   tree. A visual has at most one parent; attaching an already-parented
//!   visual (or a target root) is a configuration error reported before any
//!   mutation.
//! - Fourteen property categories (offset, transform, clip, opacity,
//!   opacity mask, content, bitmap scaling mode, effect, cache mode,
//!   guidelines, ClearType hint, text rendering/hinting modes, children
//!   z-order), each with its own realization dirty bit per channel.
//! - Cached bounds (content and subtree) maintained by the precompute pass.
//!
//! # Dirty tracking
//!
//! Mutations mark two independent domains. The logical subtree-dirty bit
//! propagates upward with an early stop at the first already-dirty ancestor
//! and is cleared by precompute. The per-channel realization bits live on
//! [`proxy::VisualProxy`] records and are consumed (and cleared) by the
//! compile pass of exactly the channel they were set for, so one visual
//! realized on several channels re-syncs per channel independently.

mod flags;
mod id;
mod proxy;
mod store;
mod traverse;

pub use flags::RealizationFlags;
pub use id::VisualId;
pub use traverse::Children;

pub(crate) use id::INVALID;
pub(crate) use proxy::{VisualProxy, find as find_proxy, find_mut as find_proxy_mut};
pub(crate) use store::VisualTree;
