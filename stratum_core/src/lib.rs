// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode composition core.
//!
//! `stratum_core` maintains an owner-side tree of visual nodes, records
//! drawing commands against those nodes, synchronizes that state to a
//! rendering consumer over a channel of typed commands, and answers bounds
//! and hit-testing queries against the recorded content.
//!
//! # Architecture
//!
//! ```text
//!   property setters / tree mutations
//!        │  (dirty flags: logical + per-channel realization)
//!        ▼
//!   CompositionTarget::render()
//!        ├─ Precompute  — clear logical flags, refresh cached bounds
//!        ├─ Compile     — per-channel walk of realization flags,
//!        │                emit create/update/release commands
//!        └─ Commit      — flush the channel batch (FIFO)
//!                              │
//!                              ▼
//!                     ChannelConsumer (renderer)
//! ```
//!
//! Bounds and hit-test queries replay the same recorded content through
//! walkers and never touch a channel.
//!
//! **[`composition`]** — The owner-side facade: visual tree, channels, and
//! the resource table behind the composition lock. Thread-affine; foreign
//! threads are rejected at the API boundary.
//!
//! **[`visual`]** — Struct-of-arrays visual storage with generational
//! handles and the two-domain dirty protocol (logical subtree bit,
//! per-channel realization bitsets).
//!
//! **[`drawing`]** — Drawing-context recording into immutable, replayable
//! content.
//!
//! **[`walker`]** — Visitor replay over recorded content: forwarding,
//! bounds accumulation, point and geometry hit-testing.
//!
//! **[`resource`]** — Logical resources with per-channel (handle, refcount)
//! records; realization is recursive over contained resources.
//!
//! **[`channel`]** — Ordered command sinks, synchronous or queued, feeding a
//! [`ChannelConsumer`].
//!
//! **[`target`]** — The per-frame render entry point.
//!
//! **[`trace`]** — No-op-by-default trace sink for pipeline events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod channel;
pub mod composition;
pub mod drawing;
pub mod error;
pub mod resource;
pub mod target;
pub mod trace;
pub mod visual;
pub mod walker;

mod compile;
mod geometry;

pub use channel::{ChannelConsumer, ChannelMode, RenderChannel};
pub use composition::{Composition, GeometryHit};
pub use drawing::{Drawing, DrawingContent, DrawingContext, DrawingRecorder, Pen};
pub use error::{CompositionError, Result, TransportError};
pub use geometry::IntersectionDetail;
pub use resource::ResourceId;
pub use target::CompositionTarget;
pub use visual::VisualId;
