// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-stream protocol for the stratum composition core.
//!
//! `stratum_wire` defines the typed records that cross the only concurrency
//! boundary in the system: the render channel between the owner-side visual
//! tree and the rendering consumer. Nothing else crosses that boundary — no
//! shared mutable state, no callbacks — so this crate is the complete
//! vocabulary the consumer ever sees.
//!
//! ```text
//!   stratum_core (owner side)
//!        │  Command / CommandBatch
//!        ▼
//!   ChannelConsumer (renderer side)
//! ```
//!
//! **[`handle`]** — Channel identity and channel-scoped resource handles.
//! Handles are opaque slot indices allocated per channel; the null handle is
//! a documented value meaning "omit this reference", never an error.
//!
//! **[`command`]** — The command records: resource lifecycle
//! (create/update/release), visual property updates, children z-order sync,
//! and target-level directives, plus the content replay ops and marshaled
//! value types they carry.
//!
//! **[`batch`]** — Ordered command batches with FIFO semantics. A batch is
//! applied atomically by the consumer; batches on one channel apply in the
//! order they were committed.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod batch;
pub mod command;
pub mod handle;

pub use batch::CommandBatch;
pub use command::{
    BitmapScalingMode, BrushData, CacheModeData, ClearTypeHint, Color, Command, ContentOp,
    EffectData, Geometry, GlyphRun, GradientStop, GuidelineSet, ImageData, MediaData, PenData,
    ResourceData, ResourceKind, SurfaceKey, TextHintingMode, TextRenderingMode,
};
pub use handle::{ChannelId, HandleAllocator, ResourceHandle};
