// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logical resources and their per-channel realizations.
//!
//! A logical resource (brush, image, media, drawing) exists once on the
//! owner side and carries a *multi-channel record*: a map from channel to
//! (handle, refcount). The 0→1 transition on a channel *realizes* the
//! resource there — contained resources are recursively add-ref'd and the
//! initial state is pushed as commands; the 1→0 transition releases it and
//! removes the mapping.
//!
//! All mutations of any record happen under the composition lock (the
//! `Mutex` around the [`ResourceArena`] held by the composition), because
//! one logical resource can be reached concurrently from independent call
//! paths. The lock covers whole add-ref/release/update operations including
//! their batch pushes, and is never held across commit/present.

mod arena;
mod id;

pub use id::ResourceId;

pub(crate) use arena::{LogicalData, ResourceArena};
