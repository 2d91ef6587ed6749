// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owner-side composition facade.
//!
//! A [`Composition`] owns the visual tree, the render channels, and the
//! process-wide resource table behind the composition lock. It is
//! single-threaded by contract: the constructing thread becomes the owner,
//! and every public API rejects calls from any other thread with
//! [`CompositionError::ForeignThread`]. The render channels are the only
//! concurrency boundary — their consumers may live anywhere.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use kurbo::{Affine, Point, Rect, Vec2};
use stratum_wire::{
    BitmapScalingMode, BrushData, CacheModeData, ChannelId, ClearTypeHint, EffectData, Geometry,
    GuidelineSet, ImageData, MediaData, ResourceHandle, TextHintingMode, TextRenderingMode,
};

use crate::channel::{ChannelConsumer, ChannelMode, RenderChannel};
use crate::compile;
use crate::drawing::{Drawing, DrawingContent};
use crate::error::{CompositionError, Result};
use crate::geometry::{self, IntersectionDetail};
use crate::resource::{LogicalData, ResourceArena, ResourceId};
use crate::trace::TraceSink;
use crate::visual::{Children, VisualId, VisualTree};

/// The result of a geometry hit query: the topmost visual whose content
/// relates non-trivially to the test geometry, and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryHit {
    /// The hit visual.
    pub visual: VisualId,
    /// The classification of the test geometry against its content.
    pub detail: IntersectionDetail,
}

/// Owner-side root object: visual tree, channels, and the resource table.
pub struct Composition {
    pub(crate) tree: VisualTree,
    pub(crate) resources: Mutex<ResourceArena>,
    pub(crate) channels: Vec<Option<RenderChannel>>,
    owner: ThreadId,
    pub(crate) tracer: Option<Box<dyn TraceSink + Send>>,
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("tree", &self.tree)
            .field("channels", &self.channels.len())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Composition {
    /// Creates an empty composition owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: VisualTree::new(),
            resources: Mutex::new(ResourceArena::new()),
            channels: Vec::new(),
            owner: thread::current().id(),
            tracer: None,
        }
    }

    /// Installs a trace sink receiving pipeline events.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.tracer = Some(sink);
    }

    pub(crate) fn verify_thread(&self) -> Result<()> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(CompositionError::ForeignThread)
        }
    }

    pub(crate) fn lock_resources(&self) -> MutexGuard<'_, ResourceArena> {
        self.resources.lock().expect("composition lock poisoned")
    }

    // -- Channels --

    /// Opens a render channel feeding `consumer` and returns its id.
    pub fn create_channel(
        &mut self,
        mode: ChannelMode,
        consumer: Box<dyn ChannelConsumer>,
    ) -> Result<ChannelId> {
        self.verify_thread()?;
        let id = ChannelId(self.channels.len() as u32);
        self.channels
            .push(Some(RenderChannel::new(id, mode, consumer)));
        Ok(id)
    }

    /// Tears down a channel: every resource and visual realization on it is
    /// dropped (without emitting commands — the consumer is going away) and
    /// the channel id becomes invalid.
    pub fn close_channel(&mut self, id: ChannelId) -> Result<()> {
        self.verify_thread()?;
        let slot = self
            .channels
            .get_mut(id.0 as usize)
            .ok_or(CompositionError::disposed("render channel"))?;
        if slot.take().is_none() {
            return Err(CompositionError::disposed("render channel"));
        }
        self.lock_resources().drop_channel(id);
        for proxies in &mut self.tree.proxies {
            proxies.retain(|p| p.channel != id);
        }
        Ok(())
    }

    pub(crate) fn channel_mut(&mut self, id: ChannelId) -> Result<&mut RenderChannel> {
        self.channels
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(CompositionError::disposed("render channel"))
    }

    // -- Visuals: lifecycle and topology --

    /// Creates a detached visual.
    pub fn create_visual(&mut self) -> Result<VisualId> {
        self.verify_thread()?;
        Ok(self.tree.create_visual())
    }

    /// Destroys a detached, childless, unrealized visual.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or the visual is attached, has
    /// children, is a target root, or is still realized on a channel.
    pub fn destroy_visual(&mut self, id: VisualId) -> Result<()> {
        self.verify_thread()?;
        self.tree.destroy_visual(id);
        Ok(())
    }

    /// Appends `child` as the last (topmost) child of `parent`.
    ///
    /// Fails with a configuration error — before any mutation — if `child`
    /// already has a parent, is a target root, or is an ancestor of
    /// `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: VisualId, child: VisualId) -> Result<()> {
        self.verify_thread()?;
        self.tree.add_child(parent, child)
    }

    /// Inserts `child` immediately below `sibling` in z-order.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn insert_before(&mut self, child: VisualId, sibling: VisualId) -> Result<()> {
        self.verify_thread()?;
        self.tree.insert_before(child, sibling)
    }

    /// Severs `child` from its parent and releases the subtree's
    /// realization on every channel it was realized on.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_from_parent(&mut self, child: VisualId) -> Result<()> {
        self.verify_thread()?;
        self.tree.validate(child);
        if self.tree.parent_of(child).is_none() {
            return Err(CompositionError::configuration("visual has no parent"));
        }

        {
            let Self {
                tree,
                resources,
                channels,
                ..
            } = self;
            let mut arena = resources.lock().expect("composition lock poisoned");
            for channel in channels.iter_mut().flatten() {
                compile::unrealize_subtree(tree, &mut arena, channel, child.idx)?;
            }
        }
        self.tree.remove_from_parent(child)
    }

    /// Whether the handle refers to a live visual.
    pub fn is_alive(&self, id: VisualId) -> Result<bool> {
        self.verify_thread()?;
        Ok(self.tree.is_alive(id))
    }

    /// The parent of a visual, if attached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn parent(&self, id: VisualId) -> Result<Option<VisualId>> {
        self.verify_thread()?;
        Ok(self.tree.parent_of(id))
    }

    /// The children of a visual, back to front.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn children(&self, id: VisualId) -> Result<Children<'_>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(Children::new(
            &self.tree,
            self.tree.first_child[id.idx as usize],
        ))
    }

    // -- Visuals: properties --
    //
    // Every setter marks its own realization bit on each channel holding
    // the visual and propagates both dirty domains upward.

    /// Sets the visual's offset in its parent's space.
    pub fn set_offset(&mut self, id: VisualId, offset: Vec2) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_offset(id, offset);
        Ok(())
    }

    /// Sets or clears the visual's transform.
    pub fn set_transform(&mut self, id: VisualId, transform: Option<Affine>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_transform(id, transform);
        Ok(())
    }

    /// Sets or clears the visual's clip geometry.
    pub fn set_clip(&mut self, id: VisualId, clip: Option<Geometry>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_clip(id, clip);
        Ok(())
    }

    /// Sets the visual's uniform opacity.
    pub fn set_opacity(&mut self, id: VisualId, opacity: f64) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_opacity(id, opacity);
        Ok(())
    }

    /// Sets or clears the visual's opacity-mask brush.
    pub fn set_opacity_mask(&mut self, id: VisualId, mask: Option<ResourceId>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_opacity_mask(id, mask);
        Ok(())
    }

    /// Sets or clears the visual's drawing content.
    pub fn set_content(&mut self, id: VisualId, content: Option<&Drawing>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_content(id, content.cloned());
        Ok(())
    }

    /// Sets the visual's bitmap scaling mode.
    pub fn set_scaling_mode(&mut self, id: VisualId, mode: BitmapScalingMode) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_scaling_mode(id, mode);
        Ok(())
    }

    /// Sets or clears the visual's effect.
    pub fn set_effect(&mut self, id: VisualId, effect: Option<EffectData>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_effect(id, effect);
        Ok(())
    }

    /// Sets or clears the visual's cache mode.
    pub fn set_cache_mode(&mut self, id: VisualId, cache: Option<CacheModeData>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_cache_mode(id, cache);
        Ok(())
    }

    /// Sets or clears the visual's guideline set.
    pub fn set_guidelines(&mut self, id: VisualId, guidelines: Option<GuidelineSet>) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_guidelines(id, guidelines);
        Ok(())
    }

    /// Sets the visual's ClearType hint.
    pub fn set_cleartype_hint(&mut self, id: VisualId, hint: ClearTypeHint) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_cleartype_hint(id, hint);
        Ok(())
    }

    /// Sets the visual's text rendering mode.
    pub fn set_text_rendering(&mut self, id: VisualId, mode: TextRenderingMode) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_text_rendering(id, mode);
        Ok(())
    }

    /// Sets the visual's text hinting mode.
    pub fn set_text_hinting(&mut self, id: VisualId, mode: TextHintingMode) -> Result<()> {
        self.verify_thread()?;
        self.tree.set_text_hinting(id, mode);
        Ok(())
    }

    // -- Visuals: property getters --

    /// The visual's offset in its parent's space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn offset(&self, id: VisualId) -> Result<Vec2> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.offset[id.idx as usize])
    }

    /// The visual's transform, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn transform(&self, id: VisualId) -> Result<Option<Affine>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.transform[id.idx as usize])
    }

    /// The visual's clip geometry, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn clip(&self, id: VisualId) -> Result<Option<Geometry>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.clip[id.idx as usize].clone())
    }

    /// The visual's opacity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn opacity(&self, id: VisualId) -> Result<f64> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.opacity[id.idx as usize])
    }

    /// The visual's opacity-mask brush, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn opacity_mask(&self, id: VisualId) -> Result<Option<ResourceId>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.opacity_mask[id.idx as usize])
    }

    /// The visual's drawing content, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn content(&self, id: VisualId) -> Result<Option<Drawing>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.content[id.idx as usize].clone())
    }

    /// The visual's bitmap scaling mode.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn scaling_mode(&self, id: VisualId) -> Result<BitmapScalingMode> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.scaling_mode[id.idx as usize])
    }

    /// The visual's effect, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn effect(&self, id: VisualId) -> Result<Option<EffectData>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.effect[id.idx as usize])
    }

    /// The visual's cache mode, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn cache_mode(&self, id: VisualId) -> Result<Option<CacheModeData>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.cache_mode[id.idx as usize])
    }

    /// The visual's guideline set, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn guidelines(&self, id: VisualId) -> Result<Option<GuidelineSet>> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.guidelines[id.idx as usize].clone())
    }

    /// The visual's ClearType hint.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn cleartype_hint(&self, id: VisualId) -> Result<ClearTypeHint> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.cleartype_hint[id.idx as usize])
    }

    /// The visual's text rendering mode.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn text_rendering(&self, id: VisualId) -> Result<TextRenderingMode> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.text_rendering[id.idx as usize])
    }

    /// The visual's text hinting mode.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn text_hinting(&self, id: VisualId) -> Result<TextHintingMode> {
        self.verify_thread()?;
        self.tree.validate(id);
        Ok(self.tree.text_hinting[id.idx as usize])
    }

    // -- Logical resources --

    /// Registers a brush.
    pub fn create_brush(&mut self, data: BrushData) -> Result<ResourceId> {
        self.verify_thread()?;
        Ok(self.lock_resources().register(LogicalData::Brush(data)))
    }

    /// Registers an image.
    pub fn create_image(&mut self, data: ImageData) -> Result<ResourceId> {
        self.verify_thread()?;
        Ok(self.lock_resources().register(LogicalData::Image(data)))
    }

    /// Registers a media source.
    pub fn create_media(&mut self, data: MediaData) -> Result<ResourceId> {
        self.verify_thread()?;
        Ok(self.lock_resources().register(LogicalData::Media(data)))
    }

    /// Registers closed drawing content as a logical resource.
    pub fn register_drawing(&mut self, content: DrawingContent) -> Result<Drawing> {
        self.verify_thread()?;
        let content = Arc::new(content);
        let id = self
            .lock_resources()
            .register(LogicalData::Drawing(Arc::clone(&content)));
        Ok(Drawing { id, content })
    }

    /// Replaces a brush's state, enqueuing exactly one update command on
    /// every channel the brush is realized on.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_brush(&mut self, id: ResourceId, data: BrushData) -> Result<()> {
        self.verify_thread()?;
        let Self {
            resources,
            channels,
            ..
        } = self;
        let mut arena = resources.lock().expect("composition lock poisoned");
        arena.update(id, LogicalData::Brush(data), channels)
    }

    /// Replaces an image's state on every realized channel.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_image(&mut self, id: ResourceId, data: ImageData) -> Result<()> {
        self.verify_thread()?;
        let Self {
            resources,
            channels,
            ..
        } = self;
        let mut arena = resources.lock().expect("composition lock poisoned");
        arena.update(id, LogicalData::Image(data), channels)
    }

    /// Replaces a media source's state on every realized channel.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_media(&mut self, id: ResourceId, data: MediaData) -> Result<()> {
        self.verify_thread()?;
        let Self {
            resources,
            channels,
            ..
        } = self;
        let mut arena = resources.lock().expect("composition lock poisoned");
        arena.update(id, LogicalData::Media(data), channels)
    }

    /// Unregisters a logical resource, freeing its slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the resource is still realized on
    /// any channel.
    pub fn discard_resource(&mut self, id: ResourceId) -> Result<()> {
        self.verify_thread()?;
        self.lock_resources().unregister(id);
        Ok(())
    }

    /// The channels a resource is currently realized on.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn resource_channels(&self, id: ResourceId) -> Result<Vec<ChannelId>> {
        self.verify_thread()?;
        let arena = self.lock_resources();
        Ok((0..arena.channel_count(id))
            .map(|i| arena.channel_at(id, i))
            .collect())
    }

    /// The resource's handle on `channel`; the null handle if it is not
    /// realized there.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn resource_handle(&self, id: ResourceId, channel: ChannelId) -> Result<ResourceHandle> {
        self.verify_thread()?;
        Ok(self.lock_resources().handle_on_channel(id, channel))
    }

    // -- Queries --

    /// The cached bounds of the visual's own content, in its local space.
    ///
    /// Runs the precompute pass over the visual's dirty subtree first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn content_bounds(&mut self, id: VisualId) -> Result<Rect> {
        self.verify_thread()?;
        self.tree.validate(id);
        self.tree.precompute(id.idx);
        Ok(self.tree.content_bounds[id.idx as usize])
    }

    /// The bounds of the visual's whole subtree (content plus descendants,
    /// clipped), in the visual's local space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn subtree_bounds(&mut self, id: VisualId) -> Result<Rect> {
        self.verify_thread()?;
        self.tree.validate(id);
        self.tree.precompute(id.idx);
        Ok(self.tree.subtree_bounds[id.idx as usize])
    }

    /// The topmost visual under `point` (given in `root`'s local space), or
    /// `None` when nothing drawable is there.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn hit_test_point(&self, root: VisualId, point: Point) -> Result<Option<VisualId>> {
        self.verify_thread()?;
        self.tree.validate(root);
        Ok(self.tree.hit_test_point(root.idx, point))
    }

    /// The topmost visual whose content relates non-trivially to `test`
    /// (given in `root`'s local space), with the classification.
    ///
    /// An empty test geometry is a configuration error.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn hit_test_geometry(
        &self,
        root: VisualId,
        test: &Geometry,
    ) -> Result<Option<GeometryHit>> {
        self.verify_thread()?;
        self.tree.validate(root);
        if geometry::is_empty_outline(test) {
            return Err(CompositionError::configuration(
                "hit-test geometry is empty",
            ));
        }
        let test_path = geometry::to_path(test);
        let mut clips = Vec::new();
        Ok(self
            .tree
            .hit_test_geometry(root.idx, &test_path, Affine::IDENTITY, &mut clips)
            .map(|(visual, detail)| GeometryHit { visual, detail }))
    }
}
