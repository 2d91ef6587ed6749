// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot storage for logical resources and their channel records.

use std::sync::Arc;

use stratum_wire::{
    BrushData, ChannelId, Command, ContentOp, ImageData, MediaData, PenData, ResourceData,
    ResourceHandle, ResourceKind,
};

use crate::channel::RenderChannel;
use crate::drawing::{DrawOp, DrawingContent, Pen};
use crate::error::{CompositionError, Result};
use crate::resource::ResourceId;

/// Owner-side state of one logical resource.
#[derive(Clone, Debug)]
pub(crate) enum LogicalData {
    /// A brush.
    Brush(BrushData),
    /// An image.
    Image(ImageData),
    /// A media frame source.
    Media(MediaData),
    /// Recorded drawing content. Immutable once registered.
    Drawing(Arc<DrawingContent>),
}

impl LogicalData {
    fn kind(&self) -> ResourceKind {
        match self {
            Self::Brush(_) => ResourceKind::Brush,
            Self::Image(_) => ResourceKind::Image,
            Self::Media(_) => ResourceKind::Media,
            Self::Drawing(_) => ResourceKind::Drawing,
        }
    }
}

/// One channel's entry in a resource's multi-channel record.
#[derive(Clone, Copy, Debug)]
struct ChannelRef {
    channel: ChannelId,
    handle: ResourceHandle,
    refs: u32,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    alive: bool,
    data: LogicalData,
    channels: Vec<ChannelRef>,
}

/// Slot storage for all logical resources, with generation-checked handles
/// and a free list, guarded as a whole by the composition lock.
#[derive(Debug, Default)]
pub(crate) struct ResourceArena {
    entries: Vec<Entry>,
    free_list: Vec<u32>,
}

impl ResourceArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a logical resource with an empty channel record.
    pub(crate) fn register(&mut self, data: LogicalData) -> ResourceId {
        if let Some(idx) = self.free_list.pop() {
            let entry = &mut self.entries[idx as usize];
            entry.generation += 1;
            entry.alive = true;
            entry.data = data;
            entry.channels.clear();
            ResourceId {
                idx,
                generation: entry.generation,
            }
        } else {
            let idx = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                alive: true,
                data,
                channels: Vec::new(),
            });
            ResourceId { idx, generation: 0 }
        }
    }

    /// Unregisters a resource, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the resource is still realized on
    /// any channel.
    pub(crate) fn unregister(&mut self, id: ResourceId) {
        self.validate(id);
        let entry = &mut self.entries[id.idx as usize];
        assert!(
            entry.channels.is_empty(),
            "cannot unregister a resource still realized on {} channel(s)",
            entry.channels.len()
        );
        entry.alive = false;
        entry.generation += 1;
        self.free_list.push(id.idx);
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: ResourceId) {
        let ok = (id.idx as usize) < self.entries.len() && {
            let e = &self.entries[id.idx as usize];
            e.alive && e.generation == id.generation
        };
        assert!(ok, "stale ResourceId: {id:?}");
    }

    pub(crate) fn kind(&self, id: ResourceId) -> ResourceKind {
        self.validate(id);
        self.entries[id.idx as usize].data.kind()
    }

    pub(crate) fn drawing_content(&self, id: ResourceId) -> Option<&Arc<DrawingContent>> {
        self.validate(id);
        match &self.entries[id.idx as usize].data {
            LogicalData::Drawing(content) => Some(content),
            _ => None,
        }
    }

    /// Resources directly contained by `id` (a drawing's referenced set).
    fn contained(&self, id: ResourceId) -> Vec<ResourceId> {
        match &self.entries[id.idx as usize].data {
            LogicalData::Drawing(content) => content.resources.clone(),
            _ => Vec::new(),
        }
    }

    /// Adds one reference on `channel`, realizing the resource there on the
    /// 0→1 transition.
    ///
    /// Returns `true` exactly when this call realized the resource: its
    /// contained resources were recursively add-ref'd and its initial state
    /// was pushed onto the channel.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn create_or_add_ref_on_channel(
        &mut self,
        id: ResourceId,
        channel: &mut RenderChannel,
    ) -> Result<bool> {
        self.validate(id);
        let entry = &mut self.entries[id.idx as usize];
        if let Some(r) = entry
            .channels
            .iter_mut()
            .find(|r| r.channel == channel.id())
        {
            r.refs += 1;
            return Ok(false);
        }

        // Realize contained resources first so their handles resolve when
        // this resource's initial state is marshaled.
        for child in self.contained(id) {
            self.create_or_add_ref_on_channel(child, channel)?;
        }

        let handle = channel.alloc_handle();
        let kind = self.entries[id.idx as usize].data.kind();
        channel.send_command(Command::CreateResource { handle, kind })?;
        match self.entries[id.idx as usize].data.clone() {
            LogicalData::Brush(data) => channel.send_command(Command::UpdateResource {
                handle,
                data: ResourceData::Brush(data),
            })?,
            LogicalData::Image(data) => channel.send_command(Command::UpdateResource {
                handle,
                data: ResourceData::Image(data),
            })?,
            LogicalData::Media(data) => channel.send_command(Command::UpdateResource {
                handle,
                data: ResourceData::Media(data),
            })?,
            LogicalData::Drawing(content) => {
                let ops = self.marshal(&content, channel.id());
                channel.begin_command(Command::UpdateDrawing {
                    handle,
                    ops: Vec::new(),
                })?;
                channel.append_payload(ops)?;
                channel.end_command()?;
            }
        }

        self.entries[id.idx as usize].channels.push(ChannelRef {
            channel: channel.id(),
            handle,
            refs: 1,
        });
        Ok(true)
    }

    /// Drops one reference on `channel`, releasing the resource there on
    /// the 1→0 transition (contained resources are then released too).
    ///
    /// Returns `true` exactly when this call released the resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the resource is not realized on
    /// `channel`.
    pub(crate) fn release_on_channel(
        &mut self,
        id: ResourceId,
        channel: &mut RenderChannel,
    ) -> Result<bool> {
        self.validate(id);
        let entry = &mut self.entries[id.idx as usize];
        let pos = entry
            .channels
            .iter()
            .position(|r| r.channel == channel.id())
            .unwrap_or_else(|| panic!("{id:?} is not realized on {:?}", channel.id()));
        let r = &mut entry.channels[pos];
        r.refs -= 1;
        if r.refs > 0 {
            return Ok(false);
        }
        let handle = r.handle;
        entry.channels.swap_remove(pos);
        channel.send_command(Command::ReleaseResource { handle })?;
        channel.free_handle(handle);
        for child in self.contained(id) {
            self.release_on_channel(child, channel)?;
        }
        Ok(true)
    }

    /// The resource's handle on `channel`, or the null handle if it is not
    /// realized there. Callers treat null as "omit this reference".
    pub(crate) fn handle_on_channel(&self, id: ResourceId, channel: ChannelId) -> ResourceHandle {
        self.validate(id);
        self.entries[id.idx as usize]
            .channels
            .iter()
            .find(|r| r.channel == channel)
            .map_or(ResourceHandle::NULL, |r| r.handle)
    }

    /// Number of channels currently holding a reference.
    pub(crate) fn channel_count(&self, id: ResourceId) -> usize {
        self.validate(id);
        self.entries[id.idx as usize].channels.len()
    }

    /// The channel at `index` in the record.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub(crate) fn channel_at(&self, id: ResourceId, index: usize) -> ChannelId {
        self.validate(id);
        let channels = &self.entries[id.idx as usize].channels;
        assert!(
            index < channels.len(),
            "channel index {index} out of range (count {})",
            channels.len()
        );
        channels[index].channel
    }

    /// Replaces the resource's logical state and enqueues exactly one update
    /// command on every channel in its record.
    ///
    /// Drawing content is immutable; updating it is an invalid operation.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn update(
        &mut self,
        id: ResourceId,
        data: LogicalData,
        channels: &mut [Option<RenderChannel>],
    ) -> Result<()> {
        self.validate(id);
        let entry = &mut self.entries[id.idx as usize];
        if matches!(entry.data, LogicalData::Drawing(_)) || matches!(data, LogicalData::Drawing(_))
        {
            return Err(CompositionError::operation(
                "drawing content is immutable; record a new drawing instead",
            ));
        }
        if entry.data.kind() != data.kind() {
            return Err(CompositionError::operation(
                "resource update must keep the resource kind",
            ));
        }
        entry.data = data.clone();
        let wire_data = match data {
            LogicalData::Brush(b) => ResourceData::Brush(b),
            LogicalData::Image(i) => ResourceData::Image(i),
            LogicalData::Media(m) => ResourceData::Media(m),
            LogicalData::Drawing(_) => unreachable!("rejected above"),
        };
        let refs = entry.channels.clone();
        for r in refs {
            let channel = channels
                .iter_mut()
                .flatten()
                .find(|c| c.id() == r.channel)
                .ok_or(CompositionError::disposed("render channel"))?;
            channel.send_command(Command::UpdateResource {
                handle: r.handle,
                data: wire_data.clone(),
            })?;
        }
        Ok(())
    }

    /// Drops every record entry for `channel` without emitting commands.
    /// Used when the channel itself is torn down.
    pub(crate) fn drop_channel(&mut self, channel: ChannelId) {
        for entry in &mut self.entries {
            entry.channels.retain(|r| r.channel != channel);
        }
    }

    /// Converts recorded ops to the channel's handle space.
    ///
    /// Unrealized optional references marshal as the null handle, which the
    /// consumer treats as "omit".
    pub(crate) fn marshal(&self, content: &DrawingContent, channel: ChannelId) -> Vec<ContentOp> {
        let resolve = |r: Option<ResourceId>| {
            r.map_or(ResourceHandle::NULL, |id| self.handle_on_channel(id, channel))
        };
        let pen = |p: &Option<Pen>| {
            p.map(|p| PenData {
                brush: resolve(p.brush),
                thickness: p.thickness,
            })
        };
        content
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Line { pen: p, p0, p1 } => ContentOp::DrawLine {
                    pen: pen(p),
                    p0: *p0,
                    p1: *p1,
                },
                DrawOp::Rect {
                    brush: b,
                    pen: p,
                    rect,
                } => ContentOp::DrawRect {
                    brush: resolve(*b),
                    pen: pen(p),
                    rect: *rect,
                },
                DrawOp::RoundedRect {
                    brush: b,
                    pen: p,
                    rect,
                } => ContentOp::DrawRoundedRect {
                    brush: resolve(*b),
                    pen: pen(p),
                    rect: *rect,
                },
                DrawOp::Ellipse {
                    brush: b,
                    pen: p,
                    ellipse,
                } => ContentOp::DrawEllipse {
                    brush: resolve(*b),
                    pen: pen(p),
                    ellipse: *ellipse,
                },
                DrawOp::Geometry {
                    brush: b,
                    pen: p,
                    geometry,
                } => ContentOp::DrawGeometry {
                    brush: resolve(*b),
                    pen: pen(p),
                    geometry: geometry.clone(),
                },
                DrawOp::Image { image, rect } => ContentOp::DrawImage {
                    image: resolve(*image),
                    rect: *rect,
                },
                DrawOp::Media { media, rect } => ContentOp::DrawMedia {
                    media: resolve(*media),
                    rect: *rect,
                },
                DrawOp::GlyphRun { brush: b, run } => ContentOp::DrawGlyphRun {
                    brush: resolve(*b),
                    run: run.clone(),
                },
                DrawOp::Drawing { drawing } => ContentOp::DrawDrawing {
                    drawing: self.handle_on_channel(drawing.id, channel),
                },
                DrawOp::PushTransform(t) => ContentOp::PushTransform { transform: *t },
                DrawOp::PushClip(c) => ContentOp::PushClip { clip: c.clone() },
                DrawOp::PushOpacity(o) => ContentOp::PushOpacity { opacity: *o },
                DrawOp::PushOpacityMask(b) => ContentOp::PushOpacityMask {
                    brush: self.handle_on_channel(*b, channel),
                },
                DrawOp::PushGuidelines(g) => ContentOp::PushGuidelines {
                    guidelines: g.clone(),
                },
                DrawOp::Pop => ContentOp::Pop,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConsumer, ChannelMode};
    use crate::drawing::{DrawingContext as _, DrawingRecorder};
    use crate::error::TransportError;
    use std::sync::{Arc as StdArc, Mutex};
    use stratum_wire::{Color, CommandBatch};

    #[derive(Clone, Default)]
    struct Sink {
        log: StdArc<Mutex<Vec<Command>>>,
    }

    impl ChannelConsumer for Sink {
        fn apply(&mut self, batch: &CommandBatch) -> Result<(), TransportError> {
            self.log.lock().unwrap().extend_from_slice(batch.commands());
            Ok(())
        }
    }

    fn channel(id: u32) -> (RenderChannel, StdArc<Mutex<Vec<Command>>>) {
        let sink = Sink::default();
        let log = StdArc::clone(&sink.log);
        (
            RenderChannel::new(ChannelId(id), ChannelMode::Queued, Box::new(sink)),
            log,
        )
    }

    fn solid() -> LogicalData {
        LogicalData::Brush(BrushData::Solid(Color::BLACK))
    }

    #[test]
    fn add_ref_release_symmetry() {
        let mut arena = ResourceArena::new();
        let (mut ch, _log) = channel(0);
        let id = arena.register(solid());

        assert!(arena.create_or_add_ref_on_channel(id, &mut ch).unwrap());
        assert!(!arena.create_or_add_ref_on_channel(id, &mut ch).unwrap());
        assert!(!arena.create_or_add_ref_on_channel(id, &mut ch).unwrap());
        assert_eq!(arena.channel_count(id), 1);
        let handle = arena.handle_on_channel(id, ChannelId(0));
        assert!(!handle.is_null());

        assert!(!arena.release_on_channel(id, &mut ch).unwrap());
        assert!(!arena.release_on_channel(id, &mut ch).unwrap());
        assert!(arena.release_on_channel(id, &mut ch).unwrap());
        assert_eq!(arena.channel_count(id), 0);
        assert!(arena.handle_on_channel(id, ChannelId(0)).is_null());
    }

    #[test]
    fn realize_pushes_create_then_initial_state() {
        let mut arena = ResourceArena::new();
        let (mut ch, log) = channel(0);
        let id = arena.register(solid());
        arena.create_or_add_ref_on_channel(id, &mut ch).unwrap();
        ch.commit().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(matches!(
            log[0],
            Command::CreateResource {
                kind: ResourceKind::Brush,
                ..
            }
        ));
        assert!(matches!(log[1], Command::UpdateResource { .. }));
    }

    #[test]
    fn drawing_realization_addrefs_contained_brushes() {
        let mut arena = ResourceArena::new();
        let (mut ch, log) = channel(0);
        let brush = arena.register(solid());

        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush), None, kurbo::Rect::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        let content = Arc::new(rec.close().unwrap());
        let drawing = arena.register(LogicalData::Drawing(content));

        assert!(arena.create_or_add_ref_on_channel(drawing, &mut ch).unwrap());
        assert_eq!(arena.channel_count(brush), 1, "contained brush realized");
        ch.commit().unwrap();

        // Brush create+update precede the drawing create+update.
        let log = log.lock().unwrap();
        assert!(matches!(
            log[0],
            Command::CreateResource {
                kind: ResourceKind::Brush,
                ..
            }
        ));
        assert!(matches!(
            log[2],
            Command::CreateResource {
                kind: ResourceKind::Drawing,
                ..
            }
        ));
        match &log[3] {
            Command::UpdateDrawing { ops, .. } => {
                assert_eq!(ops.len(), 1);
                match &ops[0] {
                    ContentOp::DrawRect { brush, .. } => assert!(!brush.is_null()),
                    other => panic!("unexpected op {other:?}"),
                }
            }
            other => panic!("unexpected command {other:?}"),
        }

        // Releasing the drawing releases the brush too.
        assert!(arena.release_on_channel(drawing, &mut ch).unwrap());
        assert_eq!(arena.channel_count(brush), 0);
    }

    #[test]
    fn update_fans_out_to_every_realized_channel() {
        let mut arena = ResourceArena::new();
        let (ch_a, log_a) = channel(0);
        let (ch_b, log_b) = channel(1);
        let mut channels = vec![Some(ch_a), Some(ch_b)];

        let id = arena.register(solid());
        arena
            .create_or_add_ref_on_channel(id, channels[0].as_mut().unwrap())
            .unwrap();
        arena
            .create_or_add_ref_on_channel(id, channels[1].as_mut().unwrap())
            .unwrap();
        log_a.lock().unwrap().clear();
        log_b.lock().unwrap().clear();

        arena
            .update(
                id,
                LogicalData::Brush(BrushData::Solid(Color::WHITE)),
                &mut channels,
            )
            .unwrap();
        channels[0].as_mut().unwrap().commit().unwrap();
        channels[1].as_mut().unwrap().commit().unwrap();

        let updates = |log: &StdArc<Mutex<Vec<Command>>>| {
            log.lock()
                .unwrap()
                .iter()
                .filter(|c| matches!(c, Command::UpdateResource { .. }))
                .count()
        };
        assert_eq!(updates(&log_a), 1);
        assert_eq!(updates(&log_b), 1);

        // Releasing A leaves B's handle valid.
        arena
            .release_on_channel(id, channels[0].as_mut().unwrap())
            .unwrap();
        assert!(arena.handle_on_channel(id, ChannelId(0)).is_null());
        assert!(!arena.handle_on_channel(id, ChannelId(1)).is_null());
    }

    #[test]
    fn channel_enumeration_tracks_the_record() {
        let mut arena = ResourceArena::new();
        let (mut ch_a, _) = channel(0);
        let (mut ch_b, _) = channel(7);
        let id = arena.register(solid());
        arena.create_or_add_ref_on_channel(id, &mut ch_a).unwrap();
        arena.create_or_add_ref_on_channel(id, &mut ch_b).unwrap();

        assert_eq!(arena.channel_count(id), 2);
        let listed: Vec<ChannelId> = (0..arena.channel_count(id))
            .map(|i| arena.channel_at(id, i))
            .collect();
        assert!(listed.contains(&ChannelId(0)));
        assert!(listed.contains(&ChannelId(7)));
    }

    #[test]
    fn updating_a_drawing_is_rejected() {
        let mut arena = ResourceArena::new();
        let mut rec = DrawingRecorder::new();
        let content = Arc::new(rec.close().unwrap());
        let id = arena.register(LogicalData::Drawing(content));
        let err = arena.update(id, solid(), &mut []).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidOperation { .. }));
    }

    #[test]
    #[should_panic(expected = "stale ResourceId")]
    fn stale_id_panics() {
        let mut arena = ResourceArena::new();
        let id = arena.register(solid());
        arena.unregister(id);
        let _ = arena.channel_count(id);
    }

    #[test]
    #[should_panic(expected = "not realized on")]
    fn release_without_ref_panics() {
        let mut arena = ResourceArena::new();
        let (mut ch, _) = channel(0);
        let id = arena.register(solid());
        let _ = arena.release_on_channel(id, &mut ch);
    }
}
