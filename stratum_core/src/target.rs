// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition targets: the per-frame render entry point.
//!
//! A target binds a root visual to one render channel and drives the
//! three-phase pipeline: **precompute** (owner-side logical pass) →
//! **compile** (per-channel realization pass, under the composition lock) →
//! **commit** (flush, outside the lock). Root assignment fails fast on
//! configuration conflicts, and every API on a disposed target reports a
//! disposed-object error.

use stratum_wire::{ChannelId, Command, ResourceHandle, ResourceKind, SurfaceKey};

use crate::compile;
use crate::composition::Composition;
use crate::error::{CompositionError, Result};
use crate::trace::{Phase, TraceSink};
use crate::visual::VisualId;

/// Binds a root visual to a channel and renders it.
#[derive(Debug)]
pub struct CompositionTarget {
    channel: ChannelId,
    handle: ResourceHandle,
    root: Option<VisualId>,
    root_synced: bool,
    disposed: bool,
}

fn trace<F: FnOnce(&mut dyn TraceSink)>(
    tracer: &mut Option<Box<dyn TraceSink + Send>>,
    f: F,
) {
    if let Some(t) = tracer {
        f(&mut **t);
    }
}

impl CompositionTarget {
    /// Creates a target realized on `channel`.
    pub fn new(comp: &mut Composition, channel: ChannelId) -> Result<Self> {
        comp.verify_thread()?;
        let ch = comp.channel_mut(channel)?;
        let handle = ch.alloc_handle();
        ch.send_command(Command::CreateResource {
            handle,
            kind: ResourceKind::Target,
        })?;
        Ok(Self {
            channel,
            handle,
            root: None,
            root_synced: true,
            disposed: false,
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            Err(CompositionError::disposed("composition target"))
        } else {
            Ok(())
        }
    }

    /// The channel this target renders to.
    pub fn channel(&self) -> Result<ChannelId> {
        self.ensure_live()?;
        Ok(self.channel)
    }

    /// The current root visual.
    pub fn root(&self) -> Result<Option<VisualId>> {
        self.ensure_live()?;
        Ok(self.root)
    }

    /// Assigns (or clears) the root visual.
    ///
    /// Fails fast, before any channel work, if the new root already has a
    /// parent or is already a target's root elsewhere. The previous root's
    /// realization on this channel is released.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_root(&mut self, comp: &mut Composition, root: Option<VisualId>) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;
        if root == self.root {
            return Ok(());
        }
        if let Some(v) = root {
            comp.tree.validate(v);
            if comp.tree.parent_of(v).is_some() {
                return Err(CompositionError::configuration(
                    "root visual must not have a parent",
                ));
            }
            if comp.tree.is_root[v.idx as usize] {
                return Err(CompositionError::configuration(
                    "visual is already the root of another target",
                ));
            }
        }

        if let Some(old) = self.root.take() {
            let Composition {
                tree,
                resources,
                channels,
                ..
            } = comp;
            let mut arena = resources.lock().expect("composition lock poisoned");
            if let Some(channel) = channels
                .get_mut(self.channel.0 as usize)
                .and_then(Option::as_mut)
            {
                compile::unrealize_subtree(tree, &mut arena, channel, old.idx)?;
            }
            tree.is_root[old.idx as usize] = false;
        }

        if let Some(v) = root {
            comp.tree.is_root[v.idx as usize] = true;
            comp.tree.propagate_logical(v.idx);
        }
        self.root = root;
        self.root_synced = false;
        Ok(())
    }

    /// Renders one frame: precompute over the dirty root subtree, compile
    /// onto this target's channel, then commit the batched commands.
    pub fn render(&mut self, comp: &mut Composition) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;

        if let Some(root) = self.root {
            trace(&mut comp.tracer, |t| t.phase_begin(Phase::Precompute));
            comp.tree.precompute(root.idx);
            trace(&mut comp.tracer, |t| t.phase_end(Phase::Precompute));
        }

        let Composition {
            tree,
            resources,
            channels,
            tracer,
            ..
        } = comp;
        let channel = channels
            .get_mut(self.channel.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(CompositionError::disposed("render channel"))?;

        trace(tracer, |t| t.phase_begin(Phase::Compile));
        {
            // The composition lock covers the whole compile pass — pure
            // bookkeeping and batch pushes — and is dropped before commit.
            let mut arena = resources.lock().expect("composition lock poisoned");
            let root_handle = match self.root {
                Some(root) => compile::compile_channel(tree, &mut arena, channel, root.idx)?,
                None => ResourceHandle::NULL,
            };
            if !self.root_synced {
                channel.send_command(Command::TargetSetRoot {
                    target: self.handle,
                    root: root_handle,
                })?;
                self.root_synced = true;
            }
        }
        trace(tracer, |t| t.phase_end(Phase::Compile));

        trace(tracer, |t| t.phase_begin(Phase::Commit));
        let applied = channel.commit()?;
        let channel_id = channel.id();
        trace(tracer, |t| {
            t.batch_committed(channel_id, applied);
            t.phase_end(Phase::Commit);
        });
        Ok(())
    }

    /// Forwards a present directive to the channel's consumer.
    pub fn present(&mut self, comp: &mut Composition) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;
        let channel = comp.channel_mut(self.channel)?;
        channel.present()?;
        let channel_id = channel.id();
        trace(&mut comp.tracer, |t| t.presented(channel_id));
        Ok(())
    }

    /// Attaches the target to an output surface.
    pub fn attach_surface(&mut self, comp: &mut Composition, surface: SurfaceKey) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;
        comp.channel_mut(self.channel)?
            .send_command(Command::TargetAttachSurface {
                target: self.handle,
                surface,
            })
    }

    /// Detaches the target from its output surface.
    pub fn detach_surface(&mut self, comp: &mut Composition) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;
        comp.channel_mut(self.channel)?
            .send_command(Command::TargetDetachSurface {
                target: self.handle,
            })
    }

    /// Releases the root's realization and the target's channel resource,
    /// flushes, and marks the target disposed. Every later call fails with
    /// a disposed-object error.
    ///
    /// Disposing after the channel itself was closed only clears owner-side
    /// state.
    pub fn dispose(&mut self, comp: &mut Composition) -> Result<()> {
        self.ensure_live()?;
        comp.verify_thread()?;
        self.disposed = true;

        let Composition {
            tree,
            resources,
            channels,
            ..
        } = comp;
        let channel = channels
            .get_mut(self.channel.0 as usize)
            .and_then(Option::as_mut);

        if let Some(root) = self.root.take() {
            tree.is_root[root.idx as usize] = false;
            if let Some(channel) = channel {
                channel.send_command(Command::TargetSetRoot {
                    target: self.handle,
                    root: ResourceHandle::NULL,
                })?;
                let mut arena = resources.lock().expect("composition lock poisoned");
                compile::unrealize_subtree(tree, &mut arena, channel, root.idx)?;
                drop(arena);
                channel.send_command(Command::ReleaseResource {
                    handle: self.handle,
                })?;
                channel.free_handle(self.handle);
                channel.commit()?;
                return Ok(());
            }
        } else if let Some(channel) = channel {
            channel.send_command(Command::ReleaseResource {
                handle: self.handle,
            })?;
            channel.free_handle(self.handle);
            channel.commit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConsumer, ChannelMode};
    use crate::drawing::{DrawingContext as _, DrawingRecorder};
    use crate::error::TransportError;
    use kurbo::Rect;
    use std::sync::{Arc, Mutex};
    use stratum_wire::{BrushData, Color, CommandBatch};

    #[derive(Clone, Default)]
    struct Sink {
        log: Arc<Mutex<Vec<Command>>>,
    }

    impl ChannelConsumer for Sink {
        fn apply(&mut self, batch: &CommandBatch) -> Result<(), TransportError> {
            self.log.lock().unwrap().extend_from_slice(batch.commands());
            Ok(())
        }
    }

    fn setup() -> (Composition, CompositionTarget, Arc<Mutex<Vec<Command>>>) {
        let mut comp = Composition::new();
        let sink = Sink::default();
        let log = Arc::clone(&sink.log);
        let ch = comp
            .create_channel(ChannelMode::Queued, Box::new(sink))
            .unwrap();
        let target = CompositionTarget::new(&mut comp, ch).unwrap();
        (comp, target, log)
    }

    fn names(log: &Arc<Mutex<Vec<Command>>>) -> Vec<&'static str> {
        log.lock().unwrap().iter().map(Command::name).collect()
    }

    #[test]
    fn root_with_parent_is_rejected_before_channel_work() {
        let (mut comp, mut target, log) = setup();
        let parent = comp.create_visual().unwrap();
        let child = comp.create_visual().unwrap();
        comp.add_child(parent, child).unwrap();

        let err = target.set_root(&mut comp, Some(child)).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
        assert!(target.root().unwrap().is_none());
        assert!(names(&log).is_empty(), "failed fast, nothing was sent");
    }

    #[test]
    fn one_visual_cannot_root_two_targets() {
        let (mut comp, mut target_a, _log) = setup();
        let sink = Sink::default();
        let ch_b = comp
            .create_channel(ChannelMode::Queued, Box::new(sink))
            .unwrap();
        let mut target_b = CompositionTarget::new(&mut comp, ch_b).unwrap();

        let root = comp.create_visual().unwrap();
        target_a.set_root(&mut comp, Some(root)).unwrap();
        let err = target_b.set_root(&mut comp, Some(root)).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn rooted_visual_cannot_be_attached_as_child() {
        let (mut comp, mut target, _log) = setup();
        let root = comp.create_visual().unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();

        let parent = comp.create_visual().unwrap();
        let err = comp.add_child(parent, root).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn first_render_realizes_and_sets_the_root() {
        let (mut comp, mut target, log) = setup();
        let root = comp.create_visual().unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();
        target.render(&mut comp).unwrap();

        let names = names(&log);
        assert_eq!(names[0], "create", "target resource");
        assert!(names.contains(&"target-set-root"));
        // The root visual's create precedes the set-root that references it.
        let create_pos = names.iter().rposition(|n| *n == "create").unwrap();
        let setroot_pos = names.iter().position(|n| *n == "target-set-root").unwrap();
        assert!(create_pos < setroot_pos);
    }

    #[test]
    fn property_change_emits_exactly_its_category() {
        let (mut comp, mut target, log) = setup();
        let root = comp.create_visual().unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();
        target.render(&mut comp).unwrap();
        log.lock().unwrap().clear();

        comp.set_opacity(root, 0.5).unwrap();
        target.render(&mut comp).unwrap();
        assert_eq!(names(&log), vec!["set-opacity"]);

        // A clean frame emits nothing.
        log.lock().unwrap().clear();
        target.render(&mut comp).unwrap();
        assert!(names(&log).is_empty());
    }

    #[test]
    fn child_attach_resyncs_the_child_list() {
        let (mut comp, mut target, log) = setup();
        let root = comp.create_visual().unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();
        target.render(&mut comp).unwrap();
        log.lock().unwrap().clear();

        let child = comp.create_visual().unwrap();
        comp.add_child(root, child).unwrap();
        target.render(&mut comp).unwrap();

        let names = names(&log);
        assert_eq!(
            names,
            vec!["create", "remove-all-children", "insert-child"],
            "child realized, then the list re-stated"
        );
    }

    #[test]
    fn content_realization_addrefs_and_releases() {
        let (mut comp, mut target, log) = setup();
        let root = comp.create_visual().unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();

        let brush = comp.create_brush(BrushData::Solid(Color::BLACK)).unwrap();
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush), None, Rect::new(0.0, 0.0, 4.0, 4.0))
            .unwrap();
        let drawing = comp.register_drawing(rec.close().unwrap()).unwrap();
        comp.set_content(root, Some(&drawing)).unwrap();
        target.render(&mut comp).unwrap();

        let ch = target.channel().unwrap();
        assert!(!comp.resource_handle(drawing.id(), ch).unwrap().is_null());
        assert!(!comp.resource_handle(brush, ch).unwrap().is_null());

        // Clearing the content releases drawing and brush.
        log.lock().unwrap().clear();
        comp.set_content(root, None).unwrap();
        target.render(&mut comp).unwrap();
        assert!(comp.resource_handle(drawing.id(), ch).unwrap().is_null());
        assert!(comp.resource_handle(brush, ch).unwrap().is_null());
        let names = names(&log);
        assert!(names.contains(&"release"));
        assert!(names.contains(&"set-content"));
    }

    #[test]
    fn disposed_target_rejects_everything() {
        let (mut comp, mut target, _log) = setup();
        target.dispose(&mut comp).unwrap();

        assert!(matches!(
            target.render(&mut comp),
            Err(CompositionError::Disposed { .. })
        ));
        assert!(matches!(
            target.set_root(&mut comp, None),
            Err(CompositionError::Disposed { .. })
        ));
        assert!(matches!(target.root(), Err(CompositionError::Disposed { .. })));
        assert!(matches!(
            target.present(&mut comp),
            Err(CompositionError::Disposed { .. })
        ));
        assert!(matches!(
            target.dispose(&mut comp),
            Err(CompositionError::Disposed { .. })
        ));
    }

    #[test]
    fn dispose_releases_the_root_subtree() {
        let (mut comp, mut target, log) = setup();
        let root = comp.create_visual().unwrap();
        let child = comp.create_visual().unwrap();
        comp.add_child(root, child).unwrap();
        target.set_root(&mut comp, Some(root)).unwrap();
        target.render(&mut comp).unwrap();
        log.lock().unwrap().clear();

        target.dispose(&mut comp).unwrap();
        let names = names(&log);
        let releases = names.iter().filter(|n| **n == "release").count();
        // Child, root, and the target resource itself.
        assert_eq!(releases, 3);
        assert_eq!(names[0], "target-set-root");

        // The visual can root a new target afterwards.
        let sink = Sink::default();
        let ch = comp
            .create_channel(ChannelMode::Queued, Box::new(sink))
            .unwrap();
        let mut other = CompositionTarget::new(&mut comp, ch).unwrap();
        other.set_root(&mut comp, Some(root)).unwrap();
    }

    #[test]
    fn two_targets_sync_independently() {
        let (mut comp, mut target_a, log_a) = setup();
        let sink = Sink::default();
        let log_b = Arc::clone(&sink.log);
        let ch_b = comp
            .create_channel(ChannelMode::Queued, Box::new(sink))
            .unwrap();
        let mut target_b = CompositionTarget::new(&mut comp, ch_b).unwrap();

        // Two roots sharing one child is impossible (single parent), so use
        // two separate trees mutated together.
        let root_a = comp.create_visual().unwrap();
        let root_b = comp.create_visual().unwrap();
        target_a.set_root(&mut comp, Some(root_a)).unwrap();
        target_b.set_root(&mut comp, Some(root_b)).unwrap();
        target_a.render(&mut comp).unwrap();
        target_b.render(&mut comp).unwrap();
        log_a.lock().unwrap().clear();
        log_b.lock().unwrap().clear();

        comp.set_opacity(root_a, 0.5).unwrap();
        target_a.render(&mut comp).unwrap();
        target_b.render(&mut comp).unwrap();

        assert_eq!(names(&log_a), vec!["set-opacity"]);
        assert!(names(&log_b).is_empty(), "only channel A had dirty bits");
    }
}
