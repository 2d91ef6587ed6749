// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference channel consumer for tests and demo harnesses.
//!
//! [`ShadowScene`] applies a command stream to an in-memory mirror of the
//! renderer's state, validating the protocol as it goes: handles must be
//! created before use and released exactly once, drawing updates must carry
//! balanced push/pop sequences, and batches must arrive sealed. Violations
//! are collected (or, in strict mode, fail the transport immediately), and
//! per-command-kind counters support assertions like "exactly one update
//! reached this channel".
//!
//! The scene is a cheap clone over shared state: hand one clone to the
//! channel as its consumer and keep another to inspect from the test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stratum_core::channel::ChannelConsumer;
use stratum_core::error::TransportError;
use stratum_wire::{Command, CommandBatch, ContentOp, ResourceHandle, ResourceKind};
use thiserror::Error;

/// A protocol violation detected while applying a command stream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    /// A batch arrived without being sealed.
    #[error("batch arrived unsealed")]
    UnsealedBatch,
    /// A create command carried the null handle.
    #[error("create carried the null handle")]
    NullCreate,
    /// A create command reused a live handle.
    #[error("duplicate create for handle {handle}")]
    DuplicateCreate {
        /// Raw handle value.
        handle: u32,
    },
    /// A command referenced a handle that is not live.
    #[error("{command} referenced unknown handle {handle}")]
    UnknownHandle {
        /// Command name.
        command: &'static str,
        /// Raw handle value.
        handle: u32,
    },
    /// A release targeted a handle that is not live.
    #[error("release of unknown handle {handle}")]
    UnknownRelease {
        /// Raw handle value.
        handle: u32,
    },
    /// A drawing update carried unbalanced push/pop ops.
    #[error("drawing update for handle {handle} has unbalanced push/pop")]
    UnbalancedContent {
        /// Raw handle value.
        handle: u32,
    },
}

#[derive(Debug, Default)]
struct SceneState {
    live: HashMap<u32, ResourceKind>,
    applied: Vec<Command>,
    counts: HashMap<&'static str, usize>,
    violations: Vec<Violation>,
    batches: u64,
    presents: u64,
}

/// An in-memory mirror of the consumer side of a render channel.
#[derive(Clone, Debug, Default)]
pub struct ShadowScene {
    state: Arc<Mutex<SceneState>>,
    strict: bool,
}

impl ShadowScene {
    /// Creates a scene that records violations without failing the channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene that fails the transport on the first violation.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            state: Arc::default(),
            strict: true,
        }
    }

    /// Total commands applied so far.
    #[must_use]
    pub fn applied_len(&self) -> usize {
        self.state.lock().unwrap().applied.len()
    }

    /// A copy of every applied command, in arrival order.
    #[must_use]
    pub fn applied(&self) -> Vec<Command> {
        self.state.lock().unwrap().applied.clone()
    }

    /// The names of every applied command, in arrival order.
    #[must_use]
    pub fn command_names(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .unwrap()
            .applied
            .iter()
            .map(Command::name)
            .collect()
    }

    /// How many commands with [`Command::name`] equal to `name` arrived.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .counts
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Violations recorded so far.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        self.state.lock().unwrap().violations.clone()
    }

    /// Number of resources currently live on the scene.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    /// Whether `handle` is currently live.
    #[must_use]
    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.state.lock().unwrap().live.contains_key(&handle.raw())
    }

    /// Batches applied so far.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.state.lock().unwrap().batches
    }

    /// Present directives received so far.
    #[must_use]
    pub fn presents(&self) -> u64 {
        self.state.lock().unwrap().presents
    }

    /// Clears the applied log and counters, keeping live resources.
    pub fn clear_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.applied.clear();
        state.counts.clear();
    }
}

fn check_live(
    state: &mut SceneState,
    command: &'static str,
    handle: ResourceHandle,
) {
    if handle.is_null() || state.live.contains_key(&handle.raw()) {
        return;
    }
    state.violations.push(Violation::UnknownHandle {
        command,
        handle: handle.raw(),
    });
}

fn balanced(ops: &[ContentOp]) -> bool {
    let mut depth: i64 = 0;
    for op in ops {
        match op {
            ContentOp::PushTransform { .. }
            | ContentOp::PushClip { .. }
            | ContentOp::PushOpacity { .. }
            | ContentOp::PushOpacityMask { .. }
            | ContentOp::PushGuidelines { .. } => depth += 1,
            ContentOp::Pop => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn content_refs(ops: &[ContentOp]) -> Vec<ResourceHandle> {
    let mut refs = Vec::new();
    for op in ops {
        match op {
            ContentOp::DrawLine { pen, .. } => {
                if let Some(pen) = pen {
                    refs.push(pen.brush);
                }
            }
            ContentOp::DrawRect { brush, pen, .. }
            | ContentOp::DrawRoundedRect { brush, pen, .. }
            | ContentOp::DrawEllipse { brush, pen, .. }
            | ContentOp::DrawGeometry { brush, pen, .. } => {
                refs.push(*brush);
                if let Some(pen) = pen {
                    refs.push(pen.brush);
                }
            }
            ContentOp::DrawImage { image, .. } => refs.push(*image),
            ContentOp::DrawMedia { media, .. } => refs.push(*media),
            ContentOp::DrawGlyphRun { brush, .. } => refs.push(*brush),
            ContentOp::DrawDrawing { drawing } => refs.push(*drawing),
            ContentOp::PushOpacityMask { brush } => refs.push(*brush),
            _ => {}
        }
    }
    refs
}

fn apply_command(state: &mut SceneState, command: &Command) {
    match command {
        Command::CreateResource { handle, kind } => {
            if handle.is_null() {
                state.violations.push(Violation::NullCreate);
            } else if state.live.insert(handle.raw(), *kind).is_some() {
                state.violations.push(Violation::DuplicateCreate {
                    handle: handle.raw(),
                });
            }
        }
        Command::ReleaseResource { handle } => {
            if state.live.remove(&handle.raw()).is_none() {
                state.violations.push(Violation::UnknownRelease {
                    handle: handle.raw(),
                });
            }
        }
        Command::UpdateResource { handle, .. } => check_live(state, command.name(), *handle),
        Command::UpdateDrawing { handle, ops } => {
            check_live(state, command.name(), *handle);
            if !balanced(ops) {
                state.violations.push(Violation::UnbalancedContent {
                    handle: handle.raw(),
                });
            }
            for reference in content_refs(ops) {
                check_live(state, command.name(), reference);
            }
        }
        Command::SetOffset { visual, .. }
        | Command::SetTransform { visual, .. }
        | Command::SetClip { visual, .. }
        | Command::SetOpacity { visual, .. }
        | Command::SetScalingMode { visual, .. }
        | Command::SetEffect { visual, .. }
        | Command::SetCacheMode { visual, .. }
        | Command::SetGuidelines { visual, .. }
        | Command::SetClearTypeHint { visual, .. }
        | Command::SetTextRenderingMode { visual, .. }
        | Command::SetTextHintingMode { visual, .. }
        | Command::RemoveAllChildren { visual } => check_live(state, command.name(), *visual),
        Command::SetOpacityMask { visual, brush } => {
            check_live(state, command.name(), *visual);
            check_live(state, command.name(), *brush);
        }
        Command::SetContent { visual, drawing } => {
            check_live(state, command.name(), *visual);
            check_live(state, command.name(), *drawing);
        }
        Command::InsertChild { visual, child, .. } => {
            check_live(state, command.name(), *visual);
            check_live(state, command.name(), *child);
        }
        Command::TargetSetRoot { target, root } => {
            check_live(state, command.name(), *target);
            check_live(state, command.name(), *root);
        }
        Command::TargetAttachSurface { target, .. }
        | Command::TargetDetachSurface { target } => {
            check_live(state, command.name(), *target);
        }
    }
}

impl ChannelConsumer for ShadowScene {
    fn apply(&mut self, batch: &CommandBatch) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.batches += 1;
        if !batch.is_sealed() {
            state.violations.push(Violation::UnsealedBatch);
        }
        log::debug!("shadow scene: applying batch of {} commands", batch.len());
        let before = state.violations.len();
        for command in batch.commands() {
            apply_command(&mut state, command);
            *state.counts.entry(command.name()).or_insert(0) += 1;
            state.applied.push(command.clone());
        }
        for violation in &state.violations[before..] {
            log::warn!("shadow scene: {violation}");
        }
        if self.strict && state.violations.len() > before {
            let first = state.violations[before].clone();
            return Err(TransportError::new(first.to_string()));
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), TransportError> {
        self.state.lock().unwrap().presents += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_wire::HandleAllocator;

    fn sealed(commands: Vec<Command>) -> CommandBatch {
        let mut batch = CommandBatch::new();
        for c in commands {
            batch.push(c);
        }
        batch.seal();
        batch
    }

    #[test]
    fn tracks_live_resources() {
        let scene = ShadowScene::new();
        let mut consumer = scene.clone();
        let mut alloc = HandleAllocator::new();
        let handle = alloc.alloc();

        consumer
            .apply(&sealed(vec![
                Command::CreateResource {
                    handle,
                    kind: ResourceKind::Brush,
                },
                Command::ReleaseResource { handle },
            ]))
            .unwrap();

        assert_eq!(scene.live_resources(), 0);
        assert_eq!(scene.count("create"), 1);
        assert_eq!(scene.count("release"), 1);
        assert!(scene.violations().is_empty());
    }

    #[test]
    fn detects_unknown_handles() {
        let scene = ShadowScene::new();
        let mut consumer = scene.clone();
        let mut alloc = HandleAllocator::new();
        let handle = alloc.alloc();

        consumer
            .apply(&sealed(vec![Command::SetOpacity {
                visual: handle,
                opacity: 0.5,
            }]))
            .unwrap();
        assert_eq!(
            scene.violations(),
            vec![Violation::UnknownHandle {
                command: "set-opacity",
                handle: handle.raw(),
            }]
        );
    }

    #[test]
    fn detects_unbalanced_content() {
        let scene = ShadowScene::new();
        let mut consumer = scene.clone();
        let mut alloc = HandleAllocator::new();
        let handle = alloc.alloc();

        consumer
            .apply(&sealed(vec![
                Command::CreateResource {
                    handle,
                    kind: ResourceKind::Drawing,
                },
                Command::UpdateDrawing {
                    handle,
                    ops: vec![ContentOp::PushOpacity { opacity: 0.5 }],
                },
            ]))
            .unwrap();
        assert_eq!(
            scene.violations(),
            vec![Violation::UnbalancedContent {
                handle: handle.raw(),
            }]
        );
    }

    #[test]
    fn strict_mode_fails_the_transport() {
        let scene = ShadowScene::strict();
        let mut consumer = scene.clone();
        let err = consumer
            .apply(&sealed(vec![Command::ReleaseResource {
                handle: ResourceHandle::NULL,
            }]))
            .unwrap_err();
        assert!(err.message.contains("unknown handle"));
    }

    #[test]
    fn double_release_is_a_violation() {
        let scene = ShadowScene::new();
        let mut consumer = scene.clone();
        let mut alloc = HandleAllocator::new();
        let handle = alloc.alloc();

        consumer
            .apply(&sealed(vec![
                Command::CreateResource {
                    handle,
                    kind: ResourceKind::Visual,
                },
                Command::ReleaseResource { handle },
                Command::ReleaseResource { handle },
            ]))
            .unwrap();
        assert_eq!(
            scene.violations(),
            vec![Violation::UnknownRelease {
                handle: handle.raw(),
            }]
        );
    }
}
