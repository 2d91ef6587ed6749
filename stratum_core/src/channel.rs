// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render channels: ordered command sinks toward the rendering consumer.
//!
//! A channel is the only boundary between the owner-side tree and the
//! renderer. Commands flow through it in strict FIFO order — this layer
//! never reorders or coalesces. A channel is either *synchronous* (each
//! command is applied by the consumer the moment it is sent, used for
//! off-screen targets) or *queued* (commands batch up and flush on commit);
//! the API surface is identical.
//!
//! Variable-length commands (drawing-content updates) are built with
//! [`begin_command`](RenderChannel::begin_command) /
//! [`append_payload`](RenderChannel::append_payload) /
//! [`end_command`](RenderChannel::end_command); everything else goes through
//! [`send_command`](RenderChannel::send_command).

use std::collections::VecDeque;

use stratum_wire::{ChannelId, Command, CommandBatch, ContentOp, HandleAllocator, ResourceHandle};

use crate::error::{CompositionError, Result, TransportError};

/// The consumer end of a render channel.
///
/// Implementations apply command batches to whatever backs the renderer — a
/// shadow scene in tests, a native compositor in production. A consumer may
/// live on another thread behind a queued channel; batches are the only
/// thing that crosses.
pub trait ChannelConsumer: Send {
    /// Applies one sealed batch. Commands within the batch, and batches
    /// across calls, arrive in FIFO order.
    fn apply(&mut self, batch: &CommandBatch) -> Result<(), TransportError>;

    /// A present directive: make the applied state visible.
    fn present(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<'a> core::fmt::Debug for (dyn ChannelConsumer + 'a) {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("dyn ChannelConsumer")
    }
}

/// Delivery timing of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Commands apply the moment they are sent.
    Synchronous,
    /// Commands batch up and apply on [`commit`](RenderChannel::commit).
    Queued,
}

/// An ordered command sink bound to one consumer.
#[derive(Debug)]
pub struct RenderChannel {
    id: ChannelId,
    mode: ChannelMode,
    allocator: HandleAllocator,
    pending: Option<Command>,
    open: CommandBatch,
    queue: VecDeque<CommandBatch>,
    consumer: Box<dyn ChannelConsumer>,
}

impl RenderChannel {
    /// Creates a channel feeding `consumer`.
    #[must_use]
    pub fn new(id: ChannelId, mode: ChannelMode, consumer: Box<dyn ChannelConsumer>) -> Self {
        Self {
            id,
            mode,
            allocator: HandleAllocator::new(),
            pending: None,
            open: CommandBatch::new(),
            queue: VecDeque::new(),
            consumer,
        }
    }

    /// This channel's id.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// This channel's delivery mode.
    #[must_use]
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub(crate) fn alloc_handle(&mut self) -> ResourceHandle {
        self.allocator.alloc()
    }

    pub(crate) fn free_handle(&mut self, handle: ResourceHandle) {
        self.allocator.release(handle);
    }

    /// Opens a variable-length command.
    ///
    /// Fails if another variable-length command is still open.
    pub fn begin_command(&mut self, command: Command) -> Result<()> {
        if self.pending.is_some() {
            return Err(CompositionError::operation(
                "a variable-length command is already open",
            ));
        }
        self.pending = Some(command);
        Ok(())
    }

    /// Appends replay ops to the open drawing-update command.
    ///
    /// Fails if no command is open or the open command takes no payload.
    pub fn append_payload(&mut self, ops: Vec<ContentOp>) -> Result<()> {
        match &mut self.pending {
            Some(Command::UpdateDrawing { ops: existing, .. }) => {
                existing.extend(ops);
                Ok(())
            }
            Some(_) => Err(CompositionError::operation(
                "open command takes no payload",
            )),
            None => Err(CompositionError::operation("no open command")),
        }
    }

    /// Completes and dispatches the open variable-length command.
    pub fn end_command(&mut self) -> Result<()> {
        let command = self.pending.take().ok_or(CompositionError::operation(
            "no open command",
        ))?;
        self.dispatch(command)
    }

    /// Dispatches a fixed-size command.
    ///
    /// Fails if a variable-length command is still open.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        if self.pending.is_some() {
            return Err(CompositionError::operation(
                "a variable-length command is still open",
            ));
        }
        self.dispatch(command)
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        match self.mode {
            ChannelMode::Synchronous => {
                let mut batch = CommandBatch::new();
                batch.push(command);
                batch.seal();
                self.consumer.apply(&batch)?;
                Ok(())
            }
            ChannelMode::Queued => {
                self.open.push(command);
                Ok(())
            }
        }
    }

    /// Seals the open batch and moves it to the commit queue.
    pub fn close_batch(&mut self) {
        if self.open.is_empty() {
            return;
        }
        let mut batch = core::mem::replace(&mut self.open, CommandBatch::new());
        batch.seal();
        self.queue.push_back(batch);
    }

    /// Flushes all batched commands to the consumer, in order.
    ///
    /// The open batch is closed first. On a synchronous channel commands
    /// were applied at send time and this is a no-op.
    pub fn commit(&mut self) -> Result<usize> {
        self.close_batch();
        let mut applied = 0;
        while let Some(batch) = self.queue.pop_front() {
            applied += batch.len();
            self.consumer.apply(&batch)?;
        }
        Ok(applied)
    }

    /// Forwards a present directive to the consumer.
    pub fn present(&mut self) -> Result<()> {
        self.consumer.present()?;
        Ok(())
    }
}
