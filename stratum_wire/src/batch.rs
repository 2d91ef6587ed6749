// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered command batches.

use alloc::vec::Vec;

use crate::command::Command;

/// An ordered run of commands applied atomically by the consumer.
///
/// Commands are appended in FIFO order and are never reordered or coalesced
/// by this layer. A batch is *sealed* by the channel when closed; a sealed
/// batch accepts no further commands.
#[derive(Clone, Debug, Default)]
pub struct CommandBatch {
    commands: Vec<Command>,
    sealed: bool,
}

impl CommandBatch {
    /// Creates an empty, open batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
            sealed: false,
        }
    }

    /// Appends a command.
    ///
    /// # Panics
    ///
    /// Panics if the batch has been sealed.
    pub fn push(&mut self, command: Command) {
        assert!(!self.sealed, "cannot append to a sealed batch");
        self.commands.push(command);
    }

    /// Seals the batch; further pushes panic.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns whether the batch is sealed.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns whether the batch holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// The commands in append order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consumes the batch, returning the commands in append order.
    #[must_use]
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ResourceKind;
    use crate::handle::ResourceHandle;

    fn create() -> Command {
        Command::CreateResource {
            handle: ResourceHandle::NULL,
            kind: ResourceKind::Brush,
        }
    }

    #[test]
    fn push_preserves_order() {
        let mut b = CommandBatch::new();
        b.push(create());
        b.push(Command::ReleaseResource {
            handle: ResourceHandle::NULL,
        });
        assert_eq!(b.len(), 2);
        assert_eq!(b.commands()[0].name(), "create");
        assert_eq!(b.commands()[1].name(), "release");
    }

    #[test]
    #[should_panic(expected = "cannot append to a sealed batch")]
    fn sealed_batch_rejects_push() {
        let mut b = CommandBatch::new();
        b.seal();
        b.push(create());
    }
}
