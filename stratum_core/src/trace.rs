// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the render pipeline.
//!
//! [`TraceSink`] has one method per pipeline event, all defaulting to no-ops,
//! so a sink implements only the events it cares about. The composition
//! holds at most one sink; `stratum_debug` provides a pretty-printing
//! implementation.

use stratum_wire::ChannelId;

/// Which phase of the render pipeline is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Owner-side pass: clear logical dirty flags, recompute cached bounds.
    Precompute,
    /// Per-channel pass: emit create/update/release commands for dirty state.
    Compile,
    /// Flush the channel's batched commands to the consumer.
    Commit,
}

impl Phase {
    /// A short lowercase label for log output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Precompute => "precompute",
            Self::Compile => "compile",
            Self::Commit => "commit",
        }
    }
}

/// Receives render-pipeline events.
pub trait TraceSink {
    /// A pipeline phase is starting.
    fn phase_begin(&mut self, phase: Phase) {
        let _ = phase;
    }

    /// A pipeline phase has finished.
    fn phase_end(&mut self, phase: Phase) {
        let _ = phase;
    }

    /// A batch of `commands` commands was committed on `channel`.
    fn batch_committed(&mut self, channel: ChannelId, commands: usize) {
        let _ = (channel, commands);
    }

    /// A present directive was forwarded on `channel`.
    fn presented(&mut self, channel: ChannelId) {
        let _ = channel;
    }
}

impl<'a> core::fmt::Debug for (dyn TraceSink + 'a) {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("dyn TraceSink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        begins: usize,
        commits: usize,
    }

    impl TraceSink for CountingSink {
        fn phase_begin(&mut self, _phase: Phase) {
            self.begins += 1;
        }

        fn batch_committed(&mut self, _channel: ChannelId, _commands: usize) {
            self.commits += 1;
        }
    }

    #[test]
    fn default_methods_are_no_ops() {
        let mut sink = CountingSink::default();
        sink.phase_begin(Phase::Precompute);
        sink.phase_end(Phase::Precompute);
        sink.batch_committed(ChannelId(0), 3);
        sink.presented(ChannelId(0));
        assert_eq!(sink.begins, 1);
        assert_eq!(sink.commits, 1);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Phase::Precompute.label(), "precompute");
        assert_eq!(Phase::Compile.label(), "compile");
        assert_eq!(Phase::Commit.label(), "commit");
    }
}
