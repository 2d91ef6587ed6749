// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace and batch output.

use std::io::Write;

use stratum_core::trace::{Phase, TraceSink};
use stratum_wire::{ChannelId, Command, CommandBatch};

/// Writes human-readable pipeline events to a [`Write`] destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        // Diagnostics must never fail the pipeline.
        let _ = writeln!(self.writer, "{text}");
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn phase_begin(&mut self, phase: Phase) {
        self.line(format_args!("phase-begin {}", phase.label()));
    }

    fn phase_end(&mut self, phase: Phase) {
        self.line(format_args!("phase-end   {}", phase.label()));
    }

    fn batch_committed(&mut self, channel: ChannelId, commands: usize) {
        self.line(format_args!(
            "commit      channel={} commands={commands}",
            channel.0
        ));
    }

    fn presented(&mut self, channel: ChannelId) {
        self.line(format_args!("present     channel={}", channel.0));
    }
}

/// Writes one line per command of `batch` to `writer`.
pub fn print_batch(writer: &mut impl Write, batch: &CommandBatch) -> std::io::Result<()> {
    writeln!(
        writer,
        "batch: {} command(s){}",
        batch.len(),
        if batch.is_sealed() { ", sealed" } else { "" }
    )?;
    for command in batch.commands() {
        describe(writer, command)?;
    }
    Ok(())
}

fn describe(writer: &mut impl Write, command: &Command) -> std::io::Result<()> {
    match command {
        Command::CreateResource { handle, kind } => {
            writeln!(writer, "  create          {} {:?}", handle.raw(), kind)
        }
        Command::ReleaseResource { handle } => {
            writeln!(writer, "  release         {}", handle.raw())
        }
        Command::UpdateDrawing { handle, ops } => {
            writeln!(
                writer,
                "  update-drawing  {} ({} ops)",
                handle.raw(),
                ops.len()
            )
        }
        Command::InsertChild {
            visual,
            child,
            index,
        } => writeln!(
            writer,
            "  insert-child    {} <- {} @ {index}",
            visual.raw(),
            child.raw()
        ),
        Command::TargetSetRoot { target, root } => {
            writeln!(
                writer,
                "  target-set-root {} -> {}",
                target.raw(),
                root.raw()
            )
        }
        other => writeln!(writer, "  {}", other.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_wire::{HandleAllocator, ResourceKind};

    #[test]
    fn batch_printing_is_line_per_command() {
        let mut alloc = HandleAllocator::new();
        let handle = alloc.alloc();
        let mut batch = CommandBatch::new();
        batch.push(Command::CreateResource {
            handle,
            kind: ResourceKind::Visual,
        });
        batch.push(Command::SetOpacity {
            visual: handle,
            opacity: 0.5,
        });
        batch.seal();

        let mut out = Vec::new();
        print_batch(&mut out, &batch).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("batch: 2"));
        assert!(lines[1].contains("create"));
        assert!(lines[2].contains("set-opacity"));
    }

    #[test]
    fn sink_writes_phase_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.phase_begin(Phase::Compile);
        sink.batch_committed(ChannelId(3), 7);
        let text = String::from_utf8(sink.writer).unwrap();
        assert!(text.contains("phase-begin compile"));
        assert!(text.contains("channel=3 commands=7"));
    }
}
