// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the stratum composition core.
//!
//! [`PrettyPrintSink`] implements
//! [`TraceSink`](stratum_core::trace::TraceSink) and writes one line per
//! pipeline event to any [`Write`](std::io::Write) destination (default:
//! stderr). [`print_batch`] dumps a command batch in the same format, one
//! command per line, for inspecting what actually crossed a channel.

mod pretty;

pub use pretty::{PrettyPrintSink, print_batch};
