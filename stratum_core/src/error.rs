// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for the composition core.
//!
//! Contract violations are reported synchronously, before any state
//! mutation, as [`CompositionError`] values. Stale generational handles are
//! programming errors and panic instead (see the `# Panics` sections on the
//! arena APIs). The one deliberate non-error is the null resource handle,
//! which is a documented "omit this reference" value.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = CompositionError> = core::result::Result<T, E>;

/// A failure reported by the render-channel consumer.
///
/// Transport failures are translated into this single type at the channel
/// boundary and propagated to the caller; this core never retries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("render transport failure: {message}")]
pub struct TransportError {
    /// Consumer-provided description of the failure.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// All failure categories surfaced by the composition core.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompositionError {
    /// A structural precondition does not hold: attaching an
    /// already-parented visual, assigning a root that is parented or rooted
    /// elsewhere, hit-testing with an empty geometry.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was violated.
        reason: &'static str,
    },

    /// An API was called in a state that forbids it: drawing after close,
    /// unbalanced push/pop at close, appending payload with no open command.
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// What was violated.
        reason: &'static str,
    },

    /// An API was called on a disposed target or a torn-down channel.
    #[error("{what} has been disposed")]
    Disposed {
        /// The disposed object.
        what: &'static str,
    },

    /// An owner-side API was called from a thread other than the
    /// composition's owner thread.
    #[error("composition accessed from a foreign thread")]
    ForeignThread,

    /// The render-channel consumer reported a failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CompositionError {
    pub(crate) const fn configuration(reason: &'static str) -> Self {
        Self::InvalidConfiguration { reason }
    }

    pub(crate) const fn operation(reason: &'static str) -> Self {
        Self::InvalidOperation { reason }
    }

    pub(crate) const fn disposed(what: &'static str) -> Self {
        Self::Disposed { what }
    }
}
