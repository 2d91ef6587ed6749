// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel realization records of visuals.

use stratum_wire::{ChannelId, ResourceHandle};

use crate::resource::ResourceId;
use crate::visual::flags::RealizationFlags;

/// One visual's realization on one channel.
///
/// Created by the compile pass when the walk first reaches the visual on
/// that channel; removed when the subtree is detached, the root is cleared,
/// or the channel is torn down. `content` and `mask` remember which
/// resources this realization add-ref'd so the matching releases can be
/// issued when they change or the proxy goes away.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VisualProxy {
    /// The channel this realization lives on.
    pub channel: ChannelId,
    /// The visual's handle on that channel.
    pub handle: ResourceHandle,
    /// Pending re-sync bits for that channel.
    pub flags: RealizationFlags,
    /// Drawing resource currently realized as this visual's content.
    pub content: Option<ResourceId>,
    /// Brush resource currently realized as this visual's opacity mask.
    pub mask: Option<ResourceId>,
}

impl VisualProxy {
    pub(crate) fn new(channel: ChannelId, handle: ResourceHandle) -> Self {
        Self {
            channel,
            handle,
            flags: RealizationFlags::empty(),
            content: None,
            mask: None,
        }
    }
}

/// Finds the proxy for `channel` in a visual's proxy list.
pub(crate) fn find(proxies: &[VisualProxy], channel: ChannelId) -> Option<&VisualProxy> {
    proxies.iter().find(|p| p.channel == channel)
}

/// Mutable variant of [`find`].
pub(crate) fn find_mut(
    proxies: &mut [VisualProxy],
    channel: ChannelId,
) -> Option<&mut VisualProxy> {
    proxies.iter_mut().find(|p| p.channel == channel)
}
