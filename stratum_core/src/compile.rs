// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-channel compile pass.
//!
//! Compile walks a root's subtree for one channel, guided by the
//! realization dirty bits of exactly that channel: it realizes visuals the
//! walk reaches for the first time (create command plus initial state,
//! pruned to non-default properties), emits one update command per set
//! property bit, re-states child lists where the children bit is set, and
//! clears the bits it consumed. Subtrees whose proxies carry no pending
//! bits are skipped entirely.
//!
//! Content and opacity-mask properties reference counted resources: when
//! the realized resource changes, the pass releases the old reference and
//! add-refs the new one on this channel (recursively realizing contained
//! resources), so resource lifetime exactly tracks what the channel can
//! still see.

use stratum_wire::{Command, ResourceHandle, ResourceKind};

use crate::channel::RenderChannel;
use crate::resource::{ResourceArena, ResourceId};
use crate::visual::{INVALID, RealizationFlags, VisualProxy, VisualTree, find_proxy, find_proxy_mut};
use crate::error::Result;

/// Synchronizes `root`'s subtree onto `channel`, returning the root's
/// handle there.
pub(crate) fn compile_channel(
    tree: &mut VisualTree,
    arena: &mut ResourceArena,
    channel: &mut RenderChannel,
    root: u32,
) -> Result<ResourceHandle> {
    sync_visual(tree, arena, channel, root)
}

/// Initial dirty set for a freshly realized visual: every property that
/// differs from the consumer-side default, so realization pushes exactly
/// the state the consumer cannot assume.
fn initial_flags(tree: &VisualTree, idx: u32) -> RealizationFlags {
    let i = idx as usize;
    let mut flags = RealizationFlags::empty();
    if tree.offset[i] != kurbo::Vec2::ZERO {
        flags |= RealizationFlags::OFFSET;
    }
    if tree.transform[i].is_some() {
        flags |= RealizationFlags::TRANSFORM;
    }
    if tree.clip[i].is_some() {
        flags |= RealizationFlags::CLIP;
    }
    if tree.opacity[i] != 1.0 {
        flags |= RealizationFlags::OPACITY;
    }
    if tree.opacity_mask[i].is_some() {
        flags |= RealizationFlags::OPACITY_MASK;
    }
    if tree.content[i].is_some() {
        flags |= RealizationFlags::CONTENT;
    }
    if tree.scaling_mode[i] != stratum_wire::BitmapScalingMode::default() {
        flags |= RealizationFlags::SCALING_MODE;
    }
    if tree.effect[i].is_some() {
        flags |= RealizationFlags::EFFECT;
    }
    if tree.cache_mode[i].is_some() {
        flags |= RealizationFlags::CACHE_MODE;
    }
    if tree.guidelines[i].is_some() {
        flags |= RealizationFlags::GUIDELINES;
    }
    if tree.cleartype_hint[i] != stratum_wire::ClearTypeHint::default() {
        flags |= RealizationFlags::CLEARTYPE_HINT;
    }
    if tree.text_rendering[i] != stratum_wire::TextRenderingMode::default() {
        flags |= RealizationFlags::TEXT_RENDERING;
    }
    if tree.text_hinting[i] != stratum_wire::TextHintingMode::default() {
        flags |= RealizationFlags::TEXT_HINTING;
    }
    if tree.first_child[i] != INVALID {
        flags |= RealizationFlags::CHILDREN;
    }
    flags
}

fn sync_visual(
    tree: &mut VisualTree,
    arena: &mut ResourceArena,
    channel: &mut RenderChannel,
    idx: u32,
) -> Result<ResourceHandle> {
    let chan_id = channel.id();
    let i = idx as usize;

    let (handle, created) = match find_proxy(&tree.proxies[i], chan_id) {
        Some(proxy) => (proxy.handle, false),
        None => {
            let handle = channel.alloc_handle();
            channel.send_command(Command::CreateResource {
                handle,
                kind: ResourceKind::Visual,
            })?;
            let mut proxy = VisualProxy::new(chan_id, handle);
            proxy.flags = initial_flags(tree, idx);
            tree.proxies[i].push(proxy);
            (handle, true)
        }
    };

    let flags = find_proxy(&tree.proxies[i], chan_id)
        .map(|p| p.flags)
        .unwrap_or_default();
    if flags.is_empty() {
        return Ok(handle);
    }

    emit_properties(tree, arena, channel, idx, handle, flags)?;

    let descend = created || flags.intersects(RealizationFlags::SUBTREE | RealizationFlags::CHILDREN);
    let mut child_handles = Vec::new();
    if descend {
        let mut child = tree.first_child[i];
        while child != INVALID {
            let child_handle = sync_visual(tree, arena, channel, child)?;
            child_handles.push(child_handle);
            child = tree.next_sibling[child as usize];
        }
    }

    if flags.contains(RealizationFlags::CHILDREN) {
        if !created {
            channel.send_command(Command::RemoveAllChildren { visual: handle })?;
        }
        for (index, child) in child_handles.iter().enumerate() {
            channel.send_command(Command::InsertChild {
                visual: handle,
                child: *child,
                index: index as u32,
            })?;
        }
    }

    if let Some(proxy) = find_proxy_mut(&mut tree.proxies[i], chan_id) {
        proxy.flags = RealizationFlags::empty();
    }
    Ok(handle)
}

fn emit_properties(
    tree: &mut VisualTree,
    arena: &mut ResourceArena,
    channel: &mut RenderChannel,
    idx: u32,
    handle: ResourceHandle,
    flags: RealizationFlags,
) -> Result<()> {
    let chan_id = channel.id();
    let i = idx as usize;

    if flags.contains(RealizationFlags::OFFSET) {
        channel.send_command(Command::SetOffset {
            visual: handle,
            offset: tree.offset[i],
        })?;
    }
    if flags.contains(RealizationFlags::TRANSFORM) {
        channel.send_command(Command::SetTransform {
            visual: handle,
            transform: tree.transform[i],
        })?;
    }
    if flags.contains(RealizationFlags::CLIP) {
        channel.send_command(Command::SetClip {
            visual: handle,
            clip: tree.clip[i].clone(),
        })?;
    }
    if flags.contains(RealizationFlags::OPACITY) {
        channel.send_command(Command::SetOpacity {
            visual: handle,
            opacity: tree.opacity[i],
        })?;
    }
    if flags.contains(RealizationFlags::OPACITY_MASK) {
        let new = tree.opacity_mask[i];
        let old = find_proxy(&tree.proxies[i], chan_id).and_then(|p| p.mask);
        if old != new {
            swap_resource_ref(arena, channel, old, new)?;
            if let Some(proxy) = find_proxy_mut(&mut tree.proxies[i], chan_id) {
                proxy.mask = new;
            }
        }
        let brush = new.map_or(ResourceHandle::NULL, |id| arena.handle_on_channel(id, chan_id));
        channel.send_command(Command::SetOpacityMask {
            visual: handle,
            brush,
        })?;
    }
    if flags.contains(RealizationFlags::CONTENT) {
        let new = tree.content[i].as_ref().map(|d| d.id());
        let old = find_proxy(&tree.proxies[i], chan_id).and_then(|p| p.content);
        if old != new {
            swap_resource_ref(arena, channel, old, new)?;
            if let Some(proxy) = find_proxy_mut(&mut tree.proxies[i], chan_id) {
                proxy.content = new;
            }
        }
        let drawing = new.map_or(ResourceHandle::NULL, |id| arena.handle_on_channel(id, chan_id));
        channel.send_command(Command::SetContent {
            visual: handle,
            drawing,
        })?;
    }
    if flags.contains(RealizationFlags::SCALING_MODE) {
        channel.send_command(Command::SetScalingMode {
            visual: handle,
            mode: tree.scaling_mode[i],
        })?;
    }
    if flags.contains(RealizationFlags::EFFECT) {
        channel.send_command(Command::SetEffect {
            visual: handle,
            effect: tree.effect[i],
        })?;
    }
    if flags.contains(RealizationFlags::CACHE_MODE) {
        channel.send_command(Command::SetCacheMode {
            visual: handle,
            cache: tree.cache_mode[i],
        })?;
    }
    if flags.contains(RealizationFlags::GUIDELINES) {
        channel.send_command(Command::SetGuidelines {
            visual: handle,
            guidelines: tree.guidelines[i].clone(),
        })?;
    }
    if flags.contains(RealizationFlags::CLEARTYPE_HINT) {
        channel.send_command(Command::SetClearTypeHint {
            visual: handle,
            hint: tree.cleartype_hint[i],
        })?;
    }
    if flags.contains(RealizationFlags::TEXT_RENDERING) {
        channel.send_command(Command::SetTextRenderingMode {
            visual: handle,
            mode: tree.text_rendering[i],
        })?;
    }
    if flags.contains(RealizationFlags::TEXT_HINTING) {
        channel.send_command(Command::SetTextHintingMode {
            visual: handle,
            mode: tree.text_hinting[i],
        })?;
    }
    Ok(())
}

/// Releases `old` and add-refs `new` on the channel, in that order.
fn swap_resource_ref(
    arena: &mut ResourceArena,
    channel: &mut RenderChannel,
    old: Option<ResourceId>,
    new: Option<ResourceId>,
) -> Result<()> {
    if let Some(old) = old {
        let _ = arena.release_on_channel(old, channel)?;
    }
    if let Some(new) = new {
        let _ = arena.create_or_add_ref_on_channel(new, channel)?;
    }
    Ok(())
}

/// Releases `idx`'s whole subtree from `channel`: children first, each
/// visual's content and mask references, then the visual itself.
///
/// Visuals with no realization on `channel` are skipped.
pub(crate) fn unrealize_subtree(
    tree: &mut VisualTree,
    arena: &mut ResourceArena,
    channel: &mut RenderChannel,
    idx: u32,
) -> Result<()> {
    let mut child = tree.first_child[idx as usize];
    while child != INVALID {
        unrealize_subtree(tree, arena, channel, child)?;
        child = tree.next_sibling[child as usize];
    }

    let chan_id = channel.id();
    let proxies = &mut tree.proxies[idx as usize];
    if let Some(pos) = proxies.iter().position(|p| p.channel == chan_id) {
        let proxy = proxies.remove(pos);
        if let Some(content) = proxy.content {
            let _ = arena.release_on_channel(content, channel)?;
        }
        if let Some(mask) = proxy.mask {
            let _ = arena.release_on_channel(mask, channel)?;
        }
        channel.send_command(Command::ReleaseResource {
            handle: proxy.handle,
        })?;
        channel.free_handle(proxy.handle);
    }
    Ok(())
}
