// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with topology, properties, and the
//! two-domain dirty protocol.

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use stratum_wire::{
    BitmapScalingMode, CacheModeData, ChannelId, ClearTypeHint, EffectData, Geometry,
    GuidelineSet, TextHintingMode, TextRenderingMode,
};

use crate::drawing::Drawing;
use crate::error::{CompositionError, Result};
use crate::geometry::{self, IntersectionDetail};
use crate::resource::ResourceId;
use crate::visual::flags::RealizationFlags;
use crate::visual::id::{INVALID, VisualId};
use crate::visual::proxy::{self, VisualProxy};
use crate::walker::{BoundsWalker, GeometryHitWalker, PointHitWalker};

/// Struct-of-arrays storage for all visuals of one composition.
///
/// Visuals are addressed by [`VisualId`] handles. Each visual occupies a
/// slot in parallel arrays; destroyed visuals are recycled via a free list,
/// and generation counters turn stale handle access into a panic.
///
/// # Dirty domains
///
/// The *logical* domain is one subtree-dirty bit per visual, set by every
/// mutation and propagated upward with an early stop at the first
/// already-dirty ancestor; [`precompute`](Self::precompute) clears it while
/// refreshing cached bounds. The *realization* domain lives on the
/// per-channel [`VisualProxy`] records and is consumed by the compile pass.
#[derive(Debug, Default)]
pub(crate) struct VisualTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties (set by callers) --
    pub(crate) offset: Vec<Vec2>,
    pub(crate) transform: Vec<Option<Affine>>,
    pub(crate) clip: Vec<Option<Geometry>>,
    pub(crate) opacity: Vec<f64>,
    pub(crate) opacity_mask: Vec<Option<ResourceId>>,
    pub(crate) content: Vec<Option<Drawing>>,
    pub(crate) scaling_mode: Vec<BitmapScalingMode>,
    pub(crate) effect: Vec<Option<EffectData>>,
    pub(crate) cache_mode: Vec<Option<CacheModeData>>,
    pub(crate) guidelines: Vec<Option<GuidelineSet>>,
    pub(crate) cleartype_hint: Vec<ClearTypeHint>,
    pub(crate) text_rendering: Vec<TextRenderingMode>,
    pub(crate) text_hinting: Vec<TextHintingMode>,

    // -- Computed by precompute --
    pub(crate) content_bounds: Vec<Rect>,
    pub(crate) subtree_bounds: Vec<Rect>,

    // -- Dirty state --
    pub(crate) subtree_dirty: Vec<bool>,
    pub(crate) is_root: Vec<bool>,
    pub(crate) proxies: Vec<Vec<VisualProxy>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl VisualTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // -- Allocation --

    /// Creates a detached visual with default properties.
    pub(crate) fn create_visual(&mut self) -> VisualId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.offset[i] = Vec2::ZERO;
            self.transform[i] = None;
            self.clip[i] = None;
            self.opacity[i] = 1.0;
            self.opacity_mask[i] = None;
            self.content[i] = None;
            self.scaling_mode[i] = BitmapScalingMode::default();
            self.effect[i] = None;
            self.cache_mode[i] = None;
            self.guidelines[i] = None;
            self.cleartype_hint[i] = ClearTypeHint::default();
            self.text_rendering[i] = TextRenderingMode::default();
            self.text_hinting[i] = TextHintingMode::default();
            self.content_bounds[i] = Rect::ZERO;
            self.subtree_bounds[i] = Rect::ZERO;
            self.subtree_dirty[i] = true;
            self.is_root[i] = false;
            self.proxies[i].clear();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.offset.push(Vec2::ZERO);
            self.transform.push(None);
            self.clip.push(None);
            self.opacity.push(1.0);
            self.opacity_mask.push(None);
            self.content.push(None);
            self.scaling_mode.push(BitmapScalingMode::default());
            self.effect.push(None);
            self.cache_mode.push(None);
            self.guidelines.push(None);
            self.cleartype_hint.push(ClearTypeHint::default());
            self.text_rendering.push(TextRenderingMode::default());
            self.text_hinting.push(TextHintingMode::default());
            self.content_bounds.push(Rect::ZERO);
            self.subtree_bounds.push(Rect::ZERO);
            self.subtree_dirty.push(true);
            self.is_root.push(false);
            self.proxies.push(Vec::new());
            self.generation.push(0);
            idx
        };
        VisualId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a visual, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the visual still has children or a
    /// parent, it is a target root, or it is still realized on any channel.
    pub(crate) fn destroy_visual(&mut self, id: VisualId) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(
            self.first_child[i] == INVALID,
            "cannot destroy a visual with children"
        );
        assert!(
            self.parent[i] == INVALID,
            "cannot destroy an attached visual; remove it from its parent first"
        );
        assert!(
            !self.is_root[i],
            "cannot destroy a target root; clear the root first"
        );
        assert!(
            self.proxies[i].is_empty(),
            "cannot destroy a visual still realized on a channel"
        );
        self.generation[i] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live visual.
    pub(crate) fn is_alive(&self, id: VisualId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: VisualId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale VisualId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    // -- Topology --

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub(crate) fn add_child(&mut self, parent: VisualId, child: VisualId) -> Result<()> {
        self.validate(parent);
        self.validate(child);
        self.check_attachable(parent.idx, child.idx)?;

        let p = parent.idx;
        let c = child.idx;
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.propagate_logical(p);
        self.mark_realization(p, RealizationFlags::CHILDREN);
        Ok(())
    }

    /// Inserts `child` immediately before `sibling` in its parent's list.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub(crate) fn insert_before(&mut self, child: VisualId, sibling: VisualId) -> Result<()> {
        self.validate(child);
        self.validate(sibling);
        let s = sibling.idx;
        let p = self.parent[s as usize];
        if p == INVALID {
            return Err(CompositionError::configuration(
                "insertion sibling has no parent",
            ));
        }
        self.check_attachable(p, child.idx)?;

        let c = child.idx;
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];
        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.propagate_logical(p);
        self.mark_realization(p, RealizationFlags::CHILDREN);
        Ok(())
    }

    /// Severs `child` from its parent. The caller is responsible for
    /// releasing the subtree's per-channel realizations.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn remove_from_parent(&mut self, child: VisualId) -> Result<()> {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        if p == INVALID {
            return Err(CompositionError::configuration("visual has no parent"));
        }

        let prev = self.prev_sibling[c as usize];
        let next = self.next_sibling[c as usize];
        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[c as usize] = INVALID;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        self.propagate_logical(p);
        self.mark_realization(p, RealizationFlags::CHILDREN);
        Ok(())
    }

    /// Fails fast — before any mutation — when `child` cannot go under
    /// `parent`.
    fn check_attachable(&self, parent: u32, child: u32) -> Result<()> {
        if self.parent[child as usize] != INVALID {
            return Err(CompositionError::configuration(
                "visual already has a parent",
            ));
        }
        if self.is_root[child as usize] {
            return Err(CompositionError::configuration(
                "visual is the root of a composition target",
            ));
        }
        // Walk up from the attachment point; finding `child` there means the
        // attach would close a cycle.
        let mut a = parent;
        while a != INVALID {
            if a == child {
                return Err(CompositionError::configuration(
                    "attach would create a cycle",
                ));
            }
            a = self.parent[a as usize];
        }
        Ok(())
    }

    pub(crate) fn parent_of(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| VisualId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    pub(crate) fn id_at(&self, idx: u32) -> VisualId {
        VisualId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    // -- Dirty propagation --

    /// Upward logical invalidation: marks `idx` and its ancestors
    /// subtree-dirty, stopping at the first visual already marked.
    ///
    /// Idempotent and safe to call redundantly; the early stop bounds the
    /// cost by the depth of the first already-dirty ancestor.
    pub(crate) fn propagate_logical(&mut self, mut idx: u32) {
        loop {
            if self.subtree_dirty[idx as usize] {
                break;
            }
            self.subtree_dirty[idx as usize] = true;
            let p = self.parent[idx as usize];
            if p == INVALID {
                break;
            }
            idx = p;
        }
    }

    /// Marks `flags` on every channel realization of `idx` and raises the
    /// SUBTREE bit up the ancestor proxies of each such channel, stopping at
    /// the first ancestor already pending.
    pub(crate) fn mark_realization(&mut self, idx: u32, flags: RealizationFlags) {
        let channels: Vec<ChannelId> = self.proxies[idx as usize]
            .iter()
            .map(|p| p.channel)
            .collect();
        for channel in channels {
            if let Some(p) = proxy::find_mut(&mut self.proxies[idx as usize], channel) {
                p.flags |= flags;
            }
            let mut a = self.parent[idx as usize];
            while a != INVALID {
                match proxy::find_mut(&mut self.proxies[a as usize], channel) {
                    Some(p) if p.flags.contains(RealizationFlags::SUBTREE) => break,
                    Some(p) => p.flags |= RealizationFlags::SUBTREE,
                    None => break,
                }
                a = self.parent[a as usize];
            }
        }
    }

    fn mark(&mut self, idx: u32, flags: RealizationFlags) {
        self.propagate_logical(idx);
        self.mark_realization(idx, flags);
    }

    // -- Property setters --

    pub(crate) fn set_offset(&mut self, id: VisualId, offset: Vec2) {
        self.validate(id);
        self.offset[id.idx as usize] = offset;
        self.mark(id.idx, RealizationFlags::OFFSET);
    }

    pub(crate) fn set_transform(&mut self, id: VisualId, transform: Option<Affine>) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
        self.mark(id.idx, RealizationFlags::TRANSFORM);
    }

    pub(crate) fn set_clip(&mut self, id: VisualId, clip: Option<Geometry>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.mark(id.idx, RealizationFlags::CLIP);
    }

    pub(crate) fn set_opacity(&mut self, id: VisualId, opacity: f64) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
        self.mark(id.idx, RealizationFlags::OPACITY);
    }

    pub(crate) fn set_opacity_mask(&mut self, id: VisualId, mask: Option<ResourceId>) {
        self.validate(id);
        self.opacity_mask[id.idx as usize] = mask;
        self.mark(id.idx, RealizationFlags::OPACITY_MASK);
    }

    pub(crate) fn set_content(&mut self, id: VisualId, content: Option<Drawing>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.mark(id.idx, RealizationFlags::CONTENT);
    }

    pub(crate) fn set_scaling_mode(&mut self, id: VisualId, mode: BitmapScalingMode) {
        self.validate(id);
        self.scaling_mode[id.idx as usize] = mode;
        self.mark(id.idx, RealizationFlags::SCALING_MODE);
    }

    pub(crate) fn set_effect(&mut self, id: VisualId, effect: Option<EffectData>) {
        self.validate(id);
        self.effect[id.idx as usize] = effect;
        self.mark(id.idx, RealizationFlags::EFFECT);
    }

    pub(crate) fn set_cache_mode(&mut self, id: VisualId, cache: Option<CacheModeData>) {
        self.validate(id);
        self.cache_mode[id.idx as usize] = cache;
        self.mark(id.idx, RealizationFlags::CACHE_MODE);
    }

    pub(crate) fn set_guidelines(&mut self, id: VisualId, guidelines: Option<GuidelineSet>) {
        self.validate(id);
        self.guidelines[id.idx as usize] = guidelines;
        self.mark(id.idx, RealizationFlags::GUIDELINES);
    }

    pub(crate) fn set_cleartype_hint(&mut self, id: VisualId, hint: ClearTypeHint) {
        self.validate(id);
        self.cleartype_hint[id.idx as usize] = hint;
        self.mark(id.idx, RealizationFlags::CLEARTYPE_HINT);
    }

    pub(crate) fn set_text_rendering(&mut self, id: VisualId, mode: TextRenderingMode) {
        self.validate(id);
        self.text_rendering[id.idx as usize] = mode;
        self.mark(id.idx, RealizationFlags::TEXT_RENDERING);
    }

    pub(crate) fn set_text_hinting(&mut self, id: VisualId, mode: TextHintingMode) {
        self.validate(id);
        self.text_hinting[id.idx as usize] = mode;
        self.mark(id.idx, RealizationFlags::TEXT_HINTING);
    }

    // -- Precompute --

    /// Transform from a visual's local space to its parent's space.
    pub(crate) fn to_parent(&self, idx: u32) -> Affine {
        let i = idx as usize;
        Affine::translate(self.offset[i]) * self.transform[i].unwrap_or(Affine::IDENTITY)
    }

    /// The logical pass: visits every subtree-dirty visual once, recomputes
    /// cached content and subtree bounds bottom-up, and clears the flags.
    pub(crate) fn precompute(&mut self, root: u32) {
        if !self.subtree_dirty[root as usize] {
            return;
        }
        let mut child = self.first_child[root as usize];
        while child != INVALID {
            self.precompute(child);
            child = self.next_sibling[child as usize];
        }

        let content_bounds = match &self.content[root as usize] {
            Some(drawing) => {
                let mut walker = BoundsWalker::new();
                drawing.content().walk(&mut walker);
                walker.bounds()
            }
            None => Rect::ZERO,
        };
        self.content_bounds[root as usize] = content_bounds;

        let mut acc = geometry::is_positive_area(content_bounds).then_some(content_bounds);
        let mut child = self.first_child[root as usize];
        while child != INVALID {
            let sb = self.subtree_bounds[child as usize];
            if geometry::is_positive_area(sb) {
                let mapped = geometry::transformed_rect_bounds(sb, self.to_parent(child));
                acc = Some(match acc {
                    None => mapped,
                    Some(a) => a.union(mapped),
                });
            }
            child = self.next_sibling[child as usize];
        }
        if let (Some(a), Some(clip)) = (acc, &self.clip[root as usize]) {
            acc = Some(a.intersect(geometry::bounds(clip)));
        }
        self.subtree_bounds[root as usize] =
            acc.filter(|r| geometry::is_positive_area(*r)).unwrap_or(Rect::ZERO);
        self.subtree_dirty[root as usize] = false;
    }

    // -- Hit testing --

    /// Returns the topmost visual in `idx`'s subtree hit by `point` (given
    /// in `idx`'s local space).
    pub(crate) fn hit_test_point(&self, idx: u32, point: Point) -> Option<VisualId> {
        if let Some(clip) = &self.clip[idx as usize]
            && !geometry::contains(clip, point)
        {
            return None;
        }

        // Children draw above content, and later siblings above earlier
        // ones, so the search runs front to back.
        let mut kids = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            kids.push(child);
            child = self.next_sibling[child as usize];
        }
        for &child in kids.iter().rev() {
            let m = self.to_parent(child);
            let det = m.determinant();
            if det == 0.0 || !det.is_finite() {
                // A visual under a non-invertible transform can never be hit.
                continue;
            }
            let local = m.inverse() * point;
            if let Some(hit) = self.hit_test_point(child, local) {
                return Some(hit);
            }
        }

        if let Some(drawing) = &self.content[idx as usize] {
            let mut walker = PointHitWalker::new(point);
            drawing.content().walk(&mut walker);
            if walker.was_hit() {
                return Some(self.id_at(idx));
            }
        }
        None
    }

    /// Returns the topmost visual in `idx`'s subtree whose content relates
    /// non-trivially to `test`, along with the classification. `to_test`
    /// maps `idx`'s local space into the test geometry's space; `clips`
    /// accumulates ancestor visual clips in test space.
    pub(crate) fn hit_test_geometry(
        &self,
        idx: u32,
        test: &BezPath,
        to_test: Affine,
        clips: &mut Vec<BezPath>,
    ) -> Option<(VisualId, IntersectionDetail)> {
        let pushed = if let Some(clip) = &self.clip[idx as usize] {
            let clip_path = to_test * geometry::to_path(clip);
            if geometry::classify(test, &clip_path) == IntersectionDetail::Empty {
                return None;
            }
            clips.push(clip_path);
            true
        } else {
            false
        };

        let result = self.hit_test_geometry_below(idx, test, to_test, clips);

        if pushed {
            let _ = clips.pop();
        }
        result
    }

    fn hit_test_geometry_below(
        &self,
        idx: u32,
        test: &BezPath,
        to_test: Affine,
        clips: &mut Vec<BezPath>,
    ) -> Option<(VisualId, IntersectionDetail)> {
        let mut kids = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            kids.push(child);
            child = self.next_sibling[child as usize];
        }
        for &child in kids.iter().rev() {
            let m = to_test * self.to_parent(child);
            if let Some(hit) = self.hit_test_geometry(child, test, m, clips) {
                return Some(hit);
            }
        }

        if let Some(drawing) = &self.content[idx as usize] {
            let mut walker = GeometryHitWalker::with_transform(test.clone(), to_test);
            for clip in clips.iter() {
                walker.clip_to(clip.clone());
            }
            drawing.content().walk(&mut walker);
            let detail = walker.detail();
            if detail != IntersectionDetail::Empty {
                return Some((self.id_at(idx), detail));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        assert!(tree.is_alive(id));
        tree.destroy_visual(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = VisualTree::new();
        let id1 = tree.create_visual();
        tree.destroy_visual(id1);
        let id2 = tree.create_visual();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn attach_already_parented_fails_before_mutation() {
        let mut tree = VisualTree::new();
        let p1 = tree.create_visual();
        let p2 = tree.create_visual();
        let child = tree.create_visual();
        tree.add_child(p1, child).unwrap();

        let err = tree.add_child(p2, child).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
        assert_eq!(tree.parent_of(child), Some(p1), "no partial mutation");
        assert_eq!(tree.first_child[p2.idx as usize], INVALID);
    }

    #[test]
    fn attach_cycle_fails() {
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(a, b).unwrap();
        let err = tree.add_child(b, a).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn remove_severs_the_link() {
        let mut tree = VisualTree::new();
        let p = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(p, c).unwrap();
        tree.remove_from_parent(c).unwrap();
        assert_eq!(tree.parent_of(c), None);
        assert_eq!(tree.first_child[p.idx as usize], INVALID);
        assert!(tree.remove_from_parent(c).is_err(), "already detached");
    }

    #[test]
    fn insert_before_orders_siblings() {
        let mut tree = VisualTree::new();
        let p = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(p, a).unwrap();
        tree.add_child(p, c).unwrap();
        tree.insert_before(b, c).unwrap();

        let order: Vec<u32> = {
            let mut v = Vec::new();
            let mut cur = tree.first_child[p.idx as usize];
            while cur != INVALID {
                v.push(cur);
                cur = tree.next_sibling[cur as usize];
            }
            v
        };
        assert_eq!(order, vec![a.idx, b.idx, c.idx]);
    }

    #[test]
    fn logical_propagation_stops_at_dirty_ancestor() {
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();
        tree.precompute(a.idx);
        assert!(!tree.subtree_dirty[a.idx as usize]);

        tree.set_opacity(c, 0.5);
        assert!(tree.subtree_dirty[a.idx as usize]);
        assert!(tree.subtree_dirty[b.idx as usize]);
        assert!(tree.subtree_dirty[c.idx as usize]);

        // Redundant invalidation is idempotent.
        let before: Vec<bool> = tree.subtree_dirty.clone();
        tree.set_opacity(c, 0.25);
        tree.set_opacity(b, 0.75);
        assert_eq!(tree.subtree_dirty, before);
    }

    #[test]
    fn precompute_clears_dirty_and_caches_bounds() {
        use crate::drawing::{DrawingContext as _, DrawingRecorder};
        use std::sync::Arc;

        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let child = tree.create_visual();
        tree.add_child(root, child).unwrap();

        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        let drawing = Drawing {
            id: ResourceId {
                idx: 0,
                generation: 0,
            },
            content: Arc::new(content),
        };
        tree.set_content(child, Some(drawing));
        tree.set_offset(child, Vec2::new(5.0, 5.0));

        tree.precompute(root.idx);
        assert!(!tree.subtree_dirty[root.idx as usize]);
        assert!(!tree.subtree_dirty[child.idx as usize]);
        assert_eq!(
            tree.content_bounds[child.idx as usize],
            Rect::new(0.0, 0.0, 10.0, 10.0)
        );
        assert_eq!(
            tree.subtree_bounds[root.idx as usize],
            Rect::new(5.0, 5.0, 15.0, 15.0),
            "child bounds mapped by its offset"
        );
    }

    #[test]
    fn mark_realization_sets_own_bit_and_ancestor_subtree_bits() {
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();

        // Hand-realize all three on channel 0 with clean flags.
        let mut alloc = stratum_wire::HandleAllocator::new();
        for idx in [a.idx, b.idx, c.idx] {
            tree.proxies[idx as usize].push(VisualProxy::new(ChannelId(0), alloc.alloc()));
        }

        tree.set_opacity(c, 0.5);
        let flags_of = |tree: &VisualTree, idx: u32| tree.proxies[idx as usize][0].flags;
        assert!(flags_of(&tree, c.idx).contains(RealizationFlags::OPACITY));
        assert!(flags_of(&tree, b.idx).contains(RealizationFlags::SUBTREE));
        assert!(flags_of(&tree, a.idx).contains(RealizationFlags::SUBTREE));
        assert!(
            !flags_of(&tree, a.idx).contains(RealizationFlags::OPACITY),
            "ancestors get only the subtree bit"
        );

        // A second channel's realization stays untouched.
        tree.proxies[c.idx as usize].push(VisualProxy::new(ChannelId(1), alloc.alloc()));
        tree.set_opacity(c, 0.25);
        assert!(tree.proxies[c.idx as usize][1].flags.contains(RealizationFlags::OPACITY));
    }

    #[test]
    fn hit_test_point_prefers_topmost_sibling() {
        use crate::drawing::{DrawingContext as _, DrawingRecorder};
        use std::sync::Arc;

        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let below = tree.create_visual();
        let above = tree.create_visual();
        tree.add_child(root, below).unwrap();
        tree.add_child(root, above).unwrap();

        let brush = ResourceId {
            idx: 0,
            generation: 0,
        };
        for v in [below, above] {
            let mut rec = DrawingRecorder::new();
            rec.draw_rectangle(Some(brush), None, Rect::new(0.0, 0.0, 10.0, 10.0))
                .unwrap();
            let drawing = Drawing {
                id: brush,
                content: Arc::new(rec.close().unwrap()),
            };
            tree.set_content(v, Some(drawing));
        }

        let hit = tree.hit_test_point(root.idx, Point::new(5.0, 5.0));
        assert_eq!(hit, Some(above), "later sibling draws on top");
    }

    #[test]
    #[should_panic(expected = "stale VisualId")]
    fn stale_handle_panics() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.destroy_visual(id);
        tree.set_opacity(id, 0.5);
    }

    #[test]
    #[should_panic(expected = "cannot destroy a visual with children")]
    fn destroy_with_children_panics() {
        let mut tree = VisualTree::new();
        let p = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(p, c).unwrap();
        tree.destroy_visual(p);
    }
}
