// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding-box accumulation over recorded content.

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::Pen;
use crate::geometry;
use crate::resource::ResourceId;
use crate::walker::ContentWalker;

/// The unbounded rectangle: stands in for any bound that contained NaN.
pub(crate) const UNBOUNDED: Rect = Rect::new(
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::INFINITY,
);

/// Accumulates the axis-aligned bounding rectangle of replayed content.
///
/// The walker keeps a private transform stack and a clip rectangle stack.
/// Primitive bounds are computed first and clipped *after*, so a zero-area
/// clip empties everything it contains without geometry math. A bound with a
/// NaN coordinate is replaced by the unbounded rectangle, keeping unions
/// well-defined.
#[derive(Debug)]
pub struct BoundsWalker {
    transform: Affine,
    clip: Option<Rect>,
    stack: Vec<Saved>,
    accumulated: Option<Rect>,
}

#[derive(Debug)]
enum Saved {
    Transform(Affine),
    Clip(Option<Rect>),
    Neutral,
}

impl Default for BoundsWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsWalker {
    /// Creates a walker with an identity transform and no clip.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transform(Affine::IDENTITY)
    }

    /// Creates a walker whose results are mapped through `transform`.
    #[must_use]
    pub fn with_transform(transform: Affine) -> Self {
        Self {
            transform,
            clip: None,
            stack: Vec::new(),
            accumulated: None,
        }
    }

    /// The accumulated bounds; the empty rectangle if nothing contributed.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.accumulated.unwrap_or(Rect::ZERO)
    }

    fn add(&mut self, local: Rect, pen: Option<&Pen>) {
        let mut local = local;
        if let Some(pen) = pen {
            let half = pen.thickness / 2.0;
            local = local.inflate(half, half);
        }
        let mut world = geometry::transformed_rect_bounds(local, self.transform);
        if geometry::has_nan(world) {
            world = UNBOUNDED;
        }
        if let Some(clip) = self.clip {
            world = world.intersect(clip);
            if !geometry::is_positive_area(world) {
                return;
            }
        }
        self.accumulated = Some(match self.accumulated {
            None => world,
            Some(acc) => acc.union(world),
        });
    }
}

impl ContentWalker for BoundsWalker {
    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) {
        let rect = Rect::new(
            p0.x.min(p1.x),
            p0.y.min(p1.y),
            p0.x.max(p1.x),
            p0.y.max(p1.y),
        );
        self.add(rect, pen);
    }

    fn draw_rectangle(&mut self, _brush: Option<ResourceId>, pen: Option<&Pen>, rect: Rect) {
        self.add(rect, pen);
    }

    fn draw_rounded_rectangle(
        &mut self,
        _brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) {
        self.add(rect.rect(), pen);
    }

    fn draw_ellipse(
        &mut self,
        _brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) {
        self.add(geometry::bounds(&Geometry::Ellipse(ellipse)), pen);
    }

    fn draw_geometry(
        &mut self,
        _brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) {
        self.add(geometry::bounds(geometry), pen);
    }

    fn draw_image(&mut self, _image: Option<ResourceId>, rect: Rect) {
        self.add(rect, None);
    }

    fn draw_media(&mut self, _media: Option<ResourceId>, rect: Rect) {
        self.add(rect, None);
    }

    fn draw_glyph_run(&mut self, _brush: Option<ResourceId>, run: &GlyphRun) {
        self.add(run.approximate_bounds(), None);
    }

    fn push_transform(&mut self, transform: Affine) {
        self.stack.push(Saved::Transform(self.transform));
        self.transform = self.transform * transform;
    }

    fn push_clip(&mut self, clip: &Geometry) {
        self.stack.push(Saved::Clip(self.clip));
        let clip_world =
            geometry::transformed_rect_bounds(geometry::bounds(clip), self.transform);
        if !geometry::has_nan(clip_world) {
            self.clip = Some(match self.clip {
                None => clip_world,
                Some(existing) => existing.intersect(clip_world),
            });
        }
    }

    fn push_opacity(&mut self, _opacity: f64) {
        self.stack.push(Saved::Neutral);
    }

    fn push_opacity_mask(&mut self, _brush: ResourceId) {
        self.stack.push(Saved::Neutral);
    }

    fn push_guidelines(&mut self, _guidelines: &GuidelineSet) {
        self.stack.push(Saved::Neutral);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(Saved::Transform(t)) => self.transform = t,
            Some(Saved::Clip(c)) => self.clip = c,
            Some(Saved::Neutral) | None => {}
        }
    }
}
