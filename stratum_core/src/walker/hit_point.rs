// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point hit-testing over recorded content.

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::Pen;
use crate::geometry;
use crate::resource::ResourceId;
use crate::walker::ContentWalker;

/// Tests whether a point hits any drawable primitive of replayed content.
///
/// The walker carries the test point through transform scopes by applying
/// each pushed transform's inverse. A non-invertible pushed transform, or a
/// clip scope that excludes the current point, turns the whole layer into a
/// no-op ("cannot ever hit") until the matching pop; a depth counter keeps
/// nested no-op layers balanced. The walk stops at the first hit.
///
/// A primitive hits only when it is drawable at the point: a fill needs a
/// brush and containment, a stroke needs a pen with a brush and proximity
/// within half the pen thickness. Null brush and null pen never hit.
#[derive(Debug)]
pub struct PointHitWalker {
    point: Point,
    stack: Vec<Saved>,
    noop_depth: u32,
    hit: bool,
}

#[derive(Debug)]
enum Saved {
    Point(Point),
    Neutral,
}

impl PointHitWalker {
    /// Creates a walker testing `point` (in the content's local space).
    #[must_use]
    pub fn new(point: Point) -> Self {
        Self {
            point,
            stack: Vec::new(),
            noop_depth: 0,
            hit: false,
        }
    }

    /// Whether any primitive was hit.
    #[must_use]
    pub fn was_hit(&self) -> bool {
        self.hit
    }

    fn active(&self) -> bool {
        self.noop_depth == 0 && !self.hit
    }

    /// Enters a no-op layer, or deepens the current one.
    fn enter_noop(&mut self) {
        self.noop_depth += 1;
    }

    fn pen_visible(pen: Option<&Pen>) -> bool {
        pen.is_some_and(|p| p.brush.is_some() && p.thickness > 0.0)
    }

    fn hit_shape(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, shape: &Geometry) {
        if !self.active() {
            return;
        }
        if brush.is_some() && geometry::contains(shape, self.point) {
            self.hit = true;
            return;
        }
        if Self::pen_visible(pen) {
            let half = pen.map_or(0.0, |p| p.thickness / 2.0);
            if geometry::stroke_contains(&geometry::to_path(shape), self.point, half) {
                self.hit = true;
            }
        }
    }
}

impl ContentWalker for PointHitWalker {
    fn stop_requested(&self) -> bool {
        self.hit
    }

    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) {
        if !self.active() || !Self::pen_visible(pen) {
            return;
        }
        let half = pen.map_or(0.0, |p| p.thickness / 2.0);
        if geometry::segment_stroke_contains(p0, p1, self.point, half) {
            self.hit = true;
        }
    }

    fn draw_rectangle(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, rect: Rect) {
        self.hit_shape(brush, pen, &Geometry::Rect(rect));
    }

    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) {
        self.hit_shape(brush, pen, &Geometry::RoundedRect(rect));
    }

    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) {
        self.hit_shape(brush, pen, &Geometry::Ellipse(ellipse));
    }

    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) {
        self.hit_shape(brush, pen, geometry);
    }

    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) {
        if self.active() && image.is_some() && rect.contains(self.point) {
            self.hit = true;
        }
    }

    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) {
        if self.active() && media.is_some() && rect.contains(self.point) {
            self.hit = true;
        }
    }

    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) {
        if self.active() && brush.is_some() && run.approximate_bounds().contains(self.point) {
            self.hit = true;
        }
    }

    fn push_transform(&mut self, transform: Affine) {
        if self.noop_depth > 0 {
            self.enter_noop();
            return;
        }
        let det = transform.determinant();
        if det == 0.0 || !det.is_finite() {
            self.enter_noop();
            return;
        }
        self.stack.push(Saved::Point(self.point));
        self.point = transform.inverse() * self.point;
    }

    fn push_clip(&mut self, clip: &Geometry) {
        if self.noop_depth > 0 {
            self.enter_noop();
            return;
        }
        if geometry::contains(clip, self.point) {
            self.stack.push(Saved::Neutral);
        } else {
            self.enter_noop();
        }
    }

    fn push_opacity(&mut self, _opacity: f64) {
        if self.noop_depth > 0 {
            self.enter_noop();
        } else {
            self.stack.push(Saved::Neutral);
        }
    }

    fn push_opacity_mask(&mut self, _brush: ResourceId) {
        if self.noop_depth > 0 {
            self.enter_noop();
        } else {
            self.stack.push(Saved::Neutral);
        }
    }

    fn push_guidelines(&mut self, _guidelines: &GuidelineSet) {
        if self.noop_depth > 0 {
            self.enter_noop();
        } else {
            self.stack.push(Saved::Neutral);
        }
    }

    fn pop(&mut self) {
        if self.noop_depth > 0 {
            self.noop_depth -= 1;
            return;
        }
        match self.stack.pop() {
            Some(Saved::Point(p)) => self.point = p,
            Some(Saved::Neutral) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{DrawingContent, DrawingContext as _, DrawingRecorder};
    use crate::resource::ResourceId;

    fn brush() -> ResourceId {
        // Hit testing only checks presence, never dereferences.
        ResourceId {
            idx: 0,
            generation: 0,
        }
    }

    fn hit(content: &DrawingContent, x: f64, y: f64) -> bool {
        let mut w = PointHitWalker::new(Point::new(x, y));
        content.walk(&mut w);
        w.was_hit()
    }

    #[test]
    fn filled_rect_hits_inside() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert!(hit(&content, 5.0, 5.0));
        assert!(!hit(&content, 15.0, 5.0));
    }

    #[test]
    fn null_brush_and_pen_never_hit() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert!(!hit(&content, 5.0, 5.0));
    }

    #[test]
    fn stroke_hits_near_outline_only() {
        let mut rec = DrawingRecorder::new();
        let pen = Pen::new(brush(), 2.0);
        rec.draw_rectangle(None, Some(&pen), Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert!(hit(&content, 0.5, 5.0), "within half thickness of the edge");
        assert!(!hit(&content, 5.0, 5.0), "interior is not stroked");
    }

    #[test]
    fn transform_is_inverted_for_the_point() {
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::translate((100.0, 0.0))).unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert!(hit(&content, 105.0, 5.0));
        assert!(!hit(&content, 5.0, 5.0));
    }

    #[test]
    fn non_invertible_transform_blocks_subtree() {
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::scale(0.0)).unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        // Back outside the degenerate layer: this one is hittable.
        rec.draw_rectangle(Some(brush()), None, Rect::new(20.0, 0.0, 30.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert!(!hit(&content, 0.0, 0.0));
        assert!(!hit(&content, 5.0, 5.0));
        assert!(hit(&content, 25.0, 5.0));
    }

    #[test]
    fn nested_noop_layers_unwind_with_all_pops() {
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::scale(0.0)).unwrap();
        rec.push_transform(Affine::translate((1.0, 1.0))).unwrap();
        rec.push_clip(&Geometry::Rect(Rect::new(0.0, 0.0, 1.0, 1.0)))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        rec.pop().unwrap();
        rec.pop().unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert!(
            hit(&content, 5.0, 5.0),
            "no-op state must clear only after all matching pops"
        );
    }

    #[test]
    fn clip_excluding_point_blocks_layer() {
        let mut rec = DrawingRecorder::new();
        rec.push_clip(&Geometry::Rect(Rect::new(0.0, 0.0, 2.0, 2.0)))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert!(hit(&content, 1.0, 1.0));
        assert!(!hit(&content, 5.0, 5.0));
    }

    #[test]
    fn image_hits_only_with_resource() {
        let mut rec = DrawingRecorder::new();
        rec.draw_image(None, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let missing = rec.close().unwrap();
        assert!(!hit(&missing, 5.0, 5.0));

        let mut rec = DrawingRecorder::new();
        rec.draw_image(Some(brush()), Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let present = rec.close().unwrap();
        assert!(hit(&present, 5.0, 5.0));
    }
}
