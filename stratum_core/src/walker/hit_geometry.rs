// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry hit-testing over recorded content.

use kurbo::{Affine, BezPath, Point, Rect, Shape as _};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::Pen;
use crate::geometry::{self, IntersectionDetail};
use crate::resource::ResourceId;
use crate::walker::ContentWalker;

/// Classifies how a test geometry relates to replayed content.
///
/// Unlike the point walker, this walker never needs a transform inverse: it
/// keeps the accumulated push matrix and maps each primitive (and each clip)
/// *forward* into the test geometry's space before classifying. Per-primitive
/// details accumulate under the rule: a fully-contains result is maximal and
/// stops the walk early; fully-inside combined with empty, in either order,
/// degrades to intersects; intersects absorbs everything else.
#[derive(Debug)]
pub struct GeometryHitWalker {
    test: BezPath,
    transform: Affine,
    stack: Vec<Saved>,
    clips: Vec<BezPath>,
    detail: Option<IntersectionDetail>,
    stop: bool,
}

#[derive(Debug)]
enum Saved {
    Transform(Affine),
    Clip,
    Neutral,
}

impl GeometryHitWalker {
    /// Creates a walker testing `test` (in the content's local space).
    #[must_use]
    pub fn new(test: BezPath) -> Self {
        Self::with_transform(test, Affine::IDENTITY)
    }

    /// Creates a walker whose content lives `transform` away from the test
    /// geometry's space.
    #[must_use]
    pub fn with_transform(test: BezPath, transform: Affine) -> Self {
        Self {
            test,
            transform,
            stack: Vec::new(),
            clips: Vec::new(),
            detail: None,
            stop: false,
        }
    }

    /// The accumulated classification; [`IntersectionDetail::Empty`] if no
    /// drawable primitive contributed.
    #[must_use]
    pub fn detail(&self) -> IntersectionDetail {
        self.detail.unwrap_or(IntersectionDetail::Empty)
    }

    /// Installs an ambient clip (already in test space) that outlives every
    /// scope of the walked content. Used for clips inherited from the
    /// visual tree above the content being walked.
    pub fn clip_to(&mut self, clip: BezPath) {
        self.clips.push(clip);
    }

    fn drawable(brush: Option<ResourceId>, pen: Option<&Pen>) -> bool {
        brush.is_some() || pen.is_some_and(|p| p.brush.is_some() && p.thickness > 0.0)
    }

    fn contribute_path(&mut self, local: BezPath) {
        let prim = self.transform * local;
        let mut detail = geometry::classify(&self.test, &prim);
        if detail != IntersectionDetail::Empty {
            for clip in &self.clips {
                let test_vs_clip = geometry::classify(&self.test, clip);
                if test_vs_clip == IntersectionDetail::Empty
                    || geometry::classify(clip, &prim) == IntersectionDetail::Empty
                {
                    detail = IntersectionDetail::Empty;
                    break;
                }
                // A clip that cuts into the test region invalidates any
                // claim that the test region is covered by the primitive.
                if test_vs_clip != IntersectionDetail::FullyInside
                    && detail == IntersectionDetail::FullyInside
                {
                    detail = IntersectionDetail::Intersects;
                }
            }
        }
        self.combine(detail);
    }

    fn combine(&mut self, detail: IntersectionDetail) {
        use IntersectionDetail::{Empty, FullyContains, FullyInside, Intersects};
        let acc = match self.detail {
            None => detail,
            Some(acc) => match (acc, detail) {
                (a, b) if a == b => a,
                (_, FullyContains) | (FullyContains, _) => FullyContains,
                (FullyInside, Empty) | (Empty, FullyInside) => Intersects,
                _ => Intersects,
            },
        };
        if acc == FullyContains {
            self.stop = true;
        }
        self.detail = Some(acc);
    }

    fn shape(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, shape: &Geometry) {
        if Self::drawable(brush, pen) {
            self.contribute_path(geometry::to_path(shape));
        }
    }
}

impl ContentWalker for GeometryHitWalker {
    fn stop_requested(&self) -> bool {
        self.stop
    }

    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) {
        if Self::drawable(None, pen) {
            let mut path = BezPath::new();
            path.move_to(p0);
            path.line_to(p1);
            self.contribute_path(path);
        }
    }

    fn draw_rectangle(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, rect: Rect) {
        self.shape(brush, pen, &Geometry::Rect(rect));
    }

    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) {
        self.shape(brush, pen, &Geometry::RoundedRect(rect));
    }

    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) {
        self.shape(brush, pen, &Geometry::Ellipse(ellipse));
    }

    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) {
        self.shape(brush, pen, geometry);
    }

    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) {
        if image.is_some() {
            self.contribute_path(rect.to_path(0.1));
        }
    }

    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) {
        if media.is_some() {
            self.contribute_path(rect.to_path(0.1));
        }
    }

    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) {
        if brush.is_some() {
            self.contribute_path(run.approximate_bounds().to_path(0.1));
        }
    }

    fn push_transform(&mut self, transform: Affine) {
        self.stack.push(Saved::Transform(self.transform));
        self.transform = self.transform * transform;
    }

    fn push_clip(&mut self, clip: &Geometry) {
        self.clips.push(self.transform * geometry::to_path(clip));
        self.stack.push(Saved::Clip);
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
            Some(Saved::Clip) => {
                let _ = self.clips.pop();
            }
            Some(Saved::Neutral) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{DrawingContent, DrawingContext as _, DrawingRecorder};

    fn brush() -> ResourceId {
        ResourceId {
            idx: 0,
            generation: 0,
        }
    }

    fn rect_test(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        Rect::new(x0, y0, x1, y1).to_path(0.1)
    }

    fn detail_of(content: &DrawingContent, test: BezPath) -> IntersectionDetail {
        let mut w = GeometryHitWalker::new(test);
        content.walk(&mut w);
        w.detail()
    }

    fn one_rect(rect: Rect) -> DrawingContent {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush()), None, rect).unwrap();
        rec.close().unwrap()
    }

    #[test]
    fn disjoint_content_is_empty() {
        let content = one_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            detail_of(&content, rect_test(50.0, 50.0, 60.0, 60.0)),
            IntersectionDetail::Empty
        );
    }

    #[test]
    fn test_inside_primitive_is_fully_inside() {
        let content = one_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            detail_of(&content, rect_test(2.0, 2.0, 4.0, 4.0)),
            IntersectionDetail::FullyInside
        );
    }

    #[test]
    fn test_around_primitive_fully_contains() {
        let content = one_rect(Rect::new(4.0, 4.0, 6.0, 6.0));
        assert_eq!(
            detail_of(&content, rect_test(0.0, 0.0, 10.0, 10.0)),
            IntersectionDetail::FullyContains
        );
    }

    #[test]
    fn overlap_intersects() {
        let content = one_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            detail_of(&content, rect_test(5.0, 5.0, 15.0, 15.0)),
            IntersectionDetail::Intersects
        );
    }

    #[test]
    fn undrawable_primitives_do_not_contribute() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(2.0, 2.0, 4.0, 4.0)),
            IntersectionDetail::Empty
        );
    }

    #[test]
    fn fully_inside_then_empty_degrades_to_intersects() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(50.0, 50.0, 60.0, 60.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(2.0, 2.0, 4.0, 4.0)),
            IntersectionDetail::Intersects
        );
    }

    #[test]
    fn empty_then_fully_inside_degrades_to_intersects() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush()), None, Rect::new(50.0, 50.0, 60.0, 60.0))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(2.0, 2.0, 4.0, 4.0)),
            IntersectionDetail::Intersects
        );
    }

    #[test]
    fn fully_contains_stops_the_walk_early() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(Some(brush()), None, Rect::new(4.0, 4.0, 6.0, 6.0))
            .unwrap();
        // Disjoint from the test region: would degrade the answer to
        // Intersects if the walk continued past the maximal result.
        rec.draw_rectangle(Some(brush()), None, Rect::new(50.0, 50.0, 60.0, 60.0))
            .unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(0.0, 0.0, 10.0, 10.0)),
            IntersectionDetail::FullyContains
        );
    }

    #[test]
    fn transform_maps_primitive_into_test_space() {
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::translate((100.0, 0.0))).unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(102.0, 2.0, 104.0, 4.0)),
            IntersectionDetail::FullyInside
        );
        assert_eq!(
            detail_of(&content, rect_test(2.0, 2.0, 4.0, 4.0)),
            IntersectionDetail::Empty
        );
    }

    #[test]
    fn collapsed_transform_classifies_as_empty() {
        // A degenerate forward mapping leaves the primitive with no area.
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::scale_non_uniform(0.0, 1.0)).unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        let detail = detail_of(&content, rect_test(50.0, 50.0, 60.0, 60.0));
        assert_eq!(detail, IntersectionDetail::Empty);
    }

    #[test]
    fn clip_disjoint_from_test_empties_contribution() {
        let mut rec = DrawingRecorder::new();
        rec.push_clip(&Geometry::Rect(Rect::new(50.0, 50.0, 60.0, 60.0)))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(0.0, 0.0, 10.0, 10.0)),
            IntersectionDetail::Empty
        );
    }

    #[test]
    fn partial_clip_caps_fully_inside_to_intersects() {
        let mut rec = DrawingRecorder::new();
        // The clip covers only part of the test region.
        rec.push_clip(&Geometry::Rect(Rect::new(0.0, 0.0, 3.0, 10.0)))
            .unwrap();
        rec.draw_rectangle(Some(brush()), None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert_eq!(
            detail_of(&content, rect_test(1.0, 1.0, 6.0, 6.0)),
            IntersectionDetail::Intersects
        );
    }
}
