// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command replay over recorded content.
//!
//! A walker is a drawing-context-shaped visitor: it receives every recorded
//! operation in order, overriding the subset it cares about (all methods
//! default to no-ops). [`DrawingContent::walk`] is the replay driver. It
//! processes ops strictly in recorded order, recurses into nested drawings
//! with the *same* walker instance (so the walker's stacks apply through the
//! nesting boundary), and checks [`ContentWalker::stop_requested`] after
//! every call — cooperative early exit, never an unwind.
//!
//! Three canonical consumers:
//!
//! - [`ForwardingWalker`] replays onto a live [`DrawingContext`], flattening
//!   nested drawings into the target recording.
//! - [`BoundsWalker`] accumulates an axis-aligned bounding rectangle.
//! - [`PointHitWalker`] / [`GeometryHitWalker`] answer hit queries.
//!
//! Walker stacks are private per instance, so any number of walkers can
//! replay the same content concurrently.
//!
//! [`DrawingContext`]: crate::drawing::DrawingContext

mod bounds;
mod forward;
mod hit_geometry;
mod hit_point;

pub use bounds::BoundsWalker;
pub use forward::ForwardingWalker;
pub use hit_geometry::GeometryHitWalker;
pub use hit_point::PointHitWalker;

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::{DrawOp, DrawingContent, Pen};
use crate::resource::ResourceId;

/// A visitor over recorded drawing operations.
///
/// Every method defaults to a no-op; implementations override what they
/// need. Nested drawings are not surfaced as calls — the driver recurses
/// into their content directly.
pub trait ContentWalker {
    /// Checked by the driver after every call; `true` ends the walk.
    fn stop_requested(&self) -> bool {
        false
    }

    /// A stroked line segment.
    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) {
        let _ = (pen, p0, p1);
    }

    /// A filled and/or stroked rectangle.
    fn draw_rectangle(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, rect: Rect) {
        let _ = (brush, pen, rect);
    }

    /// A filled and/or stroked rounded rectangle.
    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) {
        let _ = (brush, pen, rect);
    }

    /// A filled and/or stroked ellipse.
    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) {
        let _ = (brush, pen, ellipse);
    }

    /// A filled and/or stroked geometry.
    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) {
        let _ = (brush, pen, geometry);
    }

    /// An image in a destination rectangle.
    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) {
        let _ = (image, rect);
    }

    /// A media frame in a destination rectangle.
    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) {
        let _ = (media, rect);
    }

    /// A filled glyph run.
    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) {
        let _ = (brush, run);
    }

    /// A transform scope opens.
    fn push_transform(&mut self, transform: Affine) {
        let _ = transform;
    }

    /// A clip scope opens.
    fn push_clip(&mut self, clip: &Geometry) {
        let _ = clip;
    }

    /// An opacity scope opens.
    fn push_opacity(&mut self, opacity: f64) {
        let _ = opacity;
    }

    /// An opacity-mask scope opens.
    fn push_opacity_mask(&mut self, brush: ResourceId) {
        let _ = brush;
    }

    /// A guideline scope opens.
    fn push_guidelines(&mut self, guidelines: &GuidelineSet) {
        let _ = guidelines;
    }

    /// The innermost open scope closes.
    fn pop(&mut self) {}
}

impl DrawingContent {
    /// Replays this recording against `walker`.
    ///
    /// Ops are visited strictly in recorded order; nested drawings are
    /// entered with the same walker instance. The walk ends early as soon as
    /// the walker requests a stop.
    pub fn walk<W: ContentWalker + ?Sized>(&self, walker: &mut W) {
        for op in &self.ops {
            match op {
                DrawOp::Line { pen, p0, p1 } => walker.draw_line(pen.as_ref(), *p0, *p1),
                DrawOp::Rect { brush, pen, rect } => {
                    walker.draw_rectangle(*brush, pen.as_ref(), *rect);
                }
                DrawOp::RoundedRect { brush, pen, rect } => {
                    walker.draw_rounded_rectangle(*brush, pen.as_ref(), *rect);
                }
                DrawOp::Ellipse {
                    brush,
                    pen,
                    ellipse,
                } => walker.draw_ellipse(*brush, pen.as_ref(), *ellipse),
                DrawOp::Geometry {
                    brush,
                    pen,
                    geometry,
                } => walker.draw_geometry(*brush, pen.as_ref(), geometry),
                DrawOp::Image { image, rect } => walker.draw_image(*image, *rect),
                DrawOp::Media { media, rect } => walker.draw_media(*media, *rect),
                DrawOp::GlyphRun { brush, run } => walker.draw_glyph_run(*brush, run),
                DrawOp::Drawing { drawing } => drawing.content.walk(walker),
                DrawOp::PushTransform(t) => walker.push_transform(*t),
                DrawOp::PushClip(clip) => walker.push_clip(clip),
                DrawOp::PushOpacity(o) => walker.push_opacity(*o),
                DrawOp::PushOpacityMask(brush) => walker.push_opacity_mask(*brush),
                DrawOp::PushGuidelines(g) => walker.push_guidelines(g),
                DrawOp::Pop => walker.pop(),
            }
            if walker.stop_requested() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{DrawingContext as _, DrawingRecorder};

    #[derive(Default)]
    struct CountingWalker {
        rects: usize,
        pushes: usize,
        pops: usize,
        stop_after: Option<usize>,
    }

    impl ContentWalker for CountingWalker {
        fn stop_requested(&self) -> bool {
            self.stop_after.is_some_and(|n| self.rects >= n)
        }

        fn draw_rectangle(&mut self, _brush: Option<ResourceId>, _pen: Option<&Pen>, _rect: Rect) {
            self.rects += 1;
        }

        fn push_opacity(&mut self, _opacity: f64) {
            self.pushes += 1;
        }

        fn pop(&mut self) {
            self.pops += 1;
        }
    }

    fn two_rect_content() -> DrawingContent {
        let mut rec = DrawingRecorder::new();
        rec.push_opacity(0.5).unwrap();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        rec.draw_rectangle(None, None, Rect::new(1.0, 1.0, 2.0, 2.0))
            .unwrap();
        rec.pop().unwrap();
        rec.close().unwrap()
    }

    #[test]
    fn walks_all_ops_in_order() {
        let content = two_rect_content();
        let mut w = CountingWalker::default();
        content.walk(&mut w);
        assert_eq!(w.rects, 2);
        assert_eq!(w.pushes, 1);
        assert_eq!(w.pops, 1);
    }

    #[test]
    fn stop_requested_ends_the_walk() {
        let content = two_rect_content();
        let mut w = CountingWalker {
            stop_after: Some(1),
            ..CountingWalker::default()
        };
        content.walk(&mut w);
        assert_eq!(w.rects, 1, "walk should stop after the first rectangle");
        assert_eq!(w.pops, 0);
    }

    #[test]
    fn concurrent_walks_share_content() {
        let content = std::sync::Arc::new(two_rect_content());
        let a = std::sync::Arc::clone(&content);
        let handle = std::thread::spawn(move || {
            let mut w = CountingWalker::default();
            a.walk(&mut w);
            w.rects
        });
        let mut w = CountingWalker::default();
        content.walk(&mut w);
        assert_eq!(w.rects, 2);
        assert_eq!(handle.join().unwrap(), 2);
    }
}
