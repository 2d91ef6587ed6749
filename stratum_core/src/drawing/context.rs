// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The abstract drawing surface.

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::{Drawing, Pen};
use crate::error::Result;
use crate::resource::ResourceId;

/// An ordered surface of drawing primitives and scope operators.
///
/// Push operations must balance 1:1 with [`pop`](Self::pop) within one
/// session. Implementations are [`DrawingRecorder`] (capture) and the
/// forwarding walker's target (replay into another recording).
///
/// [`DrawingRecorder`]: crate::drawing::DrawingRecorder
pub trait DrawingContext {
    /// Strokes a line segment.
    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) -> Result<()>;

    /// Fills and/or strokes a rectangle.
    fn draw_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: Rect,
    ) -> Result<()>;

    /// Fills and/or strokes a rounded rectangle.
    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) -> Result<()>;

    /// Fills and/or strokes an ellipse.
    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) -> Result<()>;

    /// Fills and/or strokes an arbitrary geometry.
    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) -> Result<()>;

    /// Draws an image into a rectangle.
    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) -> Result<()>;

    /// Draws the current frame of a media source into a rectangle.
    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) -> Result<()>;

    /// Fills a glyph run.
    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) -> Result<()>;

    /// Replays a nested drawing in place.
    fn draw_drawing(&mut self, drawing: &Drawing) -> Result<()>;

    /// Opens a transform scope.
    fn push_transform(&mut self, transform: Affine) -> Result<()>;

    /// Opens a clip scope.
    fn push_clip(&mut self, clip: &Geometry) -> Result<()>;

    /// Opens an opacity scope.
    fn push_opacity(&mut self, opacity: f64) -> Result<()>;

    /// Opens an opacity-mask scope.
    fn push_opacity_mask(&mut self, brush: ResourceId) -> Result<()>;

    /// Opens a guideline scope.
    fn push_guidelines(&mut self, guidelines: &GuidelineSet) -> Result<()>;

    /// Closes the innermost open scope.
    fn pop(&mut self) -> Result<()>;
}
