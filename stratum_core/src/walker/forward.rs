// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replay of recorded content onto a live drawing context.

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::{DrawingContext, Pen};
use crate::error::{CompositionError, Result};
use crate::resource::ResourceId;
use crate::walker::ContentWalker;

/// Forwards every replayed call onto a live [`DrawingContext`].
///
/// Used for drawing-within-drawing composition: replaying one recording into
/// another flattens nested drawings into the target. The first context error
/// stops the walk and is returned by [`finish`](Self::finish).
#[derive(Debug)]
pub struct ForwardingWalker<'a, C: ?Sized> {
    ctx: &'a mut C,
    error: Option<CompositionError>,
}

impl<'a, C: DrawingContext + ?Sized> ForwardingWalker<'a, C> {
    /// Creates a walker forwarding onto `ctx`.
    pub fn new(ctx: &'a mut C) -> Self {
        Self { ctx, error: None }
    }

    /// Returns the first context error encountered during the walk, if any.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: Result<()>) {
        if self.error.is_none()
            && let Err(err) = result
        {
            self.error = Some(err);
        }
    }
}

impl<C: DrawingContext + ?Sized> ContentWalker for ForwardingWalker<'_, C> {
    fn stop_requested(&self) -> bool {
        self.error.is_some()
    }

    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) {
        let r = self.ctx.draw_line(pen, p0, p1);
        self.record(r);
    }

    fn draw_rectangle(&mut self, brush: Option<ResourceId>, pen: Option<&Pen>, rect: Rect) {
        let r = self.ctx.draw_rectangle(brush, pen, rect);
        self.record(r);
    }

    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) {
        let r = self.ctx.draw_rounded_rectangle(brush, pen, rect);
        self.record(r);
    }

    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) {
        let r = self.ctx.draw_ellipse(brush, pen, ellipse);
        self.record(r);
    }

    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) {
        let r = self.ctx.draw_geometry(brush, pen, geometry);
        self.record(r);
    }

    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) {
        let r = self.ctx.draw_image(image, rect);
        self.record(r);
    }

    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) {
        let r = self.ctx.draw_media(media, rect);
        self.record(r);
    }

    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) {
        let r = self.ctx.draw_glyph_run(brush, run);
        self.record(r);
    }

    fn push_transform(&mut self, transform: Affine) {
        let r = self.ctx.push_transform(transform);
        self.record(r);
    }

    fn push_clip(&mut self, clip: &Geometry) {
        let r = self.ctx.push_clip(clip);
        self.record(r);
    }

    fn push_opacity(&mut self, opacity: f64) {
        let r = self.ctx.push_opacity(opacity);
        self.record(r);
    }

    fn push_opacity_mask(&mut self, brush: ResourceId) {
        let r = self.ctx.push_opacity_mask(brush);
        self.record(r);
    }

    fn push_guidelines(&mut self, guidelines: &GuidelineSet) {
        let r = self.ctx.push_guidelines(guidelines);
        self.record(r);
    }

    fn pop(&mut self) {
        let r = self.ctx.pop();
        self.record(r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DrawingRecorder;

    #[test]
    fn forwarding_reproduces_the_op_sequence() {
        let mut rec = DrawingRecorder::new();
        rec.push_opacity(0.5).unwrap();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let original = rec.close().unwrap();

        let mut target = DrawingRecorder::new();
        let mut fw = ForwardingWalker::new(&mut target);
        original.walk(&mut fw);
        fw.finish().unwrap();
        let copy = target.close().unwrap();

        assert_eq!(copy.ops().len(), original.ops().len());
    }

    #[test]
    fn context_error_stops_the_walk() {
        let mut rec = DrawingRecorder::new();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        let original = rec.close().unwrap();

        // A closed target rejects every call.
        let mut target = DrawingRecorder::new();
        let _ = target.close().unwrap();
        let mut fw = ForwardingWalker::new(&mut target);
        original.walk(&mut fw);
        assert!(fw.finish().is_err());
    }
}
