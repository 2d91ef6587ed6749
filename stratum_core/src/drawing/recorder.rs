// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capturing implementation of the drawing context.

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::drawing::content::{DrawOp, Drawing, DrawingContent, Pen};
use crate::drawing::context::DrawingContext;
use crate::error::{CompositionError, Result};
use crate::resource::ResourceId;

/// Records drawing operations into an immutable [`DrawingContent`].
///
/// The recorder tracks push/pop depth as it goes; [`close`](Self::close)
/// fails if any scope is left open, and every call after a successful close
/// fails with an invalid-operation error.
#[derive(Debug, Default)]
pub struct DrawingRecorder {
    ops: Vec<DrawOp>,
    resources: Vec<ResourceId>,
    depth: u32,
    closed: bool,
}

impl DrawingRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalizes the recording.
    ///
    /// Fails with an invalid-operation error if the recorder was already
    /// closed or if any push is missing its pop. On success the recorder is
    /// spent: all further calls fail.
    pub fn close(&mut self) -> Result<DrawingContent> {
        self.ensure_open()?;
        if self.depth != 0 {
            return Err(CompositionError::operation(
                "recording closed with unbalanced push/pop",
            ));
        }
        self.closed = true;
        Ok(DrawingContent {
            ops: core::mem::take(&mut self.ops),
            resources: core::mem::take(&mut self.resources),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CompositionError::operation(
                "drawing recorder is closed",
            ))
        } else {
            Ok(())
        }
    }

    fn reference(&mut self, id: ResourceId) {
        if !self.resources.contains(&id) {
            self.resources.push(id);
        }
    }

    fn reference_brush(&mut self, brush: Option<ResourceId>) {
        if let Some(id) = brush {
            self.reference(id);
        }
    }

    fn reference_pen(&mut self, pen: Option<&Pen>) {
        if let Some(pen) = pen
            && let Some(id) = pen.brush
        {
            self.reference(id);
        }
    }
}

impl DrawingContext for DrawingRecorder {
    fn draw_line(&mut self, pen: Option<&Pen>, p0: Point, p1: Point) -> Result<()> {
        self.ensure_open()?;
        self.reference_pen(pen);
        self.ops.push(DrawOp::Line {
            pen: pen.copied(),
            p0,
            p1,
        });
        Ok(())
    }

    fn draw_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: Rect,
    ) -> Result<()> {
        self.ensure_open()?;
        self.reference_brush(brush);
        self.reference_pen(pen);
        self.ops.push(DrawOp::Rect {
            brush,
            pen: pen.copied(),
            rect,
        });
        Ok(())
    }

    fn draw_rounded_rectangle(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        rect: kurbo::RoundedRect,
    ) -> Result<()> {
        self.ensure_open()?;
        self.reference_brush(brush);
        self.reference_pen(pen);
        self.ops.push(DrawOp::RoundedRect {
            brush,
            pen: pen.copied(),
            rect,
        });
        Ok(())
    }

    fn draw_ellipse(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        ellipse: kurbo::Ellipse,
    ) -> Result<()> {
        self.ensure_open()?;
        self.reference_brush(brush);
        self.reference_pen(pen);
        self.ops.push(DrawOp::Ellipse {
            brush,
            pen: pen.copied(),
            ellipse,
        });
        Ok(())
    }

    fn draw_geometry(
        &mut self,
        brush: Option<ResourceId>,
        pen: Option<&Pen>,
        geometry: &Geometry,
    ) -> Result<()> {
        self.ensure_open()?;
        self.reference_brush(brush);
        self.reference_pen(pen);
        self.ops.push(DrawOp::Geometry {
            brush,
            pen: pen.copied(),
            geometry: geometry.clone(),
        });
        Ok(())
    }

    fn draw_image(&mut self, image: Option<ResourceId>, rect: Rect) -> Result<()> {
        self.ensure_open()?;
        if let Some(id) = image {
            self.reference(id);
        }
        self.ops.push(DrawOp::Image { image, rect });
        Ok(())
    }

    fn draw_media(&mut self, media: Option<ResourceId>, rect: Rect) -> Result<()> {
        self.ensure_open()?;
        if let Some(id) = media {
            self.reference(id);
        }
        self.ops.push(DrawOp::Media { media, rect });
        Ok(())
    }

    fn draw_glyph_run(&mut self, brush: Option<ResourceId>, run: &GlyphRun) -> Result<()> {
        self.ensure_open()?;
        self.reference_brush(brush);
        self.ops.push(DrawOp::GlyphRun {
            brush,
            run: run.clone(),
        });
        Ok(())
    }

    fn draw_drawing(&mut self, drawing: &Drawing) -> Result<()> {
        self.ensure_open()?;
        self.reference(drawing.id);
        self.ops.push(DrawOp::Drawing {
            drawing: drawing.clone(),
        });
        Ok(())
    }

    fn push_transform(&mut self, transform: Affine) -> Result<()> {
        self.ensure_open()?;
        self.depth += 1;
        self.ops.push(DrawOp::PushTransform(transform));
        Ok(())
    }

    fn push_clip(&mut self, clip: &Geometry) -> Result<()> {
        self.ensure_open()?;
        self.depth += 1;
        self.ops.push(DrawOp::PushClip(clip.clone()));
        Ok(())
    }

    fn push_opacity(&mut self, opacity: f64) -> Result<()> {
        self.ensure_open()?;
        self.depth += 1;
        self.ops.push(DrawOp::PushOpacity(opacity));
        Ok(())
    }

    fn push_opacity_mask(&mut self, brush: ResourceId) -> Result<()> {
        self.ensure_open()?;
        self.reference(brush);
        self.depth += 1;
        self.ops.push(DrawOp::PushOpacityMask(brush));
        Ok(())
    }

    fn push_guidelines(&mut self, guidelines: &GuidelineSet) -> Result<()> {
        self.ensure_open()?;
        self.depth += 1;
        self.ops.push(DrawOp::PushGuidelines(guidelines.clone()));
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.depth == 0 {
            return Err(CompositionError::operation("pop without matching push"));
        }
        self.depth -= 1;
        self.ops.push(DrawOp::Pop);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut rec = DrawingRecorder::new();
        rec.push_opacity(0.5).unwrap();
        rec.draw_rectangle(None, None, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        rec.pop().unwrap();
        let content = rec.close().unwrap();
        assert_eq!(content.ops().len(), 3);
        assert!(matches!(content.ops()[0], DrawOp::PushOpacity(_)));
        assert!(matches!(content.ops()[2], DrawOp::Pop));
    }

    #[test]
    fn unbalanced_push_fails_to_close() {
        let mut rec = DrawingRecorder::new();
        rec.push_opacity(1.0).unwrap();
        let err = rec.close().unwrap_err();
        assert!(matches!(err, CompositionError::InvalidOperation { .. }));
    }

    #[test]
    fn pop_without_push_fails() {
        let mut rec = DrawingRecorder::new();
        let err = rec.pop().unwrap_err();
        assert!(matches!(err, CompositionError::InvalidOperation { .. }));
    }

    #[test]
    fn closed_recorder_rejects_all_calls() {
        let mut rec = DrawingRecorder::new();
        let _ = rec.close().unwrap();
        assert!(rec.draw_line(None, Point::ZERO, Point::new(1.0, 1.0)).is_err());
        assert!(rec.push_opacity(1.0).is_err());
        assert!(rec.close().is_err());
    }

    #[test]
    fn nested_balance_closes() {
        let mut rec = DrawingRecorder::new();
        rec.push_transform(Affine::IDENTITY).unwrap();
        rec.push_clip(&Geometry::Rect(Rect::new(0.0, 0.0, 5.0, 5.0)))
            .unwrap();
        rec.pop().unwrap();
        rec.pop().unwrap();
        assert!(rec.close().is_ok());
    }
}
