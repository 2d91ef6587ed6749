// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded, immutable drawing content.

use std::sync::Arc;

use kurbo::{Affine, Point, Rect};
use stratum_wire::{Geometry, GlyphRun, GuidelineSet};

use crate::resource::ResourceId;

/// Stroke state for recorded primitives: a brush reference plus thickness.
///
/// A pen with no brush still defines outline geometry for bounds purposes
/// but draws nothing and never hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    /// Stroke brush, if any.
    pub brush: Option<ResourceId>,
    /// Stroke thickness, centered on the outline.
    pub thickness: f64,
}

impl Pen {
    /// A pen stroking with `brush` at `thickness`.
    #[must_use]
    pub const fn new(brush: ResourceId, thickness: f64) -> Self {
        Self {
            brush: Some(brush),
            thickness,
        }
    }
}

/// A registered drawing: recorded content plus its logical resource identity.
///
/// Produced by [`Composition::register_drawing`](crate::Composition::register_drawing);
/// required wherever content participates in channel realization (visual
/// content, nested drawings).
#[derive(Clone, Debug)]
pub struct Drawing {
    pub(crate) id: ResourceId,
    pub(crate) content: Arc<DrawingContent>,
}

impl Drawing {
    /// The drawing's logical resource id.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The recorded content.
    #[must_use]
    pub fn content(&self) -> &Arc<DrawingContent> {
        &self.content
    }
}

/// One recorded operation.
///
/// Geometry and pen data are stored by value; brushes, images, media and
/// nested drawings are stored as resource references with independent
/// per-channel lifetimes.
#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Stroke a line segment.
    Line {
        /// Stroke pen, if any.
        pen: Option<Pen>,
        /// Segment start.
        p0: Point,
        /// Segment end.
        p1: Point,
    },
    /// Fill and/or stroke a rectangle.
    Rect {
        /// Fill brush, if any.
        brush: Option<ResourceId>,
        /// Stroke pen, if any.
        pen: Option<Pen>,
        /// The rectangle.
        rect: Rect,
    },
    /// Fill and/or stroke a rounded rectangle.
    RoundedRect {
        /// Fill brush, if any.
        brush: Option<ResourceId>,
        /// Stroke pen, if any.
        pen: Option<Pen>,
        /// The rounded rectangle.
        rect: kurbo::RoundedRect,
    },
    /// Fill and/or stroke an ellipse.
    Ellipse {
        /// Fill brush, if any.
        brush: Option<ResourceId>,
        /// Stroke pen, if any.
        pen: Option<Pen>,
        /// The ellipse.
        ellipse: kurbo::Ellipse,
    },
    /// Fill and/or stroke an arbitrary geometry.
    Geometry {
        /// Fill brush, if any.
        brush: Option<ResourceId>,
        /// Stroke pen, if any.
        pen: Option<Pen>,
        /// The geometry, by value.
        geometry: Geometry,
    },
    /// Draw an image into a rectangle.
    Image {
        /// Image resource, if any.
        image: Option<ResourceId>,
        /// Destination rectangle.
        rect: Rect,
    },
    /// Draw the current frame of a media source into a rectangle.
    Media {
        /// Media resource, if any.
        media: Option<ResourceId>,
        /// Destination rectangle.
        rect: Rect,
    },
    /// Fill a glyph run.
    GlyphRun {
        /// Fill brush, if any.
        brush: Option<ResourceId>,
        /// The run.
        run: GlyphRun,
    },
    /// Replay a nested drawing in place.
    Drawing {
        /// The nested drawing.
        drawing: Drawing,
    },
    /// Open a transform scope.
    PushTransform(Affine),
    /// Open a clip scope.
    PushClip(Geometry),
    /// Open an opacity scope.
    PushOpacity(f64),
    /// Open an opacity-mask scope.
    PushOpacityMask(ResourceId),
    /// Open a guideline scope.
    PushGuidelines(GuidelineSet),
    /// Close the innermost open scope.
    Pop,
}

/// An immutable recording of drawing operations.
///
/// Every push is matched by a pop (enforced at
/// [`close`](crate::drawing::DrawingRecorder::close)). The sequence is
/// replayable any number of times and by any number of walkers concurrently;
/// walkers keep their own stacks and never mutate the content.
#[derive(Debug)]
pub struct DrawingContent {
    pub(crate) ops: Vec<DrawOp>,
    pub(crate) resources: Vec<ResourceId>,
}

impl DrawingContent {
    /// The recorded operations in order.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// The distinct resources referenced by this recording, in first-use
    /// order: brushes (including pen and mask brushes), images, media, and
    /// nested drawings.
    #[must_use]
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    /// Whether the recording holds no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
