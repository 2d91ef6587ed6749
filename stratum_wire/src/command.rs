// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed command records and the value types marshaled through them.
//!
//! Commands fall into four groups:
//!
//! - **Resource lifecycle** — [`Command::CreateResource`],
//!   [`Command::UpdateResource`], [`Command::UpdateDrawing`],
//!   [`Command::ReleaseResource`]. A resource exists on a channel between its
//!   create and release commands; updates replace its state wholesale.
//! - **Visual property updates** — one command per property category, tagged
//!   with the visual's handle. The producer emits exactly the categories
//!   whose dirty bits were set.
//! - **Children sync** — [`Command::RemoveAllChildren`] followed by ordered
//!   [`Command::InsertChild`] records re-states a visual's child list.
//! - **Target directives** — root assignment and surface attachment for a
//!   composition target realized on the channel.
//!
//! [`ContentOp`] is the replay vocabulary of a drawing resource: the recorded
//! draw/push/pop sequence with every resource reference patched to the
//! channel's handle space. Geometry and pen data travel by value; brushes,
//! images, media and nested drawings travel as handles, where the null handle
//! means "omit this reference".

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point, Rect, Vec2};

use crate::handle::ResourceHandle;

/// An opaque key for an externally-managed pixel surface.
///
/// Image decoders and media pipelines assign these; the composition passes
/// them through without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceKey(pub u64);

impl fmt::Debug for SurfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceKey({})", self.0)
    }
}

/// An sRGB color with straight alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red, 0.0–1.0.
    pub r: f32,
    /// Green, 0.0–1.0.
    pub g: f32,
    /// Blue, 0.0–1.0.
    pub b: f32,
    /// Alpha, 0.0–1.0.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// An opaque color from red/green/blue components.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// One stop of a gradient brush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis, 0.0–1.0.
    pub offset: f64,
    /// Color at this stop.
    pub color: Color,
}

/// Logical brush state, marshaled on create and on every content change.
#[derive(Clone, Debug, PartialEq)]
pub enum BrushData {
    /// A single solid color.
    Solid(Color),
    /// A linear gradient between two points.
    LinearGradient {
        /// Gradient start point.
        start: Point,
        /// Gradient end point.
        end: Point,
        /// Ordered color stops.
        stops: Vec<GradientStop>,
    },
    /// A radial gradient around a center.
    RadialGradient {
        /// Gradient center.
        center: Point,
        /// Gradient radius.
        radius: f64,
        /// Ordered color stops.
        stops: Vec<GradientStop>,
    },
}

/// Logical image state: an external surface plus its pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageData {
    /// Backing surface.
    pub surface: SurfaceKey,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Logical media state: an external frame source plus its natural size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaData {
    /// Backing frame surface.
    pub surface: SurfaceKey,
    /// Natural width in pixels.
    pub natural_width: u32,
    /// Natural height in pixels.
    pub natural_height: u32,
}

/// A positioned run of glyphs from an already-shaped text layout.
///
/// Shaping happens upstream; this core only carries the result. The origin
/// is the baseline start; the run's box spans `advance_width` forward from
/// the origin and `font_size` upward from the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    /// Baseline origin.
    pub origin: Point,
    /// Font size in drawing units.
    pub font_size: f64,
    /// Total advance width of the run.
    pub advance_width: f64,
    /// Glyph indices in the source font.
    pub glyphs: Vec<u16>,
}

impl GlyphRun {
    /// The run's approximate bounding box: `advance_width` forward from the
    /// origin, `font_size` up from the baseline.
    #[must_use]
    pub fn approximate_bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y - self.font_size,
            self.origin.x + self.advance_width,
            self.origin.y,
        )
    }
}

/// Pixel-snapping guidelines for a scope of content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuidelineSet {
    /// Vertical guideline x coordinates.
    pub x: Vec<f64>,
    /// Horizontal guideline y coordinates.
    pub y: Vec<f64>,
}

/// Pen state for stroked primitives: a brush reference plus stroke width.
///
/// The brush handle may be null ("omit"): such a pen still defines geometry
/// for bounds purposes but draws nothing and never hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenData {
    /// Stroke brush; null means no visible stroke.
    pub brush: ResourceHandle,
    /// Stroke thickness, centered on the outline.
    pub thickness: f64,
}

/// A drawable or clipping shape, marshaled by value.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(kurbo::RoundedRect),
    /// An ellipse.
    Ellipse(kurbo::Ellipse),
    /// An arbitrary Bézier path.
    Path(kurbo::BezPath),
}

/// How a visual's rasterized content is scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BitmapScalingMode {
    /// Backend default.
    #[default]
    Unspecified,
    /// Bilinear filtering.
    Linear,
    /// Nearest-neighbor sampling.
    NearestNeighbor,
    /// High-quality multi-tap filtering.
    HighQuality,
}

/// Whether subpixel (ClearType) text rendering may be used under a visual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClearTypeHint {
    /// Engine decides based on surface state.
    #[default]
    Auto,
    /// Force-enable subpixel rendering.
    Enabled,
}

/// Antialiasing mode for text under a visual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextRenderingMode {
    /// Engine decides.
    #[default]
    Auto,
    /// No antialiasing.
    Aliased,
    /// Grayscale antialiasing.
    Grayscale,
    /// Subpixel antialiasing.
    ClearType,
}

/// Glyph-metrics hinting mode for text under a visual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextHintingMode {
    /// Engine decides.
    #[default]
    Auto,
    /// Optimize for static readability.
    Fixed,
    /// Optimize for animation smoothness.
    Animated,
}

/// A bitmap effect applied to a visual's subtree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectData {
    /// Gaussian blur.
    Blur {
        /// Blur radius in drawing units.
        radius: f64,
    },
    /// Drop shadow.
    DropShadow {
        /// Shadow offset.
        offset: Vec2,
        /// Shadow blur radius.
        radius: f64,
        /// Shadow color.
        color: Color,
    },
}

/// Cached-composition mode for a visual's subtree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheModeData {
    /// Scale at which the cached bitmap is rendered.
    pub render_at_scale: f64,
    /// Whether the cache snaps to device pixels.
    pub snaps_to_device_pixels: bool,
}

/// The kind tag carried by a create command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A node of the composed tree.
    Visual,
    /// Recorded drawing content.
    Drawing,
    /// A fill/stroke brush.
    Brush,
    /// A decoded image.
    Image,
    /// A media frame source.
    Media,
    /// A composition target.
    Target,
}

/// Fixed-size resource state payloads for [`Command::UpdateResource`].
///
/// Drawing content is variable-length and uses [`Command::UpdateDrawing`]
/// instead.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceData {
    /// Brush state.
    Brush(BrushData),
    /// Image state.
    Image(ImageData),
    /// Media state.
    Media(MediaData),
}

/// One replayed drawing operation inside a drawing resource.
///
/// Every push has a matching [`ContentOp::Pop`]; the producer guarantees
/// balance before the recording can be marshaled at all.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentOp {
    /// Stroke a line segment.
    DrawLine {
        /// Stroke pen, if any.
        pen: Option<PenData>,
        /// Segment start.
        p0: Point,
        /// Segment end.
        p1: Point,
    },
    /// Fill and/or stroke a rectangle.
    DrawRect {
        /// Fill brush; null means no fill.
        brush: ResourceHandle,
        /// Stroke pen, if any.
        pen: Option<PenData>,
        /// The rectangle.
        rect: Rect,
    },
    /// Fill and/or stroke a rounded rectangle.
    DrawRoundedRect {
        /// Fill brush; null means no fill.
        brush: ResourceHandle,
        /// Stroke pen, if any.
        pen: Option<PenData>,
        /// The rounded rectangle.
        rect: kurbo::RoundedRect,
    },
    /// Fill and/or stroke an ellipse.
    DrawEllipse {
        /// Fill brush; null means no fill.
        brush: ResourceHandle,
        /// Stroke pen, if any.
        pen: Option<PenData>,
        /// The ellipse.
        ellipse: kurbo::Ellipse,
    },
    /// Fill and/or stroke an arbitrary geometry.
    DrawGeometry {
        /// Fill brush; null means no fill.
        brush: ResourceHandle,
        /// Stroke pen, if any.
        pen: Option<PenData>,
        /// The geometry, by value.
        geometry: Geometry,
    },
    /// Draw an image into a rectangle.
    DrawImage {
        /// Image resource; null means omit.
        image: ResourceHandle,
        /// Destination rectangle.
        rect: Rect,
    },
    /// Draw the current frame of a media source into a rectangle.
    DrawMedia {
        /// Media resource; null means omit.
        media: ResourceHandle,
        /// Destination rectangle.
        rect: Rect,
    },
    /// Fill a glyph run.
    DrawGlyphRun {
        /// Fill brush; null means no visible text.
        brush: ResourceHandle,
        /// The run, by value.
        run: GlyphRun,
    },
    /// Replay a nested drawing resource in place.
    DrawDrawing {
        /// The nested drawing.
        drawing: ResourceHandle,
    },
    /// Open a transform scope.
    PushTransform {
        /// Transform mapping scope-local to outer coordinates.
        transform: Affine,
    },
    /// Open a clip scope.
    PushClip {
        /// Clip geometry in scope-local coordinates.
        clip: Geometry,
    },
    /// Open an opacity scope.
    PushOpacity {
        /// Uniform opacity factor, 0.0–1.0.
        opacity: f64,
    },
    /// Open an opacity-mask scope.
    PushOpacityMask {
        /// Mask brush.
        brush: ResourceHandle,
    },
    /// Open a guideline scope.
    PushGuidelines {
        /// The guidelines.
        guidelines: GuidelineSet,
    },
    /// Close the innermost open scope.
    Pop,
}

/// A single channel command record.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Bring a resource into existence on this channel.
    CreateResource {
        /// Newly allocated handle.
        handle: ResourceHandle,
        /// What is being created.
        kind: ResourceKind,
    },
    /// Replace a resource's fixed-size state.
    UpdateResource {
        /// Target resource.
        handle: ResourceHandle,
        /// New state.
        data: ResourceData,
    },
    /// Replace a drawing resource's replay ops (variable-length).
    UpdateDrawing {
        /// Target drawing.
        handle: ResourceHandle,
        /// The full replay sequence.
        ops: Vec<ContentOp>,
    },
    /// Release a resource on this channel.
    ReleaseResource {
        /// Target resource.
        handle: ResourceHandle,
    },
    /// Set a visual's offset in its parent's space.
    SetOffset {
        /// Target visual.
        visual: ResourceHandle,
        /// New offset.
        offset: Vec2,
    },
    /// Set or clear a visual's transform.
    SetTransform {
        /// Target visual.
        visual: ResourceHandle,
        /// New transform, `None` for identity.
        transform: Option<Affine>,
    },
    /// Set or clear a visual's clip.
    SetClip {
        /// Target visual.
        visual: ResourceHandle,
        /// New clip geometry.
        clip: Option<Geometry>,
    },
    /// Set a visual's opacity.
    SetOpacity {
        /// Target visual.
        visual: ResourceHandle,
        /// New opacity, 0.0–1.0.
        opacity: f64,
    },
    /// Set or clear a visual's opacity mask.
    SetOpacityMask {
        /// Target visual.
        visual: ResourceHandle,
        /// Mask brush; null clears the mask.
        brush: ResourceHandle,
    },
    /// Set or clear a visual's drawing content.
    SetContent {
        /// Target visual.
        visual: ResourceHandle,
        /// Drawing resource; null clears the content.
        drawing: ResourceHandle,
    },
    /// Set a visual's bitmap scaling mode.
    SetScalingMode {
        /// Target visual.
        visual: ResourceHandle,
        /// New mode.
        mode: BitmapScalingMode,
    },
    /// Set or clear a visual's effect.
    SetEffect {
        /// Target visual.
        visual: ResourceHandle,
        /// New effect.
        effect: Option<EffectData>,
    },
    /// Set or clear a visual's cache mode.
    SetCacheMode {
        /// Target visual.
        visual: ResourceHandle,
        /// New cache mode.
        cache: Option<CacheModeData>,
    },
    /// Set or clear a visual's guideline set.
    SetGuidelines {
        /// Target visual.
        visual: ResourceHandle,
        /// New guidelines.
        guidelines: Option<GuidelineSet>,
    },
    /// Set a visual's ClearType hint.
    SetClearTypeHint {
        /// Target visual.
        visual: ResourceHandle,
        /// New hint.
        hint: ClearTypeHint,
    },
    /// Set a visual's text rendering mode.
    SetTextRenderingMode {
        /// Target visual.
        visual: ResourceHandle,
        /// New mode.
        mode: TextRenderingMode,
    },
    /// Set a visual's text hinting mode.
    SetTextHintingMode {
        /// Target visual.
        visual: ResourceHandle,
        /// New mode.
        mode: TextHintingMode,
    },
    /// Drop all children of a visual (prelude to a children re-sync).
    RemoveAllChildren {
        /// Target visual.
        visual: ResourceHandle,
    },
    /// Insert a child at an index in a visual's child list.
    InsertChild {
        /// Parent visual.
        visual: ResourceHandle,
        /// Child visual.
        child: ResourceHandle,
        /// Insertion index.
        index: u32,
    },
    /// Point a target at a root visual; a null root clears it.
    TargetSetRoot {
        /// Target resource.
        target: ResourceHandle,
        /// Root visual; null clears.
        root: ResourceHandle,
    },
    /// Attach a target to an output surface.
    TargetAttachSurface {
        /// Target resource.
        target: ResourceHandle,
        /// The surface.
        surface: SurfaceKey,
    },
    /// Detach a target from its output surface.
    TargetDetachSurface {
        /// Target resource.
        target: ResourceHandle,
    },
}

impl Command {
    /// A stable short name for stats and trace output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateResource { .. } => "create",
            Self::UpdateResource { .. } => "update",
            Self::UpdateDrawing { .. } => "update-drawing",
            Self::ReleaseResource { .. } => "release",
            Self::SetOffset { .. } => "set-offset",
            Self::SetTransform { .. } => "set-transform",
            Self::SetClip { .. } => "set-clip",
            Self::SetOpacity { .. } => "set-opacity",
            Self::SetOpacityMask { .. } => "set-opacity-mask",
            Self::SetContent { .. } => "set-content",
            Self::SetScalingMode { .. } => "set-scaling-mode",
            Self::SetEffect { .. } => "set-effect",
            Self::SetCacheMode { .. } => "set-cache-mode",
            Self::SetGuidelines { .. } => "set-guidelines",
            Self::SetClearTypeHint { .. } => "set-cleartype-hint",
            Self::SetTextRenderingMode { .. } => "set-text-rendering",
            Self::SetTextHintingMode { .. } => "set-text-hinting",
            Self::RemoveAllChildren { .. } => "remove-all-children",
            Self::InsertChild { .. } => "insert-child",
            Self::TargetSetRoot { .. } => "target-set-root",
            Self::TargetAttachSurface { .. } => "target-attach",
            Self::TargetDetachSurface { .. } => "target-detach",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_run_bounds_span_baseline_box() {
        let run = GlyphRun {
            origin: Point::new(10.0, 30.0),
            font_size: 12.0,
            advance_width: 48.0,
            glyphs: alloc::vec![5, 6, 7],
        };
        assert_eq!(run.approximate_bounds(), Rect::new(10.0, 18.0, 58.0, 30.0));
    }

    #[test]
    fn command_names_are_stable() {
        let cmd = Command::CreateResource {
            handle: ResourceHandle::NULL,
            kind: ResourceKind::Visual,
        };
        assert_eq!(cmd.name(), "create");
    }
}
