// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lamina Imaging: the immediate-mode painter contract used by the scene.
//!
//! The scene database never rasterizes anything itself. It lowers every
//! drawable into a short program of plain data operations and hands them to
//! a [`Painter`], which a host implements on top of whatever 2D API it has
//! (a CPU rasterizer, a GPU renderer, a platform canvas, or a recorder in
//! tests).
//!
//! # Core concepts
//!
//! - **State operations** ([`StateOp`]): replace the current transform, or
//!   push/pop a compositing layer ([`LayerOp`]) that scopes a clip, a blend
//!   mode and a group opacity.
//! - **Draw operations** ([`DrawOp`]): fill or stroke a path, fill a
//!   rectangle, draw a decoded [`Bitmap`], or clear a region.
//! - **Paints** ([`Paint`]): a solid color, a peniko gradient, or a tiled
//!   bitmap pattern.
//!
//! Geometry is expressed with kurbo types ([`Affine`], [`BezPath`], [`Rect`])
//! and colors, gradients, blend modes and fill rules come from peniko, so
//! a backend can usually map each op directly onto its native call.
//!
//! # Layers
//!
//! Layers must be well nested: every [`StateOp::PushLayer`] is matched by a
//! [`StateOp::PopLayer`]. Draws inside a layer composite with normal
//! source-over; the layer's blend mode and opacity apply when the layer is
//! composited into its parent. This mirrors the "begin transparency layer /
//! end transparency layer" pair of most immediate-mode APIs.
//!
//! ```
//! use lamina_imaging::{DrawOp, Painter, PainterExt, Paint, PaintOp, Rect};
//! use peniko::Color;
//!
//! #[derive(Default)]
//! struct Collect(Vec<PaintOp>);
//!
//! impl Painter for Collect {
//!     fn state(&mut self, op: lamina_imaging::StateOp) {
//!         self.0.push(PaintOp::State(op));
//!     }
//!     fn draw(&mut self, op: DrawOp) {
//!         self.0.push(PaintOp::Draw(op));
//!     }
//! }
//!
//! let mut painter = Collect::default();
//! painter.with_opacity_layer(0.5, |p| {
//!     p.draw(DrawOp::FillRect {
//!         rect: Rect::new(0.0, 0.0, 10.0, 10.0),
//!         paint: Paint::Solid(Color::WHITE),
//!     });
//! });
//! assert_eq!(painter.0.len(), 3);
//! ```

#![no_std]

extern crate alloc;

use alloc::sync::Arc;

pub use kurbo::{Affine, BezPath, Rect};
pub use peniko::{BlendMode, Color, Fill as FillRule, Gradient, ImageAlphaType, ImageFormat};

/// Stroke style used by [`DrawOp::StrokePath`].
///
/// This is a re-export of [`kurbo::Stroke`], which captures width, joins,
/// caps, miter limit and dashes.
pub type StrokeStyle = kurbo::Stroke;

/// A decoded raster image, ready to be drawn.
///
/// Pixels are tightly packed, row-major, in `format` with `alpha_type`
/// encoding. Bitmaps are shared by reference count; cloning one never copies
/// pixel data.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of `pixels`.
    pub format: ImageFormat,
    /// Alpha encoding of `pixels` (straight vs premultiplied).
    pub alpha_type: ImageAlphaType,
    /// Pixel data.
    pub pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Create an RGBA8 bitmap with straight alpha.
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height * 4`
    /// bytes.
    pub fn from_rgba8(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Option<Self> {
        let pixels = pixels.into();
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            format: ImageFormat::Rgba8,
            alpha_type: ImageAlphaType::Alpha,
            pixels,
        })
    }

    /// Bounds of the bitmap in its own pixel space.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Paint used when filling or stroking.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A single color.
    Solid(Color),
    /// A linear, radial or sweep gradient with ordered color stops.
    Gradient(Gradient),
    /// A bitmap repeated in both directions.
    Pattern {
        /// Tile image.
        image: Arc<Bitmap>,
        /// Placement of the tile grid in the local space of the draw.
        transform: Affine,
    },
}

impl Paint {
    /// Returns this paint with its alpha multiplied by `opacity`, if the
    /// paint can carry the factor itself.
    ///
    /// Only solid colors can; gradients and patterns return `None` and
    /// callers are expected to wrap the draw in an opacity layer instead.
    pub fn with_opacity(&self, opacity: f32) -> Option<Self> {
        match self {
            Self::Solid(color) => Some(Self::Solid(color.multiply_alpha(opacity))),
            Self::Gradient(_) | Self::Pattern { .. } => None,
        }
    }
}

impl From<Color> for Paint {
    #[inline]
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Parameters for a pushed compositing layer.
///
/// - `clip` restricts drawing within the layer. It is interpreted in the
///   coordinate space of the transform that is current when the layer is
///   pushed.
/// - `blend`/`opacity` control how the layer is composited into its parent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerOp {
    /// Optional rectangular clip applied to this layer's contents.
    pub clip: Option<Rect>,
    /// Optional blend mode used when compositing this layer into its parent.
    pub blend: Option<BlendMode>,
    /// Optional opacity (0–1) applied when compositing this layer into its parent.
    pub opacity: Option<f32>,
}

impl LayerOp {
    /// Returns true if this layer changes how its contents are composited.
    ///
    /// A default blend mode or an opacity of `1.0` count as no change.
    #[inline]
    pub fn has_compositing_effects(&self) -> bool {
        self.blend.is_some_and(|blend| blend != BlendMode::default())
            || self.opacity.is_some_and(|opacity| opacity < 1.0)
    }

    /// Returns true if this layer has no effect at all.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.clip.is_none() && !self.has_compositing_effects()
    }
}

/// State operations that mutate the current painter state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateOp {
    /// Replace the current transform matrix.
    SetTransform(Affine),
    /// Push a new layer onto the layer stack.
    PushLayer(LayerOp),
    /// Pop the most recently pushed layer.
    PopLayer,
}

/// Draw operations that produce pixels given the current state.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill a path with a paint and fill rule.
    FillPath {
        /// Geometry in the current local space.
        path: BezPath,
        /// Paint to fill with.
        paint: Paint,
        /// Rule deciding which points are inside.
        fill_rule: FillRule,
    },
    /// Stroke a path with a paint and stroke style.
    StrokePath {
        /// Geometry in the current local space.
        path: BezPath,
        /// Paint to stroke with.
        paint: Paint,
        /// Width, joins, caps and dashes.
        style: StrokeStyle,
    },
    /// Fill an axis-aligned rectangle.
    FillRect {
        /// Rectangle in the current local space.
        rect: Rect,
        /// Paint to fill with.
        paint: Paint,
    },
    /// Draw a bitmap scaled into a destination rectangle.
    DrawImage {
        /// Decoded image.
        image: Arc<Bitmap>,
        /// Destination rectangle in the current local space.
        dst: Rect,
    },
    /// Reset a region to fully transparent.
    Clear(Rect),
}

/// Unified painter operation, convenient for recording.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    /// State-changing operation.
    State(StateOp),
    /// Drawing operation.
    Draw(DrawOp),
}

/// Immediate-mode painter.
///
/// Implementations apply each operation as it arrives.
pub trait Painter {
    /// Apply a state operation.
    fn state(&mut self, op: StateOp);

    /// Apply a draw operation.
    fn draw(&mut self, op: DrawOp);

    /// Replace the current transform.
    ///
    /// This is equivalent to `self.state(StateOp::SetTransform(transform))`.
    #[inline]
    fn set_transform(&mut self, transform: Affine) {
        self.state(StateOp::SetTransform(transform));
    }

    /// Push a new layer onto the layer stack.
    #[inline]
    fn layer_push(&mut self, op: LayerOp) {
        self.state(StateOp::PushLayer(op));
    }

    /// Pop the most recently pushed layer.
    #[inline]
    fn layer_pop(&mut self) {
        self.state(StateOp::PopLayer);
    }

    /// Push a rectangular clip layer.
    ///
    /// The clip scope ends when you call [`Painter::layer_pop`].
    #[inline]
    fn clip_to_rect(&mut self, rect: Rect) {
        self.layer_push(LayerOp {
            clip: Some(rect),
            blend: None,
            opacity: None,
        });
    }
}

/// Closure-scoped helpers for [`Painter`] implementations and callers.
///
/// This is separate from [`Painter`] so that `&mut dyn Painter` stays usable.
pub trait PainterExt: Painter {
    /// Run `f` inside a pushed layer, popping it afterwards.
    ///
    /// Note: if `f` panics, the layer will not be popped.
    #[inline]
    fn with_layer<R>(&mut self, op: LayerOp, f: impl FnOnce(&mut Self) -> R) -> R {
        self.layer_push(op);
        let out = f(self);
        self.layer_pop();
        out
    }

    /// Run `f` inside a rectangular clip layer.
    #[inline]
    fn with_clip_rect<R>(&mut self, rect: Rect, f: impl FnOnce(&mut Self) -> R) -> R {
        self.with_layer(
            LayerOp {
                clip: Some(rect),
                blend: None,
                opacity: None,
            },
            f,
        )
    }

    /// Run `f` inside an opacity layer.
    #[inline]
    fn with_opacity_layer<R>(&mut self, opacity: f32, f: impl FnOnce(&mut Self) -> R) -> R {
        self.with_layer(
            LayerOp {
                clip: None,
                blend: None,
                opacity: Some(opacity),
            },
            f,
        )
    }

    /// Run `f` inside a layer with an optional clip, a blend mode and an opacity.
    #[inline]
    fn with_composite_layer<R>(
        &mut self,
        clip: Option<Rect>,
        blend: BlendMode,
        opacity: f32,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.with_layer(
            LayerOp {
                clip,
                blend: Some(blend),
                opacity: Some(opacity),
            },
            f,
        )
    }
}

impl<P: Painter + ?Sized> PainterExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct OpLog {
        ops: Vec<PaintOp>,
    }

    impl Painter for OpLog {
        fn state(&mut self, op: StateOp) {
            self.ops.push(PaintOp::State(op));
        }

        fn draw(&mut self, op: DrawOp) {
            self.ops.push(PaintOp::Draw(op));
        }
    }

    #[test]
    fn with_layer_pushes_and_pops() {
        let mut painter = OpLog::default();
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        painter.with_clip_rect(rect, |p| p.draw(DrawOp::Clear(rect)));

        assert_eq!(
            painter.ops,
            vec![
                PaintOp::State(StateOp::PushLayer(LayerOp {
                    clip: Some(rect),
                    blend: None,
                    opacity: None,
                })),
                PaintOp::Draw(DrawOp::Clear(rect)),
                PaintOp::State(StateOp::PopLayer),
            ]
        );
    }

    #[test]
    fn layer_op_noop_detection() {
        assert!(LayerOp::default().is_noop());
        let faded = LayerOp {
            opacity: Some(0.5),
            ..LayerOp::default()
        };
        assert!(faded.has_compositing_effects());
        let opaque = LayerOp {
            opacity: Some(1.0),
            blend: Some(BlendMode::default()),
            clip: None,
        };
        assert!(opaque.is_noop());
    }

    #[test]
    fn solid_paint_absorbs_opacity() {
        let paint = Paint::Solid(Color::WHITE);
        let Some(Paint::Solid(faded)) = paint.with_opacity(0.25) else {
            panic!("solid paints carry opacity");
        };
        assert!((faded.components[3] - 0.25).abs() < 1e-6);

        let gradient = Paint::Gradient(Gradient::new_linear((0.0, 0.0), (1.0, 0.0)));
        assert!(gradient.with_opacity(0.5).is_none());
    }

    #[test]
    fn bitmap_rejects_mismatched_pixels() {
        assert!(Bitmap::from_rgba8(2, 2, vec![0_u8; 16]).is_some());
        assert!(Bitmap::from_rgba8(2, 2, vec![0_u8; 15]).is_none());
        let bitmap = Bitmap::from_rgba8(3, 1, vec![0_u8; 12]).unwrap();
        assert_eq!(bitmap.bounds(), Rect::new(0.0, 0.0, 3.0, 1.0));
    }
}
