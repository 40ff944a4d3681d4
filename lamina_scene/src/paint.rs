// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paints and the stroke/fill decorations layers are rendered with.

use std::sync::Arc;

use kurbo::{Cap, Join};

pub use lamina_imaging::{BlendMode, Color, FillRule, Gradient, StrokeStyle};

use crate::geometry::Affine;

/// Encoded image bytes (PNG, JPEG, ...), shared by reference count.
pub type EncodedImage = Arc<[u8]>;

/// A tiled image paint.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    /// Encoded tile image, decoded through the scene's image decoder.
    pub image: EncodedImage,
    /// Placement of the tile grid in layer space.
    pub transform: Affine,
}

/// What a decoration paints with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A single color.
    Solid(Color),
    /// Linear or radial gradient with ordered stops.
    Gradient(Gradient),
    /// A repeated image.
    Pattern(Pattern),
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Stroke decoration: re-strokes the layer geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeDecoration {
    /// Width, cap, join, miter limit and dash pattern.
    pub style: StrokeStyle,
    /// Paint used for the stroke.
    pub paint: Paint,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f32,
    /// When `false`, `style.width` is in view pixels and the stroke keeps a
    /// constant on-screen width regardless of zoom.
    pub scales_with_zoom: bool,
}

impl StrokeDecoration {
    /// A solid, fully opaque stroke with round joins and butt caps.
    pub fn new(width: f64, paint: impl Into<Paint>) -> Self {
        Self {
            style: StrokeStyle::new(width)
                .with_join(Join::Round)
                .with_caps(Cap::Butt),
            paint: paint.into(),
            opacity: 1.0,
            scales_with_zoom: true,
        }
    }

    /// Replaces the stroke style.
    #[must_use]
    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the opacity multiplier.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Sets whether the width follows zoom.
    #[must_use]
    pub fn with_scales_with_zoom(mut self, scales: bool) -> Self {
        self.scales_with_zoom = scales;
        self
    }

    /// How far the stroke can reach beyond the geometry, in the units of
    /// `style.width`.
    ///
    /// Miter joins can extend up to `miter_limit * width / 2`; square caps
    /// extend `width / 2 * sqrt(2)` at the corners.
    pub fn outset(&self) -> f64 {
        let half = self.style.width.abs() / 2.0;
        let join = match self.style.join {
            Join::Miter => self.style.miter_limit.max(1.0),
            Join::Round | Join::Bevel => 1.0,
        };
        let cap = if self.style.start_cap == Cap::Square || self.style.end_cap == Cap::Square {
            std::f64::consts::SQRT_2
        } else {
            1.0
        };
        half * join.max(cap)
    }
}

/// Fill decoration: fills the region the layer geometry encloses.
#[derive(Clone, Debug, PartialEq)]
pub struct FillDecoration {
    /// Paint used for the fill.
    pub paint: Paint,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f32,
    /// Rule deciding which points are inside.
    pub rule: FillRule,
}

impl FillDecoration {
    /// A fully opaque nonzero fill.
    pub fn new(paint: impl Into<Paint>) -> Self {
        Self {
            paint: paint.into(),
            opacity: 1.0,
            rule: FillRule::NonZero,
        }
    }

    /// Sets the opacity multiplier.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Sets the fill rule.
    #[must_use]
    pub fn with_rule(mut self, rule: FillRule) -> Self {
        self.rule = rule;
        self
    }
}

/// One rendering pass over a layer's geometry.
///
/// Layers carry an ordered list of decorations; each one independently
/// strokes or fills the same geometry, in list order.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoration {
    /// Stroke the outline.
    Stroke(StrokeDecoration),
    /// Fill the interior.
    Fill(FillDecoration),
}

impl Decoration {
    /// Shorthand for a solid stroke.
    pub fn stroke(width: f64, paint: impl Into<Paint>) -> Self {
        Self::Stroke(StrokeDecoration::new(width, paint))
    }

    /// Shorthand for a solid nonzero fill.
    pub fn fill(paint: impl Into<Paint>) -> Self {
        Self::Fill(FillDecoration::new(paint))
    }

    /// Every encoded pattern image this decoration refers to.
    pub(crate) fn pattern_image(&self) -> Option<&EncodedImage> {
        let paint = match self {
            Self::Stroke(stroke) => &stroke.paint,
            Self::Fill(fill) => &fill.paint,
        };
        match paint {
            Paint::Pattern(pattern) => Some(&pattern.image),
            Paint::Solid(_) | Paint::Gradient(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outset_accounts_for_joins_and_caps() {
        let round = StrokeDecoration::new(4.0, Color::BLACK);
        assert!((round.outset() - 2.0).abs() < 1e-12);

        let miter = round
            .clone()
            .with_style(StrokeStyle::new(4.0).with_join(Join::Miter).with_miter_limit(4.0));
        assert!((miter.outset() - 8.0).abs() < 1e-12);

        let square = round.with_style(StrokeStyle::new(4.0).with_join(Join::Bevel).with_caps(Cap::Square));
        assert!((square.outset() - 2.0 * std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn only_patterns_report_images() {
        let bytes: EncodedImage = Arc::from(&b"not really a png"[..]);
        let patterned = Decoration::Fill(FillDecoration::new(Paint::Pattern(Pattern {
            image: bytes.clone(),
            transform: Affine::IDENTITY,
        })));
        assert_eq!(patterned.pattern_image(), Some(&bytes));
        assert!(Decoration::fill(Color::WHITE).pattern_image().is_none());
    }
}
