// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Materialized layers.
//!
//! A drawable owns the current snapshot of one concrete layer plus whatever
//! is expensive to derive from it: the decoded bitmap, the document-space
//! path, the laid-out glyph outlines. It answers draw, hit-test and bounds
//! queries from those caches and reports what must be repainted when a new
//! snapshot arrives.
//!
//! Every draw follows the same program:
//! 1. Skip if the will-draw rect misses the clip.
//! 2. Record the will-draw rect as drawn, visible or not, so a layer that is
//!    hidden later still invalidates the pixels it left behind.
//! 3. Stop if hidden.
//! 4. Push a layer clipped to the view-space dirty rect, carrying the layer's
//!    blend mode and opacity, set the layer-to-view transform, and render.

mod image;
mod path;
mod text;

use std::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect};
use lamina_imaging::{Bitmap, DrawOp, Paint as DevicePaint, Painter, PainterExt};

use crate::geometry::{path_contains, path_within, rect_contains_rect, rects_overlap, uniform_scale, union_rects};
use crate::invalidation::InvalidationSet;
use crate::layer::{Layer, LayerId};
use crate::options::SceneOptions;
use crate::paint::{Decoration, EncodedImage, Paint, StrokeDecoration};
use crate::services::Services;

pub(crate) use self::image::ImageDrawable;
pub(crate) use self::path::PathDrawable;
pub(crate) use self::text::TextDrawable;

/// What drawables need from the scene while deriving or drawing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DrawEnv<'a> {
    pub(crate) services: &'a Services,
    pub(crate) options: &'a SceneOptions,
    /// Document space to view space.
    pub(crate) document_to_view: Affine,
}

impl DrawEnv<'_> {
    /// View pixels per document unit.
    pub(crate) fn view_scale(&self) -> f64 {
        uniform_scale(self.document_to_view).max(f64::MIN_POSITIVE)
    }
}

/// One materialized concrete layer.
#[derive(Debug)]
pub(crate) enum Drawable<Id: LayerId> {
    Image(ImageDrawable<Id>),
    Path(PathDrawable<Id>),
    Text(TextDrawable<Id>),
}

impl<Id: LayerId> Drawable<Id> {
    /// Materializes `layer`. Computed layers have no drawable.
    pub(crate) fn new(layer: Layer<Id>, env: &DrawEnv<'_>) -> Option<Self> {
        match layer {
            Layer::Image(layer) => Some(Self::Image(ImageDrawable::new(layer, env))),
            Layer::Path(layer) => Some(Self::Path(PathDrawable::new(layer, env))),
            Layer::Text(layer) => Some(Self::Text(TextDrawable::new(layer, env))),
            Layer::Computed(_) => None,
        }
    }

    /// A copy of the current snapshot.
    pub(crate) fn layer(&self) -> Layer<Id> {
        match self {
            Self::Image(d) => Layer::Image(d.layer().clone()),
            Self::Path(d) => Layer::Path(d.layer().clone()),
            Self::Text(d) => Layer::Text(d.layer().clone()),
        }
    }

    /// Returns `true` if `layer` equals the current snapshot.
    pub(crate) fn is_snapshot(&self, layer: &Layer<Id>) -> bool {
        match (self, layer) {
            (Self::Image(d), Layer::Image(l)) => d.layer() == l,
            (Self::Path(d), Layer::Path(l)) => d.layer() == l,
            (Self::Text(d), Layer::Text(l)) => d.layer() == l,
            _ => false,
        }
    }

    /// Replaces the snapshot and returns the document-space region to repaint.
    ///
    /// The set is empty when nothing visual changed. A change of layer kind
    /// rebuilds the drawable.
    pub(crate) fn update_layer(&mut self, layer: Layer<Id>, env: &DrawEnv<'_>) -> InvalidationSet {
        match (self, layer) {
            (Self::Image(d), Layer::Image(l)) => d.update(l, env),
            (Self::Path(d), Layer::Path(l)) => d.update(l, env),
            (Self::Text(d), Layer::Text(l)) => d.update(l, env),
            (_, Layer::Computed(l)) => {
                log::debug!("computed layer {:?} has no drawable to update", l.id);
                InvalidationSet::new()
            }
            (this, other) => {
                let mut set = InvalidationSet::new();
                set.insert_opt_rect(this.footprint(env));
                if let Some(rebuilt) = Self::new(other, env) {
                    set.insert_opt_rect(rebuilt.will_draw_rect(env));
                    *this = rebuilt;
                }
                set
            }
        }
    }

    /// Document-space bounds of everything the next draw would touch.
    pub(crate) fn will_draw_rect(&self, env: &DrawEnv<'_>) -> Option<Rect> {
        match self {
            Self::Image(d) => d.will_draw_rect(),
            Self::Path(d) => d.will_draw_rect(env),
            Self::Text(d) => d.will_draw_rect(env),
        }
    }

    /// What the last draw recorded.
    pub(crate) fn did_draw_rect(&self) -> Option<Rect> {
        match self {
            Self::Image(d) => d.did_draw,
            Self::Path(d) => d.did_draw,
            Self::Text(d) => d.did_draw,
        }
    }

    /// Everything this drawable occupies now or occupied at its last draw.
    pub(crate) fn footprint(&self, env: &DrawEnv<'_>) -> Option<Rect> {
        union_rects(self.will_draw_rect(env), self.did_draw_rect())
    }

    /// Draws into `painter` if the will-draw rect meets `clip`.
    ///
    /// `clip` is the dirty rect in document space, `clip_view` the same rect
    /// in view space.
    pub(crate) fn draw(&mut self, painter: &mut dyn Painter, clip: Rect, clip_view: Rect, env: &DrawEnv<'_>) {
        let Some(will_draw) = self.will_draw_rect(env) else {
            return;
        };
        if !rects_overlap(will_draw, clip) {
            return;
        }
        match self {
            Self::Image(d) => {
                d.did_draw = Some(will_draw);
                d.draw(painter, clip_view, env);
            }
            Self::Path(d) => {
                d.did_draw = Some(will_draw);
                d.draw(painter, clip_view, env);
            }
            Self::Text(d) => {
                d.did_draw = Some(will_draw);
                d.draw(painter, clip_view, env);
            }
        }
    }

    /// Returns `true` if the document-space point `pt` hits the layer.
    pub(crate) fn hit_test(&self, pt: Point, env: &DrawEnv<'_>) -> bool {
        match self {
            Self::Image(d) => d.hit_test(pt),
            Self::Path(d) => d.hit_test(pt, env),
            Self::Text(d) => d.hit_test(pt),
        }
    }

    pub(crate) fn intersects(&self, rect: Rect, env: &DrawEnv<'_>) -> bool {
        self.will_draw_rect(env)
            .is_some_and(|bounds| rects_overlap(bounds, rect))
    }

    pub(crate) fn contained_by(&self, rect: Rect, env: &DrawEnv<'_>) -> bool {
        self.will_draw_rect(env)
            .is_some_and(|bounds| rect_contains_rect(rect, bounds))
    }

    /// Document-space geometry handed to dependent computed layers.
    pub(crate) fn structure_path(&self) -> BezPath {
        match self {
            Self::Image(d) => d.structure_path(),
            Self::Path(d) => d.structure_path(),
            Self::Text(d) => d.structure_path(),
        }
    }
}

/// Pushes the per-layer compositing scope used by every drawable.
///
/// The clip is given in view space, so the transform is reset before the
/// push; `layer_to_view` is installed inside.
fn with_layer_scope(
    painter: &mut dyn Painter,
    clip_view: Rect,
    blend: lamina_imaging::BlendMode,
    opacity: f32,
    layer_to_view: Affine,
    f: impl FnOnce(&mut dyn Painter),
) {
    painter.set_transform(Affine::IDENTITY);
    painter.with_composite_layer(Some(clip_view), blend, opacity, |p| {
        p.set_transform(layer_to_view);
        f(p);
    });
}

/// Decoded pattern tiles, keyed by their encoded bytes.
#[derive(Clone, Debug, Default)]
pub(crate) struct PatternCache {
    entries: Vec<(EncodedImage, Option<Arc<Bitmap>>)>,
}

impl PatternCache {
    /// Keeps tiles still referenced by `decorations`, decoding new ones.
    pub(crate) fn sync(&mut self, decorations: &[Decoration], services: &Services) {
        let mut entries: Vec<(EncodedImage, Option<Arc<Bitmap>>)> = Vec::new();
        for image in decorations.iter().filter_map(Decoration::pattern_image) {
            if entries.iter().any(|(bytes, _)| same_bytes(bytes, image)) {
                continue;
            }
            let decoded = match self.lookup(image) {
                Some(decoded) => decoded,
                None => {
                    let decoded = services.decoder.decode(image).map(Arc::new);
                    if decoded.is_none() {
                        log::warn!("pattern image could not be decoded; decoration skipped");
                    }
                    decoded
                }
            };
            entries.push((image.clone(), decoded));
        }
        self.entries = entries;
    }

    fn lookup(&self, image: &EncodedImage) -> Option<Option<Arc<Bitmap>>> {
        self.entries
            .iter()
            .find(|(bytes, _)| same_bytes(bytes, image))
            .map(|(_, decoded)| decoded.clone())
    }

    /// The painter-level paint for `paint`, or `None` if it needs a tile that
    /// failed to decode.
    pub(crate) fn resolve(&self, paint: &Paint) -> Option<DevicePaint> {
        match paint {
            Paint::Solid(color) => Some(DevicePaint::Solid(*color)),
            Paint::Gradient(gradient) => Some(DevicePaint::Gradient(gradient.clone())),
            Paint::Pattern(pattern) => {
                let image = self.lookup(&pattern.image).flatten()?;
                Some(DevicePaint::Pattern {
                    image,
                    transform: pattern.transform,
                })
            }
        }
    }
}

pub(crate) fn same_bytes(a: &EncodedImage, b: &EncodedImage) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Largest stretch the linear part of `transform` applies to any direction.
pub(crate) fn max_scale(transform: Affine) -> f64 {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    let s1 = a * a + b * b;
    let s2 = c * c + d * d;
    let cross = a * c + b * d;
    let mean = (s1 + s2) / 2.0;
    let spread = (((s1 - s2) / 2.0).powi(2) + cross * cross).sqrt();
    (mean + spread).sqrt()
}

/// Returns `true` if a stroke keeps its width in document units.
fn stroke_scales(stroke: &StrokeDecoration, layer_scales: bool) -> bool {
    stroke.scales_with_zoom && layer_scales
}

/// How far strokes reach beyond the geometry, in document units.
pub(crate) fn stroke_outset(
    decorations: &[Decoration],
    layer_transform: Affine,
    layer_scales: bool,
    env: &DrawEnv<'_>,
) -> f64 {
    decorations
        .iter()
        .filter_map(|decoration| match decoration {
            Decoration::Stroke(stroke) if stroke_scales(stroke, layer_scales) => {
                Some(stroke.outset() * max_scale(layer_transform))
            }
            Decoration::Stroke(stroke) => Some(stroke.outset() / env.view_scale()),
            Decoration::Fill(_) => None,
        })
        .fold(0.0, f64::max)
}

/// Tests `pt` against the fills and strokes of `decorations` over the
/// document-space `path`.
///
/// Any fill containing the point is a hit; otherwise the point must lie
/// within half the widest stroke of the outline.
pub(crate) fn decorations_hit(
    decorations: &[Decoration],
    path: &BezPath,
    pt: Point,
    layer_transform: Affine,
    layer_scales: bool,
    env: &DrawEnv<'_>,
) -> bool {
    let mut half_width: Option<f64> = None;
    for decoration in decorations {
        match decoration {
            Decoration::Fill(fill) => {
                if path_contains(path, pt, fill.rule) {
                    return true;
                }
            }
            Decoration::Stroke(stroke) => {
                let width = stroke.style.width.abs();
                let half = if stroke_scales(stroke, layer_scales) {
                    width / 2.0 * uniform_scale(layer_transform)
                } else {
                    width / 2.0 / env.view_scale()
                };
                half_width = Some(half_width.map_or(half, |h| h.max(half)));
            }
        }
    }
    half_width.is_some_and(|half| {
        path_within(
            path,
            pt,
            half + env.options.hit_tolerance,
            env.options.curve_accuracy,
        )
    })
}

/// Renders `decorations` over the layer-space `path`, in list order.
///
/// The painter transform must already be `layer_to_view`.
pub(crate) fn paint_decorations(
    painter: &mut dyn Painter,
    path: &BezPath,
    decorations: &[Decoration],
    patterns: &PatternCache,
    layer_to_view: Affine,
    layer_scales: bool,
) {
    for decoration in decorations {
        match decoration {
            Decoration::Fill(fill) => {
                let Some(paint) = patterns.resolve(&fill.paint) else {
                    continue;
                };
                with_paint_opacity(painter, paint, fill.opacity, |p, paint| {
                    p.draw(DrawOp::FillPath {
                        path: path.clone(),
                        paint,
                        fill_rule: fill.rule,
                    });
                });
            }
            Decoration::Stroke(stroke) => {
                let Some(paint) = patterns.resolve(&stroke.paint) else {
                    continue;
                };
                let mut style = stroke.style.clone();
                if !stroke_scales(stroke, layer_scales) {
                    // Width is in view pixels; undo the layer-to-view scale.
                    style.width /= uniform_scale(layer_to_view).max(f64::MIN_POSITIVE);
                }
                with_paint_opacity(painter, paint, stroke.opacity, |p, paint| {
                    p.draw(DrawOp::StrokePath {
                        path: path.clone(),
                        paint,
                        style,
                    });
                });
            }
        }
    }
}

/// Applies a decoration opacity: folded into solid paints, otherwise as an
/// opacity layer. Fully transparent decorations draw nothing.
fn with_paint_opacity(
    painter: &mut dyn Painter,
    paint: DevicePaint,
    opacity: f32,
    draw: impl FnOnce(&mut dyn Painter, DevicePaint),
) {
    if opacity <= 0.0 {
        return;
    }
    if opacity >= 1.0 {
        draw(painter, paint);
    } else if let Some(faded) = paint.with_opacity(opacity) {
        draw(painter, faded);
    } else {
        painter.with_opacity_layer(opacity, |p| draw(p, paint));
    }
}
