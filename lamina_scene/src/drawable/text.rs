// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{BezPath, Point, Rect, Shape};
use lamina_imaging::Painter;

use super::{DrawEnv, PatternCache, paint_decorations, stroke_outset, with_layer_scope};
use crate::geometry::{rect_path, transformed_path};
use crate::invalidation::InvalidationSet;
use crate::layer::{LayerId, TextLayer};
use crate::services::{TextLayout, TextLayoutRequest};

/// Text drawable.
///
/// The layout (bounds and glyph outlines) is cached and dropped wholesale
/// whenever the runs or wrapping settings change. Layout always goes through
/// the scene's [`TextShaper`](crate::services::TextShaper).
#[derive(Debug)]
pub(crate) struct TextDrawable<Id: LayerId> {
    layer: TextLayer<Id>,
    layout: TextLayout,
    document_outline: BezPath,
    patterns: PatternCache,
    pub(crate) did_draw: Option<Rect>,
}

impl<Id: LayerId> TextDrawable<Id> {
    pub(crate) fn new(layer: TextLayer<Id>, env: &DrawEnv<'_>) -> Self {
        let layout = lay_out(&layer, env);
        let mut patterns = PatternCache::default();
        patterns.sync(&layer.decorations, env.services);
        Self {
            document_outline: transformed_path(&layout.outline, layer.transform),
            layout,
            layer,
            patterns,
            did_draw: None,
        }
    }

    pub(crate) fn layer(&self) -> &TextLayer<Id> {
        &self.layer
    }

    pub(crate) fn update(&mut self, layer: TextLayer<Id>, env: &DrawEnv<'_>) -> InvalidationSet {
        if layer == self.layer {
            return InvalidationSet::new();
        }
        let mut set = InvalidationSet::new();
        set.insert_opt_rect(self.will_draw_rect(env));
        set.insert_opt_rect(self.did_draw);
        let hidden_throughout = !self.layer.visible && !layer.visible;

        let text_changed = layer.runs != self.layer.runs
            || layer.autosize != self.layer.autosize
            || layer.wrap_width != self.layer.wrap_width;
        let transform_changed = layer.transform != self.layer.transform;
        let decorations_changed = layer.decorations != self.layer.decorations;
        self.layer = layer;
        if text_changed {
            self.layout = lay_out(&self.layer, env);
        }
        if text_changed || transform_changed {
            self.document_outline = transformed_path(&self.layout.outline, self.layer.transform);
        }
        if decorations_changed {
            self.patterns.sync(&self.layer.decorations, env.services);
        }

        if hidden_throughout {
            return InvalidationSet::new();
        }
        set.insert_opt_rect(self.will_draw_rect(env));
        set
    }

    pub(crate) fn will_draw_rect(&self, env: &DrawEnv<'_>) -> Option<Rect> {
        let outline_empty = self.layout.outline.elements().is_empty();
        if outline_empty && self.layout.bounds.area() == 0.0 {
            return None;
        }
        let mut bounds = self.layer.transform.transform_rect_bbox(self.layout.bounds);
        if !outline_empty {
            bounds = bounds.union(self.document_outline.bounding_box());
        }
        let outset = stroke_outset(&self.layer.decorations, self.layer.transform, true, env);
        Some(bounds.inflate(outset, outset))
    }

    pub(crate) fn hit_test(&self, pt: Point) -> bool {
        if self.layer.transform.determinant().abs() <= f64::EPSILON {
            return false;
        }
        let local = self.layer.transform.inverse() * pt;
        let rect = self.layout.bounds;
        local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
    }

    pub(crate) fn structure_path(&self) -> BezPath {
        if self.document_outline.elements().is_empty() {
            rect_path(self.layout.bounds, self.layer.transform)
        } else {
            self.document_outline.clone()
        }
    }

    pub(crate) fn draw(&self, painter: &mut dyn Painter, clip_view: Rect, env: &DrawEnv<'_>) {
        if !self.layer.visible || self.layout.outline.elements().is_empty() {
            return;
        }
        let layer_to_view = env.document_to_view * self.layer.transform;
        with_layer_scope(
            painter,
            clip_view,
            self.layer.blend,
            self.layer.opacity,
            layer_to_view,
            |p| {
                paint_decorations(
                    p,
                    &self.layout.outline,
                    &self.layer.decorations,
                    &self.patterns,
                    layer_to_view,
                    true,
                );
            },
        );
    }
}

fn lay_out<Id: LayerId>(layer: &TextLayer<Id>, env: &DrawEnv<'_>) -> TextLayout {
    log::trace!("laying out text layer {:?}", layer.id);
    env.services.shaper.layout(&TextLayoutRequest {
        runs: &layer.runs,
        autosize: layer.autosize,
        wrap_width: layer.wrap_width,
    })
}
