// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{BezPath, Point, Rect, Shape};
use lamina_imaging::Painter;

use super::{DrawEnv, PatternCache, decorations_hit, paint_decorations, stroke_outset, with_layer_scope};
use crate::geometry::{transformed_path, validate_path};
use crate::invalidation::InvalidationSet;
use crate::layer::{LayerId, PathLayer};

#[derive(Debug)]
pub(crate) struct PathDrawable<Id: LayerId> {
    layer: PathLayer<Id>,
    /// Geometry in document space; empty when the layer path is malformed.
    document_path: BezPath,
    patterns: PatternCache,
    pub(crate) did_draw: Option<Rect>,
}

impl<Id: LayerId> PathDrawable<Id> {
    pub(crate) fn new(layer: PathLayer<Id>, env: &DrawEnv<'_>) -> Self {
        let mut patterns = PatternCache::default();
        patterns.sync(&layer.decorations, env.services);
        Self {
            document_path: document_path(&layer),
            layer,
            patterns,
            did_draw: None,
        }
    }

    pub(crate) fn layer(&self) -> &PathLayer<Id> {
        &self.layer
    }

    pub(crate) fn update(&mut self, layer: PathLayer<Id>, env: &DrawEnv<'_>) -> InvalidationSet {
        if layer == self.layer {
            return InvalidationSet::new();
        }
        let mut set = InvalidationSet::new();
        set.insert_opt_rect(self.will_draw_rect(env));
        set.insert_opt_rect(self.did_draw);
        let hidden_throughout = !self.layer.visible && !layer.visible;

        let geometry_changed = layer.path != self.layer.path || layer.transform != self.layer.transform;
        let decorations_changed = layer.decorations != self.layer.decorations;
        self.layer = layer;
        if geometry_changed {
            self.document_path = document_path(&self.layer);
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
        if self.document_path.elements().is_empty() {
            return None;
        }
        let outset = stroke_outset(
            &self.layer.decorations,
            self.layer.transform,
            self.layer.scales_with_zoom,
            env,
        );
        Some(self.document_path.bounding_box().inflate(outset, outset))
    }

    pub(crate) fn hit_test(&self, pt: Point, env: &DrawEnv<'_>) -> bool {
        decorations_hit(
            &self.layer.decorations,
            &self.document_path,
            pt,
            self.layer.transform,
            self.layer.scales_with_zoom,
            env,
        )
    }

    pub(crate) fn structure_path(&self) -> BezPath {
        self.document_path.clone()
    }

    pub(crate) fn draw(&self, painter: &mut dyn Painter, clip_view: Rect, env: &DrawEnv<'_>) {
        if !self.layer.visible || self.document_path.elements().is_empty() {
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
                    &self.layer.path,
                    &self.layer.decorations,
                    &self.patterns,
                    layer_to_view,
                    self.layer.scales_with_zoom,
                );
            },
        );
    }
}

fn document_path<Id: LayerId>(layer: &PathLayer<Id>) -> BezPath {
    if !validate_path(&layer.path) {
        log::warn!("path layer {:?}: subpath does not start with a move-to; drawing nothing", layer.id);
        return BezPath::new();
    }
    transformed_path(&layer.path, layer.transform)
}
