// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use kurbo::{BezPath, Point, Rect};
use lamina_imaging::{Bitmap, DrawOp, Painter};

use super::{DrawEnv, same_bytes, with_layer_scope};
use crate::geometry::rect_path;
use crate::invalidation::InvalidationSet;
use crate::layer::{ImageLayer, LayerId};

#[derive(Debug)]
pub(crate) struct ImageDrawable<Id: LayerId> {
    layer: ImageLayer<Id>,
    /// `None` when the bytes did not decode; such layers draw nothing.
    bitmap: Option<Arc<Bitmap>>,
    pub(crate) did_draw: Option<Rect>,
}

impl<Id: LayerId> ImageDrawable<Id> {
    pub(crate) fn new(layer: ImageLayer<Id>, env: &DrawEnv<'_>) -> Self {
        let bitmap = decode(&layer, env);
        Self {
            layer,
            bitmap,
            did_draw: None,
        }
    }

    pub(crate) fn layer(&self) -> &ImageLayer<Id> {
        &self.layer
    }

    pub(crate) fn update(&mut self, layer: ImageLayer<Id>, env: &DrawEnv<'_>) -> InvalidationSet {
        if layer == self.layer {
            return InvalidationSet::new();
        }
        let mut set = InvalidationSet::new();
        set.insert_opt_rect(self.will_draw_rect());
        set.insert_opt_rect(self.did_draw);
        let hidden_throughout = !self.layer.visible && !layer.visible;

        let bytes_changed = !same_bytes(&self.layer.image, &layer.image);
        self.layer = layer;
        if bytes_changed {
            self.bitmap = decode(&self.layer, env);
        }

        if hidden_throughout {
            return InvalidationSet::new();
        }
        set.insert_opt_rect(self.will_draw_rect());
        set
    }

    pub(crate) fn will_draw_rect(&self) -> Option<Rect> {
        Some(self.layer.transform.transform_rect_bbox(self.layer.local_rect()))
    }

    pub(crate) fn hit_test(&self, pt: Point) -> bool {
        if self.layer.transform.determinant().abs() <= f64::EPSILON {
            return false;
        }
        let local = self.layer.transform.inverse() * pt;
        let rect = self.layer.local_rect();
        local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
    }

    pub(crate) fn structure_path(&self) -> BezPath {
        rect_path(self.layer.local_rect(), self.layer.transform)
    }

    pub(crate) fn draw(&self, painter: &mut dyn Painter, clip_view: Rect, env: &DrawEnv<'_>) {
        if !self.layer.visible {
            return;
        }
        let Some(bitmap) = self.bitmap.clone() else {
            return;
        };
        let dst = self.layer.local_rect();
        with_layer_scope(
            painter,
            clip_view,
            self.layer.blend,
            self.layer.opacity,
            env.document_to_view * self.layer.transform,
            |p| p.draw(DrawOp::DrawImage { image: bitmap, dst }),
        );
    }
}

fn decode<Id: LayerId>(layer: &ImageLayer<Id>, env: &DrawEnv<'_>) -> Option<Arc<Bitmap>> {
    let decoded = env.services.decoder.decode(&layer.image).map(Arc::new);
    if decoded.is_none() {
        log::warn!("image layer {:?}: bytes could not be decoded", layer.id);
    }
    decoded
}
