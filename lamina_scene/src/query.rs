// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial queries and painting.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect};
use lamina_imaging::{Bitmap, DrawOp, Paint as DevicePaint, Painter};

use crate::geometry::union_rects;
use crate::layer::{Layer, LayerId};
use crate::options::Checkerboard;
use crate::state::SceneCore;

/// Selects layers by geometry. Coordinates are in document space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LayerQuery {
    /// Every layer.
    All,
    /// The topmost layer hit at a point; at most one result.
    UnderLocation(Point),
    /// Layers whose drawn bounds meet the rect.
    IntersectingBounds(Rect),
    /// Layers whose drawn bounds lie inside the rect.
    ContainingBounds(Rect),
}

impl<Id: LayerId> SceneCore<Id> {
    /// Snapshots of the layers matching `query`, topmost first.
    ///
    /// `predicate` sees each id before any geometry is tested.
    pub(crate) fn layers(&self, query: LayerQuery, mut predicate: impl FnMut(Id) -> bool) -> Vec<Layer<Id>> {
        let env = self.frame.env();
        let mut found = Vec::new();
        for &id in self.order.iter().rev() {
            if !predicate(id) {
                continue;
            }
            let Some(drawable) = self.drawables.get(&id) else {
                continue;
            };
            let matched = match query {
                LayerQuery::All => true,
                LayerQuery::UnderLocation(pt) => drawable.hit_test(pt, &env),
                LayerQuery::IntersectingBounds(rect) => drawable.intersects(rect, &env),
                LayerQuery::ContainingBounds(rect) => drawable.contained_by(rect, &env),
            };
            if matched {
                found.push(drawable.layer());
                if matches!(query, LayerQuery::UnderLocation(_)) {
                    break;
                }
            }
        }
        found
    }

    /// Materialized ids for `ids`, with computed layers standing for their
    /// outputs. Unknown ids are skipped.
    fn materialized(&self, ids: &[Id]) -> Vec<Id> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.drawables.contains_key(&id) {
                out.push(id);
            } else if let Some(generation) = self.computed.get(&id) {
                out.extend(generation.output_ids());
            }
        }
        out
    }

    pub(crate) fn structure_paths(&self, ids: &[Id]) -> Vec<BezPath> {
        self.materialized(ids)
            .into_iter()
            .filter_map(|id| self.drawables.get(&id))
            .map(|drawable| drawable.structure_path())
            .collect()
    }

    /// Union of the will-draw rects of `ids`, in document space.
    pub(crate) fn effect_bounds(&self, ids: &[Id]) -> Option<Rect> {
        let env = self.frame.env();
        self.materialized(ids)
            .into_iter()
            .filter_map(|id| self.drawables.get(&id))
            .fold(None, |acc, drawable| union_rects(acc, drawable.will_draw_rect(&env)))
    }

    pub(crate) fn convert_view_to_document(&self, pt: Point) -> Point {
        self.frame.viewport.view_to_document(self.frame.content_transform) * pt
    }

    /// Repaints the view-space `rect`: background first, then every layer
    /// in paint order.
    pub(crate) fn draw_rect(&mut self, rect: Rect, painter: &mut dyn Painter) {
        painter.set_transform(Affine::IDENTITY);
        painter.draw(DrawOp::Clear(rect));

        let canvas_to_view = self.frame.viewport.canvas_to_view();
        let canvas = canvas_to_view.transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, self.frame.size()));
        let backdrop = canvas.intersect(rect);
        if backdrop.width() > 0.0 && backdrop.height() > 0.0 {
            if let Some(color) = self.frame.background {
                painter.draw(DrawOp::FillRect {
                    rect: backdrop,
                    paint: DevicePaint::Solid(color),
                });
            } else if let Some(checkerboard) = self.frame.options.checkerboard {
                painter.draw(DrawOp::FillRect {
                    rect: backdrop,
                    paint: checkerboard_paint(&checkerboard, canvas.origin()),
                });
            }
        }

        let env = self.frame.env();
        let clip = self
            .frame
            .viewport
            .view_to_document(self.frame.content_transform)
            .transform_rect_bbox(rect);
        let mut drawn = 0_usize;
        for id in &self.order {
            if let Some(drawable) = self.drawables.get_mut(id) {
                drawable.draw(painter, clip, rect, &env);
                drawn += 1;
            }
        }
        painter.set_transform(Affine::IDENTITY);
        log::trace!("drew {rect:?} over {drawn} layers");
    }
}

/// A 2x2 tile repeated with one cell per `checkerboard.cell` view pixels.
fn checkerboard_paint(checkerboard: &Checkerboard, origin: Point) -> DevicePaint {
    let light = checkerboard.light.to_rgba8();
    let dark = checkerboard.dark.to_rgba8();
    let mut pixels = Vec::with_capacity(16);
    for color in [light, dark, dark, light] {
        pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
    }
    match Bitmap::from_rgba8(2, 2, pixels) {
        Some(tile) => DevicePaint::Pattern {
            image: Arc::new(tile),
            transform: Affine::translate(origin.to_vec2()) * Affine::scale(checkerboard.cell),
        },
        None => DevicePaint::Solid(checkerboard.light),
    }
}
