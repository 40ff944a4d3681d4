// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Point, Rect, Vec2};

/// Default lower bound for [`Viewport::zoom`].
pub const DEFAULT_MIN_ZOOM: f64 = 1e-3;
/// Default upper bound for [`Viewport::zoom`].
pub const DEFAULT_MAX_ZOOM: f64 = 1e3;

/// Zoom and scroll state of the view presenting a canvas.
///
/// Three coordinate spaces are involved:
/// - *document* space, where layers live;
/// - *canvas* space, document space after the canvas content transform;
/// - *view* space, the host view's pixels.
///
/// The viewport maps canvas space to view space with a uniform zoom followed
/// by a scroll offset measured in view pixels:
/// `view = translate(-scroll) * scale(zoom) * canvas`.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    view_bounds: Rect,
    zoom: f64,
    scroll: Vec2,
    min_zoom: f64,
    max_zoom: f64,
    canvas_to_view: Affine,
    view_to_canvas: Affine,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}

impl Viewport {
    /// Creates a viewport over `view_bounds` with zoom `1.0` and no scroll.
    #[must_use]
    pub fn new(view_bounds: Rect) -> Self {
        let mut vp = Self {
            view_bounds,
            zoom: 1.0,
            scroll: Vec2::ZERO,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            canvas_to_view: Affine::IDENTITY,
            view_to_canvas: Affine::IDENTITY,
        };
        vp.rebuild_transforms();
        vp
    }

    /// The visible region of the host view, in view coordinates.
    #[must_use]
    pub fn view_bounds(&self) -> Rect {
        self.view_bounds
    }

    /// Replaces the view bounds. Returns `true` if they changed.
    pub fn set_view_bounds(&mut self, bounds: Rect) -> bool {
        if self.view_bounds == bounds {
            return false;
        }
        self.view_bounds = bounds;
        true
    }

    /// Current uniform zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The zoom range as `(min, max)`.
    #[must_use]
    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Sets the zoom range, normalizing it so that `min <= max`, and clamps
    /// the current zoom into it.
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.set_zoom(self.zoom);
    }

    /// Sets the zoom, clamped into the zoom range. Returns `true` if the
    /// effective zoom changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !zoom.is_finite() {
            return false;
        }
        let clamped = zoom.clamp(self.min_zoom, self.max_zoom);
        if (self.zoom - clamped).abs() < f64::EPSILON {
            return false;
        }
        self.zoom = clamped;
        self.rebuild_transforms();
        true
    }

    /// Current scroll offset in view pixels.
    #[must_use]
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Sets the scroll offset. Returns `true` if it changed.
    pub fn set_scroll(&mut self, scroll: Vec2) -> bool {
        if self.scroll == scroll {
            return false;
        }
        self.scroll = scroll;
        self.rebuild_transforms();
        true
    }

    /// Zooms by `factor` keeping `anchor` (in view space) fixed.
    ///
    /// Returns `true` if zoom or scroll changed.
    pub fn zoom_about_view_point(&mut self, anchor: Point, factor: f64) -> bool {
        if factor <= 0.0 || !factor.is_finite() {
            return false;
        }
        let canvas_pt = self.view_to_canvas * anchor;
        if !self.set_zoom(self.zoom * factor) {
            return false;
        }
        let scroll = canvas_pt.to_vec2() * self.zoom - anchor.to_vec2();
        self.set_scroll(scroll);
        true
    }

    /// Canvas space to view space.
    #[must_use]
    pub fn canvas_to_view(&self) -> Affine {
        self.canvas_to_view
    }

    /// Document space to view space for a canvas with `content_transform`.
    #[must_use]
    pub fn document_to_view(&self, content_transform: Affine) -> Affine {
        self.canvas_to_view * content_transform
    }

    /// View space to document space: the inverse viewport mapping followed by
    /// the inverse content transform.
    ///
    /// The content transform is inverted rather than applied forward, so this
    /// is the exact inverse of [`Viewport::document_to_view`] and pointer
    /// positions land on the layers drawn under them. A singular content
    /// transform maps everything to the canvas origin.
    #[must_use]
    pub fn view_to_document(&self, content_transform: Affine) -> Affine {
        let inverse_content = if content_transform.determinant().abs() > f64::EPSILON {
            content_transform.inverse()
        } else {
            Affine::scale(0.0)
        };
        inverse_content * self.view_to_canvas
    }

    /// The canvas-space region currently visible.
    #[must_use]
    pub fn visible_canvas_rect(&self) -> Rect {
        self.view_to_canvas.transform_rect_bbox(self.view_bounds)
    }

    fn rebuild_transforms(&mut self) {
        self.canvas_to_view = Affine::translate(-self.scroll) * Affine::scale(self.zoom);
        self.view_to_canvas = self.canvas_to_view.inverse();
    }
}
