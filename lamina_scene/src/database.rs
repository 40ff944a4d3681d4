// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The thread-safe scene database.

use std::sync::{Arc, Weak};
use std::fmt;

use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};
use lamina_imaging::Painter;
use parking_lot::Mutex;

use crate::error::SceneError;
use crate::invalidation::{InvalidationKind, InvalidationSet};
use crate::layer::{Canvas, CanvasCommand, CursorKind, Layer, LayerId};
use crate::options::SceneOptions;
use crate::paint::Color;
use crate::query::LayerQuery;
use crate::services::Services;
use crate::state::{Notice, SceneCore};
use crate::view::SceneDelegate;
use crate::viewport::Viewport;

/// Retained scene state for one canvas.
///
/// All state sits behind a single lock. Every operation holds it only for
/// its own duration; the delegate is notified afterwards, so delegate
/// callbacks may re-enter the database.
///
/// Mutations return the view-space [`InvalidationSet`] they produced, and
/// the same set goes to the delegate when it is not empty.
pub struct SceneDatabase<Id: LayerId> {
    core: Mutex<SceneCore<Id>>,
    delegate: Mutex<Option<Weak<dyn SceneDelegate>>>,
}

impl<Id: LayerId> Default for SceneDatabase<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: LayerId> SceneDatabase<Id> {
    /// An empty scene with default services and options.
    pub fn new() -> Self {
        Self::with_services(Services::default(), SceneOptions::default())
    }

    /// An empty scene using `services` for decoding and text layout.
    pub fn with_services(services: Services, options: SceneOptions) -> Self {
        Self {
            core: Mutex::new(SceneCore::new(services, options)),
            delegate: Mutex::new(None),
        }
    }

    /// Registers `delegate`. The scene holds it weakly.
    pub fn set_delegate<D: SceneDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<D> = Arc::downgrade(delegate);
        *self.delegate.lock() = Some(weak);
    }

    /// Stops delegate notifications.
    pub fn clear_delegate(&self) {
        *self.delegate.lock() = None;
    }

    /// Runs `f` with the lock held, then notifies the delegate.
    fn mutate<R>(&self, f: impl FnOnce(&mut SceneCore<Id>) -> R) -> (R, InvalidationSet) {
        let (out, notice) = {
            let mut core = self.core.lock();
            let out = f(&mut core);
            (out, core.take_notice())
        };
        let invalidation = notice.invalidation.clone();
        self.notify(notice);
        (out, invalidation)
    }

    fn notify(&self, notice: Notice) {
        let delegate = self.delegate.lock().clone();
        let Some(delegate) = delegate.and_then(|weak| weak.upgrade()) else {
            return;
        };
        if !notice.invalidation.is_empty() {
            delegate.invalidate(&notice.invalidation);
        }
        if let Some((size, dpi)) = notice.dimensions {
            delegate.dimensions_changed(size, dpi);
        }
    }

    /// Reconciles the scene against a full canvas snapshot.
    ///
    /// On error the scene is unchanged.
    pub fn update(&self, canvas: &Canvas<Id>) -> Result<InvalidationSet, SceneError<Id>> {
        let (result, invalidation) = self.mutate(|core| core.update(canvas));
        result.map(|()| invalidation)
    }

    /// Applies fine-grained changes in order.
    ///
    /// On error the changes before the failing one stay applied and their
    /// invalidation has been delivered to the delegate.
    pub fn perform(&self, command: CanvasCommand<Id>) -> Result<InvalidationSet, SceneError<Id>> {
        let (result, invalidation) = self.mutate(|core| core.perform(command));
        result.map(|()| invalidation)
    }

    /// Sets the view-space rectangle the scene is shown in.
    pub fn set_view_bounds(&self, bounds: Rect) -> InvalidationSet {
        self.mutate(|core| {
            if core.frame.viewport.set_view_bounds(bounds) {
                core.invalidate(InvalidationKind::WHOLE_CANVAS);
            }
        })
        .1
    }

    /// Sets the zoom, clamped to the configured limits.
    pub fn set_zoom(&self, zoom: f64) -> InvalidationSet {
        self.mutate(|core| core.set_zoom(zoom)).1
    }

    /// Zooms by `factor` keeping the view-space `anchor` fixed.
    pub fn zoom_about(&self, anchor: Point, factor: f64) -> InvalidationSet {
        self.mutate(|core| {
            if core.frame.viewport.zoom_about_view_point(anchor, factor) {
                core.invalidate(InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS);
            }
        })
        .1
    }

    /// Sets the scroll offset, in view pixels.
    pub fn set_scroll(&self, scroll: Vec2) -> InvalidationSet {
        self.mutate(|core| {
            if core.frame.viewport.set_scroll(scroll) {
                core.invalidate(InvalidationKind::WHOLE_CANVAS);
            }
        })
        .1
    }

    /// Sets the display resolution; the delegate hears about it through
    /// [`SceneDelegate::dimensions_changed`].
    pub fn set_dpi(&self, dpi: f64) {
        self.mutate(|core| {
            if core.frame.dpi != dpi {
                core.frame.dpi = dpi;
                core.dimensions_changed = true;
            }
        });
    }

    /// Layers matching `query`, topmost first. See [`LayerQuery`].
    pub fn layers(&self, query: LayerQuery, predicate: impl FnMut(Id) -> bool) -> Vec<Layer<Id>> {
        self.core.lock().layers(query, predicate)
    }

    /// The current snapshot of a layer or computed layer.
    pub fn layer(&self, id: Id) -> Option<Layer<Id>> {
        self.core.lock().layer(id)
    }

    /// Document-space geometry of `ids`; computed ids stand for their
    /// outputs.
    pub fn structure_paths(&self, ids: &[Id]) -> Vec<BezPath> {
        self.core.lock().structure_paths(ids)
    }

    /// Document-space union of what `ids` draw.
    pub fn effect_bounds(&self, ids: &[Id]) -> Option<Rect> {
        self.core.lock().effect_bounds(ids)
    }

    /// Paints the view-space `rect` into `painter`.
    pub fn draw_rect(&self, rect: Rect, painter: &mut dyn Painter) {
        self.core.lock().draw_rect(rect, painter);
    }

    /// Maps a view-space point into document space.
    pub fn convert_view_to_document(&self, point: Point) -> Point {
        self.core.lock().convert_view_to_document(point)
    }

    /// Canvas size in document units.
    pub fn size(&self) -> Size {
        self.core.lock().frame.size()
    }

    /// Canvas size in view pixels at the current zoom.
    pub fn content_size(&self) -> Size {
        let core = self.core.lock();
        core.frame.size() * core.frame.viewport.zoom()
    }

    /// Current zoom factor.
    pub fn zoom(&self) -> f64 {
        self.core.lock().frame.viewport.zoom()
    }

    /// Document-to-canvas transform applied to every layer.
    pub fn content_transform(&self) -> Affine {
        self.core.lock().frame.content_transform
    }

    /// Solid background, if any.
    pub fn background_color(&self) -> Option<Color> {
        self.core.lock().frame.background
    }

    /// Cursor last requested by a command.
    pub fn cursor(&self) -> CursorKind {
        self.core.lock().frame.cursor
    }

    /// Display resolution reported to the delegate.
    pub fn dpi(&self) -> f64 {
        self.core.lock().frame.dpi
    }

    /// A copy of the viewport state.
    pub fn viewport(&self) -> Viewport {
        self.core.lock().frame.viewport.clone()
    }

    /// Number of materialized layers.
    pub fn len(&self) -> usize {
        self.core.lock().order.len()
    }

    /// Returns `true` if no layer is materialized.
    pub fn is_empty(&self) -> bool {
        self.core.lock().order.is_empty()
    }

    /// Materialized layer ids, bottom first.
    pub fn paint_order(&self) -> Vec<Id> {
        self.core.lock().order.clone()
    }

    /// Ids most recently produced by a computed layer, in paint order.
    pub fn generated_layers(&self, computed: Id) -> Option<Vec<Id>> {
        self.core
            .lock()
            .computed
            .get(&computed)
            .map(|generation| generation.output_ids())
    }
}

impl<Id: LayerId> fmt::Debug for SceneDatabase<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SceneDatabase");
        let Some(core) = self.core.try_lock() else {
            return s.finish_non_exhaustive();
        };
        s.field("size", &core.frame.size())
            .field("layers", &core.order.len())
            .field("computed", &core.computed.len())
            .field("viewport", &core.frame.viewport)
            .finish_non_exhaustive()
    }
}
