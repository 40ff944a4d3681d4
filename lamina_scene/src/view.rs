// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The boundary between a scene and the platform view showing it.
//!
//! A [`SceneDatabase`] reports repaint work to a [`SceneDelegate`]. The
//! [`ViewAdapter`] is the stock delegate: it owns nothing of the platform, it
//! only translates invalidation into calls on a [`CanvasView`] and hands them
//! to a [`Dispatcher`] standing in for the UI thread.
//!
//! The scene holds its delegate weakly, so dropping the adapter (or the view
//! behind it) is enough to stop notifications.

use std::sync::Arc;
use std::fmt;

use kurbo::{Point, Rect, Size};
use lamina_imaging::Painter;

use crate::database::SceneDatabase;
use crate::invalidation::InvalidationSet;
use crate::layer::{CursorKind, Layer, LayerId};
use crate::query::LayerQuery;

/// Receives repaint work from a [`SceneDatabase`].
///
/// Callbacks run after the database lock is released, so implementations
/// may call back into the database.
pub trait SceneDelegate: Send + Sync {
    /// Areas of the view to repaint, in view coordinates, plus any
    /// whole-canvas, content-size or cursor changes.
    fn invalidate(&self, invalidation: &InvalidationSet);

    /// The canvas size or DPI changed.
    fn dimensions_changed(&self, size: Size, dpi: f64) {
        let _ = (size, dpi);
    }
}

/// What a platform view offers a scene.
pub trait CanvasView: Send + Sync {
    /// Schedule a repaint of `rect`, in view coordinates.
    fn set_needs_display_in(&self, rect: Rect);
    /// Schedule a repaint of the whole view.
    fn set_needs_display(&self);
    /// The zoomed canvas size changed; scroll extents need updating.
    fn content_size_changed(&self, size: Size);
    /// The pointer cursor should change.
    fn cursor_changed(&self, cursor: CursorKind);
}

/// Runs work on the UI scheduling context.
pub trait Dispatcher: Send + Sync {
    /// Runs `task`, now or later, on the context this dispatcher stands for.
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Runs every task inline on the calling thread.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

/// Routes a scene's invalidation to a [`CanvasView`].
pub struct ViewAdapter<Id: LayerId, V: CanvasView> {
    scene: Arc<SceneDatabase<Id>>,
    view: Arc<V>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl<Id: LayerId, V: CanvasView + 'static> ViewAdapter<Id, V> {
    /// Creates an adapter and registers it as the scene's delegate.
    ///
    /// The scene keeps only a weak reference; keep the returned `Arc` alive
    /// for as long as the view should receive updates.
    pub fn attach(scene: Arc<SceneDatabase<Id>>, view: Arc<V>, dispatcher: Arc<dyn Dispatcher>) -> Arc<Self> {
        let adapter = Arc::new(Self {
            scene,
            view,
            dispatcher,
        });
        adapter.scene.set_delegate(&adapter);
        adapter
    }

    /// Stops notifications to this adapter's view.
    pub fn detach(&self) {
        self.scene.clear_delegate();
    }

    /// The scene this adapter presents.
    pub fn scene(&self) -> &Arc<SceneDatabase<Id>> {
        &self.scene
    }

    /// The view receiving updates.
    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    /// Paints the view-space `rect`; call from the platform's draw pass.
    pub fn draw(&self, rect: Rect, painter: &mut dyn Painter) {
        self.scene.draw_rect(rect, painter);
    }

    /// The topmost layer under a view-space point.
    pub fn hit_test(&self, point: Point) -> Option<Layer<Id>> {
        let point = self.scene.convert_view_to_document(point);
        let mut hits: Vec<Layer<Id>> = self.scene.layers(LayerQuery::UnderLocation(point), |_| true);
        hits.pop()
    }

    /// The platform view was resized.
    pub fn resize(&self, bounds: Rect) {
        self.scene.set_view_bounds(bounds);
    }
}

impl<Id: LayerId, V: CanvasView + 'static> SceneDelegate for ViewAdapter<Id, V> {
    fn invalidate(&self, invalidation: &InvalidationSet) {
        let view = self.view.clone();
        let invalidation = invalidation.clone();
        let content_size = invalidation.is_content_size().then(|| self.scene.content_size());
        let cursor = invalidation.is_cursor().then(|| self.scene.cursor());
        self.dispatcher.dispatch(Box::new(move || {
            if let Some(size) = content_size {
                view.content_size_changed(size);
            }
            if let Some(cursor) = cursor {
                view.cursor_changed(cursor);
            }
            if invalidation.is_whole_canvas() {
                view.set_needs_display();
            } else if let Some(rect) = invalidation.dirty_rect() {
                view.set_needs_display_in(rect);
            }
        }));
    }
}

impl<Id: LayerId, V: CanvasView> fmt::Debug for ViewAdapter<Id, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewAdapter")
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}
