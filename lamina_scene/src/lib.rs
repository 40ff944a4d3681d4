// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lamina Scene: a retained-mode 2D scene database for canvas editors.
//!
//! A document model describes what should be on screen as a [`Canvas`]: its
//! size, background and an ordered list of [`Layer`]s. The
//! [`SceneDatabase`] turns each snapshot into long-lived drawables, works out
//! which parts of the view need repainting, answers hit tests and spatial
//! queries, and paints dirty regions through a [`Painter`].
//!
//! ## Layers
//!
//! - [`ImageLayer`]: encoded image bytes placed in a rectangle.
//! - [`PathLayer`]: a Bézier path rendered through fill and stroke
//!   [`Decoration`]s, in list order.
//! - [`TextLayer`]: styled runs laid out by an injected
//!   [`TextLayoutEngine`].
//! - [`ComputedLayer`]: a rule deriving layers from another layer through a
//!   [`LayerFactory`]. Its outputs are re-derived whenever the source
//!   changes, transitively, within the same call.
//!
//! ## Updating
//!
//! Two entry points mutate the scene:
//! - [`SceneDatabase::update`] reconciles against a full [`Canvas`]. Layer
//!   order is diffed so that only inserted, removed, moved or changed layers
//!   are invalidated; unchanged layers keep their caches.
//! - [`SceneDatabase::perform`] applies a [`CanvasCommand`], a list of
//!   fine-grained [`CanvasChange`]s, without a full diff.
//!
//! Both return an [`InvalidationSet`] in view coordinates and deliver it to
//! the registered [`SceneDelegate`] after the internal lock is released.
//!
//! ## Coordinate spaces
//!
//! Layer transforms map layer space to document space. The canvas content
//! transform maps document space to canvas space, and the [`Viewport`]
//! (zoom, then scroll) maps canvas space to view space. Queries take
//! document coordinates; [`SceneDatabase::convert_view_to_document`] maps
//! pointer positions in.
//!
//! ```
//! use kurbo::{BezPath, Point, Rect, Shape};
//! use lamina_scene::{Canvas, Color, Decoration, LayerQuery, PathLayer, SceneDatabase};
//!
//! let scene = SceneDatabase::<u32>::new();
//! let square: BezPath = Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1);
//! let canvas = Canvas::new(100.0, 100.0).with_layer(
//!     PathLayer::new(1, square)
//!         .with_decoration(Decoration::fill(Color::from_rgb8(0xff, 0, 0))),
//! );
//! scene.update(&canvas).unwrap();
//!
//! let hits = scene.layers(LayerQuery::UnderLocation(Point::new(0.5, 0.5)), |_| true);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].id(), 1);
//! ```

mod command;
mod database;
mod dependency;
mod diff;
mod drawable;
mod query;
mod reconcile;
mod state;

pub mod error;
pub mod geometry;
pub mod invalidation;
pub mod layer;
pub mod options;
pub mod paint;
pub mod services;
pub mod view;
pub mod viewport;

pub use database::SceneDatabase;
pub use error::SceneError;
pub use invalidation::{InvalidationKind, InvalidationSet};
pub use layer::{
    Canvas, CanvasChange, CanvasCommand, CanvasIndex, ComputeContext, ComputedLayer, CursorKind, FactoryId,
    ImageLayer, Layer, LayerFactory, LayerId, PathLayer, TextAlignment, TextAttributes, TextLayer, TextRun,
};
pub use options::{Checkerboard, SceneOptions};
pub use paint::{Color, Decoration, FillDecoration, Paint, Pattern, StrokeDecoration};
pub use query::LayerQuery;
pub use services::{ImageDecoder, Services, TextLayout, TextLayoutEngine, TextLayoutRequest, TextShaper};
pub use view::{CanvasView, Dispatcher, ImmediateDispatcher, SceneDelegate, ViewAdapter};
pub use viewport::Viewport;

pub use lamina_imaging::{Bitmap, Painter};
