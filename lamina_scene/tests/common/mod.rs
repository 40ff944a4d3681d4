// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fakes and builders for scene integration tests.

#![allow(
    dead_code,
    reason = "Each test file uses a different subset of the helpers."
)]

use kurbo::{Affine, Rect, Shape};
use lamina_scene::{
    Bitmap, Color, Decoration, FactoryId, ImageDecoder, InvalidationSet, Layer, LayerFactory, PathLayer,
    SceneDatabase, SceneDelegate, SceneOptions, Services, TextLayout, TextLayoutEngine, TextLayoutRequest,
};
use parking_lot::Mutex;

pub(crate) fn red() -> Color {
    Color::from_rgb8(0xff, 0, 0)
}

/// A filled rectangle as a path layer.
pub(crate) fn filled_rect(id: u32, rect: Rect) -> PathLayer<u32> {
    PathLayer::new(id, rect.to_path(0.1)).with_decoration(Decoration::fill(red()))
}

/// Decodes any non-empty byte string to a 1x1 opaque pixel.
#[derive(Debug)]
pub(crate) struct PixelDecoder;

impl ImageDecoder for PixelDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<Bitmap> {
        if bytes.is_empty() {
            return None;
        }
        Bitmap::from_rgba8(1, 1, vec![0, 0, 0, 0xff])
    }
}

/// Lays each character out as a 10x10 box, left to right.
#[derive(Debug)]
pub(crate) struct BoxEngine;

impl TextLayoutEngine for BoxEngine {
    fn layout(&mut self, request: &TextLayoutRequest<'_>) -> TextLayout {
        let mut outline = kurbo::BezPath::new();
        let mut x = 0.0;
        for run in request.runs {
            for _ in run.text.chars() {
                outline.extend(Rect::new(x, 0.0, x + 10.0, 10.0).to_path(0.1));
                x += 10.0;
            }
        }
        TextLayout {
            bounds: Rect::new(0.0, 0.0, x, 10.0),
            outline,
        }
    }
}

pub(crate) fn scene() -> SceneDatabase<u32> {
    SceneDatabase::with_services(
        Services::default()
            .with_decoder(PixelDecoder)
            .with_text_engine(BoxEngine),
        SceneOptions::default(),
    )
}

/// Derives one copy of a path source, shifted right by `dx`.
pub(crate) fn shifted_copy(factory: u64, output: u32, dx: f64) -> LayerFactory<u32> {
    LayerFactory::new(FactoryId(factory), move |source, _| match source {
        Layer::Path(path) => {
            let mut copy = path.clone();
            copy.id = output;
            copy.transform = Affine::translate((dx, 0.0)) * path.transform;
            vec![Layer::Path(copy)]
        }
        _ => Vec::new(),
    })
}

/// Remembers every notification.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) invalidations: Mutex<Vec<InvalidationSet>>,
    pub(crate) dimensions: Mutex<Vec<(kurbo::Size, f64)>>,
}

impl SceneDelegate for Recorder {
    fn invalidate(&self, invalidation: &InvalidationSet) {
        self.invalidations.lock().push(invalidation.clone());
    }

    fn dimensions_changed(&self, size: kurbo::Size, dpi: f64) {
        self.dimensions.lock().push((size, dpi));
    }
}

pub(crate) fn ids(layers: &[Layer<u32>]) -> Vec<u32> {
    layers.iter().map(Layer::id).collect()
}
