// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External services the scene consumes: image decoding and text layout.
//!
//! Both are injected through [`Services`] when a database is created so that
//! hosts plug in their platform stack and tests substitute fakes.

use std::sync::Arc;
use std::fmt;

use kurbo::{BezPath, Rect};
use lamina_imaging::Bitmap;
use parking_lot::Mutex;

use crate::layer::TextRun;

/// Turns encoded image bytes into a drawable bitmap.
pub trait ImageDecoder: Send + Sync {
    /// Decodes `bytes`, or returns `None` if they are not a supported image.
    fn decode(&self, bytes: &[u8]) -> Option<Bitmap>;
}

/// Decoder backed by the `image` crate (PNG and JPEG by default).
#[cfg(feature = "image")]
#[derive(Copy, Clone, Debug, Default)]
pub struct RasterDecoder;

#[cfg(feature = "image")]
impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<Bitmap> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::warn!("image decode failed: {err}");
                return None;
            }
        };
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Bitmap::from_rgba8(width, height, rgba.into_raw())
    }
}

/// Decoder that rejects everything. Used when the `image` feature is off.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullDecoder;

impl ImageDecoder for NullDecoder {
    fn decode(&self, _bytes: &[u8]) -> Option<Bitmap> {
        None
    }
}

/// Input to a text layout pass.
#[derive(Copy, Clone, Debug)]
pub struct TextLayoutRequest<'a> {
    /// Runs in reading order.
    pub runs: &'a [TextRun],
    /// Grow to fit instead of wrapping.
    pub autosize: bool,
    /// Wrap width when not autosizing.
    pub wrap_width: f64,
}

/// Result of laying out text, in layer space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    /// Typographic bounds of the laid-out text.
    pub bounds: Rect,
    /// Glyph outlines positioned on their lines.
    pub outline: BezPath,
}

/// A text shaping and layout engine.
///
/// Engines are not required to be reentrant or shareable between threads;
/// the scene only ever calls one through a [`TextShaper`].
pub trait TextLayoutEngine: Send {
    /// Lays out `request`.
    fn layout(&mut self, request: &TextLayoutRequest<'_>) -> TextLayout;
}

/// Engine producing empty layouts.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullTextEngine;

impl TextLayoutEngine for NullTextEngine {
    fn layout(&mut self, _request: &TextLayoutRequest<'_>) -> TextLayout {
        TextLayout::default()
    }
}

/// Serialized access path to a [`TextLayoutEngine`].
///
/// Clones share the engine; every call takes the shaper's own lock, so at
/// most one layout runs at a time. The scene takes this lock while holding
/// its own, never the reverse.
#[derive(Clone)]
pub struct TextShaper {
    engine: Arc<Mutex<dyn TextLayoutEngine>>,
}

impl TextShaper {
    /// Wraps `engine`.
    pub fn new(engine: impl TextLayoutEngine + 'static) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lays out `request` on the shared engine.
    pub fn layout(&self, request: &TextLayoutRequest<'_>) -> TextLayout {
        self.engine.lock().layout(request)
    }
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new(NullTextEngine)
    }
}

impl fmt::Debug for TextShaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextShaper").finish_non_exhaustive()
    }
}

/// Services injected into a scene database.
#[derive(Clone)]
pub struct Services {
    /// Image decoder.
    pub decoder: Arc<dyn ImageDecoder>,
    /// Text layout access path.
    pub shaper: TextShaper,
}

impl Services {
    /// Bundles a decoder and a shaper.
    pub fn new(decoder: impl ImageDecoder + 'static, shaper: TextShaper) -> Self {
        Self {
            decoder: Arc::new(decoder),
            shaper,
        }
    }

    /// Replaces the decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Replaces the text engine.
    #[must_use]
    pub fn with_text_engine(mut self, engine: impl TextLayoutEngine + 'static) -> Self {
        self.shaper = TextShaper::new(engine);
        self
    }
}

impl Default for Services {
    /// [`RasterDecoder`] when the `image` feature is enabled, otherwise
    /// [`NullDecoder`], and [`NullTextEngine`].
    fn default() -> Self {
        #[cfg(feature = "image")]
        let decoder: Arc<dyn ImageDecoder> = Arc::new(RasterDecoder);
        #[cfg(not(feature = "image"))]
        let decoder: Arc<dyn ImageDecoder> = Arc::new(NullDecoder);
        Self {
            decoder,
            shaper: TextShaper::default(),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("shaper", &self.shaper)
            .finish_non_exhaustive()
    }
}
