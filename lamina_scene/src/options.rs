// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::paint::Color;
use crate::viewport::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};

/// Two-tone grid shown behind a transparent canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Checkerboard {
    /// Cell edge length in view pixels.
    pub cell: f64,
    /// Color of the cell at the canvas origin.
    pub light: Color,
    /// Color of the alternating cells.
    pub dark: Color,
}

impl Default for Checkerboard {
    fn default() -> Self {
        Self {
            cell: 8.0,
            light: Color::WHITE,
            dark: Color::from_rgb8(0xcc, 0xcc, 0xcc),
        }
    }
}

/// Tunables for a scene database.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneOptions {
    /// Pattern behind canvases without a background color, or `None` to
    /// leave them cleared.
    pub checkerboard: Option<Checkerboard>,
    /// Smallest allowed zoom.
    pub min_zoom: f64,
    /// Largest allowed zoom.
    pub max_zoom: f64,
    /// Extra slop, in document units, added to stroke hit tests.
    pub hit_tolerance: f64,
    /// Accuracy passed to curve distance queries.
    pub curve_accuracy: f64,
    /// Resolution of the canvas, reported with dimension changes.
    pub dpi: f64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            checkerboard: Some(Checkerboard::default()),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            hit_tolerance: 0.0,
            curve_accuracy: 1e-6,
            dpi: 72.0,
        }
    }
}

impl SceneOptions {
    /// Sets or removes the checkerboard.
    #[must_use]
    pub fn with_checkerboard(mut self, checkerboard: Option<Checkerboard>) -> Self {
        self.checkerboard = checkerboard;
        self
    }

    /// Sets the zoom range.
    #[must_use]
    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Sets the stroke hit tolerance.
    #[must_use]
    pub fn with_hit_tolerance(mut self, tolerance: f64) -> Self {
        self.hit_tolerance = tolerance.max(0.0);
        self
    }

    /// Sets the curve accuracy.
    #[must_use]
    pub fn with_curve_accuracy(mut self, accuracy: f64) -> Self {
        self.curve_accuracy = accuracy;
        self
    }

    /// Sets the initial DPI.
    #[must_use]
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }
}
