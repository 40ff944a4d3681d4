// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated repaint and layout notifications.

use kurbo::{Affine, Rect};

bitflags::bitflags! {
    /// Invalidation events that carry no geometry.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InvalidationKind: u8 {
        /// Everything visible must be repainted.
        const WHOLE_CANVAS = 0b0000_0001;
        /// The scrollable content size (canvas size times zoom) changed.
        const CONTENT_SIZE = 0b0000_0010;
        /// The cursor shown over the canvas changed.
        const CURSOR       = 0b0000_0100;
    }
}

/// A deduplicating set of invalidation events.
///
/// Dirty regions are merged additively into a single covering rectangle.
/// Sets produced by drawables are in document space; the scene database maps
/// them into view space before handing them out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvalidationSet {
    kinds: InvalidationKind,
    dirty: Option<Rect>,
}

impl InvalidationSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kinds: InvalidationKind::empty(),
            dirty: None,
        }
    }

    /// A set containing only `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut set = Self::new();
        set.insert_rect(rect);
        set
    }

    /// A set containing only `kinds`.
    #[must_use]
    pub fn from_kinds(kinds: InvalidationKind) -> Self {
        Self { kinds, dirty: None }
    }

    /// Returns `true` if nothing is invalidated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.dirty.is_none()
    }

    /// The non-geometric events in this set.
    #[must_use]
    pub fn kinds(&self) -> InvalidationKind {
        self.kinds
    }

    /// The accumulated dirty rectangle, if any.
    #[must_use]
    pub fn dirty_rect(&self) -> Option<Rect> {
        self.dirty
    }

    /// Returns `true` if the whole canvas must be repainted.
    #[must_use]
    pub fn is_whole_canvas(&self) -> bool {
        self.kinds.contains(InvalidationKind::WHOLE_CANVAS)
    }

    /// Returns `true` if the content size changed.
    #[must_use]
    pub fn is_content_size(&self) -> bool {
        self.kinds.contains(InvalidationKind::CONTENT_SIZE)
    }

    /// Returns `true` if the cursor changed.
    #[must_use]
    pub fn is_cursor(&self) -> bool {
        self.kinds.contains(InvalidationKind::CURSOR)
    }

    /// Adds non-geometric events.
    pub fn insert(&mut self, kinds: InvalidationKind) {
        self.kinds |= kinds;
    }

    /// Adds a dirty rectangle.
    ///
    /// Rectangles with non-finite coordinates are ignored. Zero-area
    /// rectangles are kept so a hairline still invalidates its row.
    pub fn insert_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        if !(rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()) {
            return;
        }
        self.dirty = Some(match self.dirty {
            Some(dirty) => dirty.union(rect),
            None => rect,
        });
    }

    /// Adds an optional dirty rectangle.
    pub fn insert_opt_rect(&mut self, rect: Option<Rect>) {
        if let Some(rect) = rect {
            self.insert_rect(rect);
        }
    }

    /// Adds everything in `other`.
    pub fn merge(&mut self, other: &Self) {
        self.kinds |= other.kinds;
        self.insert_opt_rect(other.dirty);
    }

    /// Returns a copy with the dirty rectangle mapped through `transform`.
    #[must_use]
    pub fn transformed(&self, transform: Affine) -> Self {
        Self {
            kinds: self.kinds,
            dirty: self.dirty.map(|rect| transform.transform_rect_bbox(rect)),
        }
    }

    /// Takes the contents, leaving the set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl From<InvalidationKind> for InvalidationSet {
    fn from(kinds: InvalidationKind) -> Self {
        Self::from_kinds(kinds)
    }
}

impl Extend<Rect> for InvalidationSet {
    fn extend<T: IntoIterator<Item = Rect>>(&mut self, iter: T) {
        for rect in iter {
            self.insert_rect(rect);
        }
    }
}
