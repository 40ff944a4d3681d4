// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer descriptions and the canvas snapshot the database reconciles against.
//!
//! Everything here is plain data. A [`Canvas`] is an immutable description
//! of the document: its size, content transform, background and an ordered
//! list of [`Layer`]s (later entries paint on top). Incremental edits are
//! expressed as a [`CanvasCommand`].

use std::sync::Arc;
use std::fmt::{self, Debug};
use std::hash::Hash;

use kurbo::{Affine, BezPath, Rect, Size};

use crate::paint::{BlendMode, Color, Decoration, EncodedImage};

/// Keys identifying layers.
///
/// Ids are supplied by the caller and must be unique within a canvas.
pub trait LayerId: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> LayerId for T where T: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

/// An encoded bitmap placed in a `width` by `height` rectangle at the layer
/// origin.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageLayer<Id> {
    /// Layer id.
    pub id: Id,
    /// Layer space to document space.
    pub transform: Affine,
    /// Group opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode used to composite the layer.
    pub blend: BlendMode,
    /// Hidden layers draw nothing but still occupy their bounds.
    pub visible: bool,
    /// Width of the destination rectangle, in layer units.
    pub width: f64,
    /// Height of the destination rectangle, in layer units.
    pub height: f64,
    /// Encoded image bytes.
    pub image: EncodedImage,
}

impl<Id> ImageLayer<Id> {
    /// Creates a visible, opaque image layer at the origin.
    pub fn new(id: Id, width: f64, height: f64, image: impl Into<EncodedImage>) -> Self {
        Self {
            id,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            blend: BlendMode::default(),
            visible: true,
            width,
            height,
            image: image.into(),
        }
    }

    /// The destination rectangle in layer space.
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height).abs()
    }
}

/// Vector geometry rendered through its decorations.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLayer<Id> {
    /// Layer id.
    pub id: Id,
    /// Layer space to document space.
    pub transform: Affine,
    /// Group opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode used to composite the layer.
    pub blend: BlendMode,
    /// Hidden layers draw nothing but still occupy their bounds.
    pub visible: bool,
    /// Stroke and fill passes, applied in order.
    pub decorations: Vec<Decoration>,
    /// Geometry in layer space.
    pub path: BezPath,
    /// When `false`, every stroke keeps a constant width in view pixels.
    pub scales_with_zoom: bool,
}

impl<Id> PathLayer<Id> {
    /// Creates a visible, opaque path layer with no decorations.
    pub fn new(id: Id, path: BezPath) -> Self {
        Self {
            id,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            blend: BlendMode::default(),
            visible: true,
            decorations: Vec::new(),
            path,
            scales_with_zoom: true,
        }
    }

    /// Appends a decoration.
    #[must_use]
    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.push(decoration);
        self
    }

    /// Sets whether strokes follow zoom.
    #[must_use]
    pub fn with_scales_with_zoom(mut self, scales: bool) -> Self {
        self.scales_with_zoom = scales;
        self
    }
}

/// Horizontal alignment of a text run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlignment {
    /// Flush left.
    #[default]
    Start,
    /// Centered.
    Center,
    /// Flush right.
    End,
    /// Stretched to the wrap width.
    Justified,
}

/// Font selection and paragraph settings for a run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAttributes {
    /// Font family or PostScript name, resolved by the layout engine.
    pub font_name: String,
    /// Font size in layer units.
    pub font_size: f64,
    /// Alignment within the wrap width.
    pub alignment: TextAlignment,
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self {
            font_name: String::new(),
            font_size: 12.0,
            alignment: TextAlignment::Start,
        }
    }
}

/// A span of text sharing one set of attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRun {
    /// The text.
    pub text: String,
    /// How it is set.
    pub attributes: TextAttributes,
}

impl TextRun {
    /// A run with default attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: TextAttributes::default(),
        }
    }

    /// Sets the font.
    #[must_use]
    pub fn with_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.attributes.font_name = name.into();
        self.attributes.font_size = size;
        self
    }
}

/// Styled text rendered as glyph outlines through its decorations.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer<Id> {
    /// Layer id.
    pub id: Id,
    /// Layer space to document space.
    pub transform: Affine,
    /// Group opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode used to composite the layer.
    pub blend: BlendMode,
    /// Hidden layers draw nothing but still occupy their bounds.
    pub visible: bool,
    /// Stroke and fill passes, applied in order.
    pub decorations: Vec<Decoration>,
    /// Runs in reading order.
    pub runs: Vec<TextRun>,
    /// When set, the layout grows to fit the text instead of wrapping.
    pub autosize: bool,
    /// Line width used for wrapping when `autosize` is off.
    pub wrap_width: f64,
}

impl<Id> TextLayer<Id> {
    /// Creates a visible, opaque, autosizing text layer.
    pub fn new(id: Id, runs: Vec<TextRun>) -> Self {
        Self {
            id,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            blend: BlendMode::default(),
            visible: true,
            decorations: Vec::new(),
            runs,
            autosize: true,
            wrap_width: 0.0,
        }
    }

    /// Appends a decoration.
    #[must_use]
    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.push(decoration);
        self
    }

    /// Turns off autosizing and wraps at `width`.
    #[must_use]
    pub fn with_wrap_width(mut self, width: f64) -> Self {
        self.autosize = false;
        self.wrap_width = width;
        self
    }
}

/// Stable identity of a [`LayerFactory`].
///
/// Two factories with the same id are assumed to compute the same function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactoryId(pub u64);

/// What a computed layer's factory sees of its source.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputeContext {
    /// The source's structure path in document space.
    pub structure_path: BezPath,
    /// Document-space area the source may draw into, if any.
    pub bounds: Option<Rect>,
}

type ComputeFn<Id> = dyn Fn(&Layer<Id>, &ComputeContext) -> Vec<Layer<Id>> + Send + Sync;

/// A pure function deriving layers from a source layer, keyed by id.
///
/// Equality compares ids only, so the same factory constructed twice is
/// still recognized as unchanged between reconciliations.
pub struct LayerFactory<Id> {
    id: FactoryId,
    compute: Arc<ComputeFn<Id>>,
}

impl<Id> LayerFactory<Id> {
    /// Wraps `compute` under `id`.
    pub fn new(
        id: FactoryId,
        compute: impl Fn(&Layer<Id>, &ComputeContext) -> Vec<Layer<Id>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            compute: Arc::new(compute),
        }
    }

    /// The factory's identity.
    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// Runs the factory.
    pub fn compute(&self, source: &Layer<Id>, context: &ComputeContext) -> Vec<Layer<Id>> {
        (self.compute)(source, context)
    }
}

impl<Id> Clone for LayerFactory<Id> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            compute: Arc::clone(&self.compute),
        }
    }
}

impl<Id> PartialEq for LayerFactory<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Id> Debug for LayerFactory<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerFactory").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A rule expanding into the layers its factory derives from `based_on`.
///
/// Computed layers are never drawn. Their outputs take their place in the
/// paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedLayer<Id> {
    /// Layer id.
    pub id: Id,
    /// Id of the source layer.
    pub based_on: Id,
    /// Derivation applied to the source.
    pub factory: LayerFactory<Id>,
}

impl<Id> ComputedLayer<Id> {
    /// Creates a computed layer.
    pub fn new(id: Id, based_on: Id, factory: LayerFactory<Id>) -> Self {
        Self {
            id,
            based_on,
            factory,
        }
    }
}

/// One entry of a canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum Layer<Id> {
    /// Encoded bitmap.
    Image(ImageLayer<Id>),
    /// Vector path.
    Path(PathLayer<Id>),
    /// Styled text.
    Text(TextLayer<Id>),
    /// Derived layers.
    Computed(ComputedLayer<Id>),
}

impl<Id: Copy> Layer<Id> {
    /// The layer id.
    pub fn id(&self) -> Id {
        match self {
            Self::Image(layer) => layer.id,
            Self::Path(layer) => layer.id,
            Self::Text(layer) => layer.id,
            Self::Computed(layer) => layer.id,
        }
    }

    /// The source id of a computed layer.
    pub fn based_on(&self) -> Option<Id> {
        match self {
            Self::Computed(layer) => Some(layer.based_on),
            Self::Image(_) | Self::Path(_) | Self::Text(_) => None,
        }
    }

    /// Returns `true` for computed layers.
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

impl<Id> From<ImageLayer<Id>> for Layer<Id> {
    fn from(layer: ImageLayer<Id>) -> Self {
        Self::Image(layer)
    }
}

impl<Id> From<PathLayer<Id>> for Layer<Id> {
    fn from(layer: PathLayer<Id>) -> Self {
        Self::Path(layer)
    }
}

impl<Id> From<TextLayer<Id>> for Layer<Id> {
    fn from(layer: TextLayer<Id>) -> Self {
        Self::Text(layer)
    }
}

impl<Id> From<ComputedLayer<Id>> for Layer<Id> {
    fn from(layer: ComputedLayer<Id>) -> Self {
        Self::Computed(layer)
    }
}

/// Document snapshot: size, content transform, background and paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas<Id> {
    /// Canvas width in document units.
    pub width: f64,
    /// Canvas height in document units.
    pub height: f64,
    /// Document space to canvas space.
    pub content_transform: Affine,
    /// Solid background, or `None` for a transparent canvas.
    pub background: Option<Color>,
    /// Layers in paint order, bottom first.
    pub layers: Vec<Layer<Id>>,
}

impl<Id> Default for Canvas<Id> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl<Id> Canvas<Id> {
    /// An empty transparent canvas.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content_transform: Affine::IDENTITY,
            background: None,
            layers: Vec::new(),
        }
    }

    /// Canvas size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Sets the background color.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Sets the content transform.
    #[must_use]
    pub fn with_content_transform(mut self, transform: Affine) -> Self {
        self.content_transform = transform;
        self
    }

    /// Appends a layer on top.
    #[must_use]
    pub fn with_layer(mut self, layer: impl Into<Layer<Id>>) -> Self {
        self.layers.push(layer.into());
        self
    }
}

/// Position in the paint order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanvasIndex {
    /// Index `n`, bottom first. Out-of-range values are clamped.
    At(usize),
    /// On top of everything present when the change is applied.
    Last,
}

impl CanvasIndex {
    /// Resolves against a list of `len` entries, clamping `At(n)` to `len`.
    ///
    /// Returns the index and whether it had to be clamped.
    pub fn resolve(self, len: usize) -> (usize, bool) {
        match self {
            Self::At(n) if n > len => (len, true),
            Self::At(n) => (n, false),
            Self::Last => (len, false),
        }
    }
}

/// Cursor shown while the pointer is over the canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorKind {
    /// Platform arrow.
    #[default]
    Default,
    /// Pointing hand.
    Pointer,
    /// Precise crosshair.
    Crosshair,
    /// Four-way move arrows.
    Move,
    /// Text I-beam.
    Text,
    /// Open hand.
    Grab,
    /// Closed hand.
    Grabbing,
    /// Forbidden sign.
    NotAllowed,
    /// Horizontal resize.
    ResizeHorizontal,
    /// Vertical resize.
    ResizeVertical,
    /// Resize along the top-left to bottom-right diagonal.
    ResizeDiagonalDown,
    /// Resize along the bottom-left to top-right diagonal.
    ResizeDiagonalUp,
}

/// One incremental edit.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasChange<Id> {
    /// Change the cursor.
    UpdateCursor(CursorKind),
    /// Change the canvas width.
    UpdateWidth(f64),
    /// Change the canvas height.
    UpdateHeight(f64),
    /// Change the view zoom.
    UpdateZoom(f64),
    /// Change the content transform.
    UpdateContentTransform(Affine),
    /// Change or remove the background color.
    UpdateBackgroundColor(Option<Color>),
    /// Insert a layer, or update it in place and move it to `at`.
    UpsertLayer {
        /// New snapshot.
        layer: Layer<Id>,
        /// Target position.
        at: CanvasIndex,
    },
    /// Remove a layer.
    DeleteLayer(Id),
    /// Move a layer to a new position.
    ReorderLayer {
        /// Layer to move.
        id: Id,
        /// Target position.
        to: CanvasIndex,
    },
}

/// Ordered list of edits applied in one critical section.
pub type CanvasCommand<Id> = Vec<CanvasChange<Id>>;
