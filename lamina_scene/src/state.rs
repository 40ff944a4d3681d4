// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable state behind a [`SceneDatabase`](crate::SceneDatabase).
//!
//! Everything in here runs with the database lock held. Operations record
//! view-space invalidation into `pending`; the database drains it after the
//! lock is released.

use hashbrown::HashMap;
use kurbo::{Affine, Rect, Size};

use crate::dependency::DependencyIndex;
use crate::drawable::{DrawEnv, Drawable};
use crate::invalidation::{InvalidationKind, InvalidationSet};
use crate::layer::{CanvasIndex, ComputeContext, ComputedLayer, CursorKind, Layer, LayerId};
use crate::options::SceneOptions;
use crate::paint::Color;
use crate::services::Services;
use crate::viewport::Viewport;

/// Document-level state that is not per layer.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) content_transform: Affine,
    pub(crate) background: Option<Color>,
    pub(crate) viewport: Viewport,
    pub(crate) cursor: CursorKind,
    pub(crate) dpi: f64,
    pub(crate) services: Services,
    pub(crate) options: SceneOptions,
}

impl Frame {
    pub(crate) fn document_to_view(&self) -> Affine {
        self.viewport.document_to_view(self.content_transform)
    }

    pub(crate) fn env(&self) -> DrawEnv<'_> {
        DrawEnv {
            services: &self.services,
            options: &self.options,
            document_to_view: self.document_to_view(),
        }
    }

    pub(crate) fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// What a computed layer most recently produced.
#[derive(Clone, Debug)]
pub(crate) struct Generation<Id> {
    pub(crate) layer: ComputedLayer<Id>,
    /// Source snapshot the outputs were derived from; `None` while the source
    /// is absent.
    pub(crate) source: Option<Layer<Id>>,
    /// Outputs in paint order.
    pub(crate) outputs: Vec<Layer<Id>>,
}

impl<Id: LayerId> Generation<Id> {
    pub(crate) fn output_ids(&self) -> Vec<Id> {
        self.outputs.iter().map(Layer::id).collect()
    }
}

/// Delivered to the delegate once the lock is released.
#[derive(Clone, Debug, Default)]
pub(crate) struct Notice {
    pub(crate) invalidation: InvalidationSet,
    pub(crate) dimensions: Option<(Size, f64)>,
}

#[derive(Debug)]
pub(crate) struct SceneCore<Id: LayerId> {
    pub(crate) frame: Frame,
    /// Materialized layer ids in paint order, bottom first.
    pub(crate) order: Vec<Id>,
    pub(crate) drawables: HashMap<Id, Drawable<Id>>,
    /// Keyed by computed layer id; exactly the computed layers currently
    /// applied.
    pub(crate) computed: HashMap<Id, Generation<Id>>,
    pub(crate) deps: DependencyIndex<Id>,
    /// View-space invalidation not yet handed out.
    pub(crate) pending: InvalidationSet,
    pub(crate) dimensions_changed: bool,
}

impl<Id: LayerId> SceneCore<Id> {
    pub(crate) fn new(services: Services, options: SceneOptions) -> Self {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(options.min_zoom, options.max_zoom);
        Self {
            frame: Frame {
                width: 0.0,
                height: 0.0,
                content_transform: Affine::IDENTITY,
                background: None,
                viewport,
                cursor: CursorKind::Default,
                dpi: options.dpi,
                services,
                options,
            },
            order: Vec::new(),
            drawables: HashMap::new(),
            computed: HashMap::new(),
            deps: DependencyIndex::default(),
            pending: InvalidationSet::new(),
            dimensions_changed: false,
        }
    }

    /// Drains what the delegate should hear about.
    pub(crate) fn take_notice(&mut self) -> Notice {
        let dimensions = std::mem::take(&mut self.dimensions_changed)
            .then(|| (self.frame.size(), self.frame.dpi));
        Notice {
            invalidation: self.pending.take(),
            dimensions,
        }
    }

    /// Records a document-space invalidation.
    pub(crate) fn invalidate_document(&mut self, set: &InvalidationSet) {
        if !set.is_empty() {
            self.pending.merge(&set.transformed(self.frame.document_to_view()));
        }
    }

    pub(crate) fn invalidate_document_rect(&mut self, rect: Option<Rect>) {
        if let Some(rect) = rect {
            self.invalidate_document(&InvalidationSet::from_rect(rect));
        }
    }

    pub(crate) fn invalidate(&mut self, kinds: InvalidationKind) {
        self.pending.insert(kinds);
    }

    pub(crate) fn position(&self, id: Id) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// The current snapshot of a concrete layer or computed descriptor.
    pub(crate) fn layer(&self, id: Id) -> Option<Layer<Id>> {
        if let Some(drawable) = self.drawables.get(&id) {
            return Some(drawable.layer());
        }
        self.computed
            .get(&id)
            .map(|generation| Layer::Computed(generation.layer.clone()))
    }

    /// What a factory sees of `source`.
    ///
    /// A drawable already holding this exact snapshot answers from its
    /// caches; otherwise a throwaway drawable is derived.
    pub(crate) fn compute_context(&self, source: &Layer<Id>) -> ComputeContext {
        let env = self.frame.env();
        let context = |drawable: &Drawable<Id>| ComputeContext {
            structure_path: drawable.structure_path(),
            bounds: drawable.will_draw_rect(&env),
        };
        if let Some(drawable) = self.drawables.get(&source.id()) {
            if drawable.is_snapshot(source) {
                return context(drawable);
            }
        }
        match Drawable::new(source.clone(), &env) {
            Some(staged) => context(&staged),
            None => ComputeContext {
                structure_path: kurbo::BezPath::new(),
                bounds: None,
            },
        }
    }

    /// Inserts a drawable for a new concrete layer at `index`.
    pub(crate) fn insert_new(&mut self, layer: Layer<Id>, index: usize) {
        let id = layer.id();
        let env = self.frame.env();
        let Some(drawable) = Drawable::new(layer, &env) else {
            return;
        };
        let rect = drawable.will_draw_rect(&env);
        log::trace!("layer {id:?} created at {index}");
        self.drawables.insert(id, drawable);
        let index = index.min(self.order.len());
        self.order.insert(index, id);
        self.invalidate_document_rect(rect);
    }

    /// Moves a materialized layer to `to`, resolved against the order without
    /// it. Returns `true` if its position changed.
    pub(crate) fn move_to(&mut self, id: Id, to: CanvasIndex) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        self.order.remove(from);
        let (index, clamped) = to.resolve(self.order.len());
        if clamped {
            log::warn!("index {to:?} for layer {id:?} is out of range; clamped to {index}");
        }
        self.order.insert(index, id);
        if index == from {
            return false;
        }
        let env = self.frame.env();
        let rect = self.drawables.get(&id).and_then(|d| d.footprint(&env));
        self.invalidate_document_rect(rect);
        true
    }

    /// Removes a materialized layer and everything derived from it.
    ///
    /// Dependent computed layers keep their descriptors but lose their
    /// outputs until the source comes back.
    pub(crate) fn destroy(&mut self, id: Id) {
        if let Some(drawable) = self.drawables.remove(&id) {
            let rect = drawable.footprint(&self.frame.env());
            self.order.retain(|&other| other != id);
            self.invalidate_document_rect(rect);
            log::trace!("layer {id:?} destroyed");
        }
        if let Some(generator) = self.deps.generator_of(id) {
            if let Some(generation) = self.computed.get_mut(&generator) {
                generation.outputs.retain(|output| output.id() != id);
            }
            self.deps.forget_output(id);
        }
        for computed in self.deps.dependents_of(id).to_vec() {
            self.clear_generation(computed);
        }
    }

    /// Drops the outputs of `computed`, keeping the descriptor.
    pub(crate) fn clear_generation(&mut self, computed: Id) {
        let Some(generation) = self.computed.get_mut(&computed) else {
            return;
        };
        generation.source = None;
        let outputs = std::mem::take(&mut generation.outputs);
        let based_on = generation.layer.based_on;
        for output in outputs {
            self.destroy(output.id());
        }
        self.deps.register(computed, based_on, &[]);
    }

    /// Removes a computed layer and its outputs.
    pub(crate) fn remove_computed(&mut self, computed: Id) {
        let Some(generation) = self.computed.remove(&computed) else {
            return;
        };
        for output in generation.output_ids() {
            self.destroy(output);
        }
        self.deps.unregister(computed);
        log::trace!("computed layer {computed:?} removed");
    }

    /// Checks the order/index invariant.
    pub(crate) fn debug_check(&self) {
        debug_assert_eq!(
            self.order.len(),
            self.drawables.len(),
            "every drawable appears exactly once in paint order"
        );
        debug_assert!(
            self.order.iter().all(|id| self.drawables.contains_key(id)),
            "paint order only names live drawables"
        );
    }
}
