// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full reconciliation against a [`Canvas`] snapshot.
//!
//! Reconciliation runs in two phases. Planning is pure: it expands computed
//! layers into a flat paint order of concrete snapshots and checks the
//! computed-layer graph for cycles. Only a successful plan is applied, by
//! diffing the flat order against the current one and updating survivors.

use hashbrown::{HashMap, HashSet};

use crate::dependency::DependencyIndex;
use crate::diff::diff;
use crate::drawable::Drawable;
use crate::error::SceneError;
use crate::invalidation::InvalidationKind;
use crate::layer::{Canvas, ComputedLayer, Layer, LayerId};
use crate::state::{Generation, SceneCore};

/// The flattened target state for one canvas.
#[derive(Debug)]
struct Plan<Id: LayerId> {
    order: Vec<Id>,
    snapshots: HashMap<Id, Layer<Id>>,
    generations: HashMap<Id, Generation<Id>>,
    deps: DependencyIndex<Id>,
}

impl<Id: LayerId> SceneCore<Id> {
    /// Reconciles the scene against `canvas`.
    ///
    /// On error nothing has been changed.
    pub(crate) fn update(&mut self, canvas: &Canvas<Id>) -> Result<(), SceneError<Id>> {
        let plan = self.plan(canvas)?;
        self.apply_plan(plan);
        self.apply_frame(canvas);
        self.debug_check();
        Ok(())
    }

    fn plan(&self, canvas: &Canvas<Id>) -> Result<Plan<Id>, SceneError<Id>> {
        // Unique canvas entries, first occurrence wins.
        let mut seen = HashSet::new();
        let mut entries: Vec<&Layer<Id>> = Vec::with_capacity(canvas.layers.len());
        for layer in &canvas.layers {
            if seen.insert(layer.id()) {
                entries.push(layer);
            } else {
                log::warn!("duplicate layer id {:?} in canvas; keeping the first", layer.id());
            }
        }

        let mut available: HashMap<Id, Layer<Id>> = entries
            .iter()
            .filter(|layer| !layer.is_computed())
            .map(|layer| (layer.id(), (*layer).clone()))
            .collect();
        let mut unresolved: Vec<&ComputedLayer<Id>> = entries
            .iter()
            .filter_map(|layer| match layer {
                Layer::Computed(computed) => Some(computed),
                Layer::Image(_) | Layer::Path(_) | Layer::Text(_) => None,
            })
            .collect();

        // Computed layers reading each other loop no matter what the
        // factories produce.
        let mut declared = DependencyIndex::default();
        for computed in &unresolved {
            declared.register(computed.id, computed.based_on, &[]);
        }
        for computed in &unresolved {
            if declared.would_create_cycle(computed.id, computed.based_on, &[]) {
                return Err(SceneError::CyclicDependency {
                    computed: computed.id,
                    based_on: computed.based_on,
                });
            }
        }

        // Expand computed layers whose source is available until no more can
        // be; chains resolve over successive rounds.
        let mut deps = DependencyIndex::default();
        let mut generations = HashMap::new();
        loop {
            let before = unresolved.len();
            let mut waiting = Vec::new();
            for computed in unresolved {
                let Some(source) = available.get(&computed.based_on).cloned() else {
                    waiting.push(computed);
                    continue;
                };
                let outputs = self.generate(computed, &source);
                let ids: Vec<Id> = outputs.iter().map(Layer::id).collect();
                if deps.would_create_cycle(computed.id, computed.based_on, &ids) {
                    return Err(SceneError::CyclicDependency {
                        computed: computed.id,
                        based_on: computed.based_on,
                    });
                }
                deps.register(computed.id, computed.based_on, &ids);
                for output in &outputs {
                    available.entry(output.id()).or_insert_with(|| output.clone());
                }
                generations.insert(
                    computed.id,
                    Generation {
                        layer: computed.clone(),
                        source: Some(source),
                        outputs,
                    },
                );
            }
            let progressed = waiting.len() < before;
            unresolved = waiting;
            if !progressed {
                break;
            }
        }
        for computed in unresolved {
            log::debug!(
                "computed layer {:?}: source {:?} is absent; it contributes nothing",
                computed.id,
                computed.based_on
            );
            deps.register(computed.id, computed.based_on, &[]);
            generations.insert(
                computed.id,
                Generation {
                    layer: computed.clone(),
                    source: None,
                    outputs: Vec::new(),
                },
            );
        }

        // Flatten in canvas order, splicing outputs in place of their
        // computed layer.
        let mut order = Vec::new();
        let mut snapshots: HashMap<Id, Layer<Id>> = HashMap::new();
        let mut push = |layer: &Layer<Id>| {
            let id = layer.id();
            if snapshots.contains_key(&id) {
                log::warn!("layer id {id:?} is produced more than once; keeping the first");
                return;
            }
            order.push(id);
            snapshots.insert(id, layer.clone());
        };
        for layer in entries {
            match layer {
                Layer::Computed(computed) => {
                    if let Some(generation) = generations.get(&computed.id) {
                        generation.outputs.iter().for_each(&mut push);
                    }
                }
                Layer::Image(_) | Layer::Path(_) | Layer::Text(_) => push(layer),
            }
        }

        Ok(Plan {
            order,
            snapshots,
            generations,
            deps,
        })
    }

    /// Outputs of `computed` for `source`, reusing the previous generation
    /// when neither changed.
    pub(crate) fn generate(&self, computed: &ComputedLayer<Id>, source: &Layer<Id>) -> Vec<Layer<Id>> {
        if let Some(previous) = self.computed.get(&computed.id) {
            if previous.layer == *computed && previous.source.as_ref() == Some(source) {
                return previous.outputs.clone();
            }
        }
        let context = self.compute_context(source);
        let mut seen = HashSet::new();
        computed
            .factory
            .compute(source, &context)
            .into_iter()
            .filter(|output| {
                if output.is_computed() {
                    log::warn!(
                        "computed layer {:?} produced computed layer {:?}; ignored",
                        computed.id,
                        output.id()
                    );
                    return false;
                }
                seen.insert(output.id())
            })
            .collect()
    }

    fn apply_plan(&mut self, mut plan: Plan<Id>) {
        let script = diff(&self.order, &plan.order);
        let moved = script.moved();
        let doc_to_view = self.frame.document_to_view();
        let env = self.frame.env();

        let mut detached: HashMap<Id, Drawable<Id>> = HashMap::new();
        let mut removed = 0_usize;
        for &(index, id) in &script.removals {
            self.order.remove(index);
            let Some(drawable) = self.drawables.remove(&id) else {
                continue;
            };
            if moved.contains(&id) {
                detached.insert(id, drawable);
            } else {
                if let Some(rect) = drawable.footprint(&env) {
                    self.pending.insert_rect(doc_to_view.transform_rect_bbox(rect));
                }
                log::trace!("layer {id:?} removed");
                removed += 1;
            }
        }

        let mut created = HashSet::new();
        for &(index, id) in &script.insertions {
            self.order.insert(index, id);
            let rect = if let Some(drawable) = detached.remove(&id) {
                let rect = drawable.footprint(&env);
                self.drawables.insert(id, drawable);
                rect
            } else {
                let Some(snapshot) = plan.snapshots.remove(&id) else {
                    continue;
                };
                let Some(drawable) = Drawable::new(snapshot, &env) else {
                    continue;
                };
                created.insert(id);
                let rect = drawable.will_draw_rect(&env);
                self.drawables.insert(id, drawable);
                rect
            };
            if let Some(rect) = rect {
                self.pending.insert_rect(doc_to_view.transform_rect_bbox(rect));
            }
        }

        let mut updated = 0_usize;
        for id in &self.order {
            if created.contains(id) {
                continue;
            }
            let (Some(drawable), Some(snapshot)) = (self.drawables.get_mut(id), plan.snapshots.remove(id))
            else {
                continue;
            };
            let set = drawable.update_layer(snapshot, &env);
            if !set.is_empty() {
                log::trace!("layer {id:?} changed: {:?}", set.dirty_rect());
                updated += 1;
                self.pending.merge(&set.transformed(doc_to_view));
            }
        }

        log::debug!(
            "reconciled {} layers: {} created, {} removed, {} moved, {} updated",
            self.order.len(),
            created.len(),
            removed,
            moved.len(),
            updated
        );
        self.computed = plan.generations;
        self.deps = plan.deps;
    }

    fn apply_frame(&mut self, canvas: &Canvas<Id>) {
        let frame = &mut self.frame;
        let mut kinds = InvalidationKind::empty();
        if frame.width != canvas.width || frame.height != canvas.height {
            frame.width = canvas.width;
            frame.height = canvas.height;
            kinds |= InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS;
            self.dimensions_changed = true;
        }
        if frame.content_transform != canvas.content_transform {
            frame.content_transform = canvas.content_transform;
            kinds |= InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS;
        }
        if frame.background != canvas.background {
            frame.background = canvas.background;
            kinds |= InvalidationKind::WHOLE_CANVAS;
        }
        self.invalidate(kinds);
    }
}
