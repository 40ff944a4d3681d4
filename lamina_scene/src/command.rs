// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental edits applied without a full reconciliation.

use hashbrown::{HashMap, HashSet};
use kurbo::Affine;

use crate::drawable::Drawable;
use crate::error::SceneError;
use crate::invalidation::InvalidationKind;
use crate::layer::{CanvasChange, CanvasCommand, CanvasIndex, ComputedLayer, CursorKind, Layer, LayerId};
use crate::paint::Color;
use crate::state::{Generation, SceneCore};

impl<Id: LayerId> SceneCore<Id> {
    /// Applies `command` in order.
    ///
    /// Changes naming ids that do not exist are skipped. A change that would
    /// close a computed-layer cycle stops the command; the changes before it
    /// stay applied.
    pub(crate) fn perform(&mut self, command: CanvasCommand<Id>) -> Result<(), SceneError<Id>> {
        let count = command.len();
        for change in command {
            self.apply_change(change)?;
        }
        log::debug!("performed {count} changes; {} layers", self.order.len());
        self.debug_check();
        Ok(())
    }

    fn apply_change(&mut self, change: CanvasChange<Id>) -> Result<(), SceneError<Id>> {
        match change {
            CanvasChange::UpdateCursor(cursor) => self.set_cursor(cursor),
            CanvasChange::UpdateWidth(width) => self.set_size(width, self.frame.height),
            CanvasChange::UpdateHeight(height) => self.set_size(self.frame.width, height),
            CanvasChange::UpdateZoom(zoom) => self.set_zoom(zoom),
            CanvasChange::UpdateContentTransform(transform) => self.set_content_transform(transform),
            CanvasChange::UpdateBackgroundColor(color) => self.set_background(color),
            CanvasChange::UpsertLayer { layer, at } => return self.upsert(layer, at),
            CanvasChange::DeleteLayer(id) => self.delete(id),
            CanvasChange::ReorderLayer { id, to } => self.reorder(id, to),
        }
        Ok(())
    }

    pub(crate) fn set_cursor(&mut self, cursor: CursorKind) {
        if self.frame.cursor != cursor {
            self.frame.cursor = cursor;
            self.invalidate(InvalidationKind::CURSOR);
        }
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        if self.frame.width != width || self.frame.height != height {
            self.frame.width = width;
            self.frame.height = height;
            self.dimensions_changed = true;
            self.invalidate(InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS);
        }
    }

    pub(crate) fn set_zoom(&mut self, zoom: f64) {
        if self.frame.viewport.set_zoom(zoom) {
            self.invalidate(InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS);
        }
    }

    fn set_content_transform(&mut self, transform: Affine) {
        if self.frame.content_transform != transform {
            self.frame.content_transform = transform;
            self.invalidate(InvalidationKind::CONTENT_SIZE | InvalidationKind::WHOLE_CANVAS);
        }
    }

    fn set_background(&mut self, color: Option<Color>) {
        if self.frame.background != color {
            self.frame.background = color;
            self.invalidate(InvalidationKind::WHOLE_CANVAS);
        }
    }

    fn upsert(&mut self, layer: Layer<Id>, at: CanvasIndex) -> Result<(), SceneError<Id>> {
        let id = layer.id();
        if let Layer::Computed(computed) = layer {
            if self.drawables.contains_key(&id) {
                self.destroy(id);
            }
            return self.upsert_computed(computed, Some(at));
        }

        if self.computed.contains_key(&id) {
            self.remove_computed(id);
        }
        let changed = if let Some(drawable) = self.drawables.get_mut(&id) {
            let changed = !drawable.is_snapshot(&layer);
            let set = drawable.update_layer(layer, &self.frame.env());
            self.invalidate_document(&set);
            self.move_to(id, at);
            changed
        } else {
            let (index, clamped) = at.resolve(self.order.len());
            if clamped {
                log::warn!("index {at:?} for new layer {id:?} is out of range; clamped to {index}");
            }
            self.insert_new(layer, index);
            true
        };
        if changed {
            self.refresh_dependents(id)?;
        }
        Ok(())
    }

    /// Expands `computed` against the current state of its source.
    ///
    /// `at` places the outputs; without it they go where the first surviving
    /// previous output was, or on top.
    fn upsert_computed(&mut self, computed: ComputedLayer<Id>, at: Option<CanvasIndex>) -> Result<(), SceneError<Id>> {
        if self.deps.would_create_cycle(computed.id, computed.based_on, &[]) {
            return Err(SceneError::CyclicDependency {
                computed: computed.id,
                based_on: computed.based_on,
            });
        }
        let Some(source) = self.drawables.get(&computed.based_on).map(Drawable::layer) else {
            log::debug!(
                "computed layer {:?}: source {:?} is absent; it contributes nothing",
                computed.id,
                computed.based_on
            );
            self.park_computed(computed);
            return Ok(());
        };

        let outputs = self.generate(&computed, &source);
        let ids: Vec<Id> = outputs.iter().map(Layer::id).collect();
        if self.deps.would_create_cycle(computed.id, computed.based_on, &ids) {
            return Err(SceneError::CyclicDependency {
                computed: computed.id,
                based_on: computed.based_on,
            });
        }

        let previous = self
            .computed
            .get(&computed.id)
            .map(Generation::output_ids)
            .unwrap_or_default();
        let changed = self.place_outputs(&previous, &outputs, at);
        self.deps.register(computed.id, computed.based_on, &ids);
        let id = computed.id;
        self.computed.insert(
            id,
            Generation {
                layer: computed,
                source: Some(source),
                outputs,
            },
        );
        log::trace!("computed layer {id:?} produced {} layers", ids.len());

        for output in changed {
            self.refresh_dependents(output)?;
        }
        Ok(())
    }

    /// Keeps `computed` registered without outputs until its source appears.
    fn park_computed(&mut self, computed: ComputedLayer<Id>) {
        let previous = self
            .computed
            .get(&computed.id)
            .map(Generation::output_ids)
            .unwrap_or_default();
        for stale in previous {
            self.destroy(stale);
        }
        self.deps.register(computed.id, computed.based_on, &[]);
        self.computed.insert(
            computed.id,
            Generation {
                layer: computed,
                source: None,
                outputs: Vec::new(),
            },
        );
    }

    /// Replaces `previous` outputs with `outputs` as one contiguous block.
    ///
    /// Returns the ids of outputs that are new or whose snapshot changed.
    fn place_outputs(&mut self, previous: &[Id], outputs: &[Layer<Id>], at: Option<CanvasIndex>) -> Vec<Id> {
        let wanted: HashSet<Id> = outputs.iter().map(Layer::id).collect();
        for &stale in previous.iter().filter(|id| !wanted.contains(*id)) {
            self.destroy(stale);
        }

        let anchor = match at {
            Some(CanvasIndex::At(_)) | Some(CanvasIndex::Last) => None,
            None => self
                .order
                .iter()
                .copied()
                .find(|id| previous.contains(id) && wanted.contains(id)),
        };
        let old_positions: HashMap<Id, usize> = self
            .order
            .iter()
            .enumerate()
            .filter(|(_, id)| wanted.contains(*id))
            .map(|(index, &id)| (id, index))
            .collect();

        // Lift existing outputs out, then drop the block in at the target.
        let start = anchor.map(|anchor| {
            self.order
                .iter()
                .take_while(|&&id| id != anchor)
                .filter(|id| !wanted.contains(*id))
                .count()
        });
        self.order.retain(|id| !wanted.contains(id));
        let start = match (start, at) {
            (Some(start), _) => start,
            (None, Some(index)) => {
                let (index, clamped) = index.resolve(self.order.len());
                if clamped {
                    log::warn!("index {at:?} for computed outputs is out of range; clamped to {index}");
                }
                index
            }
            (None, None) => self.order.len(),
        };

        let mut changed = Vec::new();
        for (offset, output) in outputs.iter().enumerate() {
            let id = output.id();
            let index = start + offset;
            if let Some(drawable) = self.drawables.get_mut(&id) {
                self.order.insert(index, id);
                let env = self.frame.env();
                let snapshot_changed = !drawable.is_snapshot(output);
                let set = drawable.update_layer(output.clone(), &env);
                let moved_rect = (old_positions.get(&id) != Some(&index))
                    .then(|| drawable.footprint(&env))
                    .flatten();
                self.invalidate_document(&set);
                self.invalidate_document_rect(moved_rect);
                if snapshot_changed {
                    changed.push(id);
                }
            } else {
                self.insert_new(output.clone(), index);
                changed.push(id);
            }
        }
        changed
    }

    /// Re-runs every computed layer based on `source`.
    fn refresh_dependents(&mut self, source: Id) -> Result<(), SceneError<Id>> {
        for computed in self.deps.dependents_of(source).to_vec() {
            let Some(generation) = self.computed.get(&computed) else {
                continue;
            };
            let layer = generation.layer.clone();
            self.upsert_computed(layer, None)?;
        }
        Ok(())
    }

    fn delete(&mut self, id: Id) {
        if self.computed.contains_key(&id) {
            self.remove_computed(id);
        } else if self.drawables.contains_key(&id) {
            self.destroy(id);
        } else {
            log::debug!("delete of unknown layer {id:?} ignored");
        }
    }

    fn reorder(&mut self, id: Id, to: CanvasIndex) {
        if self.drawables.contains_key(&id) {
            self.move_to(id, to);
            return;
        }
        let Some(generation) = self.computed.get(&id) else {
            log::debug!("reorder of unknown layer {id:?} ignored");
            return;
        };
        // Moving a computed layer moves its outputs as a block.
        let outputs = generation.outputs.clone();
        let ids = generation.output_ids();
        self.place_outputs(&ids, &outputs, Some(to));
    }
}
