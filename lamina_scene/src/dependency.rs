// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bookkeeping for computed layers: which sources they read and which ids
//! they generated.
//!
//! The graph has two kinds of edges: `source -> computed` (the computed
//! layer is based on the source) and `computed -> output` (the computed layer
//! generated the output). Outputs can in turn be sources, so chains form.
//! Adding edges that would close a loop is rejected.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::layer::LayerId;

/// Reverse indexes over computed layer generations.
#[derive(Clone, Debug)]
pub(crate) struct DependencyIndex<Id: LayerId> {
    based_on: HashMap<Id, Id>,
    dependents: HashMap<Id, SmallVec<[Id; 2]>>,
    generated_by: HashMap<Id, Id>,
}

impl<Id: LayerId> Default for DependencyIndex<Id> {
    fn default() -> Self {
        Self {
            based_on: HashMap::new(),
            dependents: HashMap::new(),
            generated_by: HashMap::new(),
        }
    }
}

impl<Id: LayerId> DependencyIndex<Id> {
    /// Computed layers based on `source`, in registration order.
    pub(crate) fn dependents_of(&self, source: Id) -> &[Id] {
        match self.dependents.get(&source) {
            Some(deps) => deps.as_slice(),
            None => &[],
        }
    }

    /// The computed layer that generated `output`, if any.
    pub(crate) fn generator_of(&self, output: Id) -> Option<Id> {
        self.generated_by.get(&output).copied()
    }

    /// The source of `computed`, if registered.
    pub(crate) fn source_of(&self, computed: Id) -> Option<Id> {
        self.based_on.get(&computed).copied()
    }

    /// Every id `id` is derived from: the generators above it and their
    /// sources, transitively. A computed id leads straight to its source.
    pub(crate) fn upstream(&self, id: Id) -> HashSet<Id> {
        let mut seen = HashSet::new();
        let mut current = id;
        loop {
            let computed = match self.generator_of(current) {
                Some(generator) => {
                    if !seen.insert(generator) {
                        break;
                    }
                    generator
                }
                None => current,
            };
            let Some(source) = self.source_of(computed) else {
                break;
            };
            if !seen.insert(source) {
                break;
            }
            current = source;
        }
        seen
    }

    /// Returns `true` if letting `computed` read `based_on` and generate
    /// `outputs` would make some id depend on itself.
    ///
    /// The check walks `based_on`'s lineage: `computed` must not already be
    /// above its own source, and none of the outputs may be the source, the
    /// computed layer itself, or anything the source was derived from.
    pub(crate) fn would_create_cycle(&self, computed: Id, based_on: Id, outputs: &[Id]) -> bool {
        if computed == based_on {
            return true;
        }
        let mut lineage = self.upstream(based_on);
        lineage.insert(based_on);
        if lineage.contains(&computed) {
            return true;
        }
        outputs
            .iter()
            .any(|&output| output == computed || lineage.contains(&output))
    }

    /// Records that `computed` reads `based_on` and generated `outputs`,
    /// replacing any previous registration of `computed`.
    pub(crate) fn register(&mut self, computed: Id, based_on: Id, outputs: &[Id]) {
        self.unregister(computed);
        self.based_on.insert(computed, based_on);
        let deps = self.dependents.entry(based_on).or_default();
        if !deps.contains(&computed) {
            deps.push(computed);
        }
        for &output in outputs {
            self.generated_by.entry(output).or_insert(computed);
        }
    }

    /// Forgets `computed` and the outputs attributed to it.
    pub(crate) fn unregister(&mut self, computed: Id) {
        if let Some(source) = self.based_on.remove(&computed) {
            if let Some(deps) = self.dependents.get_mut(&source) {
                deps.retain(|dep| *dep != computed);
                if deps.is_empty() {
                    self.dependents.remove(&source);
                }
            }
        }
        self.generated_by.retain(|_, generator| *generator != computed);
    }

    /// Forgets that `output` was generated by anything.
    pub(crate) fn forget_output(&mut self, output: Id) {
        self.generated_by.remove(&output);
    }
}
