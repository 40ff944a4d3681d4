// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lamina Imaging recording painter.
//!
//! This crate provides a small, stateful implementation of [`Painter`] that
//! records every operation it receives together with a snapshot of the
//! painter state at the time the operation was applied.
//!
//! It is intentionally *not* a renderer:
//! - It does **not** rasterize to pixels.
//! - It is intended for tests and debugging that want to assert on emitted
//!   ops, the transform in effect for each draw, and layer nesting.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use lamina_imaging::{Affine, DrawOp, LayerOp, PaintOp, Painter, StateOp};

/// Snapshot of the current painter state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Current transform.
    pub transform: Affine,
    /// Number of active layers on the layer stack.
    pub layer_stack_depth: u32,
    /// The most recently pushed layer op, if any.
    pub layer_top: Option<LayerOp>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            layer_stack_depth: 0,
            layer_top: None,
        }
    }
}

/// Event recorded by [`RecordingPainter`].
#[derive(Clone, Debug)]
pub enum Event {
    /// State operation and the resulting state snapshot.
    State {
        /// State operation that was applied.
        op: StateOp,
        /// Snapshot after applying the state operation.
        state: StateSnapshot,
    },
    /// Draw operation and the state snapshot used for drawing.
    Draw {
        /// Draw operation that was applied.
        op: DrawOp,
        /// Snapshot at the time of drawing.
        state: StateSnapshot,
    },
}

/// Painter that records what it is asked to do.
#[derive(Default, Debug)]
pub struct RecordingPainter {
    events: Vec<Event>,
    state: StateSnapshot,
    layer_stack: Vec<LayerOp>,
    unbalanced_pops: u32,
}

impl RecordingPainter {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in the order they were applied.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the recorded operations without state snapshots.
    pub fn ops(&self) -> Vec<PaintOp> {
        self.events
            .iter()
            .map(|event| match event {
                Event::State { op, .. } => PaintOp::State(op.clone()),
                Event::Draw { op, .. } => PaintOp::Draw(op.clone()),
            })
            .collect()
    }

    /// Returns the draw operations with the state they were drawn under.
    pub fn draws(&self) -> impl Iterator<Item = (&DrawOp, &StateSnapshot)> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::Draw { op, state } => Some((op, state)),
            Event::State { .. } => None,
        })
    }

    /// Returns the current state.
    pub fn current_state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Returns `true` if every pushed layer was popped and no pop ran past
    /// the bottom of the stack.
    pub fn is_balanced(&self) -> bool {
        self.layer_stack.is_empty() && self.unbalanced_pops == 0
    }

    /// Clears all recorded events but keeps the current state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn sync_layer_state(&mut self) {
        self.state.layer_stack_depth = u32::try_from(self.layer_stack.len()).unwrap_or(u32::MAX);
        self.state.layer_top = self.layer_stack.last().cloned();
    }
}

impl Painter for RecordingPainter {
    fn state(&mut self, op: StateOp) {
        match &op {
            StateOp::SetTransform(tx) => self.state.transform = *tx,
            StateOp::PushLayer(layer) => {
                self.layer_stack.push(layer.clone());
                self.sync_layer_state();
            }
            StateOp::PopLayer => {
                if self.layer_stack.pop().is_none() {
                    self.unbalanced_pops += 1;
                }
                self.sync_layer_state();
            }
        }

        self.events.push(Event::State {
            op,
            state: self.state.clone(),
        });
    }

    fn draw(&mut self, op: DrawOp) {
        self.events.push(Event::Draw {
            op,
            state: self.state.clone(),
        });
    }
}
