// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Order-preserving edit scripts between two id sequences.
//!
//! The script keeps the longest run of ids whose relative order is the same
//! in both sequences and expresses everything else as removals followed by
//! insertions. An id present on both sides but outside that run is a move:
//! it appears once in each list.

use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

/// Edits turning one sequence into another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EditScript<Id> {
    /// `(index, id)` in the old sequence, highest index first.
    pub(crate) removals: Vec<(usize, Id)>,
    /// `(index, id)` in the new sequence, lowest index first.
    pub(crate) insertions: Vec<(usize, Id)>,
}

impl<Id: Copy + Eq + Hash> EditScript<Id> {
    /// Returns `true` if the sequences were identical.
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.insertions.is_empty()
    }

    /// Ids that are removed and inserted again at another position.
    pub(crate) fn moved(&self) -> HashSet<Id> {
        let removed: HashSet<Id> = self.removals.iter().map(|&(_, id)| id).collect();
        self.insertions
            .iter()
            .map(|&(_, id)| id)
            .filter(|id| removed.contains(id))
            .collect()
    }

    /// Applies the script to `seq`.
    #[cfg(test)]
    pub(crate) fn apply(&self, seq: &mut Vec<Id>) {
        for &(index, _) in &self.removals {
            seq.remove(index);
        }
        for &(index, id) in &self.insertions {
            seq.insert(index, id);
        }
    }
}

/// Computes an edit script from `old` to `new`.
///
/// Both sequences must be free of duplicates.
pub(crate) fn diff<Id: Copy + Eq + Hash>(old: &[Id], new: &[Id]) -> EditScript<Id> {
    let new_index: HashMap<Id, usize> = new.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    // For every old id that survives, its position in `new`, in old order.
    let mut common: Vec<(usize, usize)> = Vec::new();
    for (old_pos, id) in old.iter().enumerate() {
        if let Some(&new_pos) = new_index.get(id) {
            common.push((old_pos, new_pos));
        }
    }

    let keep_new_positions = longest_increasing_run(&common);
    let mut kept_old = HashSet::with_capacity(keep_new_positions.len());
    let mut kept_new = HashSet::with_capacity(keep_new_positions.len());
    for &(old_pos, new_pos) in &keep_new_positions {
        kept_old.insert(old_pos);
        kept_new.insert(new_pos);
    }

    let removals = old
        .iter()
        .enumerate()
        .rev()
        .filter(|(i, _)| !kept_old.contains(i))
        .map(|(i, &id)| (i, id))
        .collect();
    let insertions = new
        .iter()
        .enumerate()
        .filter(|(i, _)| !kept_new.contains(i))
        .map(|(i, &id)| (i, id))
        .collect();

    EditScript {
        removals,
        insertions,
    }
}

/// Longest subsequence of `pairs` (ordered by `.0`) increasing in `.1`.
fn longest_increasing_run(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    // Patience sorting: `tails[k]` is the index into `pairs` of the smallest
    // tail of an increasing run of length `k + 1`.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = Vec::with_capacity(pairs.len());
    for (i, &(_, value)) in pairs.iter().enumerate() {
        let k = tails.partition_point(|&t| pairs[t].1 < value);
        prev.push(if k > 0 { Some(tails[k - 1]) } else { None });
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(pairs[i]);
        cursor = prev[i];
    }
    run.reverse();
    run
}
