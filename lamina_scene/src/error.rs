// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt::Debug;

use thiserror::Error;

/// Errors returned by scene mutations.
///
/// Most inconsistencies (commands naming missing ids, computed layers whose
/// source is absent, undecodable images) are not errors: they are logged and
/// skipped, and the next full update heals them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SceneError<Id: Debug> {
    /// A computed layer (directly or through other computed layers) derives
    /// from one of its own outputs.
    #[error("computed layer {computed:?} based on {based_on:?} would form a dependency cycle")]
    CyclicDependency {
        /// The computed layer whose expansion closes the cycle.
        computed: Id,
        /// The source it was based on.
        based_on: Id,
    },
}
