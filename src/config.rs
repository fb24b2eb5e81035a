// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Numeric tolerances shared by the topology and differential kernels.
///
/// Kept as a small `Default`-derived struct rather than scattered literals,
/// so callers that need non-default tolerances (e.g. a coarser mesh with a
/// looser equiangulation budget) can construct a `Mesh` with their own.
#[derive(Clone, Copy, Debug)]
pub struct MeshConfig {
    /// Upper bound on `equiangulate` passes, expressed as a multiple of the
    /// current half-edge count (`bound = equiangulate_pass_factor * |E|`).
    pub equiangulate_pass_factor: usize,
    /// Below this, `angle_factor_deriv`'s `|c| >= 1 - eps` branch suppresses
    /// the gradient contribution instead of dividing by a near-zero
    /// `sqrt(1 - c^2)`.
    pub angle_factor_deriv_epsilon: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            equiangulate_pass_factor: 10,
            angle_factor_deriv_epsilon: 1e-6,
        }
    }
}
