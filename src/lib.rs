// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Some useful re-exports
pub mod prelude;

/// Ambient numeric tolerances for the topology and differential kernels
pub mod config;

/// Fail-fast diagnostics shared by every mesh operation
pub mod error;

/// The half-edge mesh, its dual, and its topological edit operations
pub mod mesh;

/// Small shared helpers: inline vectors, rotated iterators, signed angles
pub mod util;
