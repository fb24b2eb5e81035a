// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::mesh::id_types::{FaceId, VertexId};

/// Structured diagnostics for the fail-fast paths of the mesh engine.
///
/// Mirrors `TraversalError` in spirit: a hand-written enum with a manual
/// `Display` and `Error` impl, so it composes with `anyhow::Context` at call
/// sites that want to attach extra information.
#[derive(Copy, Clone, Debug)]
pub enum MeshError {
    /// `dual_area`/`dual_perimeter` was called before `order_star` ran on
    /// this vertex.
    UnorderedVertex(VertexId),
    /// An operation that only makes sense on a triangle was invoked on a
    /// face with a different number of sides.
    NotATriangle(FaceId),
    /// `opposite_vertex` could not find a third vertex distinct from the
    /// edge's two endpoints.
    NoOppositeVertex,
    /// A triangle's circumcenter denominator `Λ` vanished (collinear or
    /// coincident vertices).
    DegenerateTriangle(FaceId),
    /// `equiangulate` exceeded its iteration bound without reaching a fixed
    /// point.
    EquiangulationDidNotConverge,
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::UnorderedVertex(v) => {
                write!(f, "vertex {v:?} has not been ordered via order_star")
            }
            MeshError::NotATriangle(face) => write!(f, "face {face:?} is not a triangle"),
            MeshError::NoOppositeVertex => {
                write!(f, "could not find a third vertex opposite this edge")
            }
            MeshError::DegenerateTriangle(face) => {
                write!(f, "face {face:?} is degenerate (zero circumcenter weight)")
            }
            MeshError::EquiangulationDidNotConverge => {
                write!(f, "equiangulate did not reach a fixed point within its iteration bound")
            }
        }
    }
}

impl std::error::Error for MeshError {}
