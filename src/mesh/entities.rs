// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Passive data carriers for the three entity tables. Nothing here mutates
//! its own fields; every transition is driven by `topology`, `geometry`,
//! `differential` or `edit_ops`.

use glam::{Mat3, Vec3};

use super::id_types::{FaceId, HalfEdgeId, VertexId};
use crate::util::SVec;

#[derive(Clone, Debug)]
pub struct Vertex {
    pub r: Vec3,
    pub n: Vec3,
    pub boundary: bool,
    pub attached: bool,
    pub ordered: bool,
    pub area: f32,
    pub perim: f32,
    /// Outgoing half-edges, ordered by `order_star` once `ordered` is set.
    pub edges: SVec<HalfEdgeId>,
    /// Neighbor vertices, aligned index-for-index with `edges`.
    pub neigh: SVec<VertexId>,
    /// Incident faces, aligned index-for-index with `edges`.
    pub faces: SVec<FaceId>,
    /// Incident non-hole face centers, aligned with the ordered star.
    pub dual: SVec<Vec3>,
    /// `angle_def[0]` is `d(angle_factor)/d(self.r)`; `angle_def[1 + k]`
    /// aligns with `edges[k]` and holds `d(angle_factor)/d(neigh[k].r)`.
    /// Empty for non-boundary vertices.
    pub angle_def: SVec<Vec3>,
}

impl Vertex {
    pub fn new(r: Vec3, n: Vec3) -> Self {
        Self {
            r,
            n,
            boundary: false,
            attached: false,
            ordered: false,
            area: 0.0,
            perim: 0.0,
            edges: SVec::new(),
            neigh: SVec::new(),
            faces: SVec::new(),
            dual: SVec::new(),
            angle_def: SVec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HalfEdge {
    pub from: VertexId,
    pub to: VertexId,
    pub pair: Option<HalfEdgeId>,
    pub next: Option<HalfEdgeId>,
    pub face: Option<FaceId>,
    /// Dual-tessellation segment this half-edge carries: the line between
    /// the circumcenters/geometric-centers of the two faces it borders.
    /// Consumers treat this as an opaque handle refreshed by the geometry
    /// kernel; `None` until the owning faces have centers.
    pub dual: Option<[Vec3; 2]>,
    pub boundary: bool,
    pub visited: bool,
    pub attempted_removal: bool,
}

impl HalfEdge {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self {
            from,
            to,
            pair: None,
            next: None,
            face: None,
            dual: None,
            boundary: false,
            visited: false,
            attempted_removal: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Face {
    pub vertices: SVec<VertexId>,
    pub edges: SVec<HalfEdgeId>,
    pub rc: Vec3,
    /// Cosine of the interior angle at `vertices[i]`.
    pub angles: SVec<f32>,
    /// Sine of the interior angle at `vertices[i]` (non-negative). Paired
    /// with `angles` by the equiangulation flip test via the angle-sum
    /// identity, since every interior angle lies in `(0, pi)`.
    pub angles_signed: SVec<f32>,
    pub area: f32,
    pub radius: f32,
    pub is_hole: bool,
    pub boundary: bool,
    pub obtuse: bool,
    /// `drcdr[p]` = d(rc)/d(vertices[p].r); only populated for triangles.
    pub drcdr: Option<[Mat3; 3]>,
}

impl Face {
    pub fn n_sides(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_triangle(&self) -> bool {
        self.n_sides() == 3
    }
}
