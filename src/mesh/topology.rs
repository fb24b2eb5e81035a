// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The half-edge store: insertion, pairing, face discovery, boundary
//! detection, and vertex-star ordering.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{bail, Context, Result};
use slotmap::SlotMap;

use crate::config::MeshConfig;
use crate::util::{rotate_iter, signed_angle, SVec};

use super::entities::{Face, HalfEdge, Vertex};
use super::id_types::{FaceId, HalfEdgeId, VertexId};
use super::plot::PlotOutput;

pub struct Mesh {
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) halfedges: SlotMap<HalfEdgeId, HalfEdge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) edge_map: HashMap<(VertexId, VertexId), HalfEdgeId>,
    pub(crate) boundary_edges: Vec<HalfEdgeId>,
    pub(crate) boundary_pairs: HashSet<(VertexId, VertexId)>,
    pub(crate) obtuse_boundary: VecDeque<HalfEdgeId>,
    pub(crate) is_triangulation: bool,
    pub(crate) plot_buffer: PlotOutput,
    pub config: MeshConfig,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            vertices: SlotMap::with_key(),
            halfedges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            edge_map: HashMap::new(),
            boundary_edges: Vec::new(),
            boundary_pairs: HashSet::new(),
            obtuse_boundary: VecDeque::new(),
            is_triangulation: true,
            plot_buffer: PlotOutput::default(),
            config,
        }
    }

    /// Tears the mesh down completely. The external driver rebuilds from
    /// scratch afterwards; because ids are generational slotmap keys,
    /// rebuilding the same topology in the same call order reproduces the
    /// same `edge_map`/adjacency structure (see scenario 6 in SPEC_FULL.md).
    pub fn reset(&mut self) {
        let config = self.config;
        *self = Self::with_config(config);
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    pub fn halfedge(&self, e: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[e]
    }

    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f]
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().collect()
    }

    pub fn halfedge_ids(&self) -> Vec<HalfEdgeId> {
        self.halfedges.keys().collect()
    }

    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces.keys().collect()
    }

    pub fn add_vertex(&mut self, r: glam::Vec3, n: glam::Vec3) -> VertexId {
        self.vertices.insert(Vertex::new(r, n))
    }

    /// Inserts a pre-built face record, bypassing the angle-sweep discovery
    /// in `generate_faces`. Used when an external loader already supplies a
    /// complete face list (SPEC_FULL.md §6). A non-hole face inserted this
    /// way with more than 3 sides clears `is_triangulation`, since in that
    /// case the mesh genuinely contains a polygon that isn't a discovery
    /// artifact.
    pub fn add_face(&mut self, vertices: SVec<VertexId>, edges: SVec<HalfEdgeId>, is_hole: bool) -> FaceId {
        if !is_hole && vertices.len() > 3 {
            self.is_triangulation = false;
        }
        let face_id = self.faces.insert(Face {
            vertices,
            edges: edges.clone(),
            is_hole,
            ..Default::default()
        });
        for e in edges {
            self.halfedges[e].face = Some(face_id);
        }
        face_id
    }

    /// Inserts a directed half-edge `u -> v` if not already present.
    /// Idempotent per ordered pair; callers add the opposite direction with
    /// a separate call.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<()> {
        if !self.vertices.contains_key(u) || !self.vertices.contains_key(v) {
            bail!("add_edge: vertex id out of range");
        }
        if self.edge_map.contains_key(&(u, v)) {
            return Ok(());
        }
        let id = self.halfedges.insert(HalfEdge::new(u, v));
        self.edge_map.insert((u, v), id);
        let vertex = &mut self.vertices[u];
        vertex.edges.push(id);
        vertex.neigh.push(v);
        vertex.attached = true;
        self.vertices[v].attached = true;
        Ok(())
    }

    /// Discovers faces by walking unvisited half-edges, choosing at each
    /// vertex the continuation that turns least (the signed-angle criterion
    /// in SPEC_FULL.md §4.1). Faces with more than 3 sides are marked
    /// `is_hole`; `is_triangulation` drops to `false` only when a *non-hole*
    /// face has more than 3 sides.
    pub fn generate_faces(&mut self) -> Result<()> {
        self.faces.clear();
        for he in self.halfedges.values_mut() {
            he.visited = false;
            he.face = None;
            he.next = None;
        }
        self.is_triangulation = true;

        let seeds: Vec<HalfEdgeId> = self.halfedges.keys().collect();
        for seed_e in seeds {
            if self.halfedges[seed_e].visited {
                continue;
            }

            let seed = self.halfedges[seed_e].from;
            let mut vp = seed;
            let mut cur = self.halfedges[seed_e].to;
            let mut prev_edge = seed_e;
            self.halfedges[seed_e].visited = true;

            let mut vertices: SVec<VertexId> = SVec::new();
            let mut edges: SVec<HalfEdgeId> = SVec::new();
            vertices.push(seed);
            vertices.push(cur);
            edges.push(seed_e);

            loop {
                let best = self.pick_next_outgoing(cur, vp)?;
                self.halfedges[best].visited = true;
                self.halfedges[prev_edge].next = Some(best);

                let to = self.halfedges[best].to;
                edges.push(best);
                if to == seed {
                    break;
                }
                vertices.push(to);
                vp = cur;
                cur = to;
                prev_edge = best;
            }

            let n_sides = vertices.len();
            let is_hole = n_sides > 3;
            if !is_hole && n_sides > 3 {
                self.is_triangulation = false;
            }
            let face_id = self.faces.insert(Face {
                vertices,
                edges: edges.clone(),
                is_hole,
                ..Default::default()
            });
            for e in edges {
                self.halfedges[e].face = Some(face_id);
            }
        }
        Ok(())
    }

    /// Picks, among the unvisited outgoing half-edges of `cur`, the one
    /// whose turn (measured from the incoming direction `cur - vp`) is
    /// smallest, excluding the edge that points straight back to `vp`
    /// unless it is the only option.
    fn pick_next_outgoing(&self, cur: VertexId, vp: VertexId) -> Result<HalfEdgeId> {
        let incoming = self.vertices[cur].r - self.vertices[vp].r;
        let n = self.vertices[cur].n;

        let candidates: SVec<HalfEdgeId> = self.vertices[cur]
            .edges
            .iter()
            .copied()
            .filter(|&e| !self.halfedges[e].visited)
            .collect();

        let filtered: SVec<HalfEdgeId> = candidates
            .iter()
            .copied()
            .filter(|&e| self.halfedges[e].to != vp)
            .collect();
        let pool = if filtered.is_empty() { &candidates } else { &filtered };

        pool.iter()
            .copied()
            .min_by(|&a, &b| {
                let score_a = self.turn_score(incoming, cur, a, n);
                let score_b = self.turn_score(incoming, cur, b, n);
                score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .context("generate_faces: vertex has no unvisited outgoing half-edge to continue the walk")
    }

    fn turn_score(&self, incoming: glam::Vec3, cur: VertexId, candidate: HalfEdgeId, n: glam::Vec3) -> f32 {
        let outgoing = self.vertices[self.halfedges[candidate].to].r - self.vertices[cur].r;
        std::f32::consts::PI - signed_angle(incoming, outgoing, n)
    }

    /// Re-derives boundary bookkeeping, pairs every half-edge via
    /// `edge_map`, and (if `order_flag`) orders every vertex star.
    pub fn postprocess(&mut self, order_flag: bool) -> Result<()> {
        if self.faces.is_empty() {
            self.generate_faces()?;
        }

        self.boundary_edges.clear();
        self.boundary_pairs.clear();
        for v in self.vertices.values_mut() {
            v.boundary = false;
        }
        for he in self.halfedges.values_mut() {
            he.boundary = false;
        }

        let hole_faces: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|(_, f)| f.is_hole)
            .map(|(id, _)| id)
            .collect();
        for hole in hole_faces {
            let edges = self.faces[hole].edges.clone();
            for e in edges {
                let (from, to) = (self.halfedges[e].from, self.halfedges[e].to);
                self.halfedges[e].boundary = true;
                self.vertices[from].boundary = true;
                self.vertices[to].boundary = true;
                self.boundary_pairs.insert((from, to));
                self.boundary_pairs.insert((to, from));
                self.boundary_edges.push(e);
            }
            self.faces[hole].boundary = true;
        }

        let pairs: Vec<(HalfEdgeId, (VertexId, VertexId))> = self
            .halfedges
            .iter()
            .map(|(id, he)| (id, (he.from, he.to)))
            .collect();
        for (id, (from, to)) in pairs {
            if let Some(&pair_id) = self.edge_map.get(&(to, from)) {
                self.halfedges[id].pair = Some(pair_id);
            }
        }

        if order_flag {
            // order_star's chirality check (below) needs real face centers to
            // tell which way a star winds; compute them before ordering so
            // the sign of dual_area is meaningful on the very first pass.
            let non_hole_faces: Vec<FaceId> = self.faces.iter().filter(|(_, f)| !f.is_hole).map(|(id, _)| id).collect();
            for f in non_hole_faces {
                super::geometry::compute_centre(self, f)?;
            }

            let ids: Vec<VertexId> = self.vertices.keys().collect();
            for v in ids {
                self.order_star(v)?;
            }
        }
        Ok(())
    }

    /// Orders the star of `v`: walks outgoing half-edges so consecutive
    /// entries share a face, rebuilding `edges`, `neigh`, `faces`, `dual` in
    /// lock-step; fixes chirality by checking the sign of `dual_area`;
    /// rotates the boundary vertex's lists so the hole face is last.
    pub fn order_star(&mut self, v: VertexId) -> Result<()> {
        self.vertices[v].dual.clear();
        self.vertices[v].neigh.clear();
        self.vertices[v].faces.clear();

        let outgoing = self.vertices[v].edges.clone();
        if outgoing.is_empty() {
            self.vertices[v].ordered = true;
            return Ok(());
        }

        let start = outgoing[0];
        let mut ordered_edges: SVec<HalfEdgeId> = SVec::new();
        let mut cur = start;
        loop {
            ordered_edges.push(cur);
            let face = self.halfedges[cur].face;
            let pair = self
                .halfedges[cur]
                .pair
                .context("order_star: half-edge has no pair; call postprocess first")?;
            let next = self
                .halfedges[pair]
                .next
                .context("order_star: half-edge has no next; call generate_faces first")?;
            if let Some(face_id) = face {
                if !self.faces[face_id].is_hole {
                    self.vertices[v].dual.push(self.faces[face_id].rc);
                }
                self.vertices[v].faces.push(face_id);
            }
            self.vertices[v].neigh.push(self.halfedges[cur].to);
            if next == start {
                break;
            }
            cur = next;
            if ordered_edges.len() > outgoing.len() {
                bail!("order_star: star traversal did not close for vertex {v:?}");
            }
        }
        self.vertices[v].edges = ordered_edges;
        self.vertices[v].ordered = true;

        if self.vertices[v].boundary {
            self.rotate_star_hole_last(v);
        }

        let area = crate::mesh::geometry::dual_area(self, v)?;
        if area < 0.0 {
            self.reverse_star(v);
            if self.vertices[v].boundary {
                self.rotate_star_hole_last(v);
            }
            crate::mesh::geometry::dual_area(self, v)?;
        }
        Ok(())
    }

    fn reverse_star(&mut self, v: VertexId) {
        let vertex = &mut self.vertices[v];
        vertex.edges.reverse();
        vertex.neigh.reverse();
        vertex.faces.reverse();
        vertex.dual.reverse();
    }

    /// Rotates the four aligned star lists so the hole face (and the
    /// half-edge whose pair enters `v` from the boundary) sits last.
    fn rotate_star_hole_last(&mut self, v: VertexId) {
        let faces = &self.vertices[v].faces;
        let Some(hole_pos) = faces.iter().position(|&f| self.faces[f].is_hole) else {
            return;
        };
        let n = self.vertices[v].edges.len();
        if n == 0 {
            return;
        }
        let shift = (hole_pos + 1) % n;

        let vertex = &mut self.vertices[v];
        vertex.edges = rotate_iter(vertex.edges.iter().copied(), shift, n).collect();
        vertex.neigh = rotate_iter(vertex.neigh.iter().copied(), shift, n).collect();
        vertex.faces = rotate_iter(vertex.faces.iter().copied(), shift, n).collect();
        let dual_len = vertex.dual.len();
        if dual_len > 0 {
            vertex.dual = rotate_iter(vertex.dual.iter().copied(), shift % dual_len, dual_len).collect();
        }
    }
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use super::*;

    fn single_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0), Vec3::Z);
        let b = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let c = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
        for &(u, v) in &[(a, b), (b, a), (b, c), (c, b), (c, a), (a, c)] {
            mesh.add_edge(u, v).unwrap();
        }
        mesh
    }

    #[test]
    fn single_triangle_has_one_interior_and_one_hole_face() {
        let mut mesh = single_triangle();
        mesh.postprocess(true).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        let holes = mesh.faces.values().filter(|f| f.is_hole).count();
        assert_eq!(holes, 1);
        assert!(mesh.is_triangulation);
    }

    #[test]
    fn pairing_is_involutive() {
        let mut mesh = single_triangle();
        mesh.postprocess(true).unwrap();
        for (id, he) in mesh.halfedges.iter() {
            let pair = he.pair.expect("every half-edge has a pair after postprocess");
            assert_ne!(pair, id);
            let pair_pair = mesh.halfedges[pair].pair.unwrap();
            assert_eq!(pair_pair, id);
        }
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vec3::ZERO, Vec3::Z);
        let b = mesh.add_vertex(Vec3::X, Vec3::Z);
        mesh.add_edge(a, b).unwrap();
        mesh.add_edge(a, b).unwrap();
        assert_eq!(mesh.num_halfedges(), 1);
    }
}
