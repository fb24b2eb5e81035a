// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topological remeshing: edge flip, Delaunay-style equiangulation, and
//! pruning of obtuse boundary triangles.
//!
//! Written as free functions over `&mut Mesh`, mirroring the shape of the
//! teacher's own `edit_ops.rs` catalog of connectivity mutations.

use anyhow::{anyhow, bail, Context, Result};

use crate::error::MeshError;
use crate::util::SVec;

use super::differential;
use super::geometry;
use super::id_types::{FaceId, HalfEdgeId, VertexId};
use super::topology::Mesh;

/// Triangles only; fails if `e` is boundary or the mesh isn't a
/// triangulation there, or if a third vertex can't be found.
pub fn opposite_vertex(mesh: &Mesh, e: HalfEdgeId) -> Result<VertexId> {
    let he = &mesh.halfedges[e];
    if he.boundary {
        bail!("opposite_vertex: half-edge is on the boundary");
    }
    let face = he.face.ok_or_else(|| anyhow!("opposite_vertex: half-edge has no face"))?;
    if !mesh.faces[face].is_triangle() {
        return Err(MeshError::NotATriangle(face).into());
    }
    let (u, v) = (he.from, he.to);
    mesh.faces[face]
        .vertices
        .iter()
        .copied()
        .find(|&w| w != u && w != v)
        .ok_or_else(|| MeshError::NoOppositeVertex.into())
}

fn rebuild_face_from_cycle(mesh: &mut Mesh, face: FaceId, start: HalfEdgeId) {
    let mut edges: SVec<HalfEdgeId> = SVec::new();
    let mut vertices: SVec<VertexId> = SVec::new();
    let mut cur = start;
    loop {
        edges.push(cur);
        vertices.push(mesh.halfedges[cur].from);
        cur = mesh.halfedges[cur].next.expect("edge_flip leaves a broken next cycle");
        if cur == start {
            break;
        }
    }
    mesh.faces[face].vertices = vertices;
    mesh.faces[face].edges = edges;
}

/// No-op (returns `Ok(false)`) unless the mesh is a triangulation and
/// neither `e` nor its pair is boundary. See SPEC_FULL.md §4.4.
pub fn edge_flip(mesh: &mut Mesh, e: HalfEdgeId) -> Result<bool> {
    if !mesh.is_triangulation {
        return Ok(false);
    }
    let he = mesh.halfedges[e];
    if he.boundary {
        return Ok(false);
    }
    let pair_e = match he.pair {
        Some(p) => p,
        None => return Ok(false),
    };
    if mesh.halfedges[pair_e].boundary {
        return Ok(false);
    }
    let f = match he.face {
        Some(f) => f,
        None => return Ok(false),
    };
    let f_pair = match mesh.halfedges[pair_e].face {
        Some(f) => f,
        None => return Ok(false),
    };
    if !mesh.faces[f].is_triangle() || !mesh.faces[f_pair].is_triangle() {
        return Ok(false);
    }

    let e1 = mesh.halfedges[e].next.context_no_next()?;
    let e2 = mesh.halfedges[e1].next.context_no_next()?;
    let e3 = mesh.halfedges[pair_e].next.context_no_next()?;
    let e4 = mesh.halfedges[e3].next.context_no_next()?;
    if mesh.halfedges[e2].next != Some(e) || mesh.halfedges[e4].next != Some(pair_e) {
        bail!("edge_flip: triangle ring around {e:?}/{pair_e:?} is not a 3-cycle");
    }

    let v1 = mesh.halfedges[e].from;
    let v2 = mesh.halfedges[pair_e].from;
    let v3 = opposite_vertex(mesh, e)?;
    let v4 = opposite_vertex(mesh, pair_e)?;

    // Detach the flipped edge from V1/V2, reattach to V4/V3.
    mesh.vertices[v1].edges.retain(|&x| x != e);
    mesh.vertices[v2].edges.retain(|&x| x != pair_e);
    mesh.edge_map.remove(&(v1, v2));
    mesh.edge_map.remove(&(v2, v1));

    mesh.halfedges[e].from = v4;
    mesh.halfedges[e].to = v3;
    mesh.halfedges[pair_e].from = v3;
    mesh.halfedges[pair_e].to = v4;
    mesh.edge_map.insert((v4, v3), e);
    mesh.edge_map.insert((v3, v4), pair_e);
    mesh.vertices[v4].edges.push(e);
    mesh.vertices[v3].edges.push(pair_e);

    // New triangle F = (e, E2, E3); new triangle F' = (pair_e, E4, E1).
    mesh.halfedges[e].next = Some(e2);
    mesh.halfedges[e2].next = Some(e3);
    mesh.halfedges[e3].next = Some(e);
    mesh.halfedges[pair_e].next = Some(e4);
    mesh.halfedges[e4].next = Some(e1);
    mesh.halfedges[e1].next = Some(pair_e);

    mesh.halfedges[e3].face = Some(f);
    mesh.halfedges[e1].face = Some(f_pair);

    rebuild_face_from_cycle(mesh, f, e);
    rebuild_face_from_cycle(mesh, f_pair, pair_e);

    for &face_id in &[f, f_pair] {
        geometry::compute_centre(mesh, face_id)?;
        geometry::compute_angles(mesh, face_id)?;
        differential::fc_jacobian(mesh, face_id)?;
        geometry::circum_radius(mesh, face_id);
    }

    for &v in &[v1, v2, v3, v4] {
        mesh.order_star(v)?;
        geometry::dual_perimeter(mesh, v)?;
    }

    Ok(true)
}

trait NextOrBail {
    fn context_no_next(self) -> Result<HalfEdgeId>;
}
impl NextOrBail for Option<HalfEdgeId> {
    fn context_no_next(self) -> Result<HalfEdgeId> {
        self.ok_or_else(|| anyhow!("edge_flip: half-edge is missing its next pointer"))
    }
}

/// `(cos(angle), sin(angle))` at `vertex` within `face`, from the cached
/// `angles`/`angles_signed` arrays.
fn cos_sin_at(mesh: &Mesh, face: FaceId, vertex: VertexId) -> Option<(f32, f32)> {
    mesh.faces[face]
        .vertices
        .iter()
        .position(|&v| v == vertex)
        .map(|pos| (mesh.faces[face].angles[pos], mesh.faces[face].angles_signed[pos]))
}

/// Iterative Delaunay-style flipping; no-op on non-triangulations. Flips
/// a non-boundary edge when the two opposite interior angles sum to more
/// than `pi` (SPEC_FULL.md §4.4's normative criterion). Both angles lie in
/// `(0, pi)`, so `alpha + beta > pi` is exactly `sin(alpha + beta) < 0`,
/// tested via the angle-sum identity on the cached cosine/sine pair so no
/// inverse trig is needed on the hot path.
pub fn equiangulate(mesh: &mut Mesh) -> Result<()> {
    if !mesh.is_triangulation {
        return Ok(());
    }
    let bound = mesh.config.equiangulate_pass_factor * mesh.num_halfedges().max(1);
    let mut passes = 0;
    loop {
        let mut any_flip = false;
        for e in mesh.halfedge_ids() {
            if !mesh.halfedges.contains_key(e) || mesh.halfedges[e].boundary {
                continue;
            }
            let Some(pair_e) = mesh.halfedges[e].pair else { continue };
            let (Some(f), Some(f_pair)) = (mesh.halfedges[e].face, mesh.halfedges[pair_e].face) else { continue };
            if !mesh.faces[f].is_triangle() || !mesh.faces[f_pair].is_triangle() {
                continue;
            }
            let v3 = opposite_vertex(mesh, e)?;
            let v4 = opposite_vertex(mesh, pair_e)?;
            let (Some((cos_a, sin_a)), Some((cos_b, sin_b))) = (cos_sin_at(mesh, f, v3), cos_sin_at(mesh, f_pair, v4)) else {
                continue;
            };
            let sin_sum = sin_a * cos_b + cos_a * sin_b;
            if sin_sum < 0.0 && edge_flip(mesh, e)? {
                any_flip = true;
            }
        }
        passes += 1;
        if !any_flip {
            break;
        }
        if passes > bound {
            return Err(MeshError::EquiangulationDidNotConverge.into());
        }
    }
    Ok(())
}

fn boundary_owned_edge_of(mesh: &Mesh, face: FaceId) -> Option<HalfEdgeId> {
    mesh.faces[face].edges.iter().copied().find(|&e| {
        mesh.halfedges[e]
            .pair
            .map(|p| mesh.halfedges[p].boundary)
            .unwrap_or(false)
    })
}

/// Recomputes `boundary`/`obtuse` on every non-hole face and enqueues the
/// boundary half-edge of any newly-obtuse boundary triangle.
fn update_face_properties(mesh: &mut Mesh) -> Result<()> {
    for f in mesh.face_ids() {
        if mesh.faces[f].is_hole {
            continue;
        }
        let touching = boundary_owned_edge_of(mesh, f);
        mesh.faces[f].boundary = touching.is_some();
        mesh.faces[f].obtuse = false;

        if let Some(e_face) = touching {
            if mesh.faces[f].is_triangle() {
                let apex = opposite_vertex(mesh, e_face)?;
                if let Some(pos) = mesh.faces[f].vertices.iter().position(|&v| v == apex) {
                    let obtuse = mesh.faces[f].angles[pos] < 0.0;
                    mesh.faces[f].obtuse = obtuse;
                    if obtuse {
                        let boundary_he = mesh.halfedges[e_face].pair.unwrap();
                        if !mesh.halfedges[boundary_he].attempted_removal {
                            mesh.obtuse_boundary.push_back(boundary_he);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Repeatedly recomputes obtuse boundary triangles and removes them until
/// none remain.
pub fn remove_obtuse_boundary(mesh: &mut Mesh) -> Result<()> {
    for he in mesh.halfedges.values_mut() {
        he.attempted_removal = false;
    }
    loop {
        update_face_properties(mesh)?;
        if mesh.obtuse_boundary.is_empty() {
            break;
        }
        while let Some(e) = mesh.obtuse_boundary.pop_front() {
            remove_edge_pair(mesh, e)?;
        }
    }
    Ok(())
}

/// Removes the boundary half-edge pair `e`/`pair(e)`, absorbing the
/// interior triangle they border into the hole face. No-op if `e` is not
/// boundary, or if the triangle is *regular* (all three vertices already
/// boundary — removing it would detach an interior region).
pub fn remove_edge_pair(mesh: &mut Mesh, e: HalfEdgeId) -> Result<bool> {
    if !mesh.halfedges.contains_key(e) || !mesh.halfedges[e].boundary {
        return Ok(false);
    }
    let pair_e = match mesh.halfedges[e].pair {
        Some(p) => p,
        None => return Ok(false),
    };
    mesh.halfedges[e].attempted_removal = true;
    mesh.halfedges[pair_e].attempted_removal = true;

    let face_pair = match mesh.halfedges[e].face {
        Some(f) if mesh.faces[f].is_hole => f,
        _ => return Ok(false),
    };
    let face = match mesh.halfedges[pair_e].face {
        Some(f) => f,
        None => return Ok(false),
    };
    if !mesh.faces[face].is_triangle() {
        return Ok(false);
    }

    let u = mesh.halfedges[pair_e].from;
    let w = mesh.halfedges[pair_e].to;
    let w3 = opposite_vertex(mesh, pair_e)?;

    if mesh.vertices[u].boundary && mesh.vertices[w].boundary && mesh.vertices[w3].boundary {
        // Regular: removing this triangle would detach an interior region.
        return Ok(false);
    }

    // Identify the triangle's two other edges: u -> w3 and w3 -> w (the
    // cycle is pair_e(u->w), then w->w3, then w3->u, in some rotation).
    let tri_edges = mesh.faces[face].edges.clone();
    let e_w_w3 = tri_edges
        .iter()
        .copied()
        .find(|&x| mesh.halfedges[x].from == w && mesh.halfedges[x].to == w3)
        .context("remove_edge_pair: triangle is missing its w->w3 edge")?;
    let e_w3_u = tri_edges
        .iter()
        .copied()
        .find(|&x| mesh.halfedges[x].from == w3 && mesh.halfedges[x].to == u)
        .context("remove_edge_pair: triangle is missing its w3->u edge")?;

    mesh.vertices[u].edges.retain(|&x| x != pair_e);
    mesh.vertices[w].edges.retain(|&x| x != e);
    mesh.edge_map.remove(&(u, w));
    mesh.edge_map.remove(&(w, u));
    mesh.boundary_pairs.remove(&(u, w));
    mesh.boundary_pairs.remove(&(w, u));
    mesh.boundary_pairs.insert((w, w3));
    mesh.boundary_pairs.insert((w3, w));
    mesh.boundary_pairs.insert((w3, u));
    mesh.boundary_pairs.insert((u, w3));

    mesh.halfedges[e_w_w3].face = Some(face_pair);
    mesh.halfedges[e_w_w3].boundary = true;
    mesh.halfedges[e_w3_u].face = Some(face_pair);
    mesh.halfedges[e_w3_u].boundary = true;
    mesh.vertices[w3].boundary = true;

    // Splice w -> w3 -> u into the hole's cycle in place of w -> u.
    let hole_edges = mesh.faces[face_pair].edges.clone();
    let pos = hole_edges.iter().position(|&x| x == e).context("remove_edge_pair: hole face does not own the boundary edge being removed")?;
    let n = hole_edges.len();
    let prev_in_hole = hole_edges[(pos + n - 1) % n];
    let next_in_hole = mesh.halfedges[e].next;

    mesh.halfedges[prev_in_hole].next = Some(e_w_w3);
    mesh.halfedges[e_w_w3].next = Some(e_w3_u);
    mesh.halfedges[e_w3_u].next = next_in_hole;

    mesh.faces[face_pair].edges.remove(pos);
    mesh.faces[face_pair].edges.insert(pos, e_w3_u);
    mesh.faces[face_pair].edges.insert(pos, e_w_w3);
    mesh.faces[face_pair].vertices.insert(pos + 1, w3);

    mesh.boundary_edges.retain(|&x| x != e);
    mesh.boundary_edges.push(e_w_w3);
    mesh.boundary_edges.push(e_w3_u);

    mesh.halfedges.remove(e);
    mesh.halfedges.remove(pair_e);
    mesh.faces.remove(face);

    for &v in &[u, w, w3] {
        mesh.order_star(v)?;
        geometry::dual_perimeter(mesh, v)?;
    }

    Ok(true)
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use super::*;
    use crate::mesh::geometry::update_dual_mesh;
    use crate::mesh::primitives::from_triangles;

    #[test]
    fn flip_converts_diamond_diagonal() {
        // A flat diamond: the A-B diagonal leaves both apex angles near
        // 180 degrees (sum well over pi), so Delaunay wants the much
        // shorter C-D diagonal instead.
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.5, 0.1, 0.0);
        let d = Vec3::new(0.5, -0.1, 0.0);
        let mut mesh = from_triangles(&[[0, 1, 2], [0, 3, 1]], &[a, b, c, d], &[Vec3::Z; 4]).unwrap();
        update_dual_mesh(&mut mesh).unwrap();
        equiangulate(&mut mesh).unwrap();

        let ids = mesh.vertex_ids();
        let pos_of = |id: VertexId| mesh.vertex(id).r;
        let find = |target: Vec3| ids.iter().copied().find(|&id| (pos_of(id) - target).length() < 1e-4).unwrap();
        let va = find(a);
        let vb = find(b);
        assert!(!mesh.edge_map.contains_key(&(va, vb)) && !mesh.edge_map.contains_key(&(vb, va)));
        let vc = find(c);
        let vd = find(d);
        assert!(mesh.edge_map.contains_key(&(vc, vd)) || mesh.edge_map.contains_key(&(vd, vc)));
    }
}
