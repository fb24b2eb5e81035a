// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face centers, interior angles, dual cell area/perimeter, circumradius,
//! and the boundary angle-deficit factor.

use std::f32::consts::TAU;

use anyhow::Result;
use glam::Vec3;

use crate::error::MeshError;

use super::id_types::{FaceId, VertexId};
use super::topology::Mesh;

/// Triangle-only barycentric circumcenter (SPEC_FULL.md §4.2).
pub fn compute_circumcentre(mesh: &Mesh, f: FaceId) -> Result<Vec3> {
    let face = &mesh.faces[f];
    if !face.is_triangle() {
        return Err(MeshError::NotATriangle(f).into());
    }
    let (i, j, k) = (face.vertices[0], face.vertices[1], face.vertices[2]);
    let (ri, rj, rk) = (mesh.vertices[i].r, mesh.vertices[j].r, mesh.vertices[k].r);

    let a = rj - rk;
    let b = rk - ri;
    let c = ri - rj;
    let alpha2 = a.length_squared();
    let beta2 = b.length_squared();
    let gamma2 = c.length_squared();
    let l2 = alpha2 + beta2 + gamma2;

    let lambda1 = alpha2 * (l2 - 2.0 * alpha2);
    let lambda2 = beta2 * (l2 - 2.0 * beta2);
    let lambda3 = gamma2 * (l2 - 2.0 * gamma2);
    let lambda_sum = lambda1 + lambda2 + lambda3;
    if lambda_sum.abs() < f32::EPSILON {
        return Err(MeshError::DegenerateTriangle(f).into());
    }

    Ok((lambda1 * ri + lambda2 * rj + lambda3 * rk) / lambda_sum)
}

pub fn compute_geometric_centre(mesh: &Mesh, f: FaceId) -> Vec3 {
    let face = &mesh.faces[f];
    let sum: Vec3 = face.vertices.iter().map(|&v| mesh.vertices[v].r).sum();
    sum / face.vertices.len() as f32
}

/// Dispatches to the circumcenter for triangles, the geometric mean
/// otherwise, and writes the result into `face.rc`.
pub fn compute_centre(mesh: &mut Mesh, f: FaceId) -> Result<Vec3> {
    let rc = if mesh.faces[f].is_triangle() {
        compute_circumcentre(mesh, f)?
    } else {
        compute_geometric_centre(mesh, f)
    };
    mesh.faces[f].rc = rc;
    Ok(rc)
}

/// Cosine (`angles`) and sine (`angles_signed`) of the interior angle at
/// every vertex of `f`. Every genuine interior angle of a simple polygon
/// lies in `(0, pi)`, so the sine is always non-negative here regardless
/// of winding — `equiangulate` pairs the two caches through the
/// angle-sum identity to get a sign-correct Delaunay test without ever
/// computing `alpha + beta` directly.
pub fn compute_angles(mesh: &mut Mesh, f: FaceId) -> Result<()> {
    let vertices = mesh.faces[f].vertices.clone();
    let n = vertices.len();
    let mut cosines = crate::util::SVec::with_capacity(n);
    let mut sines = crate::util::SVec::with_capacity(n);
    for i in 0..n {
        let v = vertices[i];
        let v_next = vertices[(i + 1) % n];
        let v_prev = vertices[(i + n - 1) % n];
        let to_next = (mesh.vertices[v_next].r - mesh.vertices[v].r).normalize_or_zero();
        let to_prev = (mesh.vertices[v_prev].r - mesh.vertices[v].r).normalize_or_zero();
        let cosine = to_next.dot(to_prev);
        cosines.push(cosine);
        sines.push((1.0 - cosine * cosine).max(0.0).sqrt());
    }
    let face = &mut mesh.faces[f];
    face.angles = cosines;
    face.angles_signed = sines;
    Ok(())
}

/// Distance from `rc` to any vertex; zero for non-triangles.
pub fn circum_radius(mesh: &mut Mesh, f: FaceId) -> f32 {
    let face = &mesh.faces[f];
    let radius = if face.is_triangle() {
        (face.rc - mesh.vertices[face.vertices[0]].r).length()
    } else {
        0.0
    };
    mesh.faces[f].radius = radius;
    radius
}

/// Rebuilds `vertex.dual` from the current `vertex.faces` order (skipping
/// the hole face), without touching the ordering itself. `postprocess`
/// computes every face center before ordering stars, so `order_star`
/// already sees real centers on its first pass; this is the refresh used
/// afterward, once a topological op or `update_dual_mesh` has moved
/// `face.rc` and `vertex.faces` itself hasn't changed.
pub fn refresh_vertex_duals(mesh: &mut Mesh, v: VertexId) {
    let faces = mesh.vertices[v].faces.clone();
    let dual: crate::util::SVec<Vec3> = faces
        .iter()
        .filter(|&&f| !mesh.faces[f].is_hole)
        .map(|&f| mesh.faces[f].rc)
        .collect();
    mesh.vertices[v].dual = dual;
}

/// Signed dual-cell area; §4.2. Requires `vertex.ordered`.
pub fn dual_area(mesh: &mut Mesh, v: VertexId) -> Result<f32> {
    let vertex = &mesh.vertices[v];
    if !vertex.ordered {
        return Err(MeshError::UnorderedVertex(v).into());
    }
    let n = vertex.n;
    let r_v = vertex.r;
    let dual = vertex.dual.clone();
    let m = dual.len();

    let area = if !vertex.boundary {
        if m == 0 {
            0.0
        } else {
            let mut sum = 0.0;
            for mu in 0..m {
                sum += dual[mu].cross(dual[(mu + 1) % m]).dot(n);
            }
            0.5 * sum
        }
    } else if m == 0 {
        0.0
    } else {
        let mut sum = r_v.cross(dual[0]).dot(n);
        for mu in 0..m.saturating_sub(1) {
            sum += dual[mu].cross(dual[mu + 1]).dot(n);
        }
        sum += dual[m - 1].cross(r_v).dot(n);
        0.5 * sum
    };

    mesh.vertices[v].area = area;
    Ok(area)
}

/// Dual-cell perimeter, same index conventions as `dual_area`.
pub fn dual_perimeter(mesh: &mut Mesh, v: VertexId) -> Result<f32> {
    let vertex = &mesh.vertices[v];
    if !vertex.ordered {
        return Err(MeshError::UnorderedVertex(v).into());
    }
    let r_v = vertex.r;
    let dual = vertex.dual.clone();
    let m = dual.len();

    let perim = if !vertex.boundary {
        if m == 0 {
            0.0
        } else {
            (0..m).map(|mu| (dual[mu] - dual[(mu + 1) % m]).length()).sum()
        }
    } else if m == 0 {
        0.0
    } else {
        let mut sum = (r_v - dual[0]).length();
        for mu in 0..m.saturating_sub(1) {
            sum += (dual[mu] - dual[mu + 1]).length();
        }
        sum += (dual[m - 1] - r_v).length();
        sum
    };

    mesh.vertices[v].perim = perim;
    Ok(perim)
}

/// `1` for non-boundary vertices; `0` for detached or under-connected
/// boundary corners; otherwise `(2*pi - theta) / (2*pi)`.
pub fn angle_factor(mesh: &Mesh, v: VertexId) -> f32 {
    let vertex = &mesh.vertices[v];
    if !vertex.boundary {
        return 1.0;
    }
    if !vertex.attached || vertex.faces.len() < 3 {
        return 0.0;
    }
    let n = vertex.faces.len();
    let f0 = vertex.faces[0];
    let fn_1 = vertex.faces[n - 2];
    let u1 = mesh.faces[f0].rc - vertex.r;
    let u2 = mesh.faces[fn_1].rc - vertex.r;
    let denom = u1.length() * u2.length();
    if denom < f32::EPSILON {
        return 0.0;
    }
    let mut theta = (u1.dot(u2) / denom).clamp(-1.0, 1.0).acos();
    if u1.cross(u2).dot(vertex.n) > 0.0 {
        theta = TAU - theta;
    }
    (TAU - theta) / TAU
}

/// Populates face centers, angles, radii and vertex dual caches for the
/// first time. See `update_dual_mesh` for the per-step refresh that both
/// this and every topological op route through.
pub fn generate_dual_mesh(mesh: &mut Mesh) -> Result<()> {
    update_dual_mesh(mesh)
}

/// Refreshes centers, angles, radii, Jacobians, dual areas/perimeters and
/// angle-factor gradients for every entity. Callers run this after moving
/// vertex positions and after any topological mutation.
pub fn update_dual_mesh(mesh: &mut Mesh) -> Result<()> {
    let face_ids = mesh.face_ids();
    for f in &face_ids {
        if mesh.faces[*f].is_hole {
            continue;
        }
        compute_centre(mesh, *f)?;
        compute_angles(mesh, *f)?;
        circum_radius(mesh, *f);
        if mesh.faces[*f].is_triangle() {
            super::differential::fc_jacobian(mesh, *f)?;
        }
    }

    let vertex_ids = mesh.vertex_ids();
    for v in &vertex_ids {
        refresh_vertex_duals(mesh, *v);
        dual_area(mesh, *v)?;
        dual_perimeter(mesh, *v)?;
    }
    for v in &vertex_ids {
        super::differential::angle_factor_deriv(mesh, *v)?;
    }
    Ok(())
}

/// Area of a non-hole face: for a triangle, the standard cross-product
/// formula; for a polygon, a fan-triangulation sum about the geometric
/// centre. Writes `face.area`.
pub fn face_area(mesh: &mut Mesh, f: FaceId) -> f32 {
    let face = &mesh.faces[f];
    let verts: crate::util::SVec<Vec3> = face.vertices.iter().map(|&v| mesh.vertices[v].r).collect();
    let n = verts.len();
    let area = if n < 3 {
        0.0
    } else {
        let centre: Vec3 = verts.iter().copied().sum::<Vec3>() / n as f32;
        let mut sum = 0.0;
        for i in 0..n {
            let a = verts[i] - centre;
            let b = verts[(i + 1) % n] - centre;
            sum += a.cross(b).length();
        }
        0.5 * sum
    };
    mesh.faces[f].area = area;
    area
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use super::*;
    use crate::mesh::topology::Mesh;

    #[test]
    fn circumcentre_of_equilateral_triangle_is_origin() {
        let mut mesh = Mesh::new();
        let n = Vec3::Z;
        let a = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), n);
        let b = mesh.add_vertex(Vec3::new(-0.5, 3f32.sqrt() / 2.0, 0.0), n);
        let c = mesh.add_vertex(Vec3::new(-0.5, -3f32.sqrt() / 2.0, 0.0), n);
        for &(u, v) in &[(a, b), (b, c), (c, a)] {
            mesh.add_edge(u, v).unwrap();
        }
        let face = mesh.faces.insert(crate::mesh::entities::Face {
            vertices: crate::util::SVec::from_slice(&[a, b, c]),
            ..Default::default()
        });
        let rc = compute_circumcentre(&mesh, face).unwrap();
        assert!(rc.length() < 1e-5);
    }
}
