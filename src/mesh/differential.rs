// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analytic gradients: the circumcenter Jacobian and the boundary
//! angle-factor gradient that consume it.

use std::f32::consts::TAU;

use anyhow::Result;
use glam::{Mat3, Vec3};

use crate::error::MeshError;
use crate::util::SVec;

use super::id_types::{FaceId, VertexId};
use super::topology::Mesh;

fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// `drcdr[p]_{alpha,beta} = d(rc)_alpha / d(r_p)_beta` for a triangle's
/// three vertices, via exact differentiation of the barycentric
/// circumcenter (SPEC_FULL.md §4.3). Requires `Lambda != 0`.
pub fn fc_jacobian(mesh: &mut Mesh, f: FaceId) -> Result<()> {
    let face = &mesh.faces[f];
    if !face.is_triangle() {
        return Err(MeshError::NotATriangle(f).into());
    }
    let verts = [face.vertices[0], face.vertices[1], face.vertices[2]];
    let r = [
        mesh.vertices[verts[0]].r,
        mesh.vertices[verts[1]].r,
        mesh.vertices[verts[2]].r,
    ];

    // a = rjk, b = rki, c = rij; side[p] is the side opposite vertex p.
    let side = [r[1] - r[2], r[2] - r[0], r[0] - r[1]];
    let side2 = [side[0].length_squared(), side[1].length_squared(), side[2].length_squared()];
    let l2 = side2[0] + side2[1] + side2[2];

    // d(side2[q])/d(r[p]) for q, p in {0,1,2}.
    let d_side2 = |q: usize, p: usize| -> Vec3 {
        if p == q {
            Vec3::ZERO
        } else {
            // side[q] is opposite vertex q, between the other two vertices.
            // It increases with the vertex whose index comes "after" in the
            // (q+1, q+2) ordering and decreases with the other.
            let (u, v) = ((q + 1) % 3, (q + 2) % 3);
            if p == u {
                2.0 * side[q]
            } else {
                debug_assert_eq!(p, v);
                -2.0 * side[q]
            }
        }
    };

    let lambda = [
        side2[0] * (l2 - 2.0 * side2[0]),
        side2[1] * (l2 - 2.0 * side2[1]),
        side2[2] * (l2 - 2.0 * side2[2]),
    ];
    let lambda_sum = lambda[0] + lambda[1] + lambda[2];
    if lambda_sum.abs() < f32::EPSILON {
        return Err(MeshError::DegenerateTriangle(f).into());
    }

    let mut drcdr = [Mat3::ZERO; 3];
    for p in 0..3 {
        let d_l2_dp = d_side2(0, p) + d_side2(1, p) + d_side2(2, p);
        let d_lambda_dp = [
            d_side2(0, p) * (l2 - 2.0 * side2[0]) + side2[0] * (d_l2_dp - 2.0 * d_side2(0, p)),
            d_side2(1, p) * (l2 - 2.0 * side2[1]) + side2[1] * (d_l2_dp - 2.0 * d_side2(1, p)),
            d_side2(2, p) * (l2 - 2.0 * side2[2]) + side2[2] * (d_l2_dp - 2.0 * d_side2(2, p)),
        ];
        let d_lambda_sum_dp = d_lambda_dp[0] + d_lambda_dp[1] + d_lambda_dp[2];

        let mut mat = Mat3::IDENTITY * (lambda[p] / lambda_sum);
        for q in 0..3 {
            let g_q_p = (lambda_sum * d_lambda_dp[q] - lambda[q] * d_lambda_sum_dp) / (lambda_sum * lambda_sum);
            mat += outer(r[q], g_q_p);
        }
        drcdr[p] = mat;
    }

    mesh.faces[f].drcdr = Some(drcdr);
    Ok(())
}

fn jacobian_for(mesh: &Mesh, face: FaceId, vertex: VertexId) -> Mat3 {
    let f = &mesh.faces[face];
    match (f.vertices.iter().position(|&v| v == vertex), f.drcdr) {
        (Some(pos), Some(drcdr)) => drcdr[pos],
        _ => Mat3::ZERO,
    }
}

/// Gradient of `angle_factor` with respect to every vertex that can move
/// it: the boundary vertex itself and the four vertices of its two
/// boundary-flanking triangles (SPEC_FULL.md §4.3). Non-boundary vertices
/// are left with an empty `angle_def`.
pub fn angle_factor_deriv(mesh: &mut Mesh, v: VertexId) -> Result<()> {
    if !mesh.vertices[v].boundary {
        mesh.vertices[v].angle_def.clear();
        return Ok(());
    }
    let n = mesh.vertices[v].faces.len();
    if n < 3 || !mesh.vertices[v].attached {
        mesh.vertices[v].angle_def.clear();
        return Ok(());
    }
    let f1 = mesh.vertices[v].faces[0];
    let fn_face = mesh.vertices[v].faces[n - 2];
    if !mesh.faces[f1].is_triangle() || !mesh.faces[fn_face].is_triangle() {
        mesh.vertices[v].angle_def.clear();
        return Ok(());
    }

    let r_v = mesh.vertices[v].r;
    let u1 = mesh.faces[f1].rc - r_v;
    let un = mesh.faces[fn_face].rc - r_v;
    let norm_u1 = u1.length();
    let norm_un = un.length();
    if norm_u1 < f32::EPSILON || norm_un < f32::EPSILON {
        mesh.vertices[v].angle_def.clear();
        return Ok(());
    }
    let c = (u1.dot(un) / (norm_u1 * norm_un)).clamp(-1.0, 1.0);
    let one_minus_c2 = 1.0 - c * c;

    let k = if one_minus_c2 < mesh.config.angle_factor_deriv_epsilon {
        0.0
    } else {
        let s = if u1.cross(un).dot(mesh.vertices[v].n) < 0.0 { 1.0 } else { -1.0 };
        s / (TAU * one_minus_c2.sqrt())
    };

    let u1_hat = u1 / norm_u1;
    let un_hat = un / norm_un;

    let dc_dr = |p: VertexId, is_self: bool| -> Vec3 {
        let j1 = jacobian_for(mesh, f1, p);
        let jn = jacobian_for(mesh, fn_face, p);
        let self_term = if is_self { u1 + un } else { Vec3::ZERO };
        let term1 = (j1.transpose() * un + jn.transpose() * u1 - self_term) / (norm_u1 * norm_un);

        let self_un = if is_self { un_hat } else { Vec3::ZERO };
        let self_u1 = if is_self { u1_hat } else { Vec3::ZERO };
        let bracket = norm_u1 * (jn.transpose() * un_hat - self_un) + norm_un * (j1.transpose() * u1_hat - self_u1);
        term1 - c * bracket / (norm_u1 * norm_un)
    };

    let mut angle_def: SVec<Vec3> = SVec::new();
    angle_def.resize(n + 1, Vec3::ZERO);
    angle_def[0] = k * dc_dr(v, true);

    let neigh = mesh.vertices[v].neigh.clone();
    for &e in &[0usize, 1] {
        if e < neigh.len() {
            angle_def[e + 1] += k * dc_dr(neigh[e], false);
        }
    }
    for &e in &[n.wrapping_sub(2), n.wrapping_sub(1)] {
        if e < neigh.len() {
            angle_def[e + 1] += k * dc_dr(neigh[e], false);
        }
    }

    mesh.vertices[v].angle_def = angle_def;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::geometry::compute_circumcentre;
    use crate::mesh::topology::Mesh;

    #[test]
    fn jacobian_matches_finite_difference() {
        let mut mesh = Mesh::new();
        let n = Vec3::Z;
        let a = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), n);
        let b = mesh.add_vertex(Vec3::new(-0.5, 3f32.sqrt() / 2.0, 0.0), n);
        let c = mesh.add_vertex(Vec3::new(-0.5, -3f32.sqrt() / 2.0, 0.0), n);
        let face = mesh.faces.insert(crate::mesh::entities::Face {
            vertices: SVec::from_slice(&[a, b, c]),
            ..Default::default()
        });
        fc_jacobian(&mut mesh, face).unwrap();
        let drcdr = mesh.faces[face].drcdr.unwrap();

        let rc0 = compute_circumcentre(&mesh, face).unwrap();
        let h = 1e-5;
        mesh.vertices[a].r.x += h;
        let rc1 = compute_circumcentre(&mesh, face).unwrap();
        let finite_diff = (rc1 - rc0) / h;

        let analytic_col0 = drcdr[0] * Vec3::X;
        assert!((finite_diff - analytic_col0).length() < 1e-3);
    }
}
