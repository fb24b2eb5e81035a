// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction helpers that build a fully-connected, ordered `Mesh` from
//! a flat triangle soup, per SPEC_FULL.md §4.6.

use anyhow::{bail, Result};
use glam::Vec3;

use super::geometry::update_dual_mesh;
use super::topology::Mesh;

/// Builds a mesh from an indexed triangle list. `triangles[i] = [a, b, c]`
/// indexes into `positions`/`normals`, vertices wound consistently
/// (CCW as seen from the outward normal). Runs the full face-discovery
/// sweep and dual-mesh refresh before returning.
pub fn from_triangles(triangles: &[[u32; 3]], positions: &[Vec3], normals: &[Vec3]) -> Result<Mesh> {
    if positions.len() != normals.len() {
        bail!("from_triangles: positions and normals must have the same length");
    }

    let mut mesh = Mesh::new();
    let ids: Vec<_> = positions
        .iter()
        .zip(normals)
        .map(|(&r, &n)| mesh.add_vertex(r, n))
        .collect();

    for tri in triangles {
        let [a, b, c] = tri.map(|i| {
            *ids.get(i as usize)
                .unwrap_or_else(|| panic!("from_triangles: vertex index {i} out of range"))
        });
        mesh.add_edge(a, b)?;
        mesh.add_edge(b, c)?;
        mesh.add_edge(c, a)?;
    }

    mesh.postprocess(true)?;
    update_dual_mesh(&mut mesh)?;
    Ok(mesh)
}

#[cfg(test)]
mod test {
    use super::*;

    fn hexagon_fan() -> (Vec<[u32; 3]>, Vec<Vec3>, Vec<Vec3>) {
        let mut positions = vec![Vec3::ZERO];
        let mut triangles = Vec::new();
        for i in 0..6 {
            let theta = i as f32 / 6.0 * std::f32::consts::TAU;
            positions.push(Vec3::new(theta.cos(), theta.sin(), 0.0));
        }
        for i in 0..6u32 {
            triangles.push([0, 1 + i, 1 + (i + 1) % 6]);
        }
        let normals = vec![Vec3::Z; positions.len()];
        (triangles, positions, normals)
    }

    #[test]
    fn hexagon_fan_has_one_interior_vertex_and_closed_boundary() {
        let (tris, pos, normals) = hexagon_fan();
        let mesh = from_triangles(&tris, &pos, &normals).unwrap();
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_faces(), 7); // 6 triangles + 1 hole
        let interior_count = mesh.vertex_ids().iter().filter(|&&v| !mesh.vertex(v).boundary).count();
        assert_eq!(interior_count, 1);
    }

    #[test]
    fn from_triangles_rejects_mismatched_lengths() {
        let positions = vec![Vec3::ZERO, Vec3::X];
        let normals = vec![Vec3::Z];
        assert!(from_triangles(&[], &positions, &normals).is_err());
    }
}
