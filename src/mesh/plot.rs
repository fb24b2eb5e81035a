// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flattens dual cells into a point+polygon list for external rendering
//! (SPEC_FULL.md §4.5).

use glam::Vec3;

use crate::util::SVec;

use super::topology::Mesh;

/// One dual cell: indices into `PlotOutput::points`, in rotational order,
/// plus its cached area and perimeter.
#[derive(Clone, Debug, Default)]
pub struct PlotPolygon {
    pub indices: Vec<usize>,
    pub area: f32,
    pub perimeter: f32,
}

/// The flattened dual mesh, owned by the `Mesh` and overwritten in place
/// on every call to `plot_area`.
#[derive(Clone, Debug, Default)]
pub struct PlotOutput {
    pub points: Vec<Vec3>,
    pub polygons: Vec<PlotPolygon>,
}

/// Rebuilds the mesh's plot buffer and returns a read-only view of it.
/// When `include_boundary` is set, boundary vertex positions are assigned
/// indices first, followed by the positions of every unique non-hole face
/// center; otherwise only face centers are emitted.
pub fn plot_area(mesh: &mut Mesh, include_boundary: bool) -> &PlotOutput {
    let mut points = Vec::new();
    let mut polygons = Vec::new();

    let mut boundary_index: std::collections::HashMap<super::id_types::VertexId, usize> = std::collections::HashMap::new();
    if include_boundary {
        for v in mesh.vertex_ids() {
            if mesh.vertex(v).boundary {
                boundary_index.insert(v, points.len());
                points.push(mesh.vertex(v).r);
            }
        }
    }

    let mut face_index: std::collections::HashMap<super::id_types::FaceId, usize> = std::collections::HashMap::new();
    for v in mesh.vertex_ids() {
        for &f in &mesh.vertex(v).faces {
            if mesh.face(f).is_hole {
                continue;
            }
            if !face_index.contains_key(&f) {
                face_index.insert(f, points.len());
                points.push(mesh.face(f).rc);
            }
        }
    }

    for v in mesh.vertex_ids() {
        let vertex = mesh.vertex(v);
        if !vertex.attached {
            continue;
        }
        let non_hole_faces: SVec<usize> = vertex
            .faces
            .iter()
            .filter(|&&f| !mesh.face(f).is_hole)
            .map(|&f| face_index[&f])
            .collect();
        if non_hole_faces.is_empty() {
            continue;
        }

        let mut indices = Vec::with_capacity(non_hole_faces.len() + 1);
        if vertex.boundary {
            if !include_boundary {
                continue;
            }
            indices.push(boundary_index[&v]);
        }
        indices.extend(non_hole_faces.iter().copied());

        polygons.push(PlotPolygon {
            indices,
            area: vertex.area,
            perimeter: vertex.perim,
        });
    }

    mesh.plot_buffer = PlotOutput { points, polygons };
    &mesh.plot_buffer
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::geometry::update_dual_mesh;
    use crate::mesh::primitives::from_triangles;

    #[test]
    fn hexagon_plot_emits_one_interior_polygon() {
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
        let mut mesh = from_triangles(&triangles, &positions, &normals).unwrap();
        update_dual_mesh(&mut mesh).unwrap();

        let out = plot_area(&mut mesh, false);
        assert_eq!(out.polygons.len(), 1);
        assert_eq!(out.polygons[0].indices.len(), 6);
    }

    #[test]
    fn plot_with_boundary_includes_boundary_vertices() {
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
        let mut mesh = from_triangles(&triangles, &positions, &normals).unwrap();
        update_dual_mesh(&mut mesh).unwrap();

        let out = plot_area(&mut mesh, true);
        assert_eq!(out.polygons.len(), 7);
    }
}
