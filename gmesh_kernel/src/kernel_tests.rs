// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::mesh::gmesh::edit_ops::{self, join_edge, split_edge};
use crate::mesh::gmesh::primitives::{Cube, CubeParams, Plane, PlaneParams};
use crate::mesh::gmesh::validator;
use crate::prelude::*;

fn counts_of(faces: usize, loops: usize, edges: usize, vertices: usize) -> ElementCounts {
    ElementCounts {
        faces,
        loops,
        edges,
        vertices,
    }
}

/// Splits every edge that exists at the time of the call, using a snapshot
/// of the edge ids so that iteration never observes the mutation.
fn split_all_edges(mesh: &mut GMesh) {
    let snapshot = mesh.iter_edges().map(|(e, _)| e).collect_vec();
    for e in snapshot {
        split_edge(mesh, e, None).unwrap();
    }
}

#[test]
fn triangle_create() {
    let mut mesh = GMesh::new();
    mesh.add_face_from_positions(&[
        Vec3::ZERO,
        Vec3::new(1.0, 0.1, 1.0),
        Vec3::new(2.0, 2.0, 2.0),
    ])
    .unwrap();

    assert_eq!(mesh.counts(), counts_of(1, 3, 3, 3));
    for (v, _) in mesh.iter_vertices() {
        assert_eq!(mesh.vertex_degree(v), 2);
        assert_eq!(mesh.vertex_faces(v).len(), 1);
    }
    for (e, _) in mesh.iter_edges() {
        // Border edges: one loop, self-referential radial pointers.
        let loops = mesh.edge_loops(e);
        assert_eq!(loops.len(), 1);
        assert_eq!(mesh[loops[0]].radial_next(), loops[0]);
    }
    validator::check_all(&mesh).unwrap();
}

#[test]
fn triangle_delete_from_vertex_empties_the_mesh() {
    let mut mesh = GMesh::new();
    let ring = mesh.add_vertices(&[
        Vec3::ZERO,
        Vec3::new(1.0, 0.1, 1.0),
        Vec3::new(2.0, 2.0, 2.0),
    ]);
    mesh.add_face(&ring).unwrap();

    mesh.delete_vertex(ring[0]);
    assert_eq!(mesh.counts(), counts_of(0, 0, 0, 0));
    validator::check_all(&mesh).unwrap();
}

#[test]
fn delete_face_keeps_wire_edges_behind() {
    let mut mesh = GMesh::new();
    let f = mesh
        .add_face_from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y])
        .unwrap();

    mesh.delete_face(f);
    assert_eq!(mesh.counts(), counts_of(0, 0, 3, 3));
    for (_, edge) in mesh.iter_edges() {
        assert!(edge.is_wire());
    }
    validator::check_all(&mesh).unwrap();
}

#[test]
fn deletes_are_idempotent_on_tombstones() {
    let mut mesh = GMesh::new();
    let ring = mesh.add_vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
    let f = mesh.add_face(&ring).unwrap();
    let e = mesh.find_edge(ring[0], ring[1]).unwrap();

    mesh.delete_face(f);
    mesh.delete_face(f);
    mesh.delete_edge(e);
    mesh.delete_edge(e);
    mesh.delete_vertex(ring[0]);
    mesh.delete_vertex(ring[0]);

    let settled = mesh.counts();
    mesh.delete_vertex(ring[0]);
    assert_eq!(mesh.counts(), settled);
    validator::check_all(&mesh).unwrap();
}

#[test]
fn quad_split_all_edges_makes_an_octagon() {
    let mut mesh = GMesh::new();
    let f = mesh
        .add_face_from_positions(&[
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ])
        .unwrap();

    split_all_edges(&mut mesh);

    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh[f].num_loops(), 8);
    assert_eq!(mesh.counts(), counts_of(1, 8, 8, 8));
    validator::check_all(&mesh).unwrap();
}

#[test]
fn plane_four_by_four_counts_and_split() {
    let mut mesh = Plane::build(&PlaneParams {
        vertex_count: UVec2::new(4, 4),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(mesh.counts(), counts_of(9, 36, 24, 16));

    split_all_edges(&mut mesh);

    validator::check_all(&mesh).unwrap();
    for (f, face) in mesh.iter_faces() {
        // Every quad gained one side per original edge.
        assert_eq!(face.num_loops(), 8);
        assert_eq!(mesh.face_loops(f).len(), 8);
    }
    for (e, _) in mesh.iter_edges() {
        assert!(mesh.edge_loops(e).len() <= 2);
    }
}

#[test]
fn cube_three_cubed_is_closed_and_manifold() {
    let mesh = Cube::build(&CubeParams {
        vertex_count: UVec3::new(3, 3, 3),
        scale: Vec3::ONE,
    })
    .unwrap();

    assert_eq!(mesh.counts(), counts_of(24, 96, 48, 26));
    for (e, _) in mesh.iter_edges() {
        assert_eq!(mesh.edge_loops(e).len(), 2);
    }
    validator::check_all(&mesh).unwrap();
}

#[test]
fn cube_survives_splitting_every_edge_twice() {
    let mut mesh = Cube::build(&CubeParams {
        vertex_count: UVec3::new(3, 3, 3),
        scale: Vec3::ONE,
    })
    .unwrap();

    split_all_edges(&mut mesh);
    validator::check_all(&mesh).unwrap();
    for (_, face) in mesh.iter_faces() {
        assert_eq!(face.num_loops(), 8);
    }

    split_all_edges(&mut mesh);
    validator::check_all(&mesh).unwrap();
    for (_, face) in mesh.iter_faces() {
        // Two rounds of splitting quadruple every face's side count.
        assert_eq!(face.num_loops(), 16);
    }
    for (e, _) in mesh.iter_edges() {
        assert!(mesh.edge_loops(e).len() <= 2);
    }
}

#[test]
fn split_join_round_trip_on_a_plane() {
    let mut mesh = Plane::build(&PlaneParams {
        vertex_count: UVec2::new(3, 3),
        ..Default::default()
    })
    .unwrap();
    let before = mesh.counts();

    // Pick an interior edge (one with two incident faces).
    let interior = mesh
        .iter_edges()
        .find(|(e, _)| mesh.edge_loops(*e).len() == 2)
        .map(|(e, _)| e)
        .unwrap();

    let e_new = split_edge(&mut mesh, interior, None).unwrap();
    let n = {
        let (a, b) = mesh[e_new].endpoints();
        if mesh[interior].contains(a) {
            a
        } else {
            b
        }
    };
    assert_eq!(mesh.vertex_degree(n), 2);
    validator::check_all(&mesh).unwrap();

    join_edge(&mut mesh, e_new, n).unwrap();
    assert_eq!(mesh.counts(), before);
    validator::check_all(&mesh).unwrap();
}

#[test]
fn deep_copy_compares_equal_and_diverges_after_mutation() {
    let mut mesh = Plane::build(&PlaneParams {
        vertex_count: UVec2::new(3, 3),
        ..Default::default()
    })
    .unwrap();
    // Leave a tombstone behind so the copy has to carry it too.
    let (f, _) = mesh.iter_faces().next().unwrap();
    mesh.delete_face(f);

    let copy = mesh.clone();
    assert_eq!(copy, mesh);
    assert_eq!(copy.counts(), mesh.counts());
    // Tombstoned slots are carried over, not compacted away.
    assert_eq!(copy.loop_store().slot_count(), mesh.loop_store().slot_count());
    assert!(copy.loop_store().slot_count() > copy.num_loops());

    // New elements land in the same slots on both meshes.
    let mut copy2 = mesh.clone();
    let v_a = mesh.add_vertex(Vec3::ZERO);
    let v_b = copy2.add_vertex(Vec3::ZERO);
    assert_eq!(v_a, v_b);

    mesh.add_vertex(Vec3::ONE);
    assert_ne!(copy, mesh);
}

#[test]
fn box_from_polygon_soup() {
    let hsize = Vec3::splat(0.5);
    let mesh = GMesh::build_from_polygons(
        &[
            Vec3::new(-hsize.x, -hsize.y, -hsize.z),
            Vec3::new(hsize.x, -hsize.y, -hsize.z),
            Vec3::new(hsize.x, -hsize.y, hsize.z),
            Vec3::new(-hsize.x, -hsize.y, hsize.z),
            Vec3::new(-hsize.x, hsize.y, -hsize.z),
            Vec3::new(-hsize.x, hsize.y, hsize.z),
            Vec3::new(hsize.x, hsize.y, hsize.z),
            Vec3::new(hsize.x, hsize.y, -hsize.z),
        ],
        &[
            &[0u32, 1, 2, 3],
            &[4, 5, 6, 7],
            &[4, 7, 1, 0],
            &[3, 2, 6, 5],
            &[5, 4, 0, 3],
            &[6, 2, 1, 7],
        ],
    )
    .unwrap();

    assert_eq!(mesh.counts(), counts_of(6, 24, 12, 8));
    for (e, _) in mesh.iter_edges() {
        assert_eq!(mesh.edge_loops(e).len(), 2);
    }
    let (center, size) = mesh.bounding_box();
    assert!(center.abs_diff_eq(Vec3::ZERO, 1e-6));
    assert!(size.abs_diff_eq(Vec3::ONE, 1e-6));
    validator::check_all(&mesh).unwrap();
}

#[test]
fn combine_without_weld_just_concatenates() {
    let plane = Plane::build(&PlaneParams::default()).unwrap();
    let combined = edit_ops::combine(&[plane.clone(), plane], None).unwrap();
    assert_eq!(combined.counts(), counts_of(2, 8, 8, 8));
    validator::check_all(&combined).unwrap();
}

#[test]
fn snapped_cube_stays_valid() {
    let mut mesh = Cube::build(&CubeParams {
        vertex_count: UVec3::new(2, 2, 2),
        scale: Vec3::splat(1.1),
    })
    .unwrap();
    edit_ops::snap_to_grid(&mut mesh, 0.25).unwrap();
    let once = mesh.clone();
    edit_ops::snap_to_grid(&mut mesh, 0.25).unwrap();
    assert_eq!(mesh, once);
    validator::check_all(&mesh).unwrap();
}
