// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Euler operators. Each one performs a coordinated change across the
//! four element tables that keeps every disk, loop and radial cycle closed.
//! Operators validate their input up front and only then start writing, so a
//! failed call leaves the mesh untouched.

use std::collections::hash_map::Entry;

use glam::EulerRot;

use crate::prelude::*;

pub const DEFAULT_WELD_DISTANCE: f32 = 1e-5;

#[cfg(feature = "full-validation")]
fn debug_validate(mesh: &GMesh) -> Result<()> {
    validator::check_all(mesh)
}

#[cfg(not(feature = "full-validation"))]
fn debug_validate(_mesh: &GMesh) -> Result<()> {
    Ok(())
}

/// Splits edge `e` at `position` (midpoint when not given), adding a vertex
/// `n` and a new edge so that `e` runs `keep <-> n` and the new edge runs
/// `n <-> other`. Every face incident to `e` gains one side; windings are
/// preserved.
///
/// ## Id Stability
/// The original edge id stays on the half attached to the endpoint whose
/// base edge it was (falling back to the A side). Faces keep their ids; one
/// loop per incident face is added right after the loop that rode `e`.
pub fn split_edge(mesh: &mut GMesh, e: EdgeId, position: Option<Vec3>) -> Result<EdgeId> {
    if mesh.edge(e).is_none() {
        return Err(KernelError::InvalidIndex(format!("edge {e:?} is not in the mesh")).into());
    }
    if let Some(p) = position {
        if !p.is_finite() {
            return Err(KernelError::InvalidArgument(format!(
                "split position must be finite, got {p}"
            ))
            .into());
        }
    }

    let (va, vo) = mesh[e].endpoints();

    // The endpoint whose base edge is `e` stays attached to it, so the base
    // keeps pointing at a real incidence without extra repair work. The new
    // edge takes over the opposite endpoint.
    let other = if mesh[va].base_edge() != Some(e) && mesh[vo].base_edge() == Some(e) {
        va
    } else {
        vo
    };

    let pos = position
        .unwrap_or_else(|| lerp(mesh[va].position(), mesh[vo].position(), 0.5));

    let n = mesh.alloc_vertex(pos, None);
    let e_new = mesh.alloc_edge(n, other);
    mesh[n].edge = Some(e_new);
    if mesh[other].edge == Some(e) {
        mesh[other].edge = Some(e_new);
    }

    // Disk cycle at `other`: the new edge takes the slot `e` occupied.
    let DiskLink { prev, next } = *mesh[e].disk(other);
    if next == e {
        let link = mesh[e_new].disk_mut(other);
        link.prev = e_new;
        link.next = e_new;
    } else {
        {
            let link = mesh[e_new].disk_mut(other);
            link.prev = prev;
            link.next = next;
        }
        mesh[prev].disk_mut(other).next = e_new;
        mesh[next].disk_mut(other).prev = e_new;
    }

    // `e` now runs keep <-> n. Around n the two halves form a pair cycle.
    mesh[e].replace_vertex(other, n);
    {
        let link = mesh[e].disk_mut(n);
        link.prev = e_new;
        link.next = e_new;
    }
    {
        let link = mesh[e_new].disk_mut(n);
        link.prev = e;
        link.next = e;
    }

    // Split each loop riding `e`. The loop keeps whichever half leaves its
    // start vertex, and a new loop starting at `n` continues over the other
    // half, keeping the face winding intact.
    let radial = mesh.edge_loops(e);
    mesh[e].base_loop = None;
    for l in radial.iter_cpy() {
        let face = mesh[l].face;
        let nl = mesh.alloc_loop(face, e, n);
        mesh.loop_insert_after(l, nl);
        mesh[face].num_loops += 1;

        let (l_edge, nl_edge) = if mesh[l].vertex == other {
            (e_new, e)
        } else {
            (e, e_new)
        };
        mesh.radial_insert(l_edge, l);
        mesh.radial_insert(nl_edge, nl);
    }

    debug_validate(mesh)?;
    Ok(e_new)
}

/// Collapses edge `e` onto the endpoint opposite to `v`, where `v` must have
/// exactly two incident edges. The surviving edge of `v` is relinked to run
/// between the two far endpoints; `e` and `v` are deleted. This undoes
/// [`split_edge`].
pub fn join_edge(mesh: &mut GMesh, e: EdgeId, v: VertexId) -> Result<()> {
    if mesh.edge(e).is_none() {
        return Err(KernelError::InvalidIndex(format!("edge {e:?} is not in the mesh")).into());
    }
    if mesh.vertex(v).is_none() {
        return Err(KernelError::InvalidIndex(format!("vertex {v:?} is not in the mesh")).into());
    }
    if !mesh[e].contains(v) {
        return Err(KernelError::InvalidArgument(format!(
            "edge {e:?} does not contain vertex {v:?}"
        ))
        .into());
    }
    let disk = mesh.vertex_edges(v);
    if disk.len() != 2 {
        return Err(KernelError::PreconditionFailed(format!(
            "vertex {v:?} must have degree 2 to be joined over, has {}",
            disk.len()
        ))
        .into());
    }
    let o = if disk[0] == e { disk[1] } else { disk[0] };
    let u = mesh.at_edge(e).other_vertex(v).end();
    let w = mesh.at_edge(o).other_vertex(v).end();
    if u == w {
        return Err(KernelError::PreconditionFailed(format!(
            "joining {e:?} over {v:?} would collapse {o:?} into a self-loop"
        ))
        .into());
    }

    // Drop `e`'s loops from their faces; each face loses the side that rode
    // the collapsed edge.
    for l in mesh.edge_loops(e) {
        let f = mesh[l].face;
        if mesh[f].first_loop == Some(l) {
            let next = mesh[l].next;
            mesh[f].first_loop = Some(next);
        }
        mesh.loop_remove_from_cycle(l);
        mesh[f].num_loops -= 1;
        mesh.radial_remove(e, l);
        mesh.remove_loop(l);
    }

    // Unsplice `e` everywhere, then walk `o` over to `u`.
    mesh.disk_remove(u, e);
    mesh.disk_remove(v, e);
    mesh.disk_remove(v, o);
    mesh[o].replace_vertex(v, u);
    mesh.disk_insert(u, o);

    // Loops that started at the dead vertex now start at `u`.
    for l in mesh.edge_loops(o) {
        if mesh[l].vertex == v {
            mesh[l].vertex = u;
        }
    }

    mesh.remove_edge(e);
    mesh.remove_vertex(v);

    debug_validate(mesh)?;
    Ok(())
}

/// Inserts a chord between two vertices of face `f`, cutting it into two
/// faces. Returns the new face (carrying the second half of the boundary)
/// and the chord edge. The new face inherits `f`'s payload.
pub fn split_face(
    mesh: &mut GMesh,
    f: FaceId,
    a: VertexId,
    b: VertexId,
) -> Result<(FaceId, EdgeId)> {
    if mesh.face(f).is_none() {
        return Err(KernelError::InvalidIndex(format!("face {f:?} is not in the mesh")).into());
    }
    for v in [a, b] {
        if mesh.vertex(v).is_none() {
            return Err(
                KernelError::InvalidIndex(format!("vertex {v:?} is not in the mesh")).into(),
            );
        }
    }
    if a == b {
        return Err(KernelError::InvalidArgument(format!(
            "cannot cut face {f:?} from {a:?} to itself"
        ))
        .into());
    }

    let loops = mesh.face_loops(f);
    let la = loops
        .iter_cpy()
        .find(|&l| mesh[l].vertex == a)
        .ok_or_else(|| {
            KernelError::InvalidArgument(format!("vertex {a:?} is not on face {f:?}"))
        })?;
    let lb = loops
        .iter_cpy()
        .find(|&l| mesh[l].vertex == b)
        .ok_or_else(|| {
            KernelError::InvalidArgument(format!("vertex {b:?} is not on face {f:?}"))
        })?;

    if mesh[la].next == lb || mesh[lb].next == la {
        return Err(KernelError::InvalidArgument(format!(
            "chord {a:?}-{b:?} would cut a two-sided face off {f:?}"
        ))
        .into());
    }
    if mesh.find_edge(a, b).is_some() {
        return Err(KernelError::InvalidArgument(format!(
            "vertices {a:?} and {b:?} already share an edge"
        ))
        .into());
    }

    let chord = mesh.alloc_edge(a, b);
    mesh.disk_insert(a, chord);
    mesh.disk_insert(b, chord);

    let la_prev = mesh[la].prev;
    let lb_prev = mesh[lb].prev;

    let g = mesh.alloc_face(None);
    let (material_index, smooth) = {
        let face = &mesh[f];
        (face.material_index, face.smooth)
    };
    {
        let new_face = &mut mesh[g];
        new_face.material_index = material_index;
        new_face.smooth = smooth;
    }

    // `f` keeps the boundary from `a` up to `b`, closed by a chord loop
    // running b -> a. The new face takes the rest, closed by the opposite
    // chord loop.
    let l1 = mesh.alloc_loop(f, chord, b);
    let l2 = mesh.alloc_loop(g, chord, a);

    mesh[lb_prev].next = l1;
    {
        let lp = &mut mesh[l1];
        lp.prev = lb_prev;
        lp.next = la;
    }
    mesh[la].prev = l1;

    mesh[la_prev].next = l2;
    {
        let lp = &mut mesh[l2];
        lp.prev = la_prev;
        lp.next = lb;
    }
    mesh[lb].prev = l2;

    mesh.radial_insert(chord, l1);
    mesh.radial_insert(chord, l2);

    mesh[f].first_loop = Some(la);
    mesh[g].first_loop = Some(lb);
    let f_loops = mesh.face_loops(f);
    mesh[f].num_loops = f_loops.len() as u32;
    let g_loops = mesh.face_loops(g);
    for l in g_loops.iter_cpy() {
        mesh[l].face = g;
    }
    mesh[g].num_loops = g_loops.len() as u32;

    debug_validate(mesh)?;
    Ok((g, chord))
}

/// Fuses two faces sharing exactly one manifold edge into one, deleting the
/// shared edge, its two loops and the second face. The surviving face keeps
/// `f1`'s payload. This undoes [`split_face`].
pub fn join_faces(mesh: &mut GMesh, f1: FaceId, f2: FaceId) -> Result<()> {
    for f in [f1, f2] {
        if mesh.face(f).is_none() {
            return Err(KernelError::InvalidIndex(format!("face {f:?} is not in the mesh")).into());
        }
    }
    if f1 == f2 {
        return Err(
            KernelError::InvalidArgument(format!("cannot join face {f1:?} with itself")).into(),
        );
    }

    let mut shared = SVec::<(LoopId, LoopId)>::new();
    for l in mesh.face_loops(f1) {
        let partner = mesh[l].radial_next;
        if partner != l && mesh[partner].face == f2 {
            shared.push((l, partner));
        }
    }
    if shared.len() != 1 {
        return Err(KernelError::InvalidArgument(format!(
            "faces {f1:?} and {f2:?} must share exactly one edge, found {}",
            shared.len()
        ))
        .into());
    }
    let (l1, l2) = shared[0];
    let e = mesh[l1].edge;
    if mesh[l2].radial_next != l1 {
        return Err(KernelError::InvalidArgument(format!(
            "shared edge {e:?} is not manifold"
        ))
        .into());
    }
    if mesh[l1].vertex == mesh[l2].vertex {
        return Err(KernelError::PreconditionFailed(format!(
            "faces {f1:?} and {f2:?} wind the same way over {e:?}"
        ))
        .into());
    }

    let l1_prev = mesh[l1].prev;
    let l1_next = mesh[l1].next;
    let l2_prev = mesh[l2].prev;
    let l2_next = mesh[l2].next;

    // Snapshot before the cycles are re-spliced.
    let f2_loops = mesh.face_loops(f2);
    let merged_count = mesh[f1].num_loops + mesh[f2].num_loops - 2;

    mesh[l1_prev].next = l2_next;
    mesh[l2_next].prev = l1_prev;
    mesh[l2_prev].next = l1_next;
    mesh[l1_next].prev = l2_prev;

    for l in f2_loops.iter_cpy() {
        if l != l2 {
            mesh[l].face = f1;
        }
    }
    if mesh[f1].first_loop == Some(l1) {
        mesh[f1].first_loop = Some(l1_next);
    }
    mesh[f1].num_loops = merged_count;

    mesh.radial_remove(e, l1);
    mesh.radial_remove(e, l2);
    mesh.remove_loop(l1);
    mesh.remove_loop(l2);
    let (x, y) = mesh[e].endpoints();
    mesh.disk_remove(x, e);
    mesh.disk_remove(y, e);
    mesh.remove_edge(e);
    mesh.remove_face(f2);

    debug_validate(mesh)?;
    Ok(())
}

/// Reverses the winding of a face: the loop cycle direction flips and every
/// loop starts at the other endpoint of its edge. Disk cycles are untouched;
/// radial pointers are swapped per loop.
pub fn flip_face(mesh: &mut GMesh, f: FaceId) -> Result<()> {
    if mesh.face(f).is_none() {
        return Err(KernelError::InvalidIndex(format!("face {f:?} is not in the mesh")).into());
    }
    let loops = mesh.face_loops(f);
    for l in loops.iter_cpy() {
        let lp = &mut mesh[l];
        std::mem::swap(&mut lp.next, &mut lp.prev);
        std::mem::swap(&mut lp.radial_next, &mut lp.radial_prev);
    }
    for l in loops.iter_cpy() {
        let dst = mesh.at_loop(l).dst_vertex().end();
        mesh[l].vertex = dst;
    }

    debug_validate(mesh)?;
    Ok(())
}

/// Moves every vertex by scaling, then rotating (XYZ euler, radians), then
/// translating. No topology change.
pub fn transform(mesh: &mut GMesh, translate: Vec3, rotate: Vec3, scale: Vec3) -> Result<()> {
    let rotation = Quat::from_euler(EulerRot::XYZ, rotate.x, rotate.y, rotate.z);
    for (_, vertex) in mesh.vertices.iter_mut() {
        vertex.position = rotation * (vertex.position * scale) + translate;
    }
    Ok(())
}

/// Rounds every vertex position to the nearest multiple of `grid_size`,
/// component-wise. Applying it twice is the same as applying it once.
pub fn snap_to_grid(mesh: &mut GMesh, grid_size: f32) -> Result<()> {
    if !grid_size.is_finite() || grid_size <= 0.0 {
        return Err(KernelError::InvalidArgument(format!(
            "grid size must be finite and positive, got {grid_size}"
        ))
        .into());
    }
    for (_, vertex) in mesh.vertices.iter_mut() {
        vertex.position = (vertex.position / grid_size).round() * grid_size;
    }
    Ok(())
}

/// Concatenates any number of meshes into a new one, optionally welding
/// vertices closer than `weld_distance` afterwards. The inputs are not
/// modified.
pub fn combine(meshes: &[GMesh], weld_distance: Option<f32>) -> Result<GMesh> {
    let mut result = GMesh::new();
    for mesh in meshes {
        result.merge_with(mesh);
    }
    if let Some(max_distance) = weld_distance {
        weld_vertices(&mut result, max_distance)?;
    }
    Ok(result)
}

/// Merges vertices that lie within `max_distance` of each other, keeping the
/// lowest-index vertex of each cluster. Edges between merged pairs collapse,
/// and duplicate edges left behind by the merge are fused so that previously
/// separate borders become manifold edges. Returns the number of vertices
/// removed.
///
/// A `max_distance` of zero means exact position matching.
#[profiling::function]
pub fn weld_vertices(mesh: &mut GMesh, max_distance: f32) -> Result<usize> {
    if !max_distance.is_finite() || max_distance < 0.0 {
        return Err(KernelError::InvalidArgument(format!(
            "weld distance must be finite and non-negative, got {max_distance}"
        ))
        .into());
    }

    // Map every dying vertex to its cluster survivor.
    let mut into = HashMap::<VertexId, VertexId>::new();
    if max_distance == 0.0 {
        let mut seen = HashMap::<Vec3Ord, VertexId>::new();
        for (v, vertex) in mesh.iter_vertices() {
            match seen.entry(vertex.position().to_ord()) {
                Entry::Occupied(survivor) => {
                    into.insert(v, *survivor.get());
                }
                Entry::Vacant(slot) => {
                    slot.insert(v);
                }
            }
        }
    } else {
        use rstar::{PointDistance, RTree, RTreeObject, AABB};

        struct VertexPos {
            vertex: VertexId,
            pos: Vec3,
        }

        impl RTreeObject for VertexPos {
            type Envelope = AABB<[f32; 3]>;
            fn envelope(&self) -> Self::Envelope {
                AABB::from_point(self.pos.to_array())
            }
        }

        impl PointDistance for VertexPos {
            fn distance_2(
                &self,
                point: &<Self::Envelope as rstar::Envelope>::Point,
            ) -> <<Self::Envelope as rstar::Envelope>::Point as rstar::Point>::Scalar {
                self.pos.distance_squared(Vec3::from_slice(point))
            }
        }

        let tree = RTree::bulk_load(
            mesh.iter_vertices()
                .map(|(v, vertex)| VertexPos {
                    vertex: v,
                    pos: vertex.position(),
                })
                .collect_vec(),
        );

        // Store order is id order, so the first unclaimed member of every
        // cluster is also its lowest id.
        let max_distance_2 = max_distance * max_distance;
        for (v, vertex) in mesh.iter_vertices() {
            if into.contains_key(&v) {
                continue;
            }
            for hit in tree.locate_within_distance(vertex.position().to_array(), max_distance_2) {
                if hit.vertex.to_usize() > v.to_usize() && !into.contains_key(&hit.vertex) {
                    into.insert(hit.vertex, v);
                }
            }
        }
    }

    let mut dying = into.iter().map(|(&v, &s)| (v, s)).collect_vec();
    dying.sort_by_key(|(v, _)| v.to_usize());

    for (v, s) in dying.iter_cpy() {
        if mesh.vertex(v).is_none() || mesh.vertex(s).is_none() {
            // A previous collapse already swept this cluster away.
            continue;
        }
        for e in mesh.vertex_edges(v) {
            if mesh.vertex(v).is_none() {
                break;
            }
            if mesh.edge(e).is_none() {
                continue;
            }
            let far = mesh[e].other_vertex(v);
            if far == s {
                // The edge connected the two halves of the cluster; it
                // collapses to nothing, taking its faces with it.
                mesh.delete_edge(e);
                continue;
            }
            mesh.disk_remove(v, e);
            for l in mesh.edge_loops(e) {
                if mesh[l].vertex == v {
                    mesh[l].vertex = s;
                }
            }
            mesh[e].replace_vertex(v, s);
            mesh.disk_insert(s, e);
        }
        if mesh.vertex(v).is_some() {
            mesh.remove_vertex(v);
        }
    }

    // Fuse edges that now connect the same endpoints, merging their radial
    // cycles. This is what turns two stitched borders into one manifold
    // interior edge.
    let mut canonical = HashMap::<(VertexId, VertexId), EdgeId>::new();
    let all_edges = mesh.iter_edges().map(|(e, _)| e).collect_vec();
    for e in all_edges {
        if mesh.edge(e).is_none() {
            continue;
        }
        let (a, b) = mesh[e].endpoints();
        let key = if a.to_usize() <= b.to_usize() {
            (a, b)
        } else {
            (b, a)
        };
        match canonical.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(e);
            }
            Entry::Occupied(keeper) => {
                let keep = *keeper.get();
                for l in mesh.edge_loops(e) {
                    mesh.radial_remove(e, l);
                    mesh.radial_insert(keep, l);
                }
                mesh.disk_remove(a, e);
                mesh.disk_remove(b, e);
                mesh.remove_edge(e);
            }
        }
    }

    debug_validate(mesh)?;
    Ok(into.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::gmesh::validator;

    fn quad() -> (GMesh, SVec<VertexId>, FaceId) {
        let mut mesh = GMesh::new();
        let verts = mesh.add_vertices(&[
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ]);
        let f = mesh.add_face(&verts).unwrap();
        (mesh, verts, f)
    }

    #[test]
    fn split_edge_of_quad_grows_the_face() {
        let (mut mesh, verts, f) = quad();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        let e_new = split_edge(&mut mesh, e, None).unwrap();

        assert_eq!(mesh[f].num_loops(), 5);
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.num_loops(), 5);
        validator::check_all(&mesh).unwrap();

        // The two halves meet at a degree-2 vertex at the midpoint.
        let (a, b) = mesh[e_new].endpoints();
        let n = if mesh[e].contains(a) { a } else { b };
        assert_eq!(mesh.vertex_degree(n), 2);
        assert_eq!(mesh[n].position(), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn split_edge_at_explicit_position() {
        let (mut mesh, verts, _) = quad();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        let p = Vec3::new(0.25, 0.0, 0.0);
        let e_new = split_edge(&mut mesh, e, Some(p)).unwrap();
        let (a, b) = mesh[e_new].endpoints();
        let n = if mesh[e].contains(a) { a } else { b };
        assert_eq!(mesh[n].position(), p);
    }

    #[test]
    fn split_edge_rejects_tombstones_without_mutating() {
        let (mut mesh, verts, _) = quad();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        mesh.delete_edge(e);
        let before = mesh.counts();
        let err = split_edge(&mut mesh, e, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvalidIndex(_))
        ));
        assert_eq!(mesh.counts(), before);
    }

    #[test]
    fn split_then_join_restores_counts() {
        let (mut mesh, verts, _) = quad();
        let before = mesh.counts();
        let e = mesh.find_edge(verts[1], verts[2]).unwrap();
        let e_new = split_edge(&mut mesh, e, None).unwrap();
        let n = {
            let (a, b) = mesh[e_new].endpoints();
            if mesh[e].contains(a) {
                a
            } else {
                b
            }
        };
        join_edge(&mut mesh, e_new, n).unwrap();
        assert_eq!(mesh.counts(), before);
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn join_edge_requires_degree_two() {
        let (mut mesh, verts, f) = quad();
        // The chord raises the corner's degree to three.
        split_face(&mut mesh, f, verts[0], verts[2]).unwrap();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        let err = join_edge(&mut mesh, e, verts[0]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn join_edge_over_a_quad_corner_leaves_a_triangle() {
        let (mut mesh, verts, f) = quad();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        join_edge(&mut mesh, e, verts[0]).unwrap();

        assert_eq!(mesh[f].num_loops(), 3);
        assert_eq!(mesh.counts(), ElementCounts { faces: 1, loops: 3, edges: 3, vertices: 3 });
        assert!(mesh.vertex(verts[0]).is_none());
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn join_edge_requires_the_vertex_on_the_edge() {
        let (mut mesh, verts, _) = quad();
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        let err = join_edge(&mut mesh, e, verts[2]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn split_face_cuts_a_quad_into_two_triangles() {
        let (mut mesh, verts, f) = quad();
        let (g, chord) = split_face(&mut mesh, f, verts[0], verts[2]).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh[f].num_loops(), 3);
        assert_eq!(mesh[g].num_loops(), 3);
        assert_eq!(mesh.edge_loops(chord).len(), 2);
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn split_face_rejects_adjacent_chord() {
        let (mut mesh, verts, f) = quad();
        let err = split_face(&mut mesh, f, verts[0], verts[1]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn split_then_join_faces_restores_counts() {
        let (mut mesh, verts, f) = quad();
        let before = mesh.counts();
        let (g, _) = split_face(&mut mesh, f, verts[1], verts[3]).unwrap();
        join_faces(&mut mesh, f, g).unwrap();
        assert_eq!(mesh.counts(), before);
        assert_eq!(mesh[f].num_loops(), 4);
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn join_faces_requires_a_shared_edge() {
        let mut mesh = GMesh::new();
        let f1 = mesh
            .add_face_from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y])
            .unwrap();
        let f2 = mesh
            .add_face_from_positions(&[
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(5.0, 1.0, 0.0),
            ])
            .unwrap();
        let err = join_faces(&mut mesh, f1, f2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn flip_face_reverses_the_winding() {
        let (mut mesh, verts, f) = quad();
        let before = mesh.face_vertices(f);
        flip_face(&mut mesh, f).unwrap();
        let after = mesh.face_vertices(f);
        let mut reversed = before.clone();
        reversed.reverse();
        // Same ring, opposite direction, possibly rotated.
        let offset = reversed.iter().position(|&v| v == after[0]).unwrap();
        for (i, &v) in after.iter().enumerate() {
            assert_eq!(v, reversed[(offset + i) % reversed.len()]);
        }
        assert_eq!(mesh.face_vertices(f).len(), verts.len());
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn flip_face_twice_is_identity() {
        let (mut mesh, _, f) = quad();
        let before = mesh.clone();
        flip_face(&mut mesh, f).unwrap();
        flip_face(&mut mesh, f).unwrap();
        assert_eq!(mesh, before);
    }

    #[test]
    fn snap_to_grid_is_idempotent() {
        let mut mesh = GMesh::new();
        mesh.add_face_from_positions(&[
            Vec3::new(0.13, 0.77, 0.01),
            Vec3::new(1.02, 0.2, -0.4),
            Vec3::new(2.3, 1.99, 0.74),
        ])
        .unwrap();
        snap_to_grid(&mut mesh, 0.5).unwrap();
        let once = mesh.clone();
        snap_to_grid(&mut mesh, 0.5).unwrap();
        assert_eq!(mesh, once);
    }

    #[test]
    fn snap_to_grid_rejects_bad_grid() {
        let mut mesh = GMesh::new();
        let err = snap_to_grid(&mut mesh, 0.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn transform_translates_positions() {
        let mut mesh = GMesh::new();
        let v = mesh.add_vertex(Vec3::X);
        transform(&mut mesh, Vec3::Y, Vec3::ZERO, Vec3::ONE).unwrap();
        assert_eq!(mesh[v].position(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn weld_fuses_two_shared_borders_into_manifold_edges() {
        // Two unit quads meeting along x == 1, built as separate meshes.
        let mut left = GMesh::new();
        left.add_face_from_positions(&[
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ])
        .unwrap();
        let mut right = GMesh::new();
        right
            .add_face_from_positions(&[
                Vec3::X,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ])
            .unwrap();

        let mesh = combine(&[left, right], Some(DEFAULT_WELD_DISTANCE)).unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_edges(), 7);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_loops(), 8);

        let mut manifold = 0;
        for (e, _) in mesh.iter_edges() {
            match mesh.edge_loops(e).len() {
                1 => {}
                2 => manifold += 1,
                n => panic!("radial cycle of length {n}"),
            }
        }
        assert_eq!(manifold, 1);
        validator::check_all(&mesh).unwrap();
    }

    #[test]
    fn weld_with_zero_distance_matches_exact_positions_only() {
        let mut mesh = GMesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);
        let b = mesh.add_vertex(Vec3::ZERO);
        let c = mesh.add_vertex(Vec3::splat(1e-6));
        let welded = weld_vertices(&mut mesh, 0.0).unwrap();
        assert_eq!(welded, 1);
        assert!(mesh.vertex(a).is_some());
        assert!(mesh.vertex(b).is_none());
        assert!(mesh.vertex(c).is_some());
    }

    #[test]
    fn weld_epsilon_is_parameterizable() {
        let mut mesh = GMesh::new();
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::splat(1e-6));
        mesh.add_vertex(Vec3::X);
        let welded = weld_vertices(&mut mesh, 1e-3).unwrap();
        assert_eq!(welded, 1);
        assert_eq!(mesh.num_vertices(), 2);
    }
}
