// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural self-checks. [`check_counts`] is cheap and only compares
//! element counts; [`check_all`] walks every disk, loop and radial cycle.
//! Neither ever modifies the mesh, and neither belongs in a hot path: they
//! exist for tests, for the `full-validation` feature and for debugging
//! sessions on corrupted meshes.

use crate::prelude::*;

fn violated(msg: String) -> anyhow::Error {
    KernelError::InvariantViolated(msg).into()
}

/// Cheap mode: count bookkeeping only.
pub fn check_counts(mesh: &GMesh) -> Result<()> {
    let live_loops: usize = mesh.iter_loops().count();
    if live_loops != mesh.num_loops() {
        return Err(violated(format!(
            "loop store reports {} live loops but iteration found {live_loops}",
            mesh.num_loops()
        )));
    }
    let face_loop_sum: usize = mesh.iter_faces().map(|(_, f)| f.num_loops() as usize).sum();
    if face_loop_sum != mesh.num_loops() {
        return Err(violated(format!(
            "face sides sum to {face_loop_sum} but the mesh has {} loops",
            mesh.num_loops()
        )));
    }
    Ok(())
}

/// Full mode: traverses every cycle and re-derives every count.
pub fn check_all(mesh: &GMesh) -> Result<()> {
    check_counts(mesh)?;
    check_indices(mesh)?;
    check_vertices(mesh)?;
    check_disk_cycles(mesh)?;
    check_faces(mesh)?;
    check_loops(mesh)?;
    check_radial_cycles(mesh)?;
    Ok(())
}

/// Every live element records the slot it lives in.
fn check_indices(mesh: &GMesh) -> Result<()> {
    for (id, vertex) in mesh.iter_vertices() {
        if vertex.index() != id {
            return Err(violated(format!(
                "vertex at slot {id:?} carries index {:?}",
                vertex.index()
            )));
        }
    }
    for (id, edge) in mesh.iter_edges() {
        if edge.index() != id {
            return Err(violated(format!(
                "edge at slot {id:?} carries index {:?}",
                edge.index()
            )));
        }
    }
    for (id, lp) in mesh.iter_loops() {
        if lp.index() != id {
            return Err(violated(format!(
                "loop at slot {id:?} carries index {:?}",
                lp.index()
            )));
        }
    }
    for (id, face) in mesh.iter_faces() {
        if face.index() != id {
            return Err(violated(format!(
                "face at slot {id:?} carries index {:?}",
                face.index()
            )));
        }
    }
    Ok(())
}

/// Base edges point back at their vertex.
fn check_vertices(mesh: &GMesh) -> Result<()> {
    for (v, vertex) in mesh.iter_vertices() {
        if let Some(e) = vertex.base_edge() {
            let edge = mesh
                .edge(e)
                .ok_or_else(|| violated(format!("vertex {v:?} has tombstoned base edge {e:?}")))?;
            if !edge.contains(v) {
                return Err(violated(format!(
                    "base edge {e:?} of vertex {v:?} does not contain it"
                )));
            }
        }
    }
    Ok(())
}

/// Every edge sits in both endpoints' disk cycles exactly once, and each
/// disk closes in the same number of steps forwards and backwards.
fn check_disk_cycles(mesh: &GMesh) -> Result<()> {
    for (v, vertex) in mesh.iter_vertices() {
        let base = match vertex.base_edge() {
            Some(base) => base,
            None => continue,
        };
        let mut forward = HashSet::new();
        let mut e = base;
        loop {
            if forward.len() > MAX_LOOP_ITERATIONS {
                return Err(violated(format!(
                    "disk cycle of vertex {v:?} does not close"
                )));
            }
            let edge = mesh.edge(e).ok_or_else(|| {
                violated(format!("disk cycle of {v:?} reaches tombstoned edge {e:?}"))
            })?;
            if !edge.contains(v) {
                return Err(violated(format!(
                    "disk cycle of {v:?} reaches edge {e:?} which does not contain it"
                )));
            }
            if !forward.insert(e) {
                return Err(violated(format!(
                    "disk cycle of {v:?} revisits edge {e:?} before closing"
                )));
            }
            e = edge.disk_next(v);
            if e == base {
                break;
            }
        }
        // The reverse walk visits the same edges in the same number of steps.
        let mut backward_steps = 0;
        let mut e = base;
        loop {
            backward_steps += 1;
            if backward_steps > forward.len() {
                return Err(violated(format!(
                    "reverse disk cycle of {v:?} is longer than the forward one"
                )));
            }
            let prev = mesh[e].disk_prev(v);
            if !forward.contains(&prev) {
                return Err(violated(format!(
                    "reverse disk cycle of {v:?} leaves the forward cycle at {prev:?}"
                )));
            }
            e = prev;
            if e == base {
                break;
            }
        }
        if backward_steps != forward.len() {
            return Err(violated(format!(
                "disk cycle of {v:?} has {} edges forwards but {backward_steps} backwards",
                forward.len()
            )));
        }
    }

    for (e, edge) in mesh.iter_edges() {
        let (a, b) = edge.endpoints();
        for v in [a, b] {
            if mesh.vertex(v).is_none() {
                return Err(violated(format!(
                    "edge {e:?} references tombstoned vertex {v:?}"
                )));
            }
            let occurrences = mesh.disk_cycle(v).filter(|&d| d == e).count();
            if occurrences != 1 {
                return Err(violated(format!(
                    "edge {e:?} appears {occurrences} times in the disk cycle of {v:?}"
                )));
            }
        }
    }
    Ok(())
}

/// Loop cycles close in exactly `num_loops` distinct steps and agree on
/// their face.
fn check_faces(mesh: &GMesh) -> Result<()> {
    for (f, face) in mesh.iter_faces() {
        let first = match face.first_loop() {
            Some(first) => first,
            None => return Err(violated(format!("face {f:?} has no first loop"))),
        };
        let mut seen = HashSet::new();
        let mut l = first;
        loop {
            if seen.len() > face.num_loops() as usize {
                return Err(violated(format!(
                    "loop cycle of face {f:?} is longer than its {} sides",
                    face.num_loops()
                )));
            }
            let lp = mesh.loop_at(l).ok_or_else(|| {
                violated(format!("loop cycle of face {f:?} reaches tombstoned {l:?}"))
            })?;
            if lp.face() != f {
                return Err(violated(format!(
                    "loop {l:?} in the cycle of face {f:?} references face {:?}",
                    lp.face()
                )));
            }
            if !seen.insert(l) {
                return Err(violated(format!(
                    "loop cycle of face {f:?} revisits {l:?} before closing"
                )));
            }
            if mesh[lp.next()].prev != l {
                return Err(violated(format!(
                    "loop {l:?} is not the prev of its next in face {f:?}"
                )));
            }
            l = lp.next();
            if l == first {
                break;
            }
        }
        if seen.len() != face.num_loops() as usize {
            return Err(violated(format!(
                "face {f:?} claims {} sides but its cycle has {}",
                face.num_loops(),
                seen.len()
            )));
        }
    }
    Ok(())
}

/// Loops start at one endpoint of their edge and hand over to the other.
fn check_loops(mesh: &GMesh) -> Result<()> {
    for (l, lp) in mesh.iter_loops() {
        let edge = mesh.edge(lp.edge()).ok_or_else(|| {
            violated(format!("loop {l:?} references tombstoned edge {:?}", lp.edge()))
        })?;
        if !edge.contains(lp.vertex()) {
            return Err(violated(format!(
                "loop {l:?} starts at {:?} which is not on its edge {:?}",
                lp.vertex(),
                lp.edge()
            )));
        }
        let next_start = mesh[lp.next()].vertex;
        if next_start != edge.other_vertex(lp.vertex()) {
            return Err(violated(format!(
                "loop {l:?} ends at {:?} but its successor starts at {next_start:?}",
                edge.other_vertex(lp.vertex())
            )));
        }
        if lp.radial_prev() != lp.radial_next() {
            return Err(violated(format!(
                "loop {l:?} sits on a radial cycle longer than two"
            )));
        }
    }
    Ok(())
}

/// Radial cycles close, reference their edge, and have length one or two.
fn check_radial_cycles(mesh: &GMesh) -> Result<()> {
    for (e, edge) in mesh.iter_edges() {
        let base = match edge.base_loop() {
            Some(base) => base,
            None => continue,
        };
        let mut steps = 0;
        let mut l = base;
        loop {
            steps += 1;
            if steps > 2 {
                return Err(violated(format!(
                    "radial cycle of edge {e:?} has more than two loops"
                )));
            }
            let lp = mesh.loop_at(l).ok_or_else(|| {
                violated(format!("radial cycle of {e:?} reaches tombstoned loop {l:?}"))
            })?;
            if lp.edge() != e {
                return Err(violated(format!(
                    "loop {l:?} in the radial cycle of {e:?} references edge {:?}",
                    lp.edge()
                )));
            }
            if mesh[lp.radial_next()].radial_prev != l {
                return Err(violated(format!(
                    "loop {l:?} is not the radial prev of its radial next on {e:?}"
                )));
            }
            l = lp.radial_next();
            if l == base {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mesh_is_valid() {
        check_all(&GMesh::new()).unwrap();
    }

    #[test]
    fn triangle_is_valid() {
        let mut mesh = GMesh::new();
        mesh.add_face_from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y])
            .unwrap();
        check_all(&mesh).unwrap();
    }

    #[test]
    fn detects_a_broken_disk_cycle() {
        let mut mesh = GMesh::new();
        let verts = mesh.add_vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        mesh.add_face(&verts).unwrap();

        // Point one disk link somewhere wrong on purpose.
        let e = mesh.find_edge(verts[0], verts[1]).unwrap();
        let rogue = mesh.find_edge(verts[1], verts[2]).unwrap();
        mesh[e].disk_mut(verts[0]).next = rogue;

        let err = check_all(&mesh).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvariantViolated(_))
        ));
    }

    #[test]
    fn detects_a_wrong_side_count() {
        let mut mesh = GMesh::new();
        let verts = mesh.add_vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        let f = mesh.add_face(&verts).unwrap();
        mesh[f].num_loops = 4;

        let err = check_all(&mesh).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::InvariantViolated(_))
        ));
    }
}
