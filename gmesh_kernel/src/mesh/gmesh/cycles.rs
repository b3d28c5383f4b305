// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The three cyclic topologies every operator is built from:
//!
//! - The *disk cycle*: all edges around a vertex, linked through the
//!   per-endpoint [`DiskLink`]s stored on each edge.
//! - The *loop cycle*: all loops around a face, linked through
//!   `next`/`prev`.
//! - The *radial cycle*: all loops sharing an edge, linked through
//!   `radial_next`/`radial_prev`.
//!
//! A cycle of length one is linked to itself on both sides. None of the
//! iterators here tolerate mutation of the cycle being walked; operations
//! that mutate snapshot the ids first.

use super::*;

/* ========== */
/*  Splicing  */
/* ========== */

impl GMesh {
    /// Splices edge `e` into the disk cycle of `v`, right after the vertex's
    /// base edge. The first edge of a vertex becomes a self-linked singleton
    /// cycle.
    pub(crate) fn disk_insert(&mut self, v: VertexId, e: EdgeId) {
        match self[v].edge {
            None => {
                let link = self[e].disk_mut(v);
                link.prev = e;
                link.next = e;
                self[v].edge = Some(e);
            }
            Some(base) => {
                let base_next = self[base].disk(v).next;
                {
                    let link = self[e].disk_mut(v);
                    link.prev = base;
                    link.next = base_next;
                }
                self[base].disk_mut(v).next = e;
                self[base_next].disk_mut(v).prev = e;
            }
        }
    }

    /// Removes edge `e` from the disk cycle of `v`, healing the two
    /// neighbours. When `e` was the vertex's base edge the base is repointed
    /// to a surviving neighbour, or cleared when the disk becomes empty.
    pub(crate) fn disk_remove(&mut self, v: VertexId, e: EdgeId) {
        let DiskLink { prev, next } = *self[e].disk(v);
        if next == e {
            self[v].edge = None;
        } else {
            self[prev].disk_mut(v).next = next;
            self[next].disk_mut(v).prev = prev;
            if self[v].edge == Some(e) {
                self[v].edge = Some(next);
            }
        }
        let link = self[e].disk_mut(v);
        link.prev = e;
        link.next = e;
    }

    /// Splices loop `l` into the radial cycle of edge `e` and points the loop
    /// at the edge. A loop alone on its edge self-links both radial pointers,
    /// which is what marks a border edge.
    pub(crate) fn radial_insert(&mut self, e: EdgeId, l: LoopId) {
        self[l].edge = e;
        match self[e].base_loop {
            None => {
                let lp = &mut self[l];
                lp.radial_prev = l;
                lp.radial_next = l;
                self[e].base_loop = Some(l);
            }
            Some(base) => {
                let base_next = self[base].radial_next;
                {
                    let lp = &mut self[l];
                    lp.radial_prev = base;
                    lp.radial_next = base_next;
                }
                self[base].radial_next = l;
                self[base_next].radial_prev = l;
            }
        }
    }

    /// Removes loop `l` from the radial cycle of edge `e`, repointing the
    /// edge's base loop when needed.
    pub(crate) fn radial_remove(&mut self, e: EdgeId, l: LoopId) {
        let (prev, next) = {
            let lp = &self[l];
            (lp.radial_prev, lp.radial_next)
        };
        if next == l {
            self[e].base_loop = None;
        } else {
            self[prev].radial_next = next;
            self[next].radial_prev = prev;
            if self[e].base_loop == Some(l) {
                self[e].base_loop = Some(next);
            }
        }
        let lp = &mut self[l];
        lp.radial_prev = l;
        lp.radial_next = l;
    }

    /// Splices `new` into a face's loop cycle right after `l`. The caller
    /// keeps the face's loop count in sync.
    pub(crate) fn loop_insert_after(&mut self, l: LoopId, new: LoopId) {
        let next = self[l].next;
        {
            let lp = &mut self[new];
            lp.prev = l;
            lp.next = next;
        }
        self[l].next = new;
        self[next].prev = new;
    }

    /// Removes `l` from its face's loop cycle, healing the neighbours. The
    /// caller keeps the face's first loop and loop count in sync.
    pub(crate) fn loop_remove_from_cycle(&mut self, l: LoopId) {
        let (prev, next) = {
            let lp = &self[l];
            (lp.prev, lp.next)
        };
        if next != l {
            self[prev].next = next;
            self[next].prev = prev;
        }
        let lp = &mut self[l];
        lp.prev = l;
        lp.next = l;
    }
}

/* ============ */
/*  Iteration   */
/* ============ */

fn guard_iterations(count: usize) {
    if count > MAX_LOOP_ITERATIONS {
        panic!("Max number of iterations reached. Is the mesh malformed?");
    }
}

/// Walks the edges around a vertex by following the disk links on the
/// vertex's side of each edge.
pub struct DiskCycleIter<'a> {
    mesh: &'a GMesh,
    vertex: VertexId,
    start: EdgeId,
    next: Option<EdgeId>,
    count: usize,
}

impl<'a> Iterator for DiskCycleIter<'a> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        guard_iterations(self.count);
        let current = self.next?;
        let upcoming = self.mesh[current].disk_next(self.vertex);
        self.next = (upcoming != self.start).then_some(upcoming);
        self.count += 1;
        Some(current)
    }
}

/// Walks a face's loop cycle by following `next` pointers.
pub struct LoopCycleIter<'a> {
    mesh: &'a GMesh,
    start: LoopId,
    next: Option<LoopId>,
    count: usize,
}

impl<'a> Iterator for LoopCycleIter<'a> {
    type Item = LoopId;

    fn next(&mut self) -> Option<Self::Item> {
        guard_iterations(self.count);
        let current = self.next?;
        let upcoming = self.mesh[current].next;
        self.next = (upcoming != self.start).then_some(upcoming);
        self.count += 1;
        Some(current)
    }
}

/// Walks an edge's radial cycle by following `radial_next` pointers.
pub struct RadialCycleIter<'a> {
    mesh: &'a GMesh,
    start: LoopId,
    next: Option<LoopId>,
    count: usize,
}

impl<'a> Iterator for RadialCycleIter<'a> {
    type Item = LoopId;

    fn next(&mut self) -> Option<Self::Item> {
        guard_iterations(self.count);
        let current = self.next?;
        let upcoming = self.mesh[current].radial_next;
        self.next = (upcoming != self.start).then_some(upcoming);
        self.count += 1;
        Some(current)
    }
}

impl GMesh {
    /// Iterates the disk cycle of `v`. Empty for isolated vertices.
    pub fn disk_cycle(&self, v: VertexId) -> DiskCycleIter<'_> {
        let start = self[v].edge;
        DiskCycleIter {
            mesh: self,
            vertex: v,
            start: start.unwrap_or_else(|| EdgeId::from_usize(0)),
            next: start,
            count: 0,
        }
    }

    /// Iterates a face's loop cycle starting at its first loop.
    pub fn face_loop_cycle(&self, f: FaceId) -> LoopCycleIter<'_> {
        let start = self[f].first_loop;
        LoopCycleIter {
            mesh: self,
            start: start.unwrap_or_else(|| LoopId::from_usize(0)),
            next: start,
            count: 0,
        }
    }

    /// Iterates the radial cycle of `e`. Empty for wire edges, one element
    /// for border edges, two for manifold edges.
    pub fn radial_cycle(&self, e: EdgeId) -> RadialCycleIter<'_> {
        let start = self[e].base_loop;
        RadialCycleIter {
            mesh: self,
            start: start.unwrap_or_else(|| LoopId::from_usize(0)),
            next: start,
            count: 0,
        }
    }

    /* ============ */
    /*  Collectors  */
    /* ============ */

    /// Returns the edges around a vertex. Snapshot; safe to mutate afterwards.
    pub fn vertex_edges(&self, v: VertexId) -> SVec<EdgeId> {
        self.disk_cycle(v).collect_svec()
    }

    /// Number of edges incident to `v`.
    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.disk_cycle(v).count()
    }

    /// Returns the loops of a given face. Snapshot; safe to mutate afterwards.
    pub fn face_loops(&self, f: FaceId) -> SVec<LoopId> {
        self.face_loop_cycle(f).collect_svec()
    }

    /// Returns the vertices of a given face, in winding order.
    pub fn face_vertices(&self, f: FaceId) -> SVec<VertexId> {
        self.face_loop_cycle(f).map(|l| self[l].vertex).collect()
    }

    /// Returns the edges of a given face, in winding order.
    pub fn face_edges(&self, f: FaceId) -> SVec<EdgeId> {
        self.face_loop_cycle(f).map(|l| self[l].edge).collect()
    }

    /// Returns the loops on an edge's radial cycle. Snapshot; safe to mutate
    /// afterwards.
    pub fn edge_loops(&self, e: EdgeId) -> SVec<LoopId> {
        self.radial_cycle(e).collect_svec()
    }

    /// Returns the faces incident to `v`, one entry per (face, vertex)
    /// incidence.
    pub fn vertex_faces(&self, v: VertexId) -> SVec<FaceId> {
        let mut faces = SVec::new();
        for e in self.disk_cycle(v) {
            for l in self.radial_cycle(e) {
                // Each face touches v through two of its edges; count it at
                // the loop that starts at v to avoid duplicates.
                if self[l].vertex == v {
                    faces.push(self[l].face);
                }
            }
        }
        faces
    }
}
