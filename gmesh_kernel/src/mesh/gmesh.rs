// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::prelude::*;

use glam::*;
use itertools::Itertools;

/// Implements indexing traits so the mesh data structure can be used to access
/// vertex, edge, loop or face information using ids as indices.
pub mod mesh_index_impls;

/// Type-safe index newtypes used as pointers between mesh elements
pub mod id_types;
pub use id_types::*;

/// The tombstoned element tables backing the four element kinds
pub mod store;
pub use store::ElementStore;

/// Insert/remove/iterate primitives for the disk, loop and radial cycles
pub mod cycles;
pub use cycles::*;

/// An API to represent type-safe and error-handled graph traversals over a mesh
pub mod traversals;
pub use traversals::*;

/// The Euler operators and bulk geometry operations
pub mod edit_ops;

/// Primitive shapes, like planes or cubes
pub mod primitives;

/// Structural self-checks for test and debug builds
pub mod validator;

/// Generate position and index buffers suitable for rendering
pub mod buffer_generation;
pub use buffer_generation::*;

/// GMesh cycles are a type of linked list. This means it is sometimes
/// impossible to ensure some algorithms will terminate when the mesh is
/// malformed. To ensure the code never goes into an infinite loop, this max
/// number of iterations will be performed before giving an error. This error
/// should be large enough, as faces with a very large number of vertices may
/// trigger it.
pub const MAX_LOOP_ITERATIONS: usize = 8196;

/// The error kinds reported by the kernel. Every public operation that fails
/// returns one of these, wrapped in an `anyhow::Error`, and leaves the mesh
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Null/empty input, ring too short, out-of-range parameter.
    InvalidArgument(String),
    /// A tombstoned or out-of-range index was passed to an operator.
    InvalidIndex(String),
    /// An operator-specific precondition does not hold.
    PreconditionFailed(String),
    /// Emitted by the validator only. Indicates an internal bug.
    InvariantViolated(String),
}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            KernelError::InvalidIndex(msg) => write!(f, "invalid index: {msg}"),
            KernelError::PreconditionFailed(msg) => write!(f, "precondition failed: {msg}"),
            KernelError::InvariantViolated(msg) => write!(f, "invariant violated: {msg}"),
        }
    }
}
impl std::error::Error for KernelError {}

/// The two neighbours of an edge inside the disk cycle of one of its
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskLink {
    pub prev: EdgeId,
    pub next: EdgeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    index: VertexId,
    position: Vec3,
    /// Any one edge incident to this vertex, None when the vertex is isolated.
    edge: Option<EdgeId>,
}

/// An undirected edge. The two endpoints are stored in fixed slots (the A and
/// O sides); the slot order carries no geometric meaning, it only names the
/// side each disk link belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    index: EdgeId,
    verts: [VertexId; 2],
    disk: [DiskLink; 2],
    /// Any one loop on this edge's radial cycle, None for wire edges.
    base_loop: Option<LoopId>,
}

/// A directed half-edge. One loop exists per (face, edge) incidence. Loops are
/// linked twice: through the face's loop cycle and through the edge's radial
/// cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    index: LoopId,
    face: FaceId,
    edge: EdgeId,
    /// The vertex this loop starts at. The loop ends at the edge's other
    /// endpoint.
    vertex: VertexId,
    next: LoopId,
    prev: LoopId,
    radial_next: LoopId,
    radial_prev: LoopId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    index: FaceId,
    first_loop: Option<LoopId>,
    /// Number of loops in this face's loop cycle (= number of sides).
    num_loops: u32,
    /// Opaque per-face payload, carried around but never interpreted.
    material_index: u32,
    smooth: bool,
}

impl Vertex {
    pub fn index(&self) -> VertexId {
        self.index
    }
    pub fn position(&self) -> Vec3 {
        self.position
    }
    pub fn base_edge(&self) -> Option<EdgeId> {
        self.edge
    }
}

impl Edge {
    pub fn index(&self) -> EdgeId {
        self.index
    }

    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.verts[0], self.verts[1])
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.verts[0] == v || self.verts[1] == v
    }

    /// Given one endpoint, returns the other one.
    pub fn other_vertex(&self, v: VertexId) -> VertexId {
        debug_assert!(self.contains(v));
        if self.verts[0] == v {
            self.verts[1]
        } else {
            self.verts[0]
        }
    }

    pub fn base_loop(&self) -> Option<LoopId> {
        self.base_loop
    }

    /// An edge is a border when a single face is incident to it, i.e. its
    /// radial cycle has length one. Wire edges have no radial cycle at all.
    pub fn is_wire(&self) -> bool {
        self.base_loop.is_none()
    }

    fn side_of(&self, v: VertexId) -> usize {
        if self.verts[0] == v {
            0
        } else if self.verts[1] == v {
            1
        } else {
            panic!("Edge {:?} does not contain vertex {:?}", self.index, v)
        }
    }

    pub fn disk(&self, v: VertexId) -> &DiskLink {
        &self.disk[self.side_of(v)]
    }

    pub(crate) fn disk_mut(&mut self, v: VertexId) -> &mut DiskLink {
        let side = self.side_of(v);
        &mut self.disk[side]
    }

    pub fn disk_next(&self, v: VertexId) -> EdgeId {
        self.disk(v).next
    }

    pub fn disk_prev(&self, v: VertexId) -> EdgeId {
        self.disk(v).prev
    }

    /// Swaps one endpoint for another vertex. The disk link of the affected
    /// side is reset to a self-link; the caller is responsible for splicing
    /// the edge into the new vertex's disk cycle.
    pub(crate) fn replace_vertex(&mut self, from: VertexId, to: VertexId) {
        let side = self.side_of(from);
        self.verts[side] = to;
        let e = self.index;
        self.disk[side] = DiskLink { prev: e, next: e };
    }
}

impl Loop {
    pub fn index(&self) -> LoopId {
        self.index
    }
    pub fn face(&self) -> FaceId {
        self.face
    }
    pub fn edge(&self) -> EdgeId {
        self.edge
    }
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }
    pub fn next(&self) -> LoopId {
        self.next
    }
    pub fn prev(&self) -> LoopId {
        self.prev
    }
    pub fn radial_next(&self) -> LoopId {
        self.radial_next
    }
    pub fn radial_prev(&self) -> LoopId {
        self.radial_prev
    }
}

impl Face {
    pub fn index(&self) -> FaceId {
        self.index
    }
    pub fn first_loop(&self) -> Option<LoopId> {
        self.first_loop
    }
    pub fn num_loops(&self) -> u32 {
        self.num_loops
    }
    pub fn material_index(&self) -> u32 {
        self.material_index
    }
    pub fn smooth(&self) -> bool {
        self.smooth
    }
}

/// Live element counts for a whole mesh, in inclusion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementCounts {
    pub faces: usize,
    pub loops: usize,
    pub edges: usize,
    pub vertices: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GMesh {
    vertices: ElementStore<VertexId, Vertex>,
    edges: ElementStore<EdgeId, Edge>,
    loops: ElementStore<LoopId, Loop>,
    faces: ElementStore<FaceId, Face>,
}

impl Default for GMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl GMesh {
    pub fn new() -> Self {
        Self {
            vertices: ElementStore::new(),
            edges: ElementStore::new(),
            loops: ElementStore::new(),
            faces: ElementStore::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn counts(&self) -> ElementCounts {
        ElementCounts {
            faces: self.faces.len(),
            loops: self.loops.len(),
            edges: self.edges.len(),
            vertices: self.vertices.len(),
        }
    }

    pub fn vertex_store(&self) -> &ElementStore<VertexId, Vertex> {
        &self.vertices
    }

    pub fn edge_store(&self) -> &ElementStore<EdgeId, Edge> {
        &self.edges
    }

    pub fn loop_store(&self) -> &ElementStore<LoopId, Loop> {
        &self.loops
    }

    pub fn face_store(&self) -> &ElementStore<FaceId, Face> {
        &self.faces
    }

    pub fn iter_vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn iter_loops(&self) -> impl Iterator<Item = (LoopId, &Loop)> {
        self.loops.iter()
    }

    pub fn iter_faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    /* ============ */
    /*  Allocation  */
    /* ============ */

    /// Adds a new vertex to the mesh, disconnected from everything else.
    /// Returns its handle.
    fn alloc_vertex(&mut self, position: Vec3, edge: Option<EdgeId>) -> VertexId {
        self.vertices.insert_with_key(|index| Vertex {
            index,
            position,
            edge,
        })
    }

    /// Adds a new wire edge between two vertices. The disk links start out
    /// self-referential; the caller must splice the edge into both endpoints'
    /// disk cycles.
    fn alloc_edge(&mut self, v0: VertexId, v1: VertexId) -> EdgeId {
        self.edges.insert_with_key(|index| Edge {
            index,
            verts: [v0, v1],
            disk: [
                DiskLink { prev: index, next: index },
                DiskLink { prev: index, next: index },
            ],
            base_loop: None,
        })
    }

    /// Adds a new loop, self-linked in both its cycles. The caller must
    /// splice it into a face's loop cycle and an edge's radial cycle.
    fn alloc_loop(&mut self, face: FaceId, edge: EdgeId, vertex: VertexId) -> LoopId {
        self.loops.insert_with_key(|index| Loop {
            index,
            face,
            edge,
            vertex,
            next: index,
            prev: index,
            radial_next: index,
            radial_prev: index,
        })
    }

    /// Adds a new face with no loops yet. Returns its handle.
    fn alloc_face(&mut self, first_loop: Option<LoopId>) -> FaceId {
        self.faces.insert_with_key(|index| Face {
            index,
            first_loop,
            num_loops: 0,
            material_index: 0,
            smooth: false,
        })
    }

    /// Tombstones a vertex. This does not attempt to preserve mesh
    /// connectivity and should only be used as part of internal operations.
    fn remove_vertex(&mut self, vertex: VertexId) {
        self.vertices.remove(vertex);
    }

    /// Tombstones an edge. This does not attempt to preserve mesh
    /// connectivity and should only be used as part of internal operations.
    fn remove_edge(&mut self, edge: EdgeId) {
        self.edges.remove(edge);
    }

    /// Tombstones a loop. This does not attempt to preserve mesh connectivity
    /// and should only be used as part of internal operations.
    fn remove_loop(&mut self, l: LoopId) {
        self.loops.remove(l);
    }

    /// Tombstones a face. This does not attempt to preserve mesh connectivity
    /// and should only be used as part of internal operations.
    fn remove_face(&mut self, face: FaceId) {
        self.faces.remove(face);
    }

    /* ============== */
    /*  Construction  */
    /* ============== */

    /// Adds an isolated vertex at `position` and returns its id.
    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        self.alloc_vertex(position, None)
    }

    pub fn add_vertices(&mut self, positions: &[Vec3]) -> SVec<VertexId> {
        positions.iter().map(|&p| self.add_vertex(p)).collect_svec()
    }

    /// Returns the edge connecting `v0` and `v1` if one exists, by scanning
    /// `v0`'s disk cycle.
    pub fn find_edge(&self, v0: VertexId, v1: VertexId) -> Option<EdgeId> {
        self.at_vertex(v0).edge_to(v1).try_end().ok()
    }

    /// Finds or creates the edge connecting `v0` and `v1`. New edges are
    /// spliced into both endpoints' disk cycles and start out as wire edges.
    pub fn add_edge(&mut self, v0: VertexId, v1: VertexId) -> Result<EdgeId> {
        if v0 == v1 {
            return Err(KernelError::InvalidArgument(format!(
                "cannot create an edge from {v0:?} to itself"
            ))
            .into());
        }
        for v in [v0, v1] {
            if !self.vertices.contains_key(v) {
                return Err(
                    KernelError::InvalidIndex(format!("vertex {v:?} is not in the mesh")).into(),
                );
            }
        }
        if let Some(e) = self.find_edge(v0, v1) {
            return Ok(e);
        }
        let e = self.alloc_edge(v0, v1);
        self.disk_insert(v0, e);
        self.disk_insert(v1, e);
        Ok(e)
    }

    /// Creates a face over a ring of at least three vertices, given in
    /// counter-clockwise order as seen from the outside of the surface.
    /// Missing edges are created on the fly; existing ones are reused, which
    /// is what stitches neighbouring faces together.
    ///
    /// All argument validation happens before the first mutation, so a failed
    /// call leaves the mesh untouched.
    pub fn add_face(&mut self, ring: &[VertexId]) -> Result<FaceId> {
        if ring.len() < 3 {
            return Err(KernelError::InvalidArgument(format!(
                "a face needs at least 3 vertices, got {}",
                ring.len()
            ))
            .into());
        }
        for (a, b) in ring.iter_cpy().circular_tuple_windows() {
            if a == b {
                return Err(KernelError::InvalidArgument(format!(
                    "consecutive ring vertices must be distinct, found {a:?} twice"
                ))
                .into());
            }
        }
        for &v in ring {
            if !self.vertices.contains_key(v) {
                return Err(
                    KernelError::InvalidIndex(format!("vertex {v:?} is not in the mesh")).into(),
                );
            }
        }

        let mut edges = SVec::new();
        for (a, b) in ring.iter_cpy().circular_tuple_windows() {
            // Cannot fail: the whole ring was validated above.
            edges.push(self.add_edge(a, b)?);
        }

        let face = self.alloc_face(None);
        let mut ring_loops = SVec::new();
        for (&v, &e) in ring.iter().zip(edges.iter()) {
            let l = self.alloc_loop(face, e, v);
            self.radial_insert(e, l);
            ring_loops.push(l);
        }
        for (l1, l2) in ring_loops.iter_cpy().circular_tuple_windows() {
            self[l1].next = l2;
            self[l2].prev = l1;
        }
        self[face].first_loop = Some(ring_loops[0]);
        self[face].num_loops = ring.len() as u32;
        Ok(face)
    }

    /// Creates one vertex per position and a face over all of them. See
    /// [`GMesh::add_face`].
    pub fn add_face_from_positions(&mut self, positions: &[Vec3]) -> Result<FaceId> {
        if positions.len() < 3 {
            return Err(KernelError::InvalidArgument(format!(
                "a face needs at least 3 positions, got {}",
                positions.len()
            ))
            .into());
        }
        for p in positions {
            if !p.is_finite() {
                return Err(KernelError::InvalidArgument(format!(
                    "face positions must be finite, got {p}"
                ))
                .into());
            }
        }
        let ring = self.add_vertices(positions);
        self.add_face(&ring)
    }

    /// Builds a mesh from a list of vertices, and a list of polygons
    /// containing indices that reference those vertices.
    ///
    /// - Generic over Index: Use as much precision as you need / want.
    /// - Generic over Polygon: Use whatever input layout you want.
    ///
    /// If unsure, you can pass `Vec<Vec<u32>>` as `polygons`. You can also use
    /// `[[u32;3]]` or `&[&[u32]]`. Same for `u8`, `u16` or `usize` indices.
    pub fn build_from_polygons<Index, Polygon>(
        positions: &[Vec3],
        polygons: &[Polygon],
    ) -> Result<Self>
    where
        Index: num_traits::AsPrimitive<usize>,
        Polygon: AsRef<[Index]>,
    {
        let mut mesh = Self::new();
        let verts = mesh.add_vertices(positions);
        for polygon in polygons.iter().map(|p| p.as_ref()) {
            let ring = polygon
                .iter()
                .map(|i| {
                    verts.get(i.as_()).copied().ok_or_else(|| {
                        KernelError::InvalidArgument(format!(
                            "out-of-bounds index in the polygon array: {}",
                            i.as_()
                        ))
                    })
                })
                .collect::<Result<SVec<_>, _>>()?;
            mesh.add_face(&ring)?;
        }
        Ok(mesh)
    }

    /* ============= */
    /*  Destruction  */
    /* ============= */

    /// Deletes a face together with its loops. The face's edges and vertices
    /// are left behind, possibly as wire edges or isolated vertices. No-op
    /// when the face is already tombstoned.
    pub fn delete_face(&mut self, f: FaceId) {
        if !self.faces.contains_key(f) {
            return;
        }
        for l in self.face_loops(f) {
            let e = self[l].edge;
            self.radial_remove(e, l);
            self.remove_loop(l);
        }
        self.remove_face(f);
    }

    /// Face deletion as performed inside the edge and vertex cascades: after
    /// the loops are gone, boundary edges whose radial cycle emptied are
    /// unspliced and tombstoned, and endpoints left with an empty disk go
    /// with them.
    fn delete_face_sweep(&mut self, f: FaceId) {
        if !self.faces.contains_key(f) {
            return;
        }
        let loops = self.face_loops(f);
        let edges = loops.iter().map(|&l| self[l].edge).collect_svec();
        for l in loops {
            let e = self[l].edge;
            self.radial_remove(e, l);
            self.remove_loop(l);
        }
        self.remove_face(f);

        for e in edges {
            if !self.edges.contains_key(e) || self[e].base_loop.is_some() {
                continue;
            }
            let (a, b) = self[e].endpoints();
            self.disk_remove(a, e);
            self.disk_remove(b, e);
            self.remove_edge(e);
            for v in [a, b] {
                if self[v].edge.is_none() {
                    self.remove_vertex(v);
                }
            }
        }
    }

    /// Deletes an edge. Every face on the edge's radial cycle is deleted
    /// first, sweeping away whatever the dead faces orphaned; a wire edge is
    /// simply unspliced from both endpoints' disk cycles. No-op when the edge
    /// is already tombstoned.
    pub fn delete_edge(&mut self, e: EdgeId) {
        if !self.edges.contains_key(e) {
            return;
        }
        while let Some(l) = self.edges.get(e).and_then(|edge| edge.base_loop) {
            let f = self[l].face;
            self.delete_face_sweep(f);
            if !self.edges.contains_key(e) {
                // The sweep already took the edge (and possibly its
                // endpoints) with the face.
                return;
            }
        }
        let (a, b) = self[e].endpoints();
        self.disk_remove(a, e);
        self.disk_remove(b, e);
        self.remove_edge(e);
    }

    /// Deletes a vertex by cascading [`GMesh::delete_edge`] over its disk
    /// cycle. No-op when the vertex is already tombstoned.
    pub fn delete_vertex(&mut self, v: VertexId) {
        if !self.vertices.contains_key(v) {
            return;
        }
        while let Some(e) = self.vertices.get(v).and_then(|vert| vert.edge) {
            self.delete_edge(e);
            if !self.vertices.contains_key(v) {
                return;
            }
        }
        self.remove_vertex(v);
    }

    /* ======= */
    /*  Bulk   */
    /* ======= */

    /// Merges another mesh into this one by concatenating the four element
    /// stores. The other mesh's slot layout is preserved verbatim (tombstones
    /// included), so every element id is simply shifted by a per-store
    /// offset. No connectivity is generated between the two meshes.
    pub fn merge_with(&mut self, other: &GMesh) {
        let v_base = self.vertices.slot_count();
        let e_base = self.edges.slot_count();
        let l_base = self.loops.slot_count();
        let f_base = self.faces.slot_count();

        let vmap = move |v: VertexId| VertexId::from_usize(v.to_usize() + v_base);
        let emap = move |e: EdgeId| EdgeId::from_usize(e.to_usize() + e_base);
        let lmap = move |l: LoopId| LoopId::from_usize(l.to_usize() + l_base);
        let fmap = move |f: FaceId| FaceId::from_usize(f.to_usize() + f_base);

        self.vertices.merge_offset(&other.vertices, |v| Vertex {
            index: vmap(v.index),
            position: v.position,
            edge: v.edge.map(emap),
        });
        self.edges.merge_offset(&other.edges, |e| Edge {
            index: emap(e.index),
            verts: [vmap(e.verts[0]), vmap(e.verts[1])],
            disk: [
                DiskLink { prev: emap(e.disk[0].prev), next: emap(e.disk[0].next) },
                DiskLink { prev: emap(e.disk[1].prev), next: emap(e.disk[1].next) },
            ],
            base_loop: e.base_loop.map(lmap),
        });
        self.loops.merge_offset(&other.loops, |l| Loop {
            index: lmap(l.index),
            face: fmap(l.face),
            edge: emap(l.edge),
            vertex: vmap(l.vertex),
            next: lmap(l.next),
            prev: lmap(l.prev),
            radial_next: lmap(l.radial_next),
            radial_prev: lmap(l.radial_prev),
        });
        self.faces.merge_offset(&other.faces, |f| Face {
            index: fmap(f.index),
            first_loop: f.first_loop.map(lmap),
            num_loops: f.num_loops,
            material_index: f.material_index,
            smooth: f.smooth,
        });
    }

    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for (_, v) in self.iter_vertices() {
            min = min.min(v.position);
            max = max.max(v.position);
        }
        ((min + max) * 0.5, max - min)
    }
}
