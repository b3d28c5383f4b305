// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

pub trait Location {}

impl Location for VertexId {}
impl Location for EdgeId {}
impl Location for LoopId {}
impl Location for FaceId {}

#[derive(Copy, Clone, Debug)]
pub enum TraversalError {
    VertexHasNoEdge(VertexId),
    EdgeHasNoLoop(EdgeId),
    FaceHasNoLoop(FaceId),
    EdgeDoesNotContain(EdgeId, VertexId),
    NoEdgeTo(VertexId),
}
impl std::fmt::Display for TraversalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{self:?}"))
    }
}
impl std::error::Error for TraversalError {}

#[derive(Clone, Copy)]
pub struct ValidTraversal<'a, L>
where
    L: Location,
{
    inner: &'a GMesh,
    location: L,
}

pub type Traversal<'a, L> = Result<ValidTraversal<'a, L>, TraversalError>;

/* ===================== */
/* Traversal on vertices */
/* ===================== */

pub trait VertexTraversal<'a> {
    fn base_edge(&'a self) -> Traversal<'a, EdgeId>;
}

impl<'a> VertexTraversal<'a> for Traversal<'a, VertexId> {
    fn base_edge(&'a self) -> Traversal<'a, EdgeId> {
        self.and_then(|valid| {
            Ok(ValidTraversal {
                inner: valid.inner,
                location: valid.inner[valid.location]
                    .edge
                    .ok_or(TraversalError::VertexHasNoEdge(valid.location))?,
            })
        })
    }
}

/* ================== */
/* Traversal on edges */
/* ================== */

pub trait EdgeTraversal<'a> {
    fn base_loop(&'a self) -> Traversal<'a, LoopId>;
    fn other_vertex(&'a self, v: VertexId) -> Traversal<'a, VertexId>;
    fn disk_next(&'a self, v: VertexId) -> Traversal<'a, EdgeId>;
    fn disk_prev(&'a self, v: VertexId) -> Traversal<'a, EdgeId>;
}

impl<'a> EdgeTraversal<'a> for Traversal<'a, EdgeId> {
    fn base_loop(&'a self) -> Traversal<'a, LoopId> {
        self.and_then(|valid| {
            Ok(ValidTraversal {
                inner: valid.inner,
                location: valid.inner[valid.location]
                    .base_loop
                    .ok_or(TraversalError::EdgeHasNoLoop(valid.location))?,
            })
        })
    }

    fn other_vertex(&'a self, v: VertexId) -> Traversal<'a, VertexId> {
        self.and_then(|valid| {
            let edge = &valid.inner[valid.location];
            if !edge.contains(v) {
                return Err(TraversalError::EdgeDoesNotContain(valid.location, v));
            }
            Ok(ValidTraversal {
                inner: valid.inner,
                location: edge.other_vertex(v),
            })
        })
    }

    fn disk_next(&'a self, v: VertexId) -> Traversal<'a, EdgeId> {
        self.and_then(|valid| {
            let edge = &valid.inner[valid.location];
            if !edge.contains(v) {
                return Err(TraversalError::EdgeDoesNotContain(valid.location, v));
            }
            Ok(ValidTraversal {
                inner: valid.inner,
                location: edge.disk_next(v),
            })
        })
    }

    fn disk_prev(&'a self, v: VertexId) -> Traversal<'a, EdgeId> {
        self.and_then(|valid| {
            let edge = &valid.inner[valid.location];
            if !edge.contains(v) {
                return Err(TraversalError::EdgeDoesNotContain(valid.location, v));
            }
            Ok(ValidTraversal {
                inner: valid.inner,
                location: edge.disk_prev(v),
            })
        })
    }
}

/* ================== */
/* Traversal on loops */
/* ================== */

pub trait LoopTraversal<'a> {
    fn next(&'a self) -> Traversal<'a, LoopId>;
    fn prev(&'a self) -> Traversal<'a, LoopId>;
    fn radial_next(&'a self) -> Traversal<'a, LoopId>;
    fn radial_prev(&'a self) -> Traversal<'a, LoopId>;
    fn face(&'a self) -> Traversal<'a, FaceId>;
    fn edge(&'a self) -> Traversal<'a, EdgeId>;
    fn vertex(&'a self) -> Traversal<'a, VertexId>;
    fn dst_vertex(&'a self) -> Traversal<'a, VertexId>;
}

macro_rules! impl_loop_pointer {
    ($name:ident, $field:ident, $loc:ty) => {
        fn $name(&'a self) -> Traversal<'a, $loc> {
            self.and_then(|valid| {
                Ok(ValidTraversal {
                    inner: valid.inner,
                    location: valid.inner[valid.location].$field,
                })
            })
        }
    };
}

impl<'a> LoopTraversal<'a> for Traversal<'a, LoopId> {
    impl_loop_pointer!(next, next, LoopId);
    impl_loop_pointer!(prev, prev, LoopId);
    impl_loop_pointer!(radial_next, radial_next, LoopId);
    impl_loop_pointer!(radial_prev, radial_prev, LoopId);
    impl_loop_pointer!(face, face, FaceId);
    impl_loop_pointer!(edge, edge, EdgeId);
    impl_loop_pointer!(vertex, vertex, VertexId);

    /// The vertex this loop points towards, i.e. the other endpoint of its
    /// edge.
    fn dst_vertex(&'a self) -> Traversal<'a, VertexId> {
        self.and_then(|valid| {
            let lp = &valid.inner[valid.location];
            Ok(ValidTraversal {
                inner: valid.inner,
                location: valid.inner[lp.edge].other_vertex(lp.vertex),
            })
        })
    }
}

/* ================== */
/* Traversal on faces */
/* ================== */

pub trait FaceTraversal<'a> {
    fn first_loop(&'a self) -> Traversal<'a, LoopId>;
}
impl<'a> FaceTraversal<'a> for Traversal<'a, FaceId> {
    fn first_loop(&'a self) -> Traversal<'a, LoopId> {
        self.and_then(|valid| {
            Ok(ValidTraversal {
                inner: valid.inner,
                location: valid.inner[valid.location]
                    .first_loop
                    .ok_or(TraversalError::FaceHasNoLoop(valid.location))?,
            })
        })
    }
}

/* =================== */
/*  Generic traversal  */
/* =================== */

pub trait AnyTraversal<'a, L> {
    fn end(&'a self) -> L;
    fn try_end(&'a self) -> Result<L, TraversalError>;
}
impl<'a, L> AnyTraversal<'a, L> for Traversal<'a, L>
where
    L: Location + Copy,
{
    fn end(&'a self) -> L {
        self.map(|valid| valid.location)
            .unwrap_or_else(|err| panic!("Error during traversal: {err:?}"))
    }

    fn try_end(&'a self) -> Result<L, TraversalError> {
        self.map(|valid| valid.location)
    }
}

/* ============ */
/*  Initiators  */
/* ============ */

impl GMesh {
    pub fn at_vertex(&self, vertex_id: VertexId) -> Traversal<'_, VertexId> {
        Ok(ValidTraversal {
            inner: self,
            location: vertex_id,
        })
    }

    pub fn at_edge(&self, edge_id: EdgeId) -> Traversal<'_, EdgeId> {
        Ok(ValidTraversal {
            inner: self,
            location: edge_id,
        })
    }

    pub fn at_loop(&self, loop_id: LoopId) -> Traversal<'_, LoopId> {
        Ok(ValidTraversal {
            inner: self,
            location: loop_id,
        })
    }

    pub fn at_face(&self, face_id: FaceId) -> Traversal<'_, FaceId> {
        Ok(ValidTraversal {
            inner: self,
            location: face_id,
        })
    }
}

/* ================ */
/*  Vertex Helpers  */
/* ================ */

pub trait VertexTraversalHelpers<'a> {
    fn edge_to(&self, other: VertexId) -> Traversal<EdgeId>;
}

impl<'a> VertexTraversalHelpers<'a> for Traversal<'a, VertexId> {
    /// Returns the edge connecting the current vertex to `other`, if any.
    fn edge_to(&self, other: VertexId) -> Traversal<EdgeId> {
        self.and_then(|valid| {
            let e_to = valid
                .inner
                .disk_cycle(valid.location)
                .find(|&e| valid.inner[e].contains(other))
                .ok_or(TraversalError::NoEdgeTo(other))?;
            Ok(ValidTraversal {
                inner: valid.inner,
                location: e_to,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (GMesh, SVec<VertexId>, FaceId) {
        let mut mesh = GMesh::new();
        let verts = mesh.add_vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        let f = mesh.add_face(&verts).unwrap();
        (mesh, verts, f)
    }

    #[test]
    fn chained_traversal_walks_the_face() {
        let (mesh, verts, f) = triangle();

        let face_view = mesh.at_face(f);
        let first = face_view.first_loop();
        assert_eq!(first.vertex().end(), verts[0]);
        assert_eq!(first.dst_vertex().end(), verts[1]);
        assert_eq!(first.next().vertex().end(), verts[1]);
        assert_eq!(first.prev().vertex().end(), verts[2]);
        assert_eq!(first.next().next().next().try_end().unwrap(), first.end());
        assert_eq!(first.face().end(), f);
    }

    #[test]
    fn edge_traversals_follow_the_disk_and_radial_cycles() {
        let (mesh, verts, _) = triangle();

        let vertex_view = mesh.at_vertex(verts[0]);
        let e = vertex_view.base_edge();
        assert!(mesh[e.end()].contains(verts[0]));
        let far = e.other_vertex(verts[0]).end();
        assert_ne!(far, verts[0]);

        // Degree two: next and prev land on the same neighbouring edge.
        assert_eq!(
            e.disk_next(verts[0]).try_end().unwrap(),
            e.disk_prev(verts[0]).try_end().unwrap()
        );

        // Border edge: the radial cycle is the base loop alone.
        let l = e.base_loop();
        assert_eq!(l.radial_next().try_end().unwrap(), l.end());
        assert_eq!(l.radial_prev().try_end().unwrap(), l.end());
        assert_eq!(l.edge().end(), e.end());
    }

    #[test]
    fn traversal_errors_are_reported_not_panicked() {
        let (mut mesh, verts, _) = triangle();
        let lonely = mesh.add_vertex(Vec3::splat(9.0));

        assert!(matches!(
            mesh.at_vertex(lonely).base_edge().try_end(),
            Err(TraversalError::VertexHasNoEdge(v)) if v == lonely
        ));
        assert!(matches!(
            mesh.at_vertex(verts[0]).edge_to(lonely).try_end(),
            Err(TraversalError::NoEdgeTo(v)) if v == lonely
        ));

        let e = mesh.at_vertex(verts[0]).base_edge().end();
        assert!(matches!(
            mesh.at_edge(e).other_vertex(lonely).try_end(),
            Err(TraversalError::EdgeDoesNotContain(edge, v)) if edge == e && v == lonely
        ));

        let mut wire = GMesh::new();
        let a = wire.add_vertex(Vec3::ZERO);
        let b = wire.add_vertex(Vec3::X);
        let we = wire.add_edge(a, b).unwrap();
        assert!(matches!(
            wire.at_edge(we).base_loop().try_end(),
            Err(TraversalError::EdgeHasNoLoop(edge)) if edge == we
        ));
    }
}
