// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

/// The main representation to draw the mesh's faces as triangles on the GPU.
/// This is suitable to be rendered as a plain indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct TriangleBuffers {
    /// Vertex positions, one per live vertex, compacted.
    pub positions: Vec<Vec3>,
    /// Indices: 3*N where N is the number of triangles. Indices point to
    /// elements of `positions`.
    pub indices: Vec<u32>,
}

impl GMesh {
    /// Triangulates every face as a fan anchored on its first loop and
    /// returns the buffers. Read-only: the indices stay valid as long as the
    /// mesh is not mutated.
    #[profiling::function]
    pub fn generate_triangle_buffers(&self) -> TriangleBuffers {
        let mut positions = Vec::with_capacity(self.num_vertices());
        let mut compact = HashMap::new();
        for (v, vertex) in self.iter_vertices() {
            compact.insert(v, positions.len() as u32);
            positions.push(vertex.position());
        }

        let mut indices = Vec::new();
        for (f, _face) in self.iter_faces() {
            let vertices = self.face_vertices(f);
            let v1 = vertices[0];
            for (&v2, &v3) in vertices[1..].iter().tuple_windows() {
                indices.push(compact[&v1]);
                indices.push(compact[&v2]);
                indices.push(compact[&v3]);
            }
        }

        TriangleBuffers { positions, indices }
    }
}
