// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

macro_rules! impl_index_traits {
    ($id_type:ty, $output_type:ty, $store:ident) => {
        impl std::ops::Index<$id_type> for GMesh {
            type Output = $output_type;

            fn index(&self, index: $id_type) -> &Self::Output {
                self.$store.get(index).unwrap_or_else(|| {
                    panic!(
                        "{} index error for {:?}. Has the value been deleted?",
                        stringify!($id_type),
                        index
                    )
                })
            }
        }

        impl std::ops::IndexMut<$id_type> for GMesh {
            fn index_mut(&mut self, index: $id_type) -> &mut Self::Output {
                self.$store.get_mut(index).unwrap_or_else(|| {
                    panic!(
                        "{} index error for {:?}. Has the value been deleted?",
                        stringify!($id_type),
                        index
                    )
                })
            }
        }
    };
}

impl_index_traits!(VertexId, Vertex, vertices);
impl_index_traits!(EdgeId, Edge, edges);
impl_index_traits!(LoopId, Loop, loops);
impl_index_traits!(FaceId, Face, faces);

macro_rules! impl_index_ops {
    ($field_name:ident, $field_name_mut:ident, $id_type:ty, $output_type:ty, $store:ident) => {
        /// Try to immutably borrow data
        pub fn $field_name(&self, id: $id_type) -> Option<&$output_type> {
            self.$store.get(id)
        }

        /// Try to mutably borrow data
        pub fn $field_name_mut(&mut self, id: $id_type) -> Option<&mut $output_type> {
            self.$store.get_mut(id)
        }
    };
}

impl GMesh {
    impl_index_ops!(vertex, vertex_mut, VertexId, Vertex, vertices);
    impl_index_ops!(edge, edge_mut, EdgeId, Edge, edges);
    impl_index_ops!(loop_at, loop_at_mut, LoopId, Loop, loops);
    impl_index_ops!(face, face_mut, FaceId, Face, faces);
}
