// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The four element id types. Each one wraps a `NonMaxU32` so that
//! `Option<Id>` is still 4 bytes wide, with `None` encoded as `u32::MAX`.
//! Ids are plain store positions: they carry no generation counter, so a
//! tombstoned slot that gets reused hands out the same id again. That is by
//! contract: bulk mesh merging shifts ids by a constant offset and deep
//! copies must preserve them verbatim.

use nonmax::NonMaxU32;

macro_rules! new_index_type {
    ($(#[$outer:meta])* $vis:vis struct $name:ident;) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(NonMaxU32);

        impl $name {
            pub fn from_usize(index: usize) -> Self {
                Self(
                    u32::try_from(index)
                        .ok()
                        .and_then(NonMaxU32::new)
                        .unwrap_or_else(|| panic!("element index out of range: {index}")),
                )
            }

            pub fn to_usize(self) -> usize {
                self.0.get() as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0.get())
            }
        }

        impl crate::mesh::gmesh::store::ElementIndex for $name {
            fn from_usize(index: usize) -> Self {
                Self::from_usize(index)
            }

            fn to_usize(self) -> usize {
                self.to_usize()
            }
        }
    };
}

new_index_type! { pub struct VertexId; }
new_index_type! { pub struct EdgeId; }
new_index_type! { pub struct LoopId; }
new_index_type! { pub struct FaceId; }
