// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod differential;
pub mod edit_ops;
pub mod entities;
pub mod geometry;
pub mod id_types;
pub mod plot;
pub mod primitives;
pub mod topology;

pub use differential::*;
pub use edit_ops::*;
pub use entities::{Face, HalfEdge, Vertex};
pub use geometry::*;
pub use id_types::{FaceId, HalfEdgeId, VertexId};
pub use plot::*;
pub use primitives::*;
pub use topology::Mesh;
