//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation used by the
//! deformation engines, together with the face-vertex [`Polygon`] record and
//! the surface queries the engines rely on.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which stores a triangle, quad or mixed
//! mesh as a half-edge (doubly-connected edge list) structure with a cached
//! normal per vertex. Adjacency queries are O(1); the normals are recomputed
//! whenever a mesh is constructed.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait).
//! `u32` is the default; `u64` is available for very large meshes.
//!
//! # Construction
//!
//! Meshes are constructed from file I/O or from face-vertex lists:
//!
//! ```
//! use meshwarp::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! ```

mod builder;
mod halfedge;
mod index;
mod polygon;
mod query;

pub use builder::{
    build_from_polygons, build_from_quads, build_from_triangles, compact, to_face_vertex,
};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use polygon::Polygon;
pub use query::SurfacePoint;
