//! # meshwarp
//!
//! Two stateless deformation engines for triangle and quad meshes.
//!
//! - **Centroid subdivision** ([`algo::subdivide`]): every face is split into a
//!   fan of triangles around its centroid, and the centroid is pushed along the
//!   surface normal by a fixed displacement. Repeated passes grow spiky or
//!   puffy surfaces depending on the sign of the displacement.
//! - **Attractor ripple** ([`algo::ripple`]): every vertex moves along its
//!   normal by the average of a damped sine wave `distance * sin(d) / d`
//!   measured against a set of attractor points.
//!
//! Both engines consume a [`HalfEdgeMesh`](mesh::HalfEdgeMesh) by reference and
//! return a new mesh. Meshes can be built in memory or loaded from OBJ, PLY and
//! STL files through [`io`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshwarp::prelude::*;
//!
//! let mesh: HalfEdgeMesh = meshwarp::io::load("model.obj").unwrap();
//!
//! let spiky = centroid_subdivide(&mesh, &SubdivideOptions::new(0.2, 2)).unwrap();
//! meshwarp::io::save(&spiky, "spiky.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use meshwarp::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//!
//! let attractors = [Point3::new(0.5, 0.5, 2.0)];
//! let (rippled, report) =
//!     attractor_ripple(&mesh, &attractors, &RippleOptions::new(0.25, 1)).unwrap();
//! assert_eq!(rippled.num_faces(), 4);
//! assert_eq!(report.positions.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshwarp::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::ripple::{
        attractor_ripple, CoincidentAttractor, DisplacementResult, RippleOptions,
    };
    pub use crate::algo::subdivide::{centroid_subdivide, SubdivideOptions};
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex, FaceId,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, Polygon, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
