//! Centroid subdivision.
//!
//! Each pass keeps every vertex of the input mesh and replaces every face by a
//! fan of triangles around a new vertex. The new vertex starts at the face
//! centroid and is pushed along the surface normal found at the point of the
//! input mesh closest to that centroid:
//!
//! ```text
//!   D ─────── C           D ─────── C
//!   │         │           │ ╲     ╱ │
//!   │    ·    │    ──►    │   c'    │      c' = centroid + displacement * n
//!   │         │           │ ╱     ╲ │
//!   A ─────── B           A ─────── B
//! ```
//!
//! A triangle becomes three triangles, a quad becomes four, so after one pass
//! every face is a triangle. Passes compose: two passes equal one pass applied
//! to the output of another.
//!
//! # Example
//!
//! ```
//! use meshwarp::prelude::*;
//! use meshwarp::algo::subdivide::{centroid_subdivide, SubdivideOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//!
//! let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.5, 1)).unwrap();
//! assert_eq!(result.num_vertices(), 5);
//! assert_eq!(result.num_faces(), 4);
//! ```

use log::debug;
use nalgebra::Point3;
use rayon::prelude::*;

use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{
    build_from_polygons, compact, to_face_vertex, FaceId, HalfEdgeMesh, MeshIndex, Polygon,
};

/// Options for centroid subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Distance each new vertex is moved along the surface normal.
    /// Zero keeps new vertices at the face centroids; negative values push inward.
    pub displacement: f64,

    /// Number of subdivision passes (at least 1).
    pub iterations: usize,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self {
            displacement: 1.0,
            iterations: 1,
            parallel: true,
        }
    }
}

impl SubdivideOptions {
    /// Create options with the given displacement and number of passes.
    pub fn new(displacement: f64, iterations: usize) -> Self {
        Self {
            displacement,
            iterations,
            ..Self::default()
        }
    }

    /// Set the normal displacement of new vertices.
    pub fn with_displacement(mut self, displacement: f64) -> Self {
        self.displacement = displacement;
        self
    }

    /// Set the number of passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check the option values.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidParameter`] if `iterations` is zero or
    /// `displacement` is not finite.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(MeshError::invalid_param(
                "iterations",
                self.iterations,
                "must be at least 1",
            ));
        }
        if !self.displacement.is_finite() {
            return Err(MeshError::invalid_param(
                "displacement",
                self.displacement,
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Subdivide every face around its displaced centroid.
///
/// Returns a new mesh; the input is left untouched. For an input without
/// unreferenced vertices, each pass adds one vertex per face and multiplies
/// the face count by three (triangles) or four (quads).
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] or [`MeshError::InvalidState`] if the mesh
///   fails [`HalfEdgeMesh::validate`]
/// - [`MeshError::InvalidParameter`] if the options are rejected by
///   [`SubdivideOptions::validate`]
pub fn centroid_subdivide<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &SubdivideOptions,
) -> Result<HalfEdgeMesh<I>> {
    centroid_subdivide_with_progress(mesh, options, &Progress::none())
}

/// Centroid subdivision with progress reporting.
pub fn centroid_subdivide_with_progress<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<HalfEdgeMesh<I>> {
    mesh.validate()?;
    options.validate()?;

    let mut current = subdivide_once(mesh, options)?;
    log_pass(1, options.iterations, &current);
    progress.report(1, options.iterations, "Centroid subdivision");

    for pass in 2..=options.iterations {
        current = subdivide_once(&current, options)?;
        log_pass(pass, options.iterations, &current);
        progress.report(pass, options.iterations, "Centroid subdivision");
    }

    Ok(current)
}

fn log_pass<I: MeshIndex>(pass: usize, total: usize, mesh: &HalfEdgeMesh<I>) {
    debug!(
        "centroid subdivision pass {}/{}: {} vertices, {} faces",
        pass,
        total,
        mesh.num_vertices(),
        mesh.num_faces()
    );
}

/// Perform one pass of centroid subdivision.
fn subdivide_once<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &SubdivideOptions,
) -> Result<HalfEdgeMesh<I>> {
    let (mut vertices, faces) = to_face_vertex(mesh);

    let centers: Vec<Point3<f64>> = if options.parallel {
        (0..faces.len())
            .into_par_iter()
            .map(|fi| displaced_centroid(mesh, FaceId::new(fi), options.displacement))
            .collect::<Result<_>>()?
    } else {
        (0..faces.len())
            .map(|fi| displaced_centroid(mesh, FaceId::new(fi), options.displacement))
            .collect::<Result<_>>()?
    };

    let first_center = vertices.len();
    vertices.extend(centers);

    let mut new_faces: Vec<Polygon> = Vec::with_capacity(faces.len() * 4);
    for (fi, face) in faces.iter().enumerate() {
        let c = first_center + fi;
        new_faces.extend(face.edges().map(|(a, b)| Polygon::Triangle([a, b, c])));
    }

    compact(&mut vertices, &mut new_faces);
    build_from_polygons(&vertices, &new_faces)
}

/// Centroid of face `f` moved along the surface normal nearest to it.
fn displaced_centroid<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    f: FaceId<I>,
    displacement: f64,
) -> Result<Point3<f64>> {
    let centroid = mesh.face_centroid(f);
    let hit = mesh.closest_point(&centroid, 0.0).ok_or_else(|| {
        MeshError::InvalidState(format!("no closest point for centroid of face {}", f.index()))
    })?;
    Ok(centroid + mesh.normal_at(&hit) * displacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, build_from_triangles, VertexId};
    use nalgebra::Vector3;

    fn single_triangle() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn quad_strip() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap()
    }

    #[test]
    fn test_triangle_counts() {
        let mesh = tetrahedron();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.1, 1)).unwrap();

        assert_eq!(result.num_vertices(), 4 + 4);
        assert_eq!(result.num_faces(), 4 * 3);
        assert!(result.is_triangle_mesh());
        assert!(result.is_closed());
    }

    #[test]
    fn test_quad_counts() {
        let mesh = quad_strip();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.0, 1)).unwrap();

        assert_eq!(result.num_vertices(), 6 + 2);
        assert_eq!(result.num_faces(), 2 * 4);
        assert!(result.is_triangle_mesh());
    }

    #[test]
    fn test_original_vertices_kept() {
        let mesh = tetrahedron();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.3, 1)).unwrap();

        for v in mesh.vertex_ids() {
            assert_eq!(result.position(v), mesh.position(v));
        }
    }

    #[test]
    fn test_zero_displacement_uses_centroids() {
        let mesh = quad_strip();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.0, 1)).unwrap();

        for f in mesh.face_ids() {
            let expected = mesh.face_centroid(f);
            let actual = result.position(VertexId::new(mesh.num_vertices() + f.index()));
            assert!((actual - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_displacement_follows_normal() {
        let mesh = single_triangle();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(2.0, 1)).unwrap();

        let center = result.position(VertexId::new(3));
        assert!((center - Point3::new(1.0, 1.0, 2.0)).norm() < 1e-12);

        // Negative displacement pushes against the normal
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(-0.5, 1)).unwrap();
        let center = result.position(VertexId::new(3));
        assert!((center - Point3::new(1.0, 1.0, -0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_fan_preserves_winding() {
        let mesh = single_triangle();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.0, 1)).unwrap();

        let (_, faces) = to_face_vertex(&result);
        assert_eq!(
            faces,
            vec![
                Polygon::Triangle([0, 1, 3]),
                Polygon::Triangle([1, 2, 3]),
                Polygon::Triangle([2, 0, 3]),
            ]
        );
        for f in result.face_ids() {
            assert!((result.face_normal(f) - Vector3::z()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_passes_compose() {
        let mesh = tetrahedron();
        let options = SubdivideOptions::new(0.2, 1);

        let twice = centroid_subdivide(&mesh, &options.clone().with_iterations(2)).unwrap();
        let once = centroid_subdivide(&mesh, &options).unwrap();
        let once_more = centroid_subdivide(&once, &options).unwrap();

        assert_eq!(to_face_vertex(&twice), to_face_vertex(&once_more));
        assert_eq!(twice.num_vertices(), 8 + 12);
        assert_eq!(twice.num_faces(), 36);
    }

    #[test]
    fn test_mixed_faces_fan_by_corner_count() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![Polygon::Quad([0, 1, 2, 3]), Polygon::Triangle([1, 4, 2])];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.0, 1)).unwrap();

        assert_eq!(result.num_vertices(), 5 + 2);
        assert_eq!(result.num_faces(), 4 + 3);
        assert!(result.is_triangle_mesh());

        let (_, out_faces) = to_face_vertex(&result);
        assert_eq!(
            out_faces,
            vec![
                Polygon::Triangle([0, 1, 5]),
                Polygon::Triangle([1, 2, 5]),
                Polygon::Triangle([2, 3, 5]),
                Polygon::Triangle([3, 0, 5]),
                Polygon::Triangle([1, 4, 6]),
                Polygon::Triangle([4, 2, 6]),
                Polygon::Triangle([2, 1, 6]),
            ]
        );
    }

    #[test]
    fn test_bowtie_vertex_subdivides() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]).unwrap();

        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.5, 2)).unwrap();

        assert_eq!(result.num_vertices(), 5 + 2 + 6);
        assert_eq!(result.num_faces(), 2 * 3 * 3);
        assert!(result.is_valid());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = quad_strip();
        let options = SubdivideOptions::new(0.25, 2);

        let parallel = centroid_subdivide(&mesh, &options).unwrap();
        let sequential = centroid_subdivide(&mesh, &options.clone().sequential()).unwrap();

        assert_eq!(to_face_vertex(&parallel), to_face_vertex(&sequential));
    }

    #[test]
    fn test_orphan_vertices_removed() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(9.0, 9.0, 9.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 2, 3]]).unwrap();
        let result = centroid_subdivide(&mesh, &SubdivideOptions::new(0.0, 1)).unwrap();

        assert_eq!(result.num_vertices(), 4);
        assert!(result
            .vertex_ids()
            .all(|v| *result.position(v) != Point3::new(9.0, 9.0, 9.0)));
    }

    #[test]
    fn test_progress_reports_each_pass() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| {
            sink.lock().unwrap().push((current, total));
        });

        let mesh = single_triangle();
        centroid_subdivide_with_progress(&mesh, &SubdivideOptions::new(0.0, 3), &progress).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mesh = single_triangle();
        let err = centroid_subdivide(&mesh, &SubdivideOptions::new(1.0, 0)).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "iterations", .. }
        ));
    }

    #[test]
    fn test_non_finite_displacement_rejected() {
        let mesh = single_triangle();
        let err = centroid_subdivide(&mesh, &SubdivideOptions::new(f64::NAN, 1)).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "displacement", .. }
        ));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mesh = HalfEdgeMesh::<u32>::new();
        let err = centroid_subdivide(&mesh, &SubdivideOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::EmptyMesh));
        assert!(err.is_invalid_input());
    }
}
