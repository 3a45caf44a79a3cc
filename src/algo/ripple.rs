//! Attractor ripple deformation.
//!
//! Every vertex is moved along the surface normal by the average of a damped
//! sine wave evaluated against a set of attractor points:
//!
//! ```text
//! wave(V, P)     = distance * sin(d) / d,   d = |V - P|
//! offset(V)      = (1 / |attractors|) * Σ_P wave(V, P)
//! V'             = V + offset(V) * n(V)
//! ```
//!
//! The faces are left untouched; only vertex positions change. With several
//! iterations each one starts from the mesh produced by the previous one, and
//! the returned [`DisplacementResult`] describes the last iteration only.
//!
//! # Example
//!
//! ```
//! use meshwarp::prelude::*;
//! use meshwarp::algo::ripple::{attractor_ripple, RippleOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let attractors = [Point3::new(0.0, 0.0, 2.0)];
//!
//! let (rippled, report) =
//!     attractor_ripple(&mesh, &attractors, &RippleOptions::new(1.0, 1)).unwrap();
//! assert_eq!(rippled.num_faces(), 1);
//! assert_eq!(report.displacements.len(), 3);
//! ```

use log::debug;
use nalgebra::Point3;
use rayon::prelude::*;

use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{
    build_from_polygons, compact, to_face_vertex, HalfEdgeMesh, MeshIndex, VertexId,
};

/// How an attractor lying exactly on a vertex is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoincidentAttractor {
    /// Evaluate `sin(0) / 0` as is, so the vertex displacement becomes NaN.
    #[default]
    Propagate,
    /// Use the limit of `sin(d) / d` at zero, a contribution of `distance`.
    Limit,
}

/// Options for attractor ripple deformation.
#[derive(Debug, Clone)]
pub struct RippleOptions {
    /// Wave amplitude. Must be non-zero and finite; negative values invert the wave.
    pub distance: f64,

    /// Number of ripple iterations (at least 1).
    pub iterations: usize,

    /// Treatment of attractors that coincide with a vertex.
    pub coincident: CoincidentAttractor,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for RippleOptions {
    fn default() -> Self {
        Self {
            distance: 1.0,
            iterations: 1,
            coincident: CoincidentAttractor::default(),
            parallel: true,
        }
    }
}

impl RippleOptions {
    /// Create options with the given wave amplitude and number of iterations.
    pub fn new(distance: f64, iterations: usize) -> Self {
        Self {
            distance,
            iterations,
            ..Self::default()
        }
    }

    /// Set the wave amplitude.
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the treatment of coincident attractors.
    pub fn with_coincident(mut self, coincident: CoincidentAttractor) -> Self {
        self.coincident = coincident;
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
    /// [`MeshError::InvalidParameter`] if `iterations` is zero or `distance`
    /// is zero or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(MeshError::invalid_param(
                "iterations",
                self.iterations,
                "must be at least 1",
            ));
        }
        if self.distance == 0.0 {
            return Err(MeshError::invalid_param("distance", self.distance, "must be non-zero"));
        }
        if !self.distance.is_finite() {
            return Err(MeshError::invalid_param("distance", self.distance, "must be finite"));
        }
        Ok(())
    }
}

/// Per-vertex diagnostics of the last ripple iteration.
///
/// Both vectors are indexed like the vertices of the mesh that iteration
/// consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacementResult {
    /// Average wave value applied along the normal of each vertex.
    pub displacements: Vec<f64>,

    /// Position of each vertex after moving it.
    pub positions: Vec<Point3<f64>>,
}

impl DisplacementResult {
    /// Number of vertices described.
    pub fn len(&self) -> usize {
        self.displacements.len()
    }

    /// Check whether no vertex is described.
    pub fn is_empty(&self) -> bool {
        self.displacements.is_empty()
    }
}

/// Damped sine wave `distance * sin(d) / d` with `d = |point - attractor|`.
///
/// Yields NaN when the two points coincide.
///
/// # Example
/// ```
/// use meshwarp::algo::ripple::wave_displacement;
/// use nalgebra::Point3;
///
/// let w = wave_displacement(&Point3::new(3.0, 4.0, 0.0), &Point3::origin(), 2.0);
/// assert!((w - 2.0 * 5.0_f64.sin() / 5.0).abs() < 1e-15);
/// ```
#[inline]
pub fn wave_displacement(point: &Point3<f64>, attractor: &Point3<f64>, distance: f64) -> f64 {
    let d = (point - attractor).norm();
    distance * d.sin() / d
}

/// Displace every vertex along its normal by the averaged attractor wave.
///
/// Returns the deformed mesh and the diagnostics of the last iteration. The
/// face list of the output matches the input's for meshes without
/// unreferenced vertices.
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] or [`MeshError::InvalidState`] if the mesh
///   fails [`HalfEdgeMesh::validate`]
/// - [`MeshError::InvalidParameter`] if the options are rejected by
///   [`RippleOptions::validate`], or `attractors` is empty or holds a
///   non-finite coordinate
pub fn attractor_ripple<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    attractors: &[Point3<f64>],
    options: &RippleOptions,
) -> Result<(HalfEdgeMesh<I>, DisplacementResult)> {
    attractor_ripple_with_progress(mesh, attractors, options, &Progress::none())
}

/// Attractor ripple with progress reporting.
pub fn attractor_ripple_with_progress<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    attractors: &[Point3<f64>],
    options: &RippleOptions,
    progress: &Progress,
) -> Result<(HalfEdgeMesh<I>, DisplacementResult)> {
    mesh.validate()?;
    options.validate()?;
    validate_attractors(attractors)?;

    let (mut current, mut result) = ripple_once(mesh, attractors, options)?;
    log_iteration(1, options.iterations, &result);
    progress.report(1, options.iterations, "Attractor ripple");

    for iteration in 2..=options.iterations {
        (current, result) = ripple_once(&current, attractors, options)?;
        log_iteration(iteration, options.iterations, &result);
        progress.report(iteration, options.iterations, "Attractor ripple");
    }

    Ok((current, result))
}

fn validate_attractors(attractors: &[Point3<f64>]) -> Result<()> {
    if attractors.is_empty() {
        return Err(MeshError::invalid_param("attractors", "[]", "at least one attractor is required"));
    }
    if let Some(p) = attractors
        .iter()
        .find(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(MeshError::invalid_param("attractors", p, "coordinates must be finite"));
    }
    Ok(())
}

fn log_iteration(iteration: usize, total: usize, result: &DisplacementResult) {
    let max = result
        .displacements
        .iter()
        .fold(0.0_f64, |m, d| m.max(d.abs()));
    debug!(
        "attractor ripple iteration {}/{}: {} vertices, max |displacement| {}",
        iteration,
        total,
        result.len(),
        max
    );
}

/// Perform one ripple iteration.
fn ripple_once<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    attractors: &[Point3<f64>],
    options: &RippleOptions,
) -> Result<(HalfEdgeMesh<I>, DisplacementResult)> {
    let moved: Vec<(f64, Point3<f64>)> = if options.parallel {
        (0..mesh.num_vertices())
            .into_par_iter()
            .map(|vi| move_vertex(mesh, VertexId::new(vi), attractors, options))
            .collect::<Result<_>>()?
    } else {
        (0..mesh.num_vertices())
            .map(|vi| move_vertex(mesh, VertexId::new(vi), attractors, options))
            .collect::<Result<_>>()?
    };
    let (displacements, positions): (Vec<f64>, Vec<Point3<f64>>) = moved.into_iter().unzip();

    let (_, mut faces) = to_face_vertex(mesh);
    let mut vertices = positions.clone();
    compact(&mut vertices, &mut faces);
    let rippled = build_from_polygons(&vertices, &faces)?;

    Ok((
        rippled,
        DisplacementResult {
            displacements,
            positions,
        },
    ))
}

/// Average wave offset of vertex `v` and its moved position.
fn move_vertex<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    attractors: &[Point3<f64>],
    options: &RippleOptions,
) -> Result<(f64, Point3<f64>)> {
    let p = *mesh.position(v);
    let total: f64 = attractors
        .iter()
        .map(|a| match options.coincident {
            CoincidentAttractor::Limit if p == *a => options.distance,
            _ => wave_displacement(&p, a, options.distance),
        })
        .sum();
    let offset = total / attractors.len() as f64;

    let hit = mesh.closest_point(&p, 0.0).ok_or_else(|| {
        MeshError::InvalidState(format!("no closest point for vertex {}", v.index()))
    })?;
    Ok((offset, p + mesh.normal_at(&hit) * offset))
}
