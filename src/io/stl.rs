//! STL (stereolithography) format support.
//!
//! STL only knows triangles: quads are split along their `A-C` diagonal on
//! save, and a loaded mesh is always a triangle mesh.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex, Polygon};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Corners with identical
/// coordinates are merged into one vertex; triangles that collapse as a
/// result are skipped.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::stl;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
        .collect();

    let faces: Vec<Polygon> = stl
        .faces
        .iter()
        .map(|tri| Polygon::Triangle(tri.vertices))
        .filter(|f| !f.has_duplicate_corners())
        .collect();

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_polygons(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::stl;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// stl::save(&mesh, "output.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    let mut triangles: Vec<stl_io::Triangle> = Vec::with_capacity(faces.len() * 2);
    for f in &faces {
        match *f {
            Polygon::Triangle([a, b, c]) => {
                triangles.push(triangle(&vertices[a], &vertices[b], &vertices[c]));
            }
            Polygon::Quad([a, b, c, d]) => {
                triangles.push(triangle(&vertices[a], &vertices[b], &vertices[c]));
                triangles.push(triangle(&vertices[a], &vertices[c], &vertices[d]));
            }
        }
    }

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

fn triangle(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> stl_io::Triangle {
    let n = (p1 - p0)
        .cross(&(p2 - p0))
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros);

    stl_io::Triangle {
        normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
        vertices: [
            stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
            stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
            stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
        ],
    }
}
