//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` positions and `f` faces. Texture coordinates,
//! normals, groups and materials are ignored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex, Polygon};

use super::push_face;

/// Load a mesh from an OBJ file.
///
/// All objects in the file are merged into a single mesh.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::obj;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Polygon> = Vec::new();
    let mut face_index = 0;

    for model in &models {
        let mesh = &model.mesh;
        let offset = vertices.len();

        vertices.extend(mesh.positions.chunks_exact(3).map(|p| {
            Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))
        }));

        let indices: Vec<usize> = mesh.indices.iter().map(|&i| offset + i as usize).collect();
        if mesh.face_arities.is_empty() {
            for tri in indices.chunks_exact(3) {
                push_face(&mut faces, face_index, tri)?;
                face_index += 1;
            }
        } else {
            let mut start = 0;
            for &arity in &mesh.face_arities {
                let end = start + arity as usize;
                let corners = indices.get(start..end).ok_or_else(|| MeshError::LoadError {
                    path: path.to_path_buf(),
                    message: format!("face arity {} exceeds the index list", arity),
                })?;
                push_face(&mut faces, face_index, corners)?;
                face_index += 1;
                start = end;
            }
        }
    }

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no faces".to_string(),
        });
    }

    build_from_polygons(&vertices, &faces)
}

/// Save a mesh to an OBJ file.
///
/// Quads are written as four-corner faces.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::obj;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# Generated by meshwarp")?;
    writeln!(writer, "# {} vertices, {} faces", vertices.len(), faces.len())?;

    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        write!(writer, "f")?;
        for &vi in f.corners() {
            write!(writer, " {}", vi + 1)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
