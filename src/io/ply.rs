//! PLY (Stanford polygon) format support.
//!
//! Loads ASCII and binary PLY files through `ply-rs`; saves ASCII. Triangle
//! and quad faces are kept as they are.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex, Polygon};

use super::push_face;

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::ply;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let load_error = |message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = BufReader::new(File::open(path)?);
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| load_error(e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element".to_string()))?;

    let coordinate = |vertex: &DefaultElement, axis: &str| {
        get_float_property(vertex, axis)
            .ok_or_else(|| load_error(format!("vertex missing {} coordinate", axis)))
    };
    let vertices = vertex_element
        .iter()
        .map(|vertex| -> Result<Point3<f64>> {
            Ok(Point3::new(
                coordinate(vertex, "x")?,
                coordinate(vertex, "y")?,
                coordinate(vertex, "z")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element".to_string()))?;

    let mut faces: Vec<Polygon> = Vec::with_capacity(face_element.len());
    for (fi, face) in face_element.iter().enumerate() {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error(format!("face {} has no vertex_indices property", fi)))?;

        push_face(&mut faces, fi, &indices)?;
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces".to_string()));
    }

    build_from_polygons(&vertices, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
///
/// Coordinates are written as `double` so positions survive a round trip.
///
/// # Example
///
/// ```no_run
/// use meshwarp::io::ply;
/// use meshwarp::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by meshwarp")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    // Write vertices
    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    // Write faces
    for f in &faces {
        write!(writer, "{}", f.corner_count())?;
        for &vi in f.corners() {
            write!(writer, " {}", vi)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_save_and_load_mixed_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.ply");

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.25),
        ];
        let faces = vec![Polygon::Quad([0, 1, 2, 3]), Polygon::Triangle([1, 4, 2])];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        save(&mesh, &path).unwrap();
        let loaded: HalfEdgeMesh = load(&path).unwrap();

        assert_eq!(to_face_vertex(&loaded), to_face_vertex(&mesh));
    }

    #[test]
    fn test_load_missing_faces_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n\
             property float y\nproperty float z\nend_header\n0 0 0\n",
        )
        .unwrap();

        let err = load::<_, u32>(&path).unwrap_err();
        assert!(matches!(err, MeshError::LoadError { .. }));
    }

    #[test]
    fn test_load_two_corner_face_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\n\
             property float y\nproperty float z\nelement face 2\n\
             property list uchar int vertex_indices\nend_header\n\
             0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n2 0 1\n",
        )
        .unwrap();

        let err = load::<_, u32>(&path).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFace { face: 1, corners: 2 }));
    }
}
