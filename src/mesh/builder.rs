//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists, converts them
//! back, and removes vertices that no face references.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::polygon::Polygon;
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle/quad faces.
///
/// Vertex normals are computed before the mesh is returned.
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] if `faces` is empty
/// - [`MeshError::InvalidVertexIndex`] if a face points past `vertices`
/// - [`MeshError::DegenerateFace`] if a face repeats a corner
/// - [`MeshError::NonManifoldEdge`] if two faces share a directed edge
///
/// # Example
/// ```
/// use meshwarp::mesh::{build_from_polygons, HalfEdgeMesh, Polygon};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(2.0, 0.5, 0.0),
/// ];
/// let faces = vec![Polygon::Quad([0, 1, 2, 3]), Polygon::Triangle([1, 4, 2])];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 5);
/// assert_eq!(mesh.num_faces(), 2);
/// ```
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Polygon],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.corners().iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face.has_duplicate_corners() {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Map from directed edge (v0, v1) to the interior half-edge running along it
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();

    // First pass: one half-edge per face corner, linked in a cycle
    for (fi, face) in faces.iter().enumerate() {
        let corners = face.corners();
        let n = corners.len();
        let first = mesh.num_halfedges();
        let face_id = FaceId::<I>::new(fi);

        mesh.faces.push(Face::new(HalfEdgeId::new(first)));

        for (k, (v0, v1)) in face.edges().enumerate() {
            let he = HalfEdgeId::<I>::new(first + k);
            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[v0],
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(first + (k + 1) % n),
                prev: HalfEdgeId::new(first + (k + n - 1) % n),
                face: face_id,
            });

            // Overwritten for shared vertices; fixed up for the boundary below
            mesh.vertex_mut(vertex_ids[v0]).halfedge = he;

            if edge_map.insert((v0, v1), he).is_some() {
                return Err(MeshError::NonManifoldEdge { v0, v1 });
            }
        }
    }

    // Second pass: link twins in face order, creating boundary half-edges
    for face in faces {
        for (v0, v1) in face.edges() {
            let he = edge_map[&(v0, v1)];
            if mesh.twin(he).is_valid() {
                continue;
            }

            if let Some(&twin) = edge_map.get(&(v1, v0)) {
                mesh.halfedge_mut(he).twin = twin;
                mesh.halfedge_mut(twin).twin = he;
            } else {
                let boundary_he = HalfEdgeId::<I>::new(mesh.num_halfedges());
                mesh.halfedges.push(HalfEdge {
                    origin: vertex_ids[v1],
                    twin: he,
                    ..HalfEdge::new()
                });
                mesh.halfedge_mut(he).twin = boundary_he;
            }
        }
    }

    // Third pass: link boundary half-edges into loops
    link_boundary_loops(&mut mesh);

    // Fourth pass: ensure boundary vertices point to boundary half-edges
    fix_boundary_vertex_halfedges(&mut mesh);

    mesh.rebuild_normals();

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use meshwarp::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    let polygons: Vec<Polygon> = faces.iter().map(|&f| Polygon::Triangle(f)).collect();
    build_from_polygons(vertices, &polygons)
}

/// Build a half-edge mesh from vertices and quad faces (`[A, B, C, D]`, counter-clockwise).
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    let polygons: Vec<Polygon> = faces.iter().map(|&f| Polygon::Quad(f)).collect();
    build_from_polygons(vertices, &polygons)
}

/// Link boundary half-edges into loops.
///
/// The successor of a boundary half-edge is found by rotating around its
/// destination through interior half-edges, so every wedge of a vertex
/// shared by otherwise disconnected fans gets its own loop.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let limit = mesh.num_halfedges();
    for &he in &boundary_hes {
        // Interior half-edge leaving the destination of `he`
        let mut out = mesh.twin(he);
        for _ in 0..limit {
            let candidate = mesh.twin(mesh.prev(out));
            if mesh.is_boundary_halfedge(candidate) {
                mesh.halfedge_mut(he).next = candidate;
                mesh.halfedge_mut(candidate).prev = he;
                break;
            }
            out = candidate;
        }
    }
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let limit = mesh.num_halfedges();
    for vid in mesh.vertex_ids().collect::<Vec<_>>() {
        let start_he = mesh.vertex(vid).halfedge;
        if !start_he.is_valid() {
            continue;
        }

        let mut he = start_he;
        for _ in 0..limit {
            if mesh.is_boundary_halfedge(he) {
                mesh.vertex_mut(vid).halfedge = he;
                break;
            }
            he = mesh.next(mesh.twin(he));
            if he == start_he || !he.is_valid() {
                break;
            }
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns `(vertices, faces)` with faces in mesh order and corners in winding order.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Polygon>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
    let faces: Vec<Polygon> = mesh.face_ids().map(|f| mesh.face_polygon(f)).collect();
    (vertices, faces)
}

/// Remove vertices that no face references and reindex the faces.
///
/// Surviving vertices keep their relative order. Returns the number of
/// vertices removed.
pub fn compact(vertices: &mut Vec<Point3<f64>>, faces: &mut [Polygon]) -> usize {
    let mut used = vec![false; vertices.len()];
    for face in faces.iter() {
        for &vi in face.corners() {
            used[vi] = true;
        }
    }

    let removed = used.iter().filter(|&&u| !u).count();
    if removed == 0 {
        return 0;
    }

    let mut remap = vec![usize::MAX; vertices.len()];
    let mut next = 0;
    for (old, &keep) in used.iter().enumerate() {
        if keep {
            remap[old] = next;
            vertices[next] = vertices[old];
            next += 1;
        }
    }
    vertices.truncate(next);

    for face in faces.iter_mut() {
        *face = face.map_corners(|vi| remap[vi]);
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (vertices, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    fn two_quads() -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
        // Two quads sharing the edge 1-2
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_two_quads() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        // 8 interior half-edges + 6 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 14);
        assert!(mesh.is_valid());
        assert!(mesh.is_quad_mesh());
    }

    #[test]
    fn test_boundary_loop_is_closed() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        let start = mesh
            .halfedge_ids()
            .find(|&he| mesh.is_boundary_halfedge(he))
            .unwrap();
        let mut he = start;
        let mut steps = 0;
        loop {
            assert!(mesh.is_boundary_halfedge(he));
            he = mesh.next(he);
            steps += 1;
            if he == start {
                break;
            }
            assert!(steps <= 6);
        }
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_bowtie_vertex() {
        // Two triangles touching only at vertex 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh<u32> =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_boundary_vertex(VertexId::new(0)));

        // Each triangle gets its own three-edge boundary loop
        for start in mesh.halfedge_ids().filter(|&he| mesh.is_boundary_halfedge(he)) {
            let mut he = start;
            for _ in 0..3 {
                assert!(mesh.is_boundary_halfedge(he));
                assert_eq!(mesh.origin(mesh.next(he)), mesh.dest(he));
                he = mesh.next(he);
            }
            assert_eq!(he, start);
        }
    }

    #[test]
    fn test_roundtrip_preserves_faces() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(out_verts, vertices);
        assert_eq!(out_faces, vec![Polygon::Quad([0, 1, 2, 3]), Polygon::Quad([1, 4, 5, 2])]);
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));

        let (vertices, _) = two_quads();
        let result: Result<HalfEdgeMesh<u32>> = build_from_quads(&vertices, &[[0, 1, 0, 3]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_empty_faces() {
        let (vertices, _) = single_triangle();
        let result: Result<HalfEdgeMesh<u32>> = build_from_polygons(&vertices, &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_inconsistent_winding_is_rejected() {
        let (vertices, _) = two_triangles();
        // Both faces traverse 0 -> 1
        let result: Result<HalfEdgeMesh<u32>> =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_compact_removes_orphans() {
        let mut vertices = vec![
            Point3::new(9.0, 9.0, 9.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(7.0, 7.0, 7.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut faces = vec![Polygon::Triangle([1, 2, 4])];

        let removed = compact(&mut vertices, &mut faces);

        assert_eq!(removed, 2);
        assert_eq!(
            vertices,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ]
        );
        assert_eq!(faces, vec![Polygon::Triangle([0, 1, 2])]);
    }
}
