//! Closest-point and surface-normal queries.
//!
//! [`HalfEdgeMesh::closest_point`] finds the point of the surface nearest to a
//! query position and records how that point is expressed in terms of the
//! corners of the face it lies on. [`HalfEdgeMesh::normal_at`] then blends the
//! corner vertex normals with those weights, giving a normal that varies
//! smoothly across faces.
//!
//! Quads are handled as the two triangles `(A, B, C)` and `(A, C, D)`.

use nalgebra::{Point3, Vector3};

use super::halfedge::{unit_or_zero, HalfEdgeMesh};
use super::index::{FaceId, MeshIndex};
use super::polygon::Polygon;

/// A point on the surface of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint<I: MeshIndex = u32> {
    /// The face the point lies on.
    pub face: FaceId<I>,

    /// Position of the point.
    pub point: Point3<f64>,

    /// Distance from the query position to `point`.
    pub distance: f64,

    /// Interpolation weights of the face corners, in winding order.
    /// The fourth entry is zero for triangles.
    pub weights: [f64; 4],
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Find the point of the mesh surface closest to `query`.
    ///
    /// Every face is tested; on ties the lowest face index wins. A
    /// `max_distance` of zero or less places no limit on the search.
    ///
    /// Returns `None` if the mesh has no faces or nothing lies within
    /// `max_distance`.
    ///
    /// # Example
    /// ```
    /// use meshwarp::mesh::{build_from_triangles, HalfEdgeMesh};
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
    ///
    /// let hit = mesh.closest_point(&Point3::new(0.25, 0.25, 2.0), 0.0).unwrap();
    /// assert!((hit.point - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
    /// assert!((hit.distance - 2.0).abs() < 1e-12);
    /// ```
    pub fn closest_point(&self, query: &Point3<f64>, max_distance: f64) -> Option<SurfacePoint<I>> {
        let mut best: Option<SurfacePoint<I>> = None;
        for f in self.face_ids() {
            let candidate = self.closest_point_on_face(f, query);
            let better = best
                .as_ref()
                .map_or(true, |b| b.distance.is_nan() || candidate.distance < b.distance);
            if better {
                best = Some(candidate);
            }
        }

        best.filter(|b| max_distance <= 0.0 || b.distance <= max_distance)
    }

    /// Find the point of a single face closest to `query`.
    pub fn closest_point_on_face(&self, f: FaceId<I>, query: &Point3<f64>) -> SurfacePoint<I> {
        let (point, weights) = match self.face_polygon(f) {
            Polygon::Triangle([a, b, c]) => {
                let (p, [wa, wb, wc]) =
                    closest_point_on_triangle(query, self.pos(a), self.pos(b), self.pos(c));
                (p, [wa, wb, wc, 0.0])
            }
            Polygon::Quad([a, b, c, d]) => {
                let (p1, [w1a, w1b, w1c]) =
                    closest_point_on_triangle(query, self.pos(a), self.pos(b), self.pos(c));
                let (p2, [w2a, w2c, w2d]) =
                    closest_point_on_triangle(query, self.pos(a), self.pos(c), self.pos(d));
                if (p2 - query).norm_squared() < (p1 - query).norm_squared() {
                    (p2, [w2a, 0.0, w2c, w2d])
                } else {
                    (p1, [w1a, w1b, w1c, 0.0])
                }
            }
        };

        SurfacePoint {
            face: f,
            point,
            distance: (point - query).norm(),
            weights,
        }
    }

    /// Surface normal at a point returned by [`closest_point`](Self::closest_point).
    ///
    /// The corner vertex normals are blended with the point's weights and the
    /// result is normalized. A blend that cancels out exactly yields the zero
    /// vector.
    pub fn normal_at(&self, point: &SurfacePoint<I>) -> Vector3<f64> {
        let blended = self
            .face_vertices(point.face)
            .zip(point.weights.iter())
            .fold(Vector3::zeros(), |acc, (v, &w)| acc + self.normal(v) * w);
        unit_or_zero(blended)
    }

    #[inline]
    fn pos(&self, index: usize) -> &Point3<f64> {
        &self.vertices[index].position
    }
}

/// Closest point on triangle `abc` to `p`, with barycentric weights of `a`, `b`, `c`.
///
/// Classifies `p` against the Voronoi regions of the triangle's vertices and
/// edges before falling back to the interior projection.
pub(crate) fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (Point3<f64>, [f64; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (*a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (*b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (*c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, build_from_triangles, VertexId};

    fn right_triangle() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    fn open_box_corner() -> HalfEdgeMesh {
        // Two unit quads meeting at a right angle along the x axis.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3], [1, 0, 5, 4]]).unwrap()
    }

    #[test]
    fn test_triangle_regions() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        // Vertex region
        let (p, w) = closest_point_on_triangle(&Point3::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert_eq!(p, a);
        assert_eq!(w, [1.0, 0.0, 0.0]);

        // Edge region
        let (p, w) = closest_point_on_triangle(&Point3::new(0.5, -2.0, 1.0), &a, &b, &c);
        assert!((p - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        assert!((w[0] - 0.5).abs() < 1e-12 && (w[1] - 0.5).abs() < 1e-12 && w[2] == 0.0);

        // Hypotenuse region
        let (p, w) = closest_point_on_triangle(&Point3::new(1.0, 1.0, 0.0), &a, &b, &c);
        assert!((p - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
        assert!(w[0].abs() < 1e-12);

        // Interior
        let (p, w) = closest_point_on_triangle(&Point3::new(0.2, 0.3, -4.0), &a, &b, &c);
        assert!((p - Point3::new(0.2, 0.3, 0.0)).norm() < 1e-12);
        assert!((w[0] - 0.5).abs() < 1e-12);
        assert!((w[1] - 0.2).abs() < 1e-12);
        assert!((w[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_on_vertex() {
        let mesh = right_triangle();
        let hit = mesh.closest_point(&Point3::new(1.0, 0.0, 0.0), 0.0).unwrap();
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.weights, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(mesh.normal_at(&hit), *mesh.normal(VertexId::new(1)));
    }

    #[test]
    fn test_max_distance_limits_search() {
        let mesh = right_triangle();
        let query = Point3::new(0.25, 0.25, 3.0);
        assert!(mesh.closest_point(&query, 1.0).is_none());
        assert!(mesh.closest_point(&query, 5.0).is_some());
        assert!(mesh.closest_point(&query, 0.0).is_some());
    }

    #[test]
    fn test_empty_mesh_has_no_closest_point() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert!(mesh.closest_point(&Point3::origin(), 0.0).is_none());
    }

    #[test]
    fn test_closest_point_picks_nearest_quad() {
        let mesh = open_box_corner();

        let hit = mesh.closest_point(&Point3::new(0.5, 0.6, 0.1), 0.0).unwrap();
        assert_eq!(hit.face, FaceId::new(0));
        assert!((hit.point - Point3::new(0.5, 0.6, 0.0)).norm() < 1e-12);

        let hit = mesh.closest_point(&Point3::new(0.5, 0.1, 0.6), 0.0).unwrap();
        assert_eq!(hit.face, FaceId::new(1));
        assert!((hit.point - Point3::new(0.5, 0.0, 0.6)).norm() < 1e-12);
    }

    #[test]
    fn test_quad_weights_reproduce_point() {
        let mesh = open_box_corner();
        let query = Point3::new(0.8, 0.3, 0.5);
        let hit = mesh.closest_point_on_face(FaceId::new(0), &query);

        let weight_sum: f64 = hit.weights.iter().sum();
        assert!((weight_sum - 1.0).abs() < 1e-12);

        let rebuilt = mesh
            .face_vertices(hit.face)
            .zip(hit.weights.iter())
            .fold(Vector3::zeros(), |acc, (v, &w)| acc + mesh.position(v).coords * w);
        assert!((Point3::from(rebuilt) - hit.point).norm() < 1e-12);
    }

    #[test]
    fn test_normal_at_blends_vertex_normals() {
        let mesh = open_box_corner();

        // Away from the fold the normal leans toward the quad's own +z.
        let hit = mesh.closest_point(&Point3::new(0.5, 0.9, 0.3), 0.0).unwrap();
        assert_eq!(hit.face, FaceId::new(0));
        let n = mesh.normal_at(&hit);
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!(n.z > 0.0);

        // On the shared edge the normal bisects the two faces (+z and +y).
        let hit = mesh.closest_point(&Point3::new(0.5, -1.0, -1.0), 0.0).unwrap();
        let n = mesh.normal_at(&hit);
        let expected = Vector3::new(0.0, 1.0, 1.0).normalize();
        assert!((n - expected).norm() < 1e-12);
    }
}
