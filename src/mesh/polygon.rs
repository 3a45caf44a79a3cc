//! Face-vertex polygons.
//!
//! [`Polygon`] is the face record used by the builders and the file loaders:
//! a triangle or a quad given as vertex indices in winding order.

/// A triangle or quad face given as indices into a vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polygon {
    /// Three corners `A, B, C`.
    Triangle([usize; 3]),
    /// Four corners `A, B, C, D`.
    Quad([usize; 4]),
}

impl Polygon {
    /// Build a polygon from a corner slice.
    ///
    /// Returns `None` unless the slice has three or four entries.
    pub fn from_slice(corners: &[usize]) -> Option<Self> {
        match *corners {
            [a, b, c] => Some(Polygon::Triangle([a, b, c])),
            [a, b, c, d] => Some(Polygon::Quad([a, b, c, d])),
            _ => None,
        }
    }

    /// The corner indices in winding order.
    #[inline]
    pub fn corners(&self) -> &[usize] {
        match self {
            Polygon::Triangle(c) => &c[..],
            Polygon::Quad(c) => &c[..],
        }
    }

    /// Number of corners (3 or 4).
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corners().len()
    }

    /// Check whether this face is a quad.
    #[inline]
    pub fn is_quad(&self) -> bool {
        matches!(self, Polygon::Quad(_))
    }

    /// Iterate over the directed boundary edges `(A,B), (B,C), ..., (last,A)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let corners = self.corners();
        let n = corners.len();
        (0..n).map(move |i| (corners[i], corners[(i + 1) % n]))
    }

    /// Check whether any corner is repeated.
    pub fn has_duplicate_corners(&self) -> bool {
        let corners = self.corners();
        (0..corners.len()).any(|i| corners[i + 1..].contains(&corners[i]))
    }

    /// Apply `f` to every corner index.
    pub fn map_corners<F: FnMut(usize) -> usize>(&self, mut f: F) -> Self {
        match *self {
            Polygon::Triangle([a, b, c]) => Polygon::Triangle([f(a), f(b), f(c)]),
            Polygon::Quad([a, b, c, d]) => Polygon::Quad([f(a), f(b), f(c), f(d)]),
        }
    }
}
