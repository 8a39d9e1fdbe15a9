use crate::error::{GeometryError, Result};
use crate::math::clip_3d::HalfSpace;
use crate::math::{Point3, Vector3, TOLERANCE};

/// A triangle swept along a vector: a convex pentahedron.
///
/// Faces are stored outward, base first, then top, then the three sides.
/// `planes[i]` bounds `faces[i]`.
#[derive(Debug, Clone)]
pub struct Prism {
    base: [Point3; 3],
    faces: Vec<Vec<Point3>>,
    planes: Vec<HalfSpace>,
    volume: f64,
}

impl Prism {
    /// Sweeps `triangle` along `vector`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the triangle has no area or
    /// `vector` is parallel to its plane.
    pub fn new(triangle: &[Point3; 3], vector: &Vector3) -> Result<Self> {
        let [a, b, c] = *triangle;
        let normal = (b - a).cross(&(c - a));
        let scale = (b - a).norm() * (c - a).norm();
        if normal.norm() <= TOLERANCE * scale.max(TOLERANCE) {
            return Err(GeometryError::Degenerate("sweep of a zero-area triangle".into()).into());
        }
        let along = normal.dot(vector) / (normal.norm() * vector.norm());
        if !along.is_finite() || along.abs() <= TOLERANCE {
            return Err(
                GeometryError::Degenerate("sweep vector lies in the triangle plane".into()).into(),
            );
        }

        // Base winds so its normal points against the sweep.
        let base = if along > 0.0 { [a, c, b] } else { [a, b, c] };
        let lifted = base.map(|p| p + vector);

        let mut faces = vec![
            base.to_vec(),
            vec![lifted[0], lifted[2], lifted[1]],
        ];
        for i in 0..3 {
            let j = (i + 1) % 3;
            faces.push(vec![base[j], base[i], lifted[i], lifted[j]]);
        }

        let planes = faces
            .iter()
            .map(|f| {
                let n = (f[1] - f[0]).cross(&(f[2] - f[0]));
                HalfSpace::through(&f[0], &n)
                    .ok_or_else(|| GeometryError::Degenerate("flat prism face".into()).into())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base,
            faces,
            planes,
            volume: 0.5 * normal.dot(vector).abs(),
        })
    }

    /// The swept triangle, wound against the sweep direction.
    #[must_use]
    pub fn base(&self) -> &[Point3; 3] {
        &self.base
    }

    #[must_use]
    pub fn base_centroid(&self) -> Point3 {
        Point3::from((self.base[0].coords + self.base[1].coords + self.base[2].coords) / 3.0)
    }

    /// Base area times the sweep height along the base normal.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Outward face polygons: base, top, then sides.
    #[must_use]
    pub fn faces(&self) -> &[Vec<Point3>] {
        &self.faces
    }

    /// Bounding half-spaces, aligned with [`Prism::faces`].
    #[must_use]
    pub fn planes(&self) -> &[HalfSpace] {
        &self.planes
    }

    /// Whether the prisms share a base vertex.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        self.base.iter().any(|p| other.base.contains(p))
    }
}

/// Union of prisms swept from the triangles of one face.
#[derive(Debug, Clone)]
pub struct SweptVolume {
    prisms: Vec<Prism>,
}

impl SweptVolume {
    /// Sweeps every triangle along `vector`.
    ///
    /// # Errors
    ///
    /// Fails on the first triangle that cannot be swept.
    pub fn new(triangles: &[[Point3; 3]], vector: &Vector3) -> Result<Self> {
        let prisms = triangles
            .iter()
            .map(|t| Prism::new(t, vector))
            .collect::<Result<_>>()?;
        Ok(Self { prisms })
    }

    #[must_use]
    pub fn prisms(&self) -> &[Prism] {
        &self.prisms
    }
}
