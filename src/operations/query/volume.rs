use crate::error::Result;
use crate::tessellation::{TessellateSolid, TriangleMesh};
use crate::topology::{SolidId, TopologyStore};

/// Computes the signed volume of a solid.
///
/// Uses tessellation and the signed tetrahedron method. For each triangle,
/// computes `(1/6) * v0 . (v1 x v2)` and sums over all triangles. The result
/// is positive when the faces are oriented outward and negative when the
/// whole boundary is inside out.
pub struct Volume {
    solid: SolidId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        let mesh = TessellateSolid::new(self.solid).execute(store)?;
        Ok(Self::of_mesh(&mesh))
    }

    /// Signed volume enclosed by a closed triangle mesh, taking the winding
    /// as given.
    #[must_use]
    pub fn of_mesh(mesh: &TriangleMesh) -> f64 {
        mesh.triangles()
            .map(|[v0, v1, v2]| v0.coords.dot(&v1.coords.cross(&v2.coords)))
            .sum::<f64>()
            / 6.0
    }
}
