use crate::error::Result;
use crate::topology::{SolidId, TopologyStore};

use super::{TessellateFace, TriangleMesh};

/// Tessellates all faces of a solid into a combined triangle mesh.
///
/// `face_ids` of the result index into [`TopologyStore::solid_faces`].
pub struct TessellateSolid {
    solid: SolidId,
}

impl TessellateSolid {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the tessellation, returning a combined triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its faces cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let mut combined = TriangleMesh::default();
        for (index, face_id) in store.solid_faces(self.solid)?.into_iter().enumerate() {
            let mut face_mesh = TessellateFace::new(face_id).execute(store)?;
            face_mesh.face_ids.fill(index);
            combined.merge(&face_mesh);
        }
        Ok(combined)
    }
}
