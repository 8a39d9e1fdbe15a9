use crate::error::{Result, TopologyError};
use crate::geometry::Plane;
use crate::math::polygon_3d::{newell_normal, polygon_centroid_3d};
use crate::topology::{FaceData, FaceId, FaceSurface, TopologyStore, WireId};

/// Creates a planar face bounded by closed wires.
///
/// The supporting plane passes through the area centroid of the outer wire
/// and its normal follows the outer wire's winding (right-hand rule). The
/// wires are not required to be exactly coplanar; planarity is checked by
/// [`IsValid`](crate::operations::query::IsValid).
pub struct MakeFace {
    outer_wire: WireId,
    inner_wires: Vec<WireId>,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation.
    #[must_use]
    pub fn new(outer_wire: WireId, inner_wires: Vec<WireId>) -> Self {
        Self {
            outer_wire,
            inner_wires,
        }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::WireNotClosed`] if any wire is open, or a
    /// geometry error if the outer wire encloses no area.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        for &wire in std::iter::once(&self.outer_wire).chain(&self.inner_wires) {
            if !store.wire(wire)?.is_closed {
                return Err(TopologyError::WireNotClosed.into());
            }
        }

        let outer = store.wire_points(self.outer_wire)?;
        let normal = newell_normal(&outer)?;
        let plane = Plane::from_normal(polygon_centroid_3d(&outer), normal)?;

        Ok(store.add_face(FaceData {
            surface: FaceSurface::Plane(plane),
            outer_wire: self.outer_wire,
            inner_wires: self.inner_wires.clone(),
            same_sense: true,
        }))
    }
}
