use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::shaping::Extrude;
use crate::topology::{SolidId, TopologyStore};

use super::{MakeFace, MakeWire};

/// Creates an axis-aligned box solid from two corner points.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// Face order: bottom, top, then the sides starting at `y = min`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the box is flat along any axis.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        let size = hi - lo;
        if size.iter().any(|&d| d < TOLERANCE) {
            return Err(OperationError::InvalidInput(format!(
                "box corners must differ on every axis, got size {size:?}"
            ))
            .into());
        }

        let base = vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
        ];
        let wire = MakeWire::new(base, true).execute(store)?;
        let face = MakeFace::new(wire, vec![]).execute(store)?;
        Extrude::new(face, Vector3::new(0.0, 0.0, size.z)).execute(store)
    }
}
