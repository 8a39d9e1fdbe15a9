use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EdgeData, OrientedEdge, TopologyStore, VertexData, WireData, WireId};

/// Creates a polyline wire from a sequence of 3D points.
pub struct MakeWire {
    points: Vec<Point3>,
    close: bool,
}

impl MakeWire {
    /// Creates a new `MakeWire` operation.
    ///
    /// With `close` set, an extra edge joins the last point back to the first.
    #[must_use]
    pub fn new(points: Vec<Point3>, close: bool) -> Self {
        Self { points, close }
    }

    /// Executes the operation, creating the wire in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if there are too few points
    /// (2 for an open wire, 3 for a closed one) or two consecutive points
    /// coincide.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        let min_points = if self.close { 3 } else { 2 };
        if self.points.len() < min_points {
            return Err(OperationError::InvalidInput(format!(
                "wire needs at least {min_points} points, got {}",
                self.points.len()
            ))
            .into());
        }

        let n = self.points.len();
        let segments = if self.close { n } else { n - 1 };
        for i in 0..segments {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % n];
            if (b - a).norm() < TOLERANCE {
                return Err(OperationError::InvalidInput(format!(
                    "wire points {i} and {} coincide",
                    (i + 1) % n
                ))
                .into());
            }
        }

        let vertices: Vec<_> = self
            .points
            .iter()
            .map(|&point| store.add_vertex(VertexData { point }))
            .collect();

        let edges = (0..segments)
            .map(|i| {
                let edge = store.add_edge(EdgeData {
                    start: vertices[i],
                    end: vertices[(i + 1) % n],
                });
                OrientedEdge {
                    edge,
                    forward: true,
                }
            })
            .collect();

        Ok(store.add_wire(WireData {
            edges,
            is_closed: self.close,
        }))
    }
}
