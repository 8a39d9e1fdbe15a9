//! Input checks run before any analysis.

use tracing::warn;

use crate::body::SolidBody;
use crate::error::{AnalysisError, Result};
use crate::math::{Vector3, TOLERANCE};

/// Rejects a body that is not a closed, manifold, positive-volume solid.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidBody`] listing every failed predicate.
pub fn check_body(body: &SolidBody, tolerance: f64) -> Result<()> {
    let reasons = body.validate(tolerance);
    if reasons.is_empty() {
        Ok(())
    } else {
        warn!(?reasons, "body rejected");
        Err(AnalysisError::InvalidBody { reasons }.into())
    }
}

/// Unit direction of a removal vector.
///
/// # Errors
///
/// Returns [`AnalysisError::DegenerateVector`] for zero, near-zero or
/// non-finite vectors.
pub fn unit_vector(vector: &Vector3) -> Result<Vector3> {
    if !vector.iter().all(|c| c.is_finite()) {
        return Err(AnalysisError::DegenerateVector.into());
    }
    vector
        .try_normalize(TOLERANCE)
        .ok_or_else(|| AnalysisError::DegenerateVector.into())
}
