use thiserror::Error;

/// Top-level error type for the demold analysis engine.
#[derive(Debug, Error)]
pub enum DemoldError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to topological operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("wire is not closed")]
    WireNotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to modelling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Errors raised by the collision analyses.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The body failed one or more validity predicates and was not analysed.
    #[error("body rejected: {}", reasons.join("; "))]
    InvalidBody { reasons: Vec<String> },

    #[error("removal vector is zero-length or not finite")]
    DegenerateVector,

    #[error("face index {index} is out of range (body has {count} faces)")]
    FaceOutOfRange { index: usize, count: usize },

    /// Adaptive sampling reached its resolution cap without enough interior points.
    #[error("sampling did not converge below resolution {resolution}")]
    SamplingExhausted { resolution: u32 },

    #[error("could not construct intermediate geometry: {0}")]
    Construction(String),
}

/// Convenience type alias for results using [`DemoldError`].
pub type Result<T> = std::result::Result<T, DemoldError>;
