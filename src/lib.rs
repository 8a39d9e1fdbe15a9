pub mod analysis;
pub mod body;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod tessellation;
pub mod topology;

pub use analysis::coverage::{Coverage, CoverageReport};
pub use analysis::oriented_box::{OrientedBoxSearch, PrintVolumeFit};
pub use analysis::{AnalysisParams, Diagnostic, FaceStatus};
pub use body::{BrepBody, SolidBody};
pub use error::{DemoldError, Result};
pub use kernel::{GeometryKernel, PolyhedralKernel};
pub use mesh::{MeshBody, MeshFace};
