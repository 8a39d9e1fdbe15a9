mod bounding_box;
mod is_valid;
mod volume;

pub use bounding_box::Aabb;
pub use is_valid::IsValid;
pub use volume::Volume;
