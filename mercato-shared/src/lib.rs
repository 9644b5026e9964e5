pub mod geo;
pub mod lifecycle;
pub mod slug;

pub use geo::GeoPoint;
pub use lifecycle::{Lifecycle, RecordStatus};
pub use slug::Slug;
