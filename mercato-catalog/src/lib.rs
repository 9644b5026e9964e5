pub mod product;
pub mod snapshot;

pub use product::{ProductCatalog, ProductRecord};
pub use snapshot::{PriceSnapshot, SnapshotProvider};
