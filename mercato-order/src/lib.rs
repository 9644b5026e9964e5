pub mod delivery;
pub mod manager;
pub mod models;
pub mod store;
pub mod workflow;

pub use delivery::{Delivery, DeliveryNote, DeliveryStatus};
pub use manager::{OrderLine, OrderService};
pub use models::{Order, OrderItem, OrderStatus, Payment};
pub use store::MarketStore;
pub use workflow::DeliveryService;
