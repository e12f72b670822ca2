//! Business logic services of the Gold Bar Inventory Engine

pub mod batch;
pub mod client;
pub mod delivery;
pub mod forward;
pub mod matcher;
pub mod settlement;
pub mod stock;

pub use batch::BatchService;
pub use client::ClientService;
pub use delivery::DeliveryService;
pub use forward::ForwardService;
pub use stock::StockService;
