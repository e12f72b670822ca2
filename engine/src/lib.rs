//! Gold Bar Inventory & Settlement Engine
//!
//! Tracks physical gold-bar inventory for a trading operation: import
//! batches, consignment deliveries, forward-sold commitments, and the
//! settlement of delivered bars into priced, invoiced, paid sales.
//!
//! The engine is stateless between calls except for the persisted entities
//! themselves: it is driven synchronously by one caller at a time over a
//! document store that offers per-entity CRUD only (see [`store::Store`]).
//! Availability checks are read-then-write without a cross-operation lock,
//! so two concurrent `create_delivery` calls against the same batch and
//! weight class could both pass validation and jointly over-allocate; one
//! human operator drives mutations at a time.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{BatchService, ClientService, DeliveryService, ForwardService, StockService};
use store::Store;

/// Engine façade bundling the store and configuration, handing out services
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn batches(&self) -> BatchService {
        BatchService::new(self.store.clone())
    }

    pub fn clients(&self) -> ClientService {
        ClientService::new(self.store.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.store.clone())
    }

    pub fn deliveries(&self) -> DeliveryService {
        DeliveryService::new(self.store.clone(), self.config.clone())
    }

    pub fn forwards(&self) -> ForwardService {
        ForwardService::new(self.store.clone())
    }
}

/// Initialize tracing for the embedding application or the test suite
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
