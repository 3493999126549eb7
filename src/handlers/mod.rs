pub mod common;
pub mod customers;
pub mod rentals;
pub mod videos;

use crate::{
    db::DbPool,
    metrics::RentalMetrics,
    services::{CustomerService, RentalLedger, RentalService, VideoService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerService>,
    pub videos: Arc<VideoService>,
    pub rentals: Arc<RentalService>,
}

impl AppServices {
    /// Wires every service to one shared ledger and metrics registry.
    pub fn new(
        db_pool: Arc<DbPool>,
        ledger: Arc<RentalLedger>,
        metrics: Arc<RentalMetrics>,
    ) -> Self {
        Self {
            customers: Arc::new(CustomerService::new(
                db_pool.clone(),
                ledger.clone(),
                metrics.clone(),
            )),
            videos: Arc::new(VideoService::new(
                db_pool.clone(),
                ledger.clone(),
                metrics.clone(),
            )),
            rentals: Arc::new(RentalService::new(db_pool, ledger, metrics)),
        }
    }
}
