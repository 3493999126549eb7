use crate::{
    db::DbPool,
    errors::ServiceError,
    metrics::RentalMetrics,
    services::rental_ledger::{RentalLedger, RentalReceipt},
};
use chrono::Utc;
use sea_orm::TransactionTrait;
use std::sync::Arc;
use tracing::instrument;

/// Runs ledger operations inside their own transaction and records the outcome.
#[derive(Clone)]
pub struct RentalService {
    db_pool: Arc<DbPool>,
    ledger: Arc<RentalLedger>,
    metrics: Arc<RentalMetrics>,
}

impl RentalService {
    pub fn new(db_pool: Arc<DbPool>, ledger: Arc<RentalLedger>, metrics: Arc<RentalMetrics>) -> Self {
        Self {
            db_pool,
            ledger,
            metrics,
        }
    }

    #[instrument(skip(self))]
    pub async fn check_out(
        &self,
        customer_id: i32,
        video_id: i32,
    ) -> Result<RentalReceipt, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let today = Utc::now().date_naive();

        let receipt = match self
            .ledger
            .check_out(&txn, customer_id, video_id, today)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                if matches!(err, ServiceError::InventoryExhausted { .. }) {
                    self.metrics.record_rejection("inventory_exhausted");
                }
                return Err(err);
            }
        };

        txn.commit().await?;
        self.metrics.record_checkout();
        Ok(receipt)
    }

    #[instrument(skip(self))]
    pub async fn check_in(
        &self,
        customer_id: i32,
        video_id: i32,
    ) -> Result<RentalReceipt, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let receipt = match self.ledger.check_in(&txn, customer_id, video_id).await {
            Ok(receipt) => receipt,
            Err(err) => {
                if matches!(err, ServiceError::NoOutstandingRental { .. }) {
                    self.metrics.record_rejection("no_outstanding_rental");
                }
                return Err(err);
            }
        };

        txn.commit().await?;
        self.metrics.record_check_in();
        Ok(receipt)
    }
}
