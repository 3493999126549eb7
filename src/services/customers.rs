use crate::{
    db::DbPool,
    entities::{customer, rental, video},
    errors::{RecordKind, ServiceError},
    metrics::RentalMetrics,
    services::{rental_ledger::RentalLedger, videos::RentedVideo},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Writable customer fields.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(max = 255, message = "name must be at most 255 characters"))]
    pub name: String,
    #[validate(length(max = 255, message = "postal_code must be at most 255 characters"))]
    pub postal_code: String,
    #[validate(length(max = 255, message = "phone must be at most 255 characters"))]
    pub phone: String,
}

/// A customer currently holding a copy of some video, with that rental's due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoRenter {
    pub id: i32,
    pub name: String,
    pub postal_code: String,
    pub phone: String,
    pub registered_at: Option<DateTime<Utc>>,
    pub videos_checked_out_count: i32,
    pub due_date: NaiveDate,
}

impl VideoRenter {
    pub(crate) fn from_rental(customer: customer::Model, rental: &rental::Model) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            postal_code: customer.postal_code,
            phone: customer.phone,
            registered_at: customer.registered_at,
            videos_checked_out_count: customer.videos_checked_out_count,
            due_date: rental.due_date,
        }
    }
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    ledger: Arc<RentalLedger>,
    metrics: Arc<RentalMetrics>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, ledger: Arc<RentalLedger>, metrics: Arc<RentalMetrics>) -> Self {
        Self {
            db_pool,
            ledger,
            metrics,
        }
    }

    /// Lists all customers ordered by id
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<customer::Model>, ServiceError> {
        let customers = customer::Entity::find()
            .order_by_asc(customer::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(customers)
    }

    /// Registers a new customer with no rentals
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        input: CustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let created = customer::ActiveModel {
            name: Set(input.name),
            postal_code: Set(input.postal_code),
            phone: Set(input.phone),
            registered_at: Set(Some(Utc::now())),
            videos_checked_out_count: Set(0),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(customer_id = created.id, "Customer registered");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db_pool)
            .await?
            .ok_or(ServiceError::not_found(RecordKind::Customer, customer_id))
    }

    /// Replaces the contact fields of an already loaded customer. The rental
    /// count is untouched.
    #[instrument(skip(self, existing), fields(customer_id = existing.id))]
    pub async fn update_customer(
        &self,
        existing: customer::Model,
        input: CustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let customer_id = existing.id;
        let mut active: customer::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.postal_code = Set(input.postal_code);
        active.phone = Set(input.phone);

        let updated = active.update(&*self.db_pool).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => ServiceError::not_found(RecordKind::Customer, customer_id),
            other => ServiceError::DatabaseError(other),
        })?;
        info!(customer_id, "Customer updated");
        Ok(updated)
    }

    /// Deletes the customer, returning every copy they held to stock.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: i32) -> Result<i32, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let released = self
            .ledger
            .reconcile_customer_delete(&txn, customer_id)
            .await?;
        txn.commit().await?;

        self.metrics.record_reconciled("customer", released);
        Ok(customer_id)
    }

    /// Videos the customer currently holds, one entry per outstanding rental.
    #[instrument(skip(self))]
    pub async fn rented_videos(&self, customer_id: i32) -> Result<Vec<RentedVideo>, ServiceError> {
        self.get_customer(customer_id).await?;

        let rows = rental::Entity::find()
            .filter(rental::Column::CustomerId.eq(customer_id))
            .order_by_asc(rental::Column::Id)
            .find_also_related(video::Entity)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(held, video)| video.map(|v| RentedVideo::from_rental(v, &held)))
            .collect())
    }
}
