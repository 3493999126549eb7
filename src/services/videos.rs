use crate::{
    db::DbPool,
    entities::{customer, rental, video},
    errors::{RecordKind, ServiceError},
    metrics::RentalMetrics,
    services::{customers::VideoRenter, rental_ledger::RentalLedger},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Writable video fields.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoInput {
    #[validate(length(max = 255, message = "title must be at most 255 characters"))]
    pub title: String,
    pub release_date: NaiveDate,
    #[validate(range(min = 0, message = "total_inventory must not be negative"))]
    pub total_inventory: i32,
}

/// A video a customer currently holds, with that rental's due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RentedVideo {
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
    pub total_inventory: i32,
    pub available_inventory: i32,
    pub due_date: NaiveDate,
}

impl RentedVideo {
    pub(crate) fn from_rental(video: video::Model, rental: &rental::Model) -> Self {
        Self {
            id: video.id,
            title: video.title,
            release_date: video.release_date,
            total_inventory: video.total_inventory,
            available_inventory: video.available_inventory,
            due_date: rental.due_date,
        }
    }
}

#[derive(Clone)]
pub struct VideoService {
    db_pool: Arc<DbPool>,
    ledger: Arc<RentalLedger>,
    metrics: Arc<RentalMetrics>,
}

impl VideoService {
    pub fn new(db_pool: Arc<DbPool>, ledger: Arc<RentalLedger>, metrics: Arc<RentalMetrics>) -> Self {
        Self {
            db_pool,
            ledger,
            metrics,
        }
    }

    /// Lists all videos ordered by id
    #[instrument(skip(self))]
    pub async fn list_videos(&self) -> Result<Vec<video::Model>, ServiceError> {
        let videos = video::Entity::find()
            .order_by_asc(video::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(videos)
    }

    /// Adds a title; every copy starts on the shelf.
    #[instrument(skip(self))]
    pub async fn create_video(&self, input: VideoInput) -> Result<video::Model, ServiceError> {
        input.validate()?;

        let created = video::ActiveModel {
            title: Set(input.title),
            release_date: Set(input.release_date),
            total_inventory: Set(input.total_inventory),
            available_inventory: Set(input.total_inventory),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(video_id = created.id, total_inventory = created.total_inventory, "Video added");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_video(&self, video_id: i32) -> Result<video::Model, ServiceError> {
        video::Entity::find_by_id(video_id)
            .one(&*self.db_pool)
            .await?
            .ok_or(ServiceError::not_found(RecordKind::Video, video_id))
    }

    /// Replaces the video's fields and recomputes availability from the
    /// copies still out. A total below that count is refused.
    #[instrument(skip(self))]
    pub async fn update_video(
        &self,
        video_id: i32,
        input: VideoInput,
    ) -> Result<video::Model, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await?;

        let existing = video::Entity::find_by_id(video_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::not_found(RecordKind::Video, video_id))?;

        let outstanding = rental::Entity::find()
            .filter(rental::Column::VideoId.eq(video_id))
            .count(&txn)
            .await? as i32;

        if input.total_inventory < outstanding {
            warn!(
                video_id,
                total_inventory = input.total_inventory,
                outstanding,
                "Refusing to shrink inventory below copies on loan"
            );
            return Err(ServiceError::InvalidOperation(format!(
                "total_inventory {} is below the {} copies currently rented",
                input.total_inventory, outstanding
            )));
        }

        let mut active: video::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.release_date = Set(input.release_date);
        active.total_inventory = Set(input.total_inventory);
        active.available_inventory = Set(input.total_inventory - outstanding);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(video_id, available_inventory = updated.available_inventory, "Video updated");
        Ok(updated)
    }

    /// Deletes the video, closing every rental of it.
    #[instrument(skip(self))]
    pub async fn delete_video(&self, video_id: i32) -> Result<i32, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let released = self.ledger.reconcile_video_delete(&txn, video_id).await?;
        txn.commit().await?;

        self.metrics.record_reconciled("video", released);
        Ok(video_id)
    }

    /// Customers currently holding the video, one entry per outstanding rental.
    #[instrument(skip(self))]
    pub async fn renters(&self, video_id: i32) -> Result<Vec<VideoRenter>, ServiceError> {
        self.get_video(video_id).await?;

        let rows = rental::Entity::find()
            .filter(rental::Column::VideoId.eq(video_id))
            .order_by_asc(rental::Column::Id)
            .find_also_related(customer::Entity)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(held, customer)| customer.map(|c| VideoRenter::from_rental(c, &held)))
            .collect())
    }
}
