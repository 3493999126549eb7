//! Rental bookkeeping.
//!
//! The ledger is the only code that creates or removes rows in `rentals`, and
//! the only code that moves `customers.videos_checked_out_count` and
//! `videos.available_inventory`. Every method takes the caller's connection,
//! normally an open [`sea_orm::DatabaseTransaction`], so the row change and
//! both counter changes commit or roll back together.
//!
//! Row locks are always taken video rows first, then customer rows, each
//! group in ascending id order.

use crate::entities::{customer, rental, video};
use crate::errors::{RecordKind, ServiceError};
use chrono::{Duration, NaiveDate};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

/// Outcome of a checkout or check-in, with the counters as committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RentalReceipt {
    pub customer_id: i32,
    pub video_id: i32,
    /// Present on checkout only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub videos_checked_out_count: i32,
    pub available_inventory: i32,
}

#[derive(Debug, Clone)]
pub struct RentalLedger {
    rental_period: Duration,
}

impl RentalLedger {
    pub fn new(rental_period: Duration) -> Self {
        Self { rental_period }
    }

    pub fn rental_period(&self) -> Duration {
        self.rental_period
    }

    /// Due date for a rental that starts on `today`.
    pub fn due_date_from(&self, today: NaiveDate) -> NaiveDate {
        today + self.rental_period
    }

    /// Lends one copy of `video_id` to `customer_id`.
    ///
    /// The video is resolved before the customer. Availability is claimed
    /// with a guarded decrement so two concurrent checkouts can never take
    /// the last copy twice.
    #[instrument(skip(self, conn))]
    pub async fn check_out<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i32,
        video_id: i32,
        today: NaiveDate,
    ) -> Result<RentalReceipt, ServiceError> {
        let video = lock_video(conn, video_id).await?;
        lock_customer(conn, customer_id).await?;

        if video.available_inventory <= 0 {
            warn!(video_id, customer_id, "Checkout rejected: no copies available");
            return Err(ServiceError::InventoryExhausted { video_id });
        }

        let claimed = video::Entity::update_many()
            .col_expr(
                video::Column::AvailableInventory,
                Expr::col(video::Column::AvailableInventory).sub(1),
            )
            .filter(video::Column::Id.eq(video_id))
            .filter(video::Column::AvailableInventory.gt(0))
            .exec(conn)
            .await?;
        if claimed.rows_affected == 0 {
            warn!(video_id, customer_id, "Checkout lost the race for the last copy");
            return Err(ServiceError::InventoryExhausted { video_id });
        }

        customer::Entity::update_many()
            .col_expr(
                customer::Column::VideosCheckedOutCount,
                Expr::col(customer::Column::VideosCheckedOutCount).add(1),
            )
            .filter(customer::Column::Id.eq(customer_id))
            .exec(conn)
            .await?;

        let due_date = self.due_date_from(today);
        let rental = rental::ActiveModel {
            customer_id: Set(customer_id),
            video_id: Set(video_id),
            due_date: Set(due_date),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let (videos_checked_out_count, available_inventory) =
            committed_counters(conn, customer_id, video_id).await?;

        info!(
            rental_id = rental.id,
            customer_id,
            video_id,
            %due_date,
            videos_checked_out_count,
            available_inventory,
            "Video checked out"
        );

        Ok(RentalReceipt {
            customer_id,
            video_id,
            due_date: Some(due_date),
            videos_checked_out_count,
            available_inventory,
        })
    }

    /// Returns one copy of `video_id` from `customer_id`.
    ///
    /// When the customer holds several copies of the same video, the rental
    /// with the lowest id is closed.
    #[instrument(skip(self, conn))]
    pub async fn check_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i32,
        video_id: i32,
    ) -> Result<RentalReceipt, ServiceError> {
        lock_video(conn, video_id).await?;
        lock_customer(conn, customer_id).await?;

        let outstanding = rental::Entity::find()
            .filter(rental::Column::CustomerId.eq(customer_id))
            .filter(rental::Column::VideoId.eq(video_id))
            .order_by_asc(rental::Column::Id)
            .one(conn)
            .await?
            .ok_or(ServiceError::NoOutstandingRental {
                customer_id,
                video_id,
            })?;

        let removed = rental::Entity::delete_by_id(outstanding.id)
            .exec(conn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(ServiceError::NoOutstandingRental {
                customer_id,
                video_id,
            });
        }

        let released = video::Entity::update_many()
            .col_expr(
                video::Column::AvailableInventory,
                Expr::col(video::Column::AvailableInventory).add(1),
            )
            .filter(video::Column::Id.eq(video_id))
            .filter(
                Expr::col(video::Column::AvailableInventory)
                    .lt(Expr::col(video::Column::TotalInventory)),
            )
            .exec(conn)
            .await?;
        let returned = customer::Entity::update_many()
            .col_expr(
                customer::Column::VideosCheckedOutCount,
                Expr::col(customer::Column::VideosCheckedOutCount).sub(1),
            )
            .filter(customer::Column::Id.eq(customer_id))
            .filter(customer::Column::VideosCheckedOutCount.gt(0))
            .exec(conn)
            .await?;
        if released.rows_affected == 0 || returned.rows_affected == 0 {
            return Err(ServiceError::InternalError(format!(
                "rental counters out of sync for customer {} and video {}",
                customer_id, video_id
            )));
        }

        let (videos_checked_out_count, available_inventory) =
            committed_counters(conn, customer_id, video_id).await?;

        info!(
            rental_id = outstanding.id,
            customer_id,
            video_id,
            videos_checked_out_count,
            available_inventory,
            "Video checked in"
        );

        Ok(RentalReceipt {
            customer_id,
            video_id,
            due_date: None,
            videos_checked_out_count,
            available_inventory,
        })
    }

    /// Releases every rental held by the customer, then deletes the customer.
    ///
    /// Row locks follow the checkout order: the customer's videos in
    /// ascending id order, then the customer. Returns the number of rentals
    /// released.
    #[instrument(skip(self, conn))]
    pub async fn reconcile_customer_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i32,
    ) -> Result<u64, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(conn)
            .await?
            .ok_or(ServiceError::not_found(RecordKind::Customer, customer_id))?;

        let mut locked: BTreeSet<i32> = rentals_of_customer(conn, customer_id)
            .await?
            .iter()
            .map(|held| held.video_id)
            .collect();
        lock_videos(conn, &locked).await?;
        lock_customer(conn, customer_id).await?;

        // rentals opened before the customer lock was taken
        let rentals = rentals_of_customer(conn, customer_id).await?;
        let late: BTreeSet<i32> = rentals
            .iter()
            .map(|held| held.video_id)
            .filter(|id| !locked.contains(id))
            .collect();
        if !late.is_empty() {
            lock_videos(conn, &late).await?;
            locked.extend(late);
        }

        for held in &rentals {
            video::Entity::update_many()
                .col_expr(
                    video::Column::AvailableInventory,
                    Expr::col(video::Column::AvailableInventory).add(1),
                )
                .filter(video::Column::Id.eq(held.video_id))
                .exec(conn)
                .await?;
            debug!(rental_id = held.id, video_id = held.video_id, "Copy returned to stock");
        }

        rental::Entity::delete_many()
            .filter(rental::Column::CustomerId.eq(customer_id))
            .exec(conn)
            .await?;
        customer::Entity::delete_by_id(customer_id)
            .exec(conn)
            .await?;

        let released = rentals.len() as u64;
        info!(customer_id, released, videos = locked.len(), "Customer deleted");
        Ok(released)
    }

    /// Releases every rental of the video, then deletes the video.
    ///
    /// Locks the video, then its renters in ascending id order. Returns the
    /// number of rentals released.
    #[instrument(skip(self, conn))]
    pub async fn reconcile_video_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        video_id: i32,
    ) -> Result<u64, ServiceError> {
        lock_video(conn, video_id).await?;

        let rentals = rental::Entity::find()
            .filter(rental::Column::VideoId.eq(video_id))
            .order_by_asc(rental::Column::Id)
            .all(conn)
            .await?;
        let renters: BTreeSet<i32> = rentals.iter().map(|held| held.customer_id).collect();
        lock_customers(conn, &renters).await?;

        for held in &rentals {
            customer::Entity::update_many()
                .col_expr(
                    customer::Column::VideosCheckedOutCount,
                    Expr::col(customer::Column::VideosCheckedOutCount).sub(1),
                )
                .filter(customer::Column::Id.eq(held.customer_id))
                .filter(customer::Column::VideosCheckedOutCount.gt(0))
                .exec(conn)
                .await?;
            debug!(
                rental_id = held.id,
                customer_id = held.customer_id,
                "Rental closed by video removal"
            );
        }

        rental::Entity::delete_many()
            .filter(rental::Column::VideoId.eq(video_id))
            .exec(conn)
            .await?;
        video::Entity::delete_by_id(video_id).exec(conn).await?;

        let released = rentals.len() as u64;
        info!(video_id, released, "Video deleted");
        Ok(released)
    }
}

async fn lock_video<C: ConnectionTrait>(conn: &C, id: i32) -> Result<video::Model, ServiceError> {
    video::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(ServiceError::not_found(RecordKind::Video, id))
}

async fn lock_customer<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<customer::Model, ServiceError> {
    customer::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(ServiceError::not_found(RecordKind::Customer, id))
}

async fn lock_videos<C: ConnectionTrait>(conn: &C, ids: &BTreeSet<i32>) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    video::Entity::find()
        .filter(video::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(video::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await?;
    Ok(())
}

async fn lock_customers<C: ConnectionTrait>(conn: &C, ids: &BTreeSet<i32>) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    customer::Entity::find()
        .filter(customer::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(customer::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await?;
    Ok(())
}

async fn rentals_of_customer<C: ConnectionTrait>(
    conn: &C,
    customer_id: i32,
) -> Result<Vec<rental::Model>, DbErr> {
    rental::Entity::find()
        .filter(rental::Column::CustomerId.eq(customer_id))
        .order_by_asc(rental::Column::Id)
        .all(conn)
        .await
}

async fn committed_counters<C: ConnectionTrait>(
    conn: &C,
    customer_id: i32,
    video_id: i32,
) -> Result<(i32, i32), ServiceError> {
    let customer = customer::Entity::find_by_id(customer_id)
        .one(conn)
        .await?
        .ok_or(ServiceError::not_found(RecordKind::Customer, customer_id))?;
    let video = video::Entity::find_by_id(video_id)
        .one(conn)
        .await?
        .ok_or(ServiceError::not_found(RecordKind::Video, video_id))?;

    if video.available_inventory < 0
        || video.available_inventory > video.total_inventory
        || customer.videos_checked_out_count < 0
    {
        return Err(ServiceError::InternalError(format!(
            "rental counters out of range for customer {} and video {}",
            customer_id, video_id
        )));
    }

    Ok((customer.videos_checked_out_count, video.available_inventory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_today_plus_rental_period() {
        let ledger = RentalLedger::new(Duration::days(7));
        assert_eq!(ledger.rental_period(), Duration::days(7));
        let today = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        assert_eq!(
            ledger.due_date_from(today),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }

    #[test]
    fn check_in_receipt_omits_due_date() {
        let receipt = RentalReceipt {
            customer_id: 1,
            video_id: 2,
            due_date: None,
            videos_checked_out_count: 0,
            available_inventory: 3,
        };
        let body = serde_json::to_value(&receipt).unwrap();
        assert!(body.get("due_date").is_none());
        assert_eq!(body["available_inventory"], 3);
    }
}
