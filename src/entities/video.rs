use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A title in the catalogue and its physical copies.
///
/// Invariant: `0 <= available_inventory <= total_inventory`, and
/// `total_inventory - available_inventory` is the number of live rentals.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "videos")]
#[schema(as = Video)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
    pub total_inventory: i32,
    pub available_inventory: i32,
}

impl Model {
    /// Copies currently out with customers.
    pub fn checked_out(&self) -> i32 {
        self.total_inventory - self.available_inventory
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rental::Entity")]
    Rentals,
}

impl Related<super::rental::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rentals.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        super::rental::Relation::Customer.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::rental::Relation::Video.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
