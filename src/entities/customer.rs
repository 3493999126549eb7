use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered store customer.
///
/// `videos_checked_out_count` always equals the number of live rows in
/// `rentals` referencing this customer; only the rental ledger writes it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "customers")]
#[schema(as = Customer)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub postal_code: String,
    pub phone: String,
    pub registered_at: Option<DateTime<Utc>>,
    pub videos_checked_out_count: i32,
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

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        super::rental::Relation::Video.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::rental::Relation::Customer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
