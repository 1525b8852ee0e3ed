use sea_orm::entity::prelude::*;

/// Snapshot of the most recently published playlist entries
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ranked_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub stream_url: String,
    pub speed_kbps: f64,
    pub resolution_px: i32,
    pub tested_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
