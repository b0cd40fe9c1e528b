use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

// Chart columns hold the astrology API responses verbatim.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vedic_charts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub birth_detail_id: i64,
    pub d1_rasi_chart: Json,
    pub d9_navamsa_chart: Json,
    pub d10_dasamsa_chart: Json,
    pub planetary_positions: Json,
    pub nakshatras: Json,
    pub vimshottari_dasha: Json,
    pub houses: Json,
    pub ayanamsa_value: f64,
    pub ayanamsa_type: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
