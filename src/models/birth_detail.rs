use crate::entities::birth_detail_entity as bd;
use crate::models::{ChartData, VedicChartResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BirthDetailInput {
    #[schema(example = "Maya Santos")]
    pub name: String,
    #[schema(example = "1994-08-21")]
    pub birth_date: String,
    #[schema(example = "06:45")]
    pub birth_time: String,
    #[schema(example = "Quezon City")]
    pub birth_city: String,
    #[schema(example = "Philippines")]
    pub birth_country: Option<String>,
    #[schema(example = 14.676)]
    pub latitude: f64,
    #[schema(example = 121.0437)]
    pub longitude: f64,
    #[schema(example = "Asia/Manila")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BirthDetailResponse {
    pub id: i64,
    pub name: String,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_city: String,
    pub birth_country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<bd::Model> for BirthDetailResponse {
    fn from(m: bd::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            birth_date: m.birth_date.format("%Y-%m-%d").to_string(),
            birth_time: m.birth_time.format("%H:%M:%S").to_string(),
            birth_city: m.birth_city,
            birth_country: m.birth_country,
            latitude: m.latitude,
            longitude: m.longitude,
            timezone: m.timezone,
            is_active: m.is_active,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveBirthDetailResponse {
    pub birth_detail: BirthDetailResponse,
    pub chart: ChartData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentBirthDetailResponse {
    pub birth_detail: Option<BirthDetailResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveBirthDetailResponse {
    pub birth_detail: BirthDetailResponse,
    pub chart: Option<VedicChartResponse>,
}
