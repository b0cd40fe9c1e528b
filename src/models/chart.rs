use crate::entities::vedic_chart_entity as vc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

pub const AYANAMSA_TYPE_LAHIRI: &str = "LAHIRI";

/// Name for a Prokerala ayanamsa code.
pub fn ayanamsa_label(code: i32) -> String {
    match code {
        1 => AYANAMSA_TYPE_LAHIRI.to_string(),
        3 => "RAMAN".to_string(),
        5 => "KP".to_string(),
        other => format!("AYANAMSA_{other}"),
    }
}

/// Chart payload as persisted; blobs come straight from the astrology API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartData {
    #[schema(value_type = Object)]
    pub d1_rasi_chart: Value,
    #[schema(value_type = Object)]
    pub d9_navamsa_chart: Value,
    #[schema(value_type = Object)]
    pub d10_dasamsa_chart: Value,
    #[schema(value_type = Object)]
    pub planetary_positions: Value,
    #[schema(value_type = Object)]
    pub nakshatras: Value,
    #[schema(value_type = Object)]
    pub vimshottari_dasha: Value,
    #[schema(value_type = Object)]
    pub houses: Value,
    pub ayanamsa_value: f64,
    pub ayanamsa_type: String,
}

impl ChartData {
    /// Stored when the astrology API is unavailable so onboarding can finish.
    pub fn placeholder() -> Self {
        Self {
            d1_rasi_chart: json!({}),
            d9_navamsa_chart: json!({}),
            d10_dasamsa_chart: json!({}),
            planetary_positions: json!({}),
            nakshatras: json!({}),
            vimshottari_dasha: json!({}),
            houses: json!({}),
            ayanamsa_value: 24.0,
            ayanamsa_type: AYANAMSA_TYPE_LAHIRI.to_string(),
        }
    }
}

impl From<vc::Model> for ChartData {
    fn from(m: vc::Model) -> Self {
        Self {
            d1_rasi_chart: m.d1_rasi_chart,
            d9_navamsa_chart: m.d9_navamsa_chart,
            d10_dasamsa_chart: m.d10_dasamsa_chart,
            planetary_positions: m.planetary_positions,
            nakshatras: m.nakshatras,
            vimshottari_dasha: m.vimshottari_dasha,
            houses: m.houses,
            ayanamsa_value: m.ayanamsa_value,
            ayanamsa_type: m.ayanamsa_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VedicChartResponse {
    pub id: i64,
    pub birth_detail_id: i64,
    #[serde(flatten)]
    pub data: ChartData,
    pub created_at: DateTime<Utc>,
}

impl From<vc::Model> for VedicChartResponse {
    fn from(m: vc::Model) -> Self {
        let id = m.id;
        let birth_detail_id = m.birth_detail_id;
        let created_at = m.created_at.unwrap_or_else(Utc::now);
        Self {
            id,
            birth_detail_id,
            data: ChartData::from(m),
            created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalculateChartRequest {
    pub birth_detail_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalculateChartResponse {
    pub vedic_chart_id: i64,
}
