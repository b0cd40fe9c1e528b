use crate::entities::{birth_detail_entity as bd, vedic_chart_entity as vc};
use crate::error::{AppError, AppResult};
use crate::external::{ChartResponses, ProkeralaClient};
use crate::models::{CalculateChartResponse, ChartData, ayanamsa_label};
use crate::utils::birth_datetime_iso;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct ChartService {
    pool: DatabaseConnection,
    prokerala: ProkeralaClient,
}

impl ChartService {
    pub fn new(pool: DatabaseConnection, prokerala: ProkeralaClient) -> Self {
        Self { pool, prokerala }
    }

    /// Calls the astrology API for one birth detail. Nothing is stored.
    pub async fn compute(&self, birth: &bd::Model) -> AppResult<ChartData> {
        let datetime = birth_datetime_iso(birth.birth_date, birth.birth_time, &birth.timezone)?;
        log::debug!("Calculating chart for birth detail {} at {datetime}", birth.id);
        let responses = self
            .prokerala
            .fetch_chart(birth.latitude, birth.longitude, &datetime)
            .await?;
        Ok(map_chart(responses, self.prokerala.ayanamsa()))
    }

    pub async fn save<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        birth_detail_id: i64,
        chart: &ChartData,
    ) -> AppResult<vc::Model> {
        let row = vc::ActiveModel {
            user_id: Set(user_id),
            birth_detail_id: Set(birth_detail_id),
            d1_rasi_chart: Set(chart.d1_rasi_chart.clone()),
            d9_navamsa_chart: Set(chart.d9_navamsa_chart.clone()),
            d10_dasamsa_chart: Set(chart.d10_dasamsa_chart.clone()),
            planetary_positions: Set(chart.planetary_positions.clone()),
            nakshatras: Set(chart.nakshatras.clone()),
            vimshottari_dasha: Set(chart.vimshottari_dasha.clone()),
            houses: Set(chart.houses.clone()),
            ayanamsa_value: Set(chart.ayanamsa_value),
            ayanamsa_type: Set(chart.ayanamsa_type.clone()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row)
    }

    pub async fn latest_for(&self, birth_detail_id: i64) -> AppResult<Option<vc::Model>> {
        Ok(vc::Entity::find()
            .filter(vc::Column::BirthDetailId.eq(birth_detail_id))
            .order_by_desc(vc::Column::CreatedAt)
            .order_by_desc(vc::Column::Id)
            .one(&self.pool)
            .await?)
    }

    pub async fn calculate_and_save(
        &self,
        user_id: i64,
        birth_detail_id: i64,
    ) -> AppResult<CalculateChartResponse> {
        let birth = bd::Entity::find_by_id(birth_detail_id)
            .filter(bd::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Birth details not found".into()))?;

        let chart = self.compute(&birth).await?;
        let saved = Self::save(&self.pool, user_id, birth.id, &chart).await?;
        log::info!("Saved chart {} for birth detail {}", saved.id, birth.id);
        Ok(CalculateChartResponse {
            vedic_chart_id: saved.id,
        })
    }
}

// One birth-details call feeds the rasi chart, positions, houses and nakshatras.
fn map_chart(r: ChartResponses, ayanamsa: i32) -> ChartData {
    ChartData {
        d1_rasi_chart: r.birth_details.clone(),
        d9_navamsa_chart: r.navamsa,
        d10_dasamsa_chart: r.dasamsa,
        planetary_positions: r.birth_details.clone(),
        nakshatras: r.birth_details.clone(),
        vimshottari_dasha: r.dashas,
        houses: r.birth_details,
        ayanamsa_value: f64::from(ayanamsa),
        ayanamsa_type: ayanamsa_label(ayanamsa),
    }
}
