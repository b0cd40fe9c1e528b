use crate::entities::{birth_detail_entity as bd, vedic_chart_entity as vc};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::ChartService;
use crate::utils::{parse_birth_date, parse_birth_time, parse_timezone};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

const DEFAULT_COUNTRY: &str = "Unknown";

#[derive(Clone)]
pub struct BirthDetailService {
    pool: DatabaseConnection,
    chart_service: ChartService,
}

struct ValidBirthInput {
    name: String,
    birth_date: NaiveDate,
    birth_time: NaiveTime,
    birth_city: String,
    birth_country: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
}

fn validate_input(input: BirthDetailInput) -> AppResult<ValidBirthInput> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError("name is required".into()));
    }
    let birth_city = input.birth_city.trim().to_string();
    if birth_city.is_empty() {
        return Err(AppError::ValidationError("birth_city is required".into()));
    }
    if !(-90.0..=90.0).contains(&input.latitude) {
        return Err(AppError::ValidationError("latitude must be between -90 and 90".into()));
    }
    if !(-180.0..=180.0).contains(&input.longitude) {
        return Err(AppError::ValidationError(
            "longitude must be between -180 and 180".into(),
        ));
    }
    let tz = parse_timezone(&input.timezone)?;
    let birth_country = input
        .birth_country
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    Ok(ValidBirthInput {
        name,
        birth_date: parse_birth_date(&input.birth_date)?,
        birth_time: parse_birth_time(&input.birth_time)?,
        birth_city,
        birth_country,
        latitude: input.latitude,
        longitude: input.longitude,
        timezone: tz.name().to_string(),
    })
}

impl BirthDetailService {
    pub fn new(pool: DatabaseConnection, chart_service: ChartService) -> Self {
        Self {
            pool,
            chart_service,
        }
    }

    /// Onboarding. Also replaces any earlier active row.
    pub async fn create(
        &self,
        user_id: i64,
        input: BirthDetailInput,
    ) -> AppResult<SaveBirthDetailResponse> {
        self.save_new_active(user_id, input, None).await
    }

    pub async fn update(
        &self,
        user_id: i64,
        input: BirthDetailInput,
    ) -> AppResult<SaveBirthDetailResponse> {
        self.save_new_active(
            user_id,
            input,
            Some("Birth details updated. Previous chart preserved.".to_string()),
        )
        .await
    }

    async fn save_new_active(
        &self,
        user_id: i64,
        input: BirthDetailInput,
        message: Option<String>,
    ) -> AppResult<SaveBirthDetailResponse> {
        let v = validate_input(input)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        bd::Entity::update_many()
            .col_expr(bd::Column::IsActive, Expr::value(false))
            .col_expr(bd::Column::UpdatedAt, Expr::value(now))
            .filter(bd::Column::UserId.eq(user_id))
            .filter(bd::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;
        let birth = bd::ActiveModel {
            user_id: Set(user_id),
            name: Set(v.name),
            birth_date: Set(v.birth_date),
            birth_time: Set(v.birth_time),
            birth_city: Set(v.birth_city),
            birth_country: Set(v.birth_country),
            latitude: Set(v.latitude),
            longitude: Set(v.longitude),
            timezone: Set(v.timezone),
            is_active: Set(true),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        let chart = match self.chart_service.compute(&birth).await {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Chart calculation failed for birth detail {}: {e}", birth.id);
                ChartData::placeholder()
            }
        };

        // the birth detail stays even if the chart row cannot be written
        if let Err(e) = ChartService::save(&self.pool, user_id, birth.id, &chart).await {
            log::error!("Saving chart for birth detail {} failed: {e}", birth.id);
        }

        Ok(SaveBirthDetailResponse {
            birth_detail: BirthDetailResponse::from(birth),
            chart,
            message,
        })
    }

    pub async fn active(&self, user_id: i64) -> AppResult<Option<bd::Model>> {
        Ok(bd::Entity::find()
            .filter(bd::Column::UserId.eq(user_id))
            .filter(bd::Column::IsActive.eq(true))
            .order_by_desc(bd::Column::CreatedAt)
            .order_by_desc(bd::Column::Id)
            .one(&self.pool)
            .await?)
    }

    pub async fn active_with_chart(
        &self,
        user_id: i64,
    ) -> AppResult<Option<(bd::Model, Option<vc::Model>)>> {
        let Some(birth) = self.active(user_id).await? else {
            return Ok(None);
        };
        let chart = self.chart_service.latest_for(birth.id).await?;
        Ok(Some((birth, chart)))
    }

    pub async fn current(&self, user_id: i64) -> AppResult<CurrentBirthDetailResponse> {
        let birth = self.active(user_id).await?;
        Ok(CurrentBirthDetailResponse {
            birth_detail: birth.map(BirthDetailResponse::from),
        })
    }

    pub async fn get_active(&self, user_id: i64) -> AppResult<ActiveBirthDetailResponse> {
        let (birth, chart) = self
            .active_with_chart(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active birth details".into()))?;
        Ok(ActiveBirthDetailResponse {
            birth_detail: BirthDetailResponse::from(birth),
            chart: chart.map(VedicChartResponse::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use serde_json::json;
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn input(name: &str) -> BirthDetailInput {
        BirthDetailInput {
            name: name.to_string(),
            birth_date: "1994-08-21".into(),
            birth_time: "06:45".into(),
            birth_city: "Quezon City".into(),
            birth_country: None,
            latitude: 14.676,
            longitude: 121.0437,
            timezone: "Asia/Manila".into(),
        }
    }

    fn service(db: &DatabaseConnection, base_url: &str) -> BirthDetailService {
        BirthDetailService::new(
            db.clone(),
            ChartService::new(db.clone(), prokerala_client(base_url)),
        )
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let mut i = input("Maya");
        i.latitude = 91.0;
        assert!(validate_input(i).is_err());

        assert!(validate_input(input("  ")).is_err());

        let mut i = input("Maya");
        i.timezone = "Mars/Olympus".into();
        assert!(validate_input(i).is_err());

        let mut i = input("Maya");
        i.birth_time = "6pm".into();
        assert!(validate_input(i).is_err());

        let v = validate_input(input("Maya")).unwrap();
        assert_eq!(v.birth_country, "Unknown");
    }

    #[tokio::test]
    async fn astrology_failure_saves_placeholder_chart() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let db = test_db().await;
        let u = insert_user(&db, "f@example.com").await;
        let svc = service(&db, &server.uri());

        let resp = svc.create(u.id, input("Maya")).await.unwrap();
        assert_eq!(resp.chart, ChartData::placeholder());
        assert_eq!(resp.chart.ayanamsa_value, 24.0);

        let active = svc.get_active(u.id).await.unwrap();
        let chart = active.chart.unwrap();
        assert_eq!(chart.data.d1_rasi_chart, json!({}));
        assert_eq!(chart.data.ayanamsa_type, "LAHIRI");
    }

    #[tokio::test]
    async fn update_leaves_exactly_one_active_row() {
        let server = MockServer::start().await;
        mount_prokerala_ok(&server).await;
        let db = test_db().await;
        let u = insert_user(&db, "u@example.com").await;
        let svc = service(&db, &server.uri());

        let first = svc.create(u.id, input("First")).await.unwrap();
        let second = svc.update(u.id, input("Second")).await.unwrap();
        assert_eq!(
            second.message.as_deref(),
            Some("Birth details updated. Previous chart preserved.")
        );

        let rows = bd::Entity::find()
            .filter(bd::Column::UserId.eq(u.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|r| r.is_active).count(), 1);

        let current = svc.current(u.id).await.unwrap().birth_detail.unwrap();
        assert_eq!(current.name, "Second");

        // old chart kept for the deactivated row
        let old_chart = vc::Entity::find()
            .filter(vc::Column::BirthDetailId.eq(first.birth_detail.id))
            .one(&db)
            .await
            .unwrap();
        assert!(old_chart.is_some());
    }

    #[tokio::test]
    async fn no_birth_detail_is_null_then_404() {
        let server = MockServer::start().await;
        let db = test_db().await;
        let u = insert_user(&db, "n@example.com").await;
        let svc = service(&db, &server.uri());
        assert!(svc.current(u.id).await.unwrap().birth_detail.is_none());
        assert!(matches!(
            svc.get_active(u.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
