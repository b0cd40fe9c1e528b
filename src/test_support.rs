//! Shared fixtures for service tests: a migrated in-memory SQLite database.

use crate::database::DbPool;
use crate::entities::{
    birth_detail_entity as bd, subscription_entity as sub, user_entity as users,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};

pub async fn test_db() -> DbPool {
    // one connection, otherwise every pool member gets its own empty :memory: db
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("migrate sqlite");
    db
}

pub async fn insert_user(db: &DbPool, email: &str) -> users::Model {
    users::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("x".to_string()),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn insert_trial(db: &DbPool, user_id: i64, limit: i32, sent: i32) -> sub::Model {
    sub::ActiveModel {
        user_id: Set(user_id),
        status: Set(crate::entities::SubscriptionStatus::Trial),
        tier: Set(crate::entities::SubscriptionTier::Free),
        trial_message_limit: Set(Some(limit)),
        total_messages_sent: Set(sent),
        limit_reached: Set(sent >= limit),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert subscription")
}

pub async fn insert_birth_detail(db: &DbPool, user_id: i64) -> bd::Model {
    bd::ActiveModel {
        user_id: Set(user_id),
        name: Set("Maya".to_string()),
        birth_date: Set(NaiveDate::from_ymd_opt(1994, 8, 21).unwrap()),
        birth_time: Set(NaiveTime::from_hms_opt(6, 45, 0).unwrap()),
        birth_city: Set("Quezon City".to_string()),
        birth_country: Set("Philippines".to_string()),
        latitude: Set(14.676),
        longitude: Set(121.0437),
        timezone: Set("Asia/Manila".to_string()),
        is_active: Set(true),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert birth detail")
}

pub fn prokerala_client(base_url: &str) -> crate::external::ProkeralaClient {
    crate::external::ProkeralaClient::new(crate::config::ProkeralaConfig {
        client_id: "cid".into(),
        client_secret: "secret".into(),
        base_url: base_url.to_string(),
        ayanamsa: 1,
    })
}

/// Token plus all four chart endpoints answering 200.
pub async fn mount_prokerala_ok(server: &wiremock::MockServer) {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok", "expires_in": 3600})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/astrology/birth-details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nakshatra": "Rohini"})))
        .mount(server)
        .await;
    for chart_type in ["navamsa", "dasamsa"] {
        Mock::given(method("GET"))
            .and(path("/v2/astrology/divisional-planet-position"))
            .and(query_param("chart_type", chart_type))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chart": chart_type})))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/v2/astrology/dasha-periods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dasha_periods": []})))
        .mount(server)
        .await;
}
