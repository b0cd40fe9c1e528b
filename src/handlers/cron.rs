use crate::config::CronConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Constant-time check: both values are MACed under the secret and the tags
/// compared with `verify_slice`.
fn secret_matches(token: &str, secret: &str) -> bool {
    let mac = |data: &[u8]| {
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map(|mut m| {
            m.update(data);
            m
        })
    };
    let (Ok(expected), Ok(given)) = (mac(secret.as_bytes()), mac(token.as_bytes())) else {
        return false;
    };
    given.verify_slice(&expected.finalize().into_bytes()).is_ok()
}

fn authorized(req: &HttpRequest, cron: &CronConfig) -> bool {
    if cron.secret.is_empty() {
        return false;
    }
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| secret_matches(token, &cron.secret))
}

#[utoipa::path(
    get,
    path = "/cron/expire-subscriptions",
    tag = "cron",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Expired cancelled subscriptions", body = ExpireSubscriptionsResponse),
        (status = 401, description = "Wrong or missing cron secret")
    )
)]
pub async fn expire_subscriptions(
    req: HttpRequest,
    cron: web::Data<CronConfig>,
    service: web::Data<SubscriptionService>,
) -> AppResult<HttpResponse> {
    if !authorized(&req, &cron) {
        return Err(AppError::AuthError("Invalid cron secret".into()));
    }
    let expired_count = service.expire_cancelled(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(ExpireSubscriptionsResponse {
        expired_count,
    })))
}

pub fn cron_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cron").route("/expire-subscriptions", web::get().to(expire_subscriptions)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubscriptionConfig;
    use crate::test_support::test_db;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn requires_cron_secret() {
        let db = test_db().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(CronConfig {
                    secret: "cron-s3cret".into(),
                    expire_interval_secs: 0,
                }))
                .app_data(web::Data::new(SubscriptionService::new(
                    db,
                    SubscriptionConfig::default(),
                )))
                .configure(cron_config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/cron/expire-subscriptions")
            .insert_header(("Authorization", "Bearer nope"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::get()
            .uri("/cron/expire-subscriptions")
            .insert_header(("Authorization", "Bearer cron-s3cret"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["expired_count"], 0);
    }

    #[actix_web::test]
    async fn secret_comparison_is_exact() {
        assert!(secret_matches("cron-s3cret", "cron-s3cret"));
        assert!(!secret_matches("cron-s3creT", "cron-s3cret"));
        assert!(!secret_matches("cron-s3", "cron-s3cret"));
        assert!(!secret_matches("cron-s3cret-and-more", "cron-s3cret"));
        assert!(!secret_matches("", "cron-s3cret"));
    }
}
