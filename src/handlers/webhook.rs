use crate::error::AppError;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use log::{error, info, warn};

/// LemonSqueezy delivers subscription lifecycle events here.
///
/// Non-2xx answers make the provider redeliver, so only bad signatures and
/// malformed payloads are answered with 4xx.
pub async fn lemonsqueezy_webhook(
    req: HttpRequest,
    body: web::Bytes,
    payment_service: web::Data<PaymentService>,
) -> HttpResponse {
    let Some(signature) = req
        .headers()
        .get("X-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("LemonSqueezy webhook without X-Signature");
        return AppError::AuthError("Missing signature".into()).error_response();
    };

    match payment_service.handle_webhook(&body, signature).await {
        Ok(()) => {
            info!("Processed LemonSqueezy webhook");
            HttpResponse::Ok().json(serde_json::json!({ "received": true }))
        }
        Err(e @ (AppError::AuthError(_) | AppError::ValidationError(_))) => {
            warn!("Rejected LemonSqueezy webhook: {e}");
            e.error_response()
        }
        Err(e) => {
            error!("Failed to process LemonSqueezy webhook: {e}");
            e.error_response()
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook").route("/lemonsqueezy", web::post().to(lemonsqueezy_webhook)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SubscriptionStatus;
    use crate::external::lemonsqueezy::sign;
    use crate::services::SubscriptionService;
    use crate::services::payment_service::tests::{WEBHOOK_SECRET, service};
    use crate::test_support::*;
    use crate::config::SubscriptionConfig;
    use actix_web::{App, test};
    use serde_json::json;

    #[actix_web::test]
    async fn signature_gate_and_activation() {
        let db = test_db().await;
        let u = insert_user(&db, "hook@example.com").await;
        let dir = tempfile::tempdir().unwrap();
        let payments = service(&db, "http://127.0.0.1:9", dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(payments))
                .configure(webhook_config),
        )
        .await;

        let body = json!({
            "meta": {"event_name": "subscription_created", "custom_data": {"user_id": u.id.to_string()}},
            "data": {"id": "ls_77", "attributes": {}}
        })
        .to_string();

        let req = test::TestRequest::post()
            .uri("/webhook/lemonsqueezy")
            .insert_header(("X-Signature", sign("wrong", body.as_bytes())))
            .set_payload(body.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::post()
            .uri("/webhook/lemonsqueezy")
            .set_payload(body.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/webhook/lemonsqueezy")
            .insert_header(("X-Signature", sign(WEBHOOK_SECRET, body.as_bytes())))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let subs = SubscriptionService::new(db.clone(), SubscriptionConfig::default());
        let s = subs.find(u.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Active);
    }
}
