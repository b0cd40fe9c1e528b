use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/subscription/check",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current subscription", body = SubscriptionResponse)
    )
)]
pub async fn check(
    service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.check(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/subscription/cancel",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cancelled, access continues until period end", body = SubscriptionActionResponse),
        (status = 400, description = "Subscription is not active")
    )
)]
pub async fn cancel(
    service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.cancel(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/subscription/reactivate",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reactivated", body = SubscriptionActionResponse),
        (status = 400, description = "Not cancelled or period already over")
    )
)]
pub async fn reactivate(
    service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.reactivate(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscription")
            .route("/check", web::get().to(check))
            .route("/cancel", web::post().to(cancel))
            .route("/reactivate", web::post().to(reactivate)),
    );
}
