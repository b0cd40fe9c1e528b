use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::NotificationService;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications, newest first", body = PaginatedNotificationResponse)
    )
)]
pub async fn list(
    service: web::Data<NotificationService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let page = service.list(user_id, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

#[utoipa::path(
    post,
    path = "/notifications/mark-read",
    tag = "notifications",
    request_body = MarkReadRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "No such notification for this user")
    )
)]
pub async fn mark_read(
    service: web::Data<NotificationService>,
    req: HttpRequest,
    body: web::Json<MarkReadRequest>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    service.mark_read(user_id, body.notification_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub fn notifications_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list))
            .route("/mark-read", web::post().to(mark_read)),
    );
}
