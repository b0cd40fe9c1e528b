use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::BirthDetailService;
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    post,
    path = "/birth-details/create",
    tag = "birth-details",
    request_body = BirthDetailInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Birth details saved with chart", body = SaveBirthDetailResponse),
        (status = 400, description = "Invalid birth data")
    )
)]
pub async fn create(
    service: web::Data<BirthDetailService>,
    req: HttpRequest,
    body: web::Json<BirthDetailInput>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.create(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/birth-details/update",
    tag = "birth-details",
    request_body = BirthDetailInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New birth details active, previous chart kept", body = SaveBirthDetailResponse),
        (status = 400, description = "Invalid birth data")
    )
)]
pub async fn update(
    service: web::Data<BirthDetailService>,
    req: HttpRequest,
    body: web::Json<BirthDetailInput>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.update(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/birth-details/current",
    tag = "birth-details",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active birth details or null", body = CurrentBirthDetailResponse)
    )
)]
pub async fn current(
    service: web::Data<BirthDetailService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.current(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/birth-details/active",
    tag = "birth-details",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active birth details with latest chart", body = ActiveBirthDetailResponse),
        (status = 404, description = "No active birth details")
    )
)]
pub async fn active(
    service: web::Data<BirthDetailService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.get_active(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn birth_details_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/birth-details")
            .route("/create", web::post().to(create))
            .route("/update", web::post().to(update))
            .route("/current", web::get().to(current))
            .route("/active", web::get().to(active)),
    );
}
