use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::ChartService;
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    post,
    path = "/charts/calculate",
    tag = "charts",
    request_body = CalculateChartRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Chart calculated and stored", body = CalculateChartResponse),
        (status = 404, description = "Birth details not found"),
        (status = 502, description = "Astrology API failure")
    )
)]
pub async fn calculate(
    service: web::Data<ChartService>,
    req: HttpRequest,
    body: web::Json<CalculateChartRequest>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service
        .calculate_and_save(user_id, body.birth_detail_id)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn charts_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/charts").route("/calculate", web::post().to(calculate)));
}
