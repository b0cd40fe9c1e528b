use crate::error::AppResult;
use crate::models::*;
use crate::services::GeocodeService;
use actix_web::{HttpResponse, web};

#[utoipa::path(
    get,
    path = "/geocode",
    tag = "geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Matching cities with timezones", body = GeocodeResponse),
        (status = 502, description = "Geocoding API failure")
    )
)]
pub async fn search(
    service: web::Data<GeocodeService>,
    query: web::Query<GeocodeQuery>,
) -> AppResult<HttpResponse> {
    let cities = service.search(query.q.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(GeocodeResponse { cities })))
}

pub fn geocode_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/geocode", web::get().to(search));
}
