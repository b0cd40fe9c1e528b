use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::ChatService;
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = SendMessageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assistant reply", body = SendMessageResponse),
        (status = 400, description = "Empty message or no birth details"),
        (status = 403, description = "Trial message limit reached"),
        (status = 502, description = "LLM failure")
    )
)]
pub async fn send_message(
    service: web::Data<ChatService>,
    req: HttpRequest,
    body: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.send_message(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/chat/history",
    tag = "chat",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Latest messages, oldest first", body = ChatHistoryResponse)
    )
)]
pub async fn history(service: web::Data<ChatService>, req: HttpRequest) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.history(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .route("", web::post().to(send_message))
            .route("/history", web::get().to(history)),
    );
}
