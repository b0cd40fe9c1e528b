use super::current_user_id;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{PaymentService, ReceiptUpload};
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::TryStreamExt;

const MAX_REFERENCE_BYTES: usize = 128;

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::ValidationError(format!("Invalid multipart body: {e}"))
}

// Reads a field into memory, failing once it grows past `limit`.
async fn read_field(field: &mut Field, limit: usize, what: &str) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::ValidationError(format!("{what} is too large")));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[utoipa::path(
    post,
    path = "/payment/upload-receipt",
    tag = "payment",
    request_body(content = ReceiptUploadForm, content_type = "multipart/form-data"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Receipt analysed; `valid` tells whether premium was activated", body = UploadReceiptResponse),
        (status = 400, description = "Missing file or reference, non-image, too large, or reused reference"),
        (status = 502, description = "Vision API failure")
    )
)]
pub async fn upload_receipt(
    service: web::Data<PaymentService>,
    req: HttpRequest,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let mut upload = ReceiptUpload {
        image: Vec::new(),
        content_type: None,
        reference_number: None,
    };

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("receipt") => {
                upload.content_type = field.content_type().map(|m| m.essence_str().to_string());
                upload.image =
                    read_field(&mut field, service.max_receipt_bytes(), "Receipt image").await?;
            }
            Some("reference_number") => {
                let raw = read_field(&mut field, MAX_REFERENCE_BYTES, "Reference number").await?;
                let text = String::from_utf8(raw).map_err(|_| {
                    AppError::ValidationError("Reference number must be text".into())
                })?;
                upload.reference_number = Some(text);
            }
            _ => {
                // drain unknown fields so the stream can advance
                while field.try_next().await.map_err(bad_multipart)?.is_some() {}
            }
        }
    }

    let response = service.upload_receipt(user_id, upload).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/payment/checkout-url",
    tag = "payment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Hosted card checkout link", body = CheckoutUrlResponse)
    )
)]
pub async fn checkout_url(
    service: web::Data<PaymentService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let response = service.checkout_url(user_id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .route("/upload-receipt", web::post().to(upload_receipt))
            .route("/checkout-url", web::get().to(checkout_url)),
    );
}
