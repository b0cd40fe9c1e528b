use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    MessageRole, NotificationType, PaymentMethod, ReceiptValidationStatus, SubscriptionStatus,
    SubscriptionTier,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::birth_details::create,
        handlers::birth_details::update,
        handlers::birth_details::current,
        handlers::birth_details::active,
        handlers::charts::calculate,
        handlers::chat::send_message,
        handlers::chat::history,
        handlers::subscription::check,
        handlers::subscription::cancel,
        handlers::subscription::reactivate,
        handlers::payment::upload_receipt,
        handlers::payment::checkout_url,
        handlers::notifications::list,
        handlers::notifications::mark_read,
        handlers::geocode::search,
        handlers::cron::expire_subscriptions,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            RefreshTokenRequest,
            UserResponse,
            AuthResponse,
            BirthDetailInput,
            BirthDetailResponse,
            SaveBirthDetailResponse,
            CurrentBirthDetailResponse,
            ActiveBirthDetailResponse,
            ChartData,
            VedicChartResponse,
            CalculateChartRequest,
            CalculateChartResponse,
            SendMessageRequest,
            SendMessageResponse,
            ChatMessageResponse,
            ChatHistoryResponse,
            SubscriptionResponse,
            SubscriptionActionResponse,
            ExpireSubscriptionsResponse,
            UploadReceiptResponse,
            ReceiptUploadForm,
            CheckoutUrlResponse,
            ReceiptAnalysis,
            NotificationResponse,
            MarkReadRequest,
            PaginatedNotificationResponse,
            City,
            GeocodeResponse,
            MessageRole,
            NotificationType,
            PaymentMethod,
            ReceiptValidationStatus,
            SubscriptionStatus,
            SubscriptionTier,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login and token refresh"),
        (name = "birth-details", description = "Birth data and the active chart"),
        (name = "charts", description = "Vedic chart calculation"),
        (name = "chat", description = "Astrologer chat"),
        (name = "subscription", description = "Trial and premium access"),
        (name = "payment", description = "GCash receipts and LemonSqueezy checkout"),
        (name = "notifications", description = "In-app notifications"),
        (name = "geocode", description = "Birth city search"),
        (name = "cron", description = "Scheduled maintenance"),
    ),
    info(
        title = "Clarity Backend API",
        version = "1.0.0",
        description = "Clarity astrology chat REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
