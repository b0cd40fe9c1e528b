pub mod auth;
pub mod birth_details;
pub mod charts;
pub mod chat;
pub mod cron;
pub mod geocode;
pub mod notifications;
pub mod payment;
pub mod subscription;
pub mod webhook;

pub use auth::auth_config;
pub use birth_details::birth_details_config;
pub use charts::charts_config;
pub use chat::chat_config;
pub use cron::cron_config;
pub use geocode::geocode_config;
pub use notifications::notifications_config;
pub use payment::payment_config;
pub use subscription::subscription_config;
pub use webhook::webhook_config;

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};

/// User id placed in request extensions by the auth middleware.
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".into()))
}
