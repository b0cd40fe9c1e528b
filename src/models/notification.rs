use crate::entities::{NotificationType, user_notification_entity as un};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<un::Model> for NotificationResponse {
    fn from(m: un::Model) -> Self {
        Self {
            id: m.id,
            notification_type: m.notification_type,
            title: m.title,
            message: m.message,
            is_read: m.is_read,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    pub notification_id: i64,
}
