pub mod birth_details;
pub mod conversations;
pub mod payment_receipts;
pub mod subscriptions;
pub mod user_notifications;
pub mod users;
pub mod vedic_charts;

pub use birth_details as birth_detail_entity;
pub use conversations as conversation_entity;
pub use conversations::MessageRole;
pub use payment_receipts as payment_receipt_entity;
pub use payment_receipts::ReceiptValidationStatus;
pub use subscriptions as subscription_entity;
pub use subscriptions::{PaymentMethod, SubscriptionStatus, SubscriptionTier};
pub use user_notifications as user_notification_entity;
pub use user_notifications::NotificationType;
pub use users as user_entity;
pub use vedic_charts as vedic_chart_entity;
