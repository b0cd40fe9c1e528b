pub mod auth_service;
pub mod birth_detail_service;
pub mod chart_service;
pub mod chat_service;
pub mod geocode_service;
pub mod notification_service;
pub mod payment_service;
pub mod receipt_storage;
pub mod subscription_service;

pub use auth_service::*;
pub use birth_detail_service::*;
pub use chart_service::*;
pub use chat_service::*;
pub use geocode_service::*;
pub use notification_service::*;
pub use payment_service::*;
pub use receipt_storage::*;
pub use subscription_service::*;
