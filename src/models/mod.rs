pub mod birth_detail;
pub mod chart;
pub mod chat;
pub mod common;
pub mod geocode;
pub mod notification;
pub mod pagination;
pub mod payment;
pub mod subscription;
pub mod user;

pub use birth_detail::*;
pub use chart::*;
pub use chat::*;
pub use common::*;
pub use geocode::*;
pub use notification::*;
pub use pagination::*;
pub use payment::*;
pub use subscription::*;
pub use user::*;
