pub mod datetime;
pub mod email;
pub mod jwt;
pub mod password;

pub use datetime::*;
pub use email::*;
pub use jwt::*;
pub use password::*;
