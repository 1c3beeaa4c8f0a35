//! Database models split into domain-specific modules.

pub mod booking;
pub mod service;
pub mod staff;
pub mod user;

pub use booking::*;
pub use service::*;
pub use staff::*;
pub use user::*;
