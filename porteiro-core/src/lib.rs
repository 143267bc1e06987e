pub mod entities;
pub mod error;
pub mod module_id;
pub mod notification_types;
pub mod permission;
pub mod session;
pub mod utils;
