pub mod entity_store;
pub mod permissions;
pub mod session;

pub use entity_store::store::EntityStore;
pub use session::service::SessionService;
