pub mod backend;
pub mod memory;
pub mod store;

pub use store::{EntityStore, NewUser};
