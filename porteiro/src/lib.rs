//! Porteiro service layer
//!
//! Wires the entity store, permission resolver, and session service into an
//! explicitly passed application context. The binary and integration tests
//! consume this crate; UI collaborators only ever touch the gate predicate
//! and the documented login/logout/save operations.

pub mod app_context;
pub mod notification;
pub mod seed;
pub mod services;
pub mod settings;

pub use app_context::{AppContext, SharedAppContext};
