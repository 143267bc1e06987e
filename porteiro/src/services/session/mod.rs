pub mod blob;
pub mod service;
pub mod token;

pub use service::{SessionService, SessionState};

#[cfg(test)]
mod tests;
