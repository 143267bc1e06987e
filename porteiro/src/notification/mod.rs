pub mod log;
pub mod notify;

pub use notify::notify;
