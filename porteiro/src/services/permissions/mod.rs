pub mod resolver;

pub use resolver::{resolve, PermissionGrid, PermissionRow};

#[cfg(test)]
mod tests;
