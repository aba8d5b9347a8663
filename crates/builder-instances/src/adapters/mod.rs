//! Adapters implementing the outbound ports.

pub mod file_store;
pub mod local_driver;

pub use file_store::FileInstanceStore;
pub use local_driver::{LocalDriver, LocalDriverFactory};
