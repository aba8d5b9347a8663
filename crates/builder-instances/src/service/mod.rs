//! Application services.

mod remove;

pub use remove::{InstanceRemover, RemoveOptions};
