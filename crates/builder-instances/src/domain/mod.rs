//! Domain layer: instances, names and errors.

pub mod entities;
pub mod errors;

pub use entities::{validate_name, Node, NodeGroup, DEFAULT_DRIVER};
pub use errors::{DriverError, InstanceError, RemoveError};
