//! Port traits for instance storage and node drivers.

pub mod outbound;

pub use outbound::{BuilderDriver, DriverFactory, InMemoryInstanceStore, InstanceStore};
