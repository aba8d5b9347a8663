//! # Builder Instances
//!
//! Named builder instances and their removal.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - `NodeGroup`, `Node`, name rules, errors
//! - `ports/` - `InstanceStore`, `BuilderDriver`, `DriverFactory`
//! - `adapters/` - JSON file store, local state-directory driver
//! - `service/` - removal with per-instance error aggregation
//!
//! ## Usage
//!
//! ```ignore
//! use builder_instances::{FileInstanceStore, InstanceRemover, LocalDriverFactory, RemoveOptions};
//!
//! let mut store = FileInstanceStore::open(config_dir)?;
//! let drivers = LocalDriverFactory::new(config_dir.join("state"));
//! let options = RemoveOptions { builders: vec!["b1".into()], ..Default::default() };
//!
//! InstanceRemover::new(&mut store, &drivers)
//!     .remove(&options, &mut std::io::stdout())
//!     .await?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileInstanceStore, LocalDriver, LocalDriverFactory};
pub use domain::{
    validate_name, DriverError, InstanceError, Node, NodeGroup, RemoveError, DEFAULT_DRIVER,
};
pub use ports::{BuilderDriver, DriverFactory, InMemoryInstanceStore, InstanceStore};
pub use service::{InstanceRemover, RemoveOptions};
