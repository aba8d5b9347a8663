//! # Outbound Ports (Driven Ports)
//!
//! What removal needs from its host: somewhere instances are recorded, and
//! a driver for each node.
//!
//! Production: `FileInstanceStore`, `LocalDriverFactory` (adapters/)
//! Testing: `InMemoryInstanceStore` (below)

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{DriverError, InstanceError, Node, NodeGroup};

/// Persistent record of builder instances.
pub trait InstanceStore: Send + Sync {
    /// Look up an instance by name.
    fn get(&self, name: &str) -> Result<NodeGroup, InstanceError>;

    /// The instance selected as current, if any.
    fn current(&self) -> Result<Option<NodeGroup>, InstanceError>;

    /// Select `name` as current.
    fn set_current(&mut self, name: &str) -> Result<(), InstanceError>;

    /// Create or replace an instance.
    fn save(&mut self, group: &NodeGroup) -> Result<(), InstanceError>;

    /// Forget an instance. Clears the current selection if it pointed here.
    fn remove(&mut self, name: &str) -> Result<(), InstanceError>;

    /// All instances, ordered by name.
    fn list(&self) -> Result<Vec<NodeGroup>, InstanceError>;
}

/// Lifecycle operations on one node's daemon.
#[async_trait]
pub trait BuilderDriver: Send + Sync {
    /// Stop the daemon.
    async fn stop(&self, force: bool) -> Result<(), DriverError>;

    /// Remove the daemon and/or its state.
    async fn rm(&self, force: bool, rm_volume: bool, rm_daemon: bool) -> Result<(), DriverError>;
}

/// Resolves the driver for each node of an instance.
pub trait DriverFactory: Send + Sync {
    /// `Ok(None)` means the node has nothing to tear down.
    fn driver_for(
        &self,
        group: &NodeGroup,
        node: &Node,
    ) -> Result<Option<Box<dyn BuilderDriver>>, InstanceError>;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATION
// =============================================================================

/// In-memory instance store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInstanceStore {
    groups: BTreeMap<String, NodeGroup>,
    current: Option<String>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `groups`.
    pub fn with_groups(groups: impl IntoIterator<Item = NodeGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
            current: None,
        }
    }
}

impl InstanceStore for InMemoryInstanceStore {
    fn get(&self, name: &str) -> Result<NodeGroup, InstanceError> {
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| InstanceError::NotFound(name.to_string()))
    }

    fn current(&self) -> Result<Option<NodeGroup>, InstanceError> {
        Ok(self
            .current
            .as_ref()
            .and_then(|name| self.groups.get(name))
            .cloned())
    }

    fn set_current(&mut self, name: &str) -> Result<(), InstanceError> {
        if !self.groups.contains_key(name) {
            return Err(InstanceError::NotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    fn save(&mut self, group: &NodeGroup) -> Result<(), InstanceError> {
        self.groups.insert(group.name.clone(), group.clone());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), InstanceError> {
        if self.groups.remove(name).is_none() {
            return Err(InstanceError::NotFound(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<NodeGroup>, InstanceError> {
        Ok(self.groups.values().cloned().collect())
    }
}
