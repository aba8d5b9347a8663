//! # Builder Instance Entities

use serde::{Deserialize, Serialize};

use super::errors::InstanceError;

/// Driver used when an instance does not name one.
pub const DEFAULT_DRIVER: &str = "local";

/// One build daemon belonging to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    pub endpoint: String,
}

impl Node {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A named builder instance: a driver kind and the nodes it manages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeGroup {
    pub name: String,
    pub driver: String,
    pub nodes: Vec<Node>,
}

impl NodeGroup {
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Driver name, falling back to [`DEFAULT_DRIVER`].
    pub fn driver_name(&self) -> &str {
        if self.driver.is_empty() {
            DEFAULT_DRIVER
        } else {
            &self.driver
        }
    }
}

/// Check an instance name.
///
/// Names start with a letter and continue with letters, digits, `.`, `_`
/// or `-`. This also keeps them safe to use as file names.
pub fn validate_name(name: &str) -> Result<(), InstanceError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(InstanceError::InvalidName(name.to_string()))
    }
}
