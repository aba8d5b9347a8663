//! # Domain Errors

use std::fmt;

use thiserror::Error;

/// Failure reported by a driver while acting on one node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The daemon is running and the call did not allow forcing it.
    #[error("daemon is still running")]
    Busy,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// Failure while looking up, tearing down or forgetting one instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("no builder {0:?} found")]
    NotFound(String),

    #[error("invalid builder name {0:?}: names start with a letter and contain only letters, digits, '.', '_' or '-'")]
    InvalidName(String),

    #[error("builder {0:?} already exists")]
    AlreadyExists(String),

    #[error("builder {instance:?} uses unknown driver {driver:?}")]
    UnknownDriver { instance: String, driver: String },

    #[error("builder {instance:?} node {node:?}: {source}")]
    Driver {
        instance: String,
        node: String,
        #[source]
        source: DriverError,
    },

    #[error("instance store error at {path}: {reason}")]
    Store { path: String, reason: String },

    #[error("corrupt instance record {path}: {reason}")]
    Serialization { path: String, reason: String },

    #[error("failed to write output: {0}")]
    Output(String),
}

/// Aggregate of every instance that could not be removed.
///
/// Displays as one `Error: <reason>` line per failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveError {
    removed: Vec<String>,
    failures: Vec<InstanceError>,
}

impl RemoveError {
    pub(crate) fn new(removed: Vec<String>, failures: Vec<InstanceError>) -> Self {
        Self { removed, failures }
    }

    /// Instances that were removed before or after the failures.
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn failures(&self) -> &[InstanceError] {
        &self.failures
    }
}

impl fmt::Display for RemoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Error: {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_error_lines() {
        let err = RemoveError::new(
            vec!["b1".into()],
            vec![
                InstanceError::NotFound("b2".into()),
                InstanceError::Driver {
                    instance: "b3".into(),
                    node: "b30".into(),
                    source: DriverError::Busy,
                },
            ],
        );
        assert_eq!(
            err.to_string(),
            "Error: no builder \"b2\" found\n\
             Error: builder \"b3\" node \"b30\": daemon is still running"
        );
        assert_eq!(err.removed(), ["b1".to_string()]);
    }
}
