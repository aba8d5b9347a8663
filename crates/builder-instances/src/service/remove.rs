//! # Instance Removal
//!
//! ```text
//! for each requested instance:
//!     stop every node           (skipped with keep_daemon)
//!     rm every node             (force, volume unless keep_state, daemon unless keep_daemon)
//!     forget the instance
//!     print its name
//! ```
//!
//! A failing instance is recorded and the next one is attempted. A failed
//! teardown leaves the instance in the store so removal can be retried.

use std::io::Write;

use tracing::{info, warn};

use progress_telemetry::{INSTANCES_REMOVED, INSTANCE_REMOVAL_FAILURES};

use crate::domain::{DriverError, InstanceError, NodeGroup, RemoveError};
use crate::ports::{DriverFactory, InstanceStore};

/// What to remove and how much of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Instances to remove. Empty means the current instance.
    pub builders: Vec<String>,
    /// Keep the build state (volume).
    pub keep_state: bool,
    /// Leave the daemon running.
    pub keep_daemon: bool,
}

/// Removes builder instances through a store and a driver factory.
pub struct InstanceRemover<'a> {
    store: &'a mut dyn InstanceStore,
    drivers: &'a dyn DriverFactory,
}

impl<'a> InstanceRemover<'a> {
    pub fn new(store: &'a mut dyn InstanceStore, drivers: &'a dyn DriverFactory) -> Self {
        Self { store, drivers }
    }

    /// Remove the requested instances, printing each removed name to `out`.
    ///
    /// Returns the removed names. If any instance failed, returns a
    /// [`RemoveError`] listing every failure; the ones that succeeded are
    /// still removed and printed.
    pub async fn remove<W: Write>(
        &mut self,
        options: &RemoveOptions,
        out: &mut W,
    ) -> Result<Vec<String>, RemoveError> {
        let mut removed = Vec::new();
        let mut failures = Vec::new();

        if options.builders.is_empty() {
            match self.store.current() {
                Ok(Some(group)) => {
                    self.remove_group(group, options, out, &mut removed, &mut failures)
                        .await
                }
                Ok(None) => info!("No current builder instance to remove"),
                Err(e) => failures.push(e),
            }
        } else {
            for name in &options.builders {
                match self.store.get(name) {
                    Ok(group) => {
                        self.remove_group(group, options, out, &mut removed, &mut failures)
                            .await
                    }
                    Err(e) => failures.push(e),
                }
            }
        }

        INSTANCES_REMOVED.inc_by(removed.len() as u64);
        INSTANCE_REMOVAL_FAILURES.inc_by(failures.len() as u64);

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(RemoveError::new(removed, failures))
        }
    }

    async fn remove_group<W: Write>(
        &mut self,
        group: NodeGroup,
        options: &RemoveOptions,
        out: &mut W,
        removed: &mut Vec<String>,
        failures: &mut Vec<InstanceError>,
    ) {
        let result = match self.teardown(&group, options).await {
            Ok(()) => self.store.remove(&group.name),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(instance = %group.name, "Builder instance removed");
                if let Err(e) = writeln!(out, "{}", group.name) {
                    failures.push(InstanceError::Output(e.to_string()));
                }
                removed.push(group.name);
            }
            Err(e) => {
                warn!(instance = %group.name, error = %e, "Failed to remove builder instance");
                failures.push(e);
            }
        }
    }

    /// Stop and remove every node of `group`.
    ///
    /// A node whose driver cannot be resolved does not stop the others;
    /// its error is returned after they were handled.
    async fn teardown(
        &self,
        group: &NodeGroup,
        options: &RemoveOptions,
    ) -> Result<(), InstanceError> {
        let mut deferred = None;

        for node in &group.nodes {
            let driver = match self.drivers.driver_for(group, node) {
                Ok(Some(driver)) => driver,
                Ok(None) => continue,
                Err(e) => {
                    deferred.get_or_insert(e);
                    continue;
                }
            };
            let driver_error = |source: DriverError| InstanceError::Driver {
                instance: group.name.clone(),
                node: node.name.clone(),
                source,
            };

            if !options.keep_daemon {
                driver.stop(true).await.map_err(driver_error)?;
            }
            driver
                .rm(true, !options.keep_state, !options.keep_daemon)
                .await
                .map_err(driver_error)?;
        }

        deferred.map_or(Ok(()), Err)
    }
}
