//! # Local Driver
//!
//! Node daemons managed as state directories on this machine:
//!
//! ```text
//! <state-root>/<node>/
//! ├── daemon.json     daemon configuration; present while the daemon exists
//! ├── running         present while the daemon runs
//! └── volume/         build cache and state
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::{DriverError, InstanceError, Node, NodeGroup};
use crate::ports::{BuilderDriver, DriverFactory};

const DAEMON_FILE: &str = "daemon.json";
const RUNNING_FILE: &str = "running";
const VOLUME_DIR: &str = "volume";

/// Driver for one locally managed node.
#[derive(Debug, Clone)]
pub struct LocalDriver {
    node: String,
    dir: PathBuf,
}

impl LocalDriver {
    pub fn new(state_root: &Path, node: &Node) -> Self {
        Self {
            node: node.name.clone(),
            dir: state_root.join(&node.name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the daemon and its volume and mark it running.
    pub async fn bootstrap(&self, endpoint: &str) -> Result<(), DriverError> {
        fs::create_dir_all(self.dir.join(VOLUME_DIR)).await.map_err(io_error)?;
        let config = serde_json::json!({ "node": self.node, "endpoint": endpoint });
        fs::write(self.dir.join(DAEMON_FILE), config.to_string())
            .await
            .map_err(io_error)?;
        fs::write(self.dir.join(RUNNING_FILE), b"").await.map_err(io_error)?;
        debug!(node = %self.node, dir = %self.dir.display(), "Local daemon bootstrapped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        fs::try_exists(self.dir.join(RUNNING_FILE)).await.unwrap_or(false)
    }
}

#[async_trait]
impl BuilderDriver for LocalDriver {
    async fn stop(&self, force: bool) -> Result<(), DriverError> {
        debug!(node = %self.node, force, "Stopping local daemon");
        remove_file_if_exists(&self.dir.join(RUNNING_FILE)).await
    }

    async fn rm(&self, force: bool, rm_volume: bool, rm_daemon: bool) -> Result<(), DriverError> {
        debug!(node = %self.node, force, rm_volume, rm_daemon, "Removing local daemon");
        if rm_daemon && !force && self.is_running().await {
            return Err(DriverError::Busy);
        }

        if rm_volume {
            match fs::remove_dir_all(self.dir.join(VOLUME_DIR)).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e)),
            }
        }
        if rm_daemon {
            remove_file_if_exists(&self.dir.join(RUNNING_FILE)).await?;
            remove_file_if_exists(&self.dir.join(DAEMON_FILE)).await?;
        }

        // Drop the node directory once nothing is left in it.
        if rm_volume && rm_daemon {
            match fs::remove_dir(&self.dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => debug!(node = %self.node, error = %e, "Node directory kept"),
            }
        }
        Ok(())
    }
}

/// Resolves [`LocalDriver`]s for instances using the `local` driver.
#[derive(Debug, Clone)]
pub struct LocalDriverFactory {
    state_root: PathBuf,
}

impl LocalDriverFactory {
    pub fn new(state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_root: state_root.into(),
        }
    }

    pub fn local_driver(&self, node: &Node) -> LocalDriver {
        LocalDriver::new(&self.state_root, node)
    }
}

impl DriverFactory for LocalDriverFactory {
    fn driver_for(
        &self,
        group: &NodeGroup,
        node: &Node,
    ) -> Result<Option<Box<dyn BuilderDriver>>, InstanceError> {
        match group.driver_name() {
            "local" => Ok(Some(Box::new(self.local_driver(node)))),
            other => Err(InstanceError::UnknownDriver {
                instance: group.name.clone(),
                driver: other.to_string(),
            }),
        }
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<(), DriverError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(e)),
    }
}

fn io_error(e: io::Error) -> DriverError {
    DriverError::Io(e.to_string())
}
