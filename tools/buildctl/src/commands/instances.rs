//! `rm`, `create` and `ls`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use builder_instances::{
    validate_name, FileInstanceStore, InstanceError, InstanceRemover, InstanceStore,
    LocalDriverFactory, Node, NodeGroup, RemoveOptions, DEFAULT_DRIVER,
};
use progress_telemetry::TelemetryConfig;

const STATE_DIR: &str = "state";

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Instances to remove (defaults to --builder, then the current instance)
    names: Vec<String>,

    /// Keep the build state
    #[arg(long)]
    keep_state: bool,

    /// Leave the daemon running
    #[arg(long)]
    keep_daemon: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the new instance
    name: String,

    /// Endpoint recorded for the instance's node
    #[arg(long, default_value = "")]
    endpoint: String,

    /// Select the new instance as current
    #[arg(long = "use")]
    use_instance: bool,
}

fn state_root(config_dir: &Path) -> PathBuf {
    config_dir.join(STATE_DIR)
}

pub async fn rm(args: RmArgs, builder: Option<String>, config_dir: &Path) -> Result<ExitCode> {
    let _telemetry = super::init(TelemetryConfig::from_env())?;

    let mut store = FileInstanceStore::open(config_dir)?;
    let drivers = LocalDriverFactory::new(state_root(config_dir));

    let builders = if args.names.is_empty() {
        builder.into_iter().collect()
    } else {
        args.names
    };
    let options = RemoveOptions {
        builders,
        keep_state: args.keep_state,
        keep_daemon: args.keep_daemon,
    };

    let mut stdout = io::stdout();
    match InstanceRemover::new(&mut store, &drivers)
        .remove(&options, &mut stdout)
        .await
    {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn create(args: CreateArgs, config_dir: &Path) -> Result<ExitCode> {
    let _telemetry = super::init(TelemetryConfig::from_env())?;

    validate_name(&args.name)?;
    let mut store = FileInstanceStore::open(config_dir)?;
    match store.get(&args.name) {
        Ok(_) => bail!(InstanceError::AlreadyExists(args.name)),
        Err(InstanceError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let node = Node::new(format!("{}0", args.name), args.endpoint.as_str());
    let drivers = LocalDriverFactory::new(state_root(config_dir));
    drivers
        .local_driver(&node)
        .bootstrap(&node.endpoint)
        .await
        .with_context(|| format!("Failed to bootstrap node {:?}", node.name))?;

    let group = NodeGroup::new(args.name.as_str(), DEFAULT_DRIVER).with_node(node);
    store.save(&group)?;
    if args.use_instance {
        store.set_current(&group.name)?;
    }
    info!(instance = %group.name, "Builder instance created");

    println!("{}", group.name);
    Ok(ExitCode::SUCCESS)
}

pub fn ls(config_dir: &Path) -> Result<ExitCode> {
    let _telemetry = super::init(TelemetryConfig::from_env())?;

    let store = FileInstanceStore::open(config_dir)?;
    let current = store.current()?.map(|group| group.name);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{:<24} {:<10} NODES", "NAME", "DRIVER")?;
    for group in store.list()? {
        let name = if current.as_deref() == Some(group.name.as_str()) {
            format!("{} *", group.name)
        } else {
            group.name.clone()
        };
        let nodes: Vec<&str> = group.nodes.iter().map(|n| n.name.as_str()).collect();
        writeln!(
            stdout,
            "{:<24} {:<10} {}",
            name,
            group.driver_name(),
            nodes.join(",")
        )?;
    }
    Ok(ExitCode::SUCCESS)
}
