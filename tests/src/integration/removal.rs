//! # Instance Removal Flows
//!
//! `InstanceRemover` over the on-disk store and the local driver, the same
//! wiring `buildctl rm` uses.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use builder_instances::{
        FileInstanceStore, InstanceError, InstanceRemover, InstanceStore, LocalDriverFactory,
        Node, NodeGroup, RemoveOptions,
    };

    struct Fixture {
        _dir: TempDir,
        store: FileInstanceStore,
        drivers: LocalDriverFactory,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = FileInstanceStore::open(dir.path().join("config")).unwrap();
            let drivers = LocalDriverFactory::new(dir.path().join("state"));
            Self {
                _dir: dir,
                store,
                drivers,
            }
        }

        async fn create(&mut self, name: &str, driver: &str) -> Node {
            let node = Node::new(format!("{}0", name), format!("unix:///run/{}.sock", name));
            if driver == "local" {
                self.drivers
                    .local_driver(&node)
                    .bootstrap(&node.endpoint)
                    .await
                    .unwrap();
            }
            self.store
                .save(&NodeGroup::new(name, driver).with_node(node.clone()))
                .unwrap();
            node
        }

        fn node_dir(&self, node: &Node) -> PathBuf {
            self.drivers.local_driver(node).dir().to_path_buf()
        }
    }

    fn names(builders: &[&str]) -> RemoveOptions {
        RemoveOptions {
            builders: builders.iter().map(|s| s.to_string()).collect(),
            ..RemoveOptions::default()
        }
    }

    #[tokio::test]
    async fn test_one_removed_one_failed() {
        let mut fx = Fixture::new();
        let b1 = fx.create("b1", "local").await;
        fx.create("b2", "remote").await;

        let mut out = Vec::new();
        let err = InstanceRemover::new(&mut fx.store, &fx.drivers)
            .remove(&names(&["b1", "b2"]), &mut out)
            .await
            .unwrap_err();

        assert_eq!(String::from_utf8(out).unwrap(), "b1\n");
        assert_eq!(
            err.to_string(),
            "Error: builder \"b2\" uses unknown driver \"remote\""
        );
        assert!(!fx.node_dir(&b1).exists());
        assert_eq!(
            fx.store.get("b1"),
            Err(InstanceError::NotFound("b1".to_string()))
        );
        assert!(fx.store.get("b2").is_ok());
    }

    #[tokio::test]
    async fn test_keep_state_and_daemon() {
        let mut fx = Fixture::new();
        let b1 = fx.create("b1", "local").await;

        let options = RemoveOptions {
            keep_state: true,
            keep_daemon: true,
            ..names(&["b1"])
        };
        InstanceRemover::new(&mut fx.store, &fx.drivers)
            .remove(&options, &mut Vec::new())
            .await
            .unwrap();

        let driver = fx.drivers.local_driver(&b1);
        assert!(driver.is_running().await);
        assert!(driver.dir().join("volume").is_dir());
        assert!(fx.store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_instance_removed_and_cleared() {
        let mut fx = Fixture::new();
        fx.create("b1", "local").await;
        fx.create("b2", "local").await;
        fx.store.set_current("b2").unwrap();

        let mut out = Vec::new();
        let removed = InstanceRemover::new(&mut fx.store, &fx.drivers)
            .remove(&RemoveOptions::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(removed, vec!["b2".to_string()]);
        assert_eq!(String::from_utf8(out).unwrap(), "b2\n");
        assert_eq!(fx.store.current().unwrap(), None);

        let remaining: Vec<_> = fx
            .store
            .list()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(remaining, vec!["b1"]);
    }

    #[tokio::test]
    async fn test_store_survives_reopen_after_partial_failure() {
        let mut fx = Fixture::new();
        fx.create("b1", "local").await;
        fx.create("b2", "remote").await;

        let _ = InstanceRemover::new(&mut fx.store, &fx.drivers)
            .remove(&names(&["b2", "ghost", "b1"]), &mut Vec::new())
            .await
            .unwrap_err();

        let reopened = FileInstanceStore::open(fx.store.root()).unwrap();
        let remaining: Vec<_> = reopened
            .list()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(remaining, vec!["b2"]);
    }
}
