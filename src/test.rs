//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::MemoryStore;
use crate::{Config, Dispatcher, Workbook};
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

/// Test environment with a finanzas home directory holding a freshly created `Config`.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a home directory and a config file pointing at a random spreadsheet id.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("finanzas");
        let rand = Uuid::new_v4().to_string().replace('-', "");
        let sheet_url = format!("https://docs.google.com/spreadsheets/d/{rand}/edit");
        let config = Config::create(&root, &sheet_url, None, None)
            .await
            .unwrap();

        Self { temp_dir, config }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Writes `contents` to a file in the temp directory, outside the home directory, and returns
    /// its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Returns a dispatcher over a seeded `MemoryStore` along with a handle to that store, so that
    /// tests can inspect what the requests wrote.
    pub fn dispatcher(&self) -> (Dispatcher, MemoryStore) {
        let store = MemoryStore::seeded(self.config.sheets()).unwrap();
        let workbook = Workbook::new(Box::new(store.clone()), self.config.sheets().clone());
        (Dispatcher::new(workbook), store)
    }
}

#[tokio::test]
async fn test_env_dispatcher_uses_configured_tabs() {
    let env = TestEnv::new().await;
    let (dispatcher, store) = env.dispatcher();
    let envelope = dispatcher
        .command(r#"{"action": "addTarjeta", "item": {"id": "tc-9", "descripcion": "Libro"}}"#)
        .await;
    assert!(envelope.is_success());
    let cards = store.table(&env.config().sheets().cards).await.unwrap();
    assert_eq!(cards.len(), 5);
}
