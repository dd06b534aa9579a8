//! Where a command gets its inventory from: the live API, or a JSON snapshot
//! file for offline checks. Status writes to a snapshot file are saved back
//! to the same file.

use std::fs;
use std::path::{Path, PathBuf};

use stockcheck_config::Settings;
use stockcheck_inventory_client::{load_auth, parse_records, AuthCredentials, InventoryClient};
use stockcheck_recon::{InventoryReader, InventoryRecord, InventoryWriter, MemoryInventory, Status, StoreError};

use crate::exit_codes::*;
use crate::CliError;

pub enum Source {
    Api(InventoryClient),
    File(SnapshotFile),
}

pub struct SnapshotFile {
    path: PathBuf,
    store: MemoryInventory,
}

impl Source {
    /// `--snapshot FILE` wins; otherwise the API with saved credentials.
    pub fn open(snapshot: Option<&Path>, settings: &Settings) -> Result<Self, CliError> {
        match snapshot {
            Some(path) => Ok(Source::File(SnapshotFile::load(path)?)),
            None => {
                let creds = load_auth().ok_or_else(|| CliError {
                    code: EXIT_API_NOT_AUTH,
                    message: "Not authenticated".into(),
                    hint: Some("run `stockcheck login --token <TOKEN>` or pass --snapshot FILE".into()),
                })?;
                let creds = match &settings.api_base {
                    Some(base) => AuthCredentials::new(creds.token, base.clone()),
                    None => creds,
                };
                let client = InventoryClient::new(creds).map_err(CliError::client)?;
                Ok(Source::Api(client))
            }
        }
    }

    /// Full listing for commands that do not run a session.
    pub fn records(&self, scope: &str) -> Result<Vec<InventoryRecord>, CliError> {
        match self {
            Source::Api(client) => client.list_records(scope).map_err(CliError::client),
            Source::File(file) => Ok(file.store.records()),
        }
    }

    pub fn describe(&self, scope: &str) -> String {
        match self {
            Source::Api(client) => format!("{} (scope {})", client.api_base(), scope),
            Source::File(file) => file.path.display().to_string(),
        }
    }

    /// Save pending writes. No-op for the API.
    pub fn persist(&self) -> Result<(), CliError> {
        match self {
            Source::Api(_) => Ok(()),
            Source::File(file) => file.save(),
        }
    }
}

impl InventoryReader for Source {
    fn list_records(&self, scope: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        match self {
            Source::Api(client) => InventoryReader::list_records(client, scope),
            Source::File(file) => file.store.list_records(scope),
        }
    }
}

impl InventoryWriter for Source {
    fn update_status(&self, record_id: &str, status: Status, note: &str) -> Result<(), StoreError> {
        match self {
            Source::Api(client) => InventoryWriter::update_status(client, record_id, status, note),
            Source::File(file) => file.store.update_status(record_id, status, note),
        }
    }
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let invalid = |message: String| CliError {
            code: EXIT_SNAPSHOT_INVALID,
            message,
            hint: Some("expected a JSON array of records, or {\"records\": [...]}".into()),
        };

        let contents = fs::read_to_string(path)
            .map_err(|e| invalid(format!("Cannot read snapshot {}: {}", path.display(), e)))?;
        let json: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| invalid(format!("Invalid JSON in {}: {}", path.display(), e)))?;
        let records = parse_records(&json)
            .map_err(|e| invalid(format!("{}: {}", path.display(), e)))?;

        log::info!("loaded {} record(s) from {}", records.len(), path.display());
        Ok(Self { path: path.to_path_buf(), store: MemoryInventory::new(records) })
    }

    fn save(&self) -> Result<(), CliError> {
        if self.store.write_count() == 0 {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.store.records())
            .map_err(|e| CliError::io(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| CliError::io(format!("Failed to write {}: {}", self.path.display(), e)))?;
        log::info!("saved {} status change(s) to {}", self.store.write_count(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(dir: &Path) -> PathBuf {
        let path = dir.join("snapshot.json");
        fs::write(&path, r#"[
            {"id": 1, "imei": "111", "status": "available"},
            {"id": 2, "imei": "222", "status": "sold"}
        ]"#).unwrap();
        path
    }

    #[test]
    fn file_source_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path());
        let source = Source::open(Some(&path), &Settings::default()).unwrap();

        source.update_status("1", Status::Lost, "gone").unwrap();
        assert!(source.update_status("99", Status::Lost, "").is_err());
        source.persist().unwrap();

        let reloaded = SnapshotFile::load(&path).unwrap();
        assert_eq!(reloaded.store.status_of("1"), Some(Status::Lost));
        assert_eq!(reloaded.store.status_of("2"), Some(Status::Sold));
    }

    #[test]
    fn invalid_snapshot_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"items\": []}").unwrap();
        assert_eq!(SnapshotFile::load(&path).err().unwrap().code, EXIT_SNAPSHOT_INVALID);
        assert_eq!(SnapshotFile::load(&dir.path().join("nope.json")).err().unwrap().code, EXIT_SNAPSHOT_INVALID);
    }
}
