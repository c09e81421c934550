use crate::error::{Error, Result};
use crate::project_index::write_pretty_json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PUBLISHED_DATA_FILE: &str = "published_data.json";

/// Publish comments per show: publish key -> published file -> comment.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishedData {
    records: BTreeMap<String, BTreeMap<String, String>>,
}

/// Key under which an item's publishes are recorded, i.e. sequence and shot.
pub fn publish_key(group: &str, item: &str) -> String {
    format!("{group}_{item}")
}

pub fn data_path(folder: &Path) -> PathBuf {
    folder.join(PUBLISHED_DATA_FILE)
}

impl PublishedData {
    /// Loads the show's publish records, creating the folder and an empty
    /// `{}` file on first use.
    pub fn load_or_init(folder: &Path) -> Result<Self> {
        fs::create_dir_all(folder).map_err(|e| Error::io(folder, e))?;
        let path = data_path(folder);
        if !path.exists() {
            fs::write(&path, "{}").map_err(|e| Error::io(&path, e))?;
        }
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::json(&path, e))
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        write_pretty_json(&data_path(folder), self)
    }

    pub fn record(&mut self, key: &str, file: &str, comment: &str) {
        info!(%key, %file, "recording publish");
        self.records
            .entry(key.to_string())
            .or_default()
            .insert(file.to_string(), comment.to_string());
    }

    pub fn comment(&self, key: &str, file: &str) -> Option<&str> {
        self.records.get(key)?.get(file).map(String::as_str)
    }

    /// Drops every record of `file`, under any key. Returns how many went.
    pub fn remove_file(&mut self, file: &str) -> usize {
        let mut removed = 0;
        for files in self.records.values_mut() {
            if files.remove(file).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.records.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod publish_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("demo/show_data");

        let data = PublishedData::load_or_init(&folder).unwrap();
        assert!(data.is_empty());
        assert_eq!(fs::read_to_string(data_path(&folder)).unwrap(), "{}");
    }

    #[test]
    fn test_record_and_read_back() {
        let dir = TempDir::new().unwrap();
        let key = publish_key("seq01", "shot_0010");
        assert_eq!(key, "seq01_shot_0010");

        let mut data = PublishedData::load_or_init(dir.path()).unwrap();
        data.record(&key, "/p/manifest_v001.usda", "first pass");
        data.record(&key, "/p/manifest_v002.usda", "notes addressed");
        data.save(dir.path()).unwrap();

        let reloaded = PublishedData::load_or_init(dir.path()).unwrap();
        assert_eq!(reloaded, data);
        assert_eq!(reloaded.comment(&key, "/p/manifest_v002.usda"), Some("notes addressed"));
        assert_eq!(reloaded.comment(&key, "/p/other.usda"), None);
        assert_eq!(reloaded.comment("seq02_shot_0010", "/p/manifest_v001.usda"), None);

        let text = fs::read_to_string(data_path(dir.path())).unwrap();
        assert!(text.contains("\n    \"seq01_shot_0010\""));
    }

    #[test]
    fn test_remove_file() {
        let mut data = PublishedData::default();
        data.record("a_b", "/f.usda", "x");
        data.record("c_d", "/f.usda", "y");
        data.record("c_d", "/g.usda", "z");

        assert_eq!(data.remove_file("/f.usda"), 2);
        assert_eq!(data.comment("c_d", "/g.usda"), Some("z"));
        assert_eq!(data.remove_file("/missing.usda"), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(data_path(dir.path()), "{oops").unwrap();
        assert!(matches!(PublishedData::load_or_init(dir.path()), Err(Error::Json { .. })));
    }
}
