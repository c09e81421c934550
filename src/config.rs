use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub const PR_PROJECTS_PATH: &str = "PR_PROJECTS_PATH";
pub const PR_SHOW: &str = "PR_SHOW";
pub const PR_GROUP: &str = "PR_GROUP";
pub const PR_ITEM: &str = "PR_ITEM";
pub const PR_TASK: &str = "PR_TASK";
pub const PROJECTS_INDEX_PATH: &str = "PROJECTS_INDEX_PATH";

/// Keys needed to resolve a task context on disk.
pub const TASK_KEYS: [&str; 5] = [PR_PROJECTS_PATH, PR_SHOW, PR_ITEM, PR_GROUP, PR_TASK];

/// Snapshot of the pipeline environment variables.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Reads the pipeline variables from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = [
            PR_PROJECTS_PATH,
            PR_SHOW,
            PR_GROUP,
            PR_ITEM,
            PR_TASK,
            PROJECTS_INDEX_PATH,
        ]
        .into_iter()
        .filter_map(|key| lookup(key).map(|value| (key.to_string(), value)))
        .collect();
        Self { vars }
    }

    /// Overrides a single variable, e.g. from a command line flag.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    /// Returns the value of `key`. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Fails with every missing key at once.
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| self.get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingEnv(missing))
        }
    }

    pub fn projects_root(&self) -> Result<PathBuf> {
        self.require(&[PR_PROJECTS_PATH])?;
        Ok(PathBuf::from(self.get(PR_PROJECTS_PATH).unwrap_or_default()))
    }

    pub fn index_path(&self) -> Result<PathBuf> {
        self.require(&[PROJECTS_INDEX_PATH])?;
        Ok(PathBuf::from(self.get(PROJECTS_INDEX_PATH).unwrap_or_default()))
    }

    /// `<projects>/<show>/show_data`, where publish records live.
    pub fn show_data_folder(&self) -> Result<PathBuf> {
        self.require(&[PR_PROJECTS_PATH, PR_SHOW])?;
        Ok(self.projects_root()?.join(self.get(PR_SHOW).unwrap_or_default()).join("show_data"))
    }

    /// `<projects>/<show>/<group>/<item>`, the folder new tasks go into.
    pub fn item_dir(&self) -> Result<PathBuf> {
        self.require(&[PR_PROJECTS_PATH, PR_SHOW, PR_GROUP, PR_ITEM])?;
        let mut dir = self.projects_root()?;
        for key in [PR_SHOW, PR_GROUP, PR_ITEM] {
            dir.push(self.get(key).unwrap_or_default());
        }
        Ok(dir)
    }

    /// All variables as template values, keyed by their lower-cased names.
    pub fn template_vars(&self) -> HashMap<String, String> {
        self.vars
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.clone()))
            .collect()
    }
}
