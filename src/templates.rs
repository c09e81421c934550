use crate::error::{Error, Result};
use crate::naming::{clean_dcc_name, closest_match};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const DEFAULT_PATH_TEMPLATES: &str = include_str!("templates/folder_structure.json");
const DEFAULT_DCC_TEMPLATES: &str = include_str!("templates/dcc_templates.json");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

/// A path template entry: a single pattern or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Single(String),
    Many(Vec<String>),
}

/// Named path patterns such as `scene_file`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct PathTemplates {
    entries: BTreeMap<String, TemplateValue>,
}

impl PathTemplates {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_json(path, DEFAULT_PATH_TEMPLATES)
    }

    pub fn get(&self, name: &str) -> Result<&TemplateValue> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_string()))
    }

    /// Fetches a template that must be a single pattern.
    pub fn single(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            TemplateValue::Single(pattern) => Ok(pattern),
            TemplateValue::Many(_) => Err(Error::UnknownTemplate(name.to_string())),
        }
    }
}

/// Substitutes every `{key}` in `template` from `vars`.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut missing = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        match vars.get(key) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(key) => Err(Error::MissingVariable(key)),
        None => Ok(rendered.into_owned()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DccCheck {
    Known,
    Suggest(String),
    Unknown,
}

/// DCCs accepted for folder creation and those skipped for lack of a template.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DccSelection {
    pub accepted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Sub-folder layout per DCC application.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DccTemplates {
    folders: BTreeMap<String, Vec<String>>,
}

impl DccTemplates {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_json(path, DEFAULT_DCC_TEMPLATES)
    }

    pub fn known(&self) -> Vec<&str> {
        self.folders.keys().map(String::as_str).collect()
    }

    /// Relative sub-folders for `dcc`; empty when it has no template.
    pub fn folders(&self, dcc: &str) -> &[String] {
        self.folders.get(dcc).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn check(&self, dcc: &str) -> DccCheck {
        if self.folders.contains_key(dcc) {
            return DccCheck::Known;
        }
        match closest_match(dcc, &self.known()) {
            Some(suggestion) => DccCheck::Suggest(suggestion.to_string()),
            None => DccCheck::Unknown,
        }
    }

    /// Cleans user input, replaces typos with their closest known DCC and
    /// splits the result into accepted and skipped names.
    pub fn resolve<S: AsRef<str>>(&self, inputs: &[S]) -> DccSelection {
        let mut selection = DccSelection::default();
        for input in inputs {
            let dcc = clean_dcc_name(input.as_ref());
            if dcc.is_empty() {
                continue;
            }
            let (name, bucket) = match self.check(&dcc) {
                DccCheck::Known => (dcc, &mut selection.accepted),
                DccCheck::Suggest(suggestion) => {
                    debug!(input = %dcc, %suggestion, "replacing unknown DCC with closest match");
                    (suggestion, &mut selection.accepted)
                }
                DccCheck::Unknown => (dcc, &mut selection.skipped),
            };
            if !bucket.contains(&name) {
                bucket.push(name);
            }
        }
        selection
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: Option<&Path>, default: &str) -> Result<T> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            serde_json::from_str(&text).map_err(|e| Error::json(path, e))
        }
        None => serde_json::from_str(default).map_err(|e| Error::json("<built-in>", e)),
    }
}
