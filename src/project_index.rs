use crate::error::{Error, Result};
use crate::naming::sanitize_name;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Depth of a node in the index: Project -> Group -> Item -> Task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Project,
    Group,
    Item,
    Task,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Project, Level::Group, Level::Item, Level::Task];

    pub fn depth(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Project => "project",
            Level::Group => "group",
            Level::Item => "item",
            Level::Task => "task",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

/// A sequence, or a container such as `assets`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub items: BTreeMap<String, Item>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
}

/// Slash-separated location of a node, e.g. `demo/seq01/shot_0010/fx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPath(Vec<String>);

impl IndexPath {
    pub fn new<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Result<Self> {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        match parts.len() {
            0 => Err(Error::NotFound("empty index path".into())),
            1..=4 => Ok(Self(parts)),
            _ => Err(Error::HierarchyTooDeep),
        }
    }

    pub fn level(&self) -> Level {
        Level::ALL[self.0.len() - 1]
    }

    pub fn name(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn parent(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }
}

impl FromStr for IndexPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IndexPath::new(s.split('/').filter(|part| !part.is_empty()))
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// The show-wide project index, persisted as nested JSON objects keyed by
/// name: `{project: {groups: {group: {items: {item: {tasks: {task: {}}}}}}}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectIndex {
    projects: BTreeMap<String, Project>,
}

/// Children of one node, whatever its level.
enum Children<'a> {
    Projects(&'a mut BTreeMap<String, Project>),
    Groups(&'a mut BTreeMap<String, Group>),
    Items(&'a mut BTreeMap<String, Item>),
    Tasks(&'a mut BTreeMap<String, Task>),
}

impl Children<'_> {
    fn insert(self, name: String) {
        match self {
            Children::Projects(map) => insert_default(map, name),
            Children::Groups(map) => insert_default(map, name),
            Children::Items(map) => insert_default(map, name),
            Children::Tasks(map) => insert_default(map, name),
        }
    }

    fn remove(self, name: &str) -> bool {
        match self {
            Children::Projects(map) => map.remove(name).is_some(),
            Children::Groups(map) => map.remove(name).is_some(),
            Children::Items(map) => map.remove(name).is_some(),
            Children::Tasks(map) => map.remove(name).is_some(),
        }
    }

    fn rename(self, old: &str, new: String) -> Result<bool> {
        match self {
            Children::Projects(map) => rename_key(map, old, new),
            Children::Groups(map) => rename_key(map, old, new),
            Children::Items(map) => rename_key(map, old, new),
            Children::Tasks(map) => rename_key(map, old, new),
        }
    }
}

fn insert_default<T: Default>(map: &mut BTreeMap<String, T>, name: String) {
    map.entry(name).or_default();
}

/// Moves `old` to `new`. Fails without touching the map when `new` is taken
/// by another sibling.
fn rename_key<T>(map: &mut BTreeMap<String, T>, old: &str, new: String) -> Result<bool> {
    if !map.contains_key(old) {
        return Ok(false);
    }
    if new != old && map.contains_key(&new) {
        return Err(Error::AlreadyExists(new));
    }
    if let Some(node) = map.remove(old) {
        map.insert(new, node);
    }
    Ok(true)
}

fn child_mut<'a, T>(map: &'a mut BTreeMap<String, T>, name: &str) -> Result<&'a mut T> {
    map.get_mut(name).ok_or_else(|| Error::NotFound(name.to_string()))
}

impl ProjectIndex {
    /// Reads the index. A missing file is an empty index, and so is a file
    /// that no longer parses; the latter is logged.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!(path = %path.display(), "no project index yet");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        match serde_json::from_str(&text) {
            Ok(index) => Ok(index),
            Err(err) => {
                warn!(path = %path.display(), %err, "project index is corrupted, starting with an empty index");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        write_pretty_json(path, self)?;
        info!(path = %path.display(), projects = self.projects.len(), "project index written");
        Ok(())
    }

    pub fn project_names(&self) -> Vec<&str> {
        self.projects.keys().map(String::as_str).collect()
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn contains(&self, path: &IndexPath) -> bool {
        let parts = &path.0;
        let Some(project) = self.projects.get(&parts[0]) else {
            return false;
        };
        match parts.as_slice() {
            [_] => true,
            [_, g] => project.groups.contains_key(g),
            [_, g, i] => project.groups.get(g).is_some_and(|group| group.items.contains_key(i)),
            [_, g, i, t] => project
                .groups
                .get(g)
                .and_then(|group| group.items.get(i))
                .is_some_and(|item| item.tasks.contains_key(t)),
            _ => false,
        }
    }

    fn children_mut(&mut self, parent: &[String]) -> Result<Children<'_>> {
        Ok(match parent {
            [] => Children::Projects(&mut self.projects),
            [p] => Children::Groups(&mut child_mut(&mut self.projects, p)?.groups),
            [p, g] => {
                let project = child_mut(&mut self.projects, p)?;
                Children::Items(&mut child_mut(&mut project.groups, g)?.items)
            }
            [p, g, i] => {
                let project = child_mut(&mut self.projects, p)?;
                let group = child_mut(&mut project.groups, g)?;
                Children::Tasks(&mut child_mut(&mut group.items, i)?.tasks)
            }
            _ => return Err(Error::HierarchyTooDeep),
        })
    }

    /// Adds a node under an existing parent and returns the stored path. The
    /// new name is sanitised; adding an existing name is a no-op.
    pub fn add(&mut self, path: &IndexPath) -> Result<IndexPath> {
        let name = sanitize_name(path.name());
        self.children_mut(path.parent())?.insert(name.clone());

        let stored = IndexPath::new(path.parent().iter().cloned().chain([name]))?;
        debug!(path = %stored, level = %stored.level(), "index node added");
        Ok(stored)
    }

    /// Removes a node together with everything below it.
    pub fn remove(&mut self, path: &IndexPath) -> Result<()> {
        if !self.children_mut(path.parent())?.remove(path.name()) {
            return Err(Error::NotFound(path.to_string()));
        }
        debug!(%path, "index node removed");
        Ok(())
    }

    /// Renames a node in place, keeping its subtree. Returns the stored name.
    pub fn rename(&mut self, path: &IndexPath, new_name: &str) -> Result<String> {
        let name = sanitize_name(new_name);
        if !self.children_mut(path.parent())?.rename(path.name(), name.clone())? {
            return Err(Error::NotFound(path.to_string()));
        }
        debug!(%path, new_name = %name, "index node renamed");
        Ok(name)
    }

    /// Replaces one project's subtree, leaving the other projects untouched.
    pub fn merge_project(&mut self, name: &str, project: Project) {
        self.projects.insert(name.to_string(), project);
    }

    /// Removes every node called `name`, at any level. Returns how many went.
    pub fn prune_name(&mut self, name: &str) -> usize {
        let mut removed = usize::from(self.projects.remove(name).is_some());
        for project in self.projects.values_mut() {
            removed += usize::from(project.groups.remove(name).is_some());
            for group in project.groups.values_mut() {
                removed += usize::from(group.items.remove(name).is_some());
                for item in group.items.values_mut() {
                    removed += usize::from(item.tasks.remove(name).is_some());
                }
            }
        }
        removed
    }

    /// Depth-first listing of a project's nodes, the project itself first.
    pub fn walk(&self, project: &str) -> Option<Vec<(Level, &str)>> {
        let (name, node) = self.projects.get_key_value(project)?;
        let mut nodes = vec![(Level::Project, name.as_str())];
        for (group_name, group) in &node.groups {
            nodes.push((Level::Group, group_name.as_str()));
            for (item_name, item) in &group.items {
                nodes.push((Level::Item, item_name.as_str()));
                for task_name in item.tasks.keys() {
                    nodes.push((Level::Task, task_name.as_str()));
                }
            }
        }
        Some(nodes)
    }

    /// Indented text rendering of a project, two spaces per level.
    pub fn tree_lines(&self, project: &str) -> Option<Vec<String>> {
        let nodes = self.walk(project)?;
        Some(
            nodes
                .into_iter()
                .map(|(level, name)| format!("{}{name}", "  ".repeat(level.depth())))
                .collect(),
        )
    }
}

/// Writes `value` as JSON indented by four spaces.
pub fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::json(path, e))?;
    fs::write(path, buffer).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod project_index_tests {
    use super::*;
    use tempfile::TempDir;

    fn path(text: &str) -> IndexPath {
        text.parse().unwrap()
    }

    fn sample() -> ProjectIndex {
        let mut index = ProjectIndex::default();
        for p in [
            "demo",
            "demo/seq01",
            "demo/seq01/shot_0010",
            "demo/seq01/shot_0010/fx",
            "demo/seq01/shot_0010/lighting",
            "demo/assets",
            "demo/assets/tree",
            "other",
        ] {
            index.add(&path(p)).unwrap();
        }
        index
    }

    #[test]
    fn test_index_path_parse() {
        let p = path("/demo/seq01//shot_0010/");
        assert_eq!(p.level(), Level::Item);
        assert_eq!(p.name(), "shot_0010");
        assert_eq!(p.to_string(), "demo/seq01/shot_0010");
        assert!(matches!("a/b/c/d/e".parse::<IndexPath>(), Err(Error::HierarchyTooDeep)));
        assert!("".parse::<IndexPath>().is_err());
    }

    #[test]
    fn test_serialized_layout() {
        let index = sample();
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(
            value["demo"]["groups"]["seq01"]["items"]["shot_0010"]["tasks"]["fx"],
            serde_json::json!({})
        );
        assert_eq!(value["demo"]["groups"]["assets"]["items"]["tree"]["tasks"], serde_json::json!({}));
        assert_eq!(value["other"]["groups"], serde_json::json!({}));
    }

    #[test]
    fn test_add_requires_parent() {
        let mut index = sample();
        assert!(matches!(index.add(&path("demo/seq02/shot")), Err(Error::NotFound(name)) if name == "seq02"));
        assert!(matches!(index.add(&path("nope/seq01")), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_add_sanitises_and_is_idempotent() {
        let mut index = sample();
        let stored = index.add(&path("demo/seq 02")).unwrap();
        assert_eq!(stored, path("demo/seq_02"));
        index.add(&path("demo/seq_02")).unwrap();
        assert_eq!(index.project("demo").unwrap().groups.len(), 3);
    }

    #[test]
    fn test_remove_and_rename() {
        let mut index = sample();
        index.rename(&path("demo/seq01"), "seq 10").unwrap();
        assert!(index.contains(&path("demo/seq_10/shot_0010/fx")));
        assert!(!index.contains(&path("demo/seq01")));

        index.remove(&path("demo/seq_10/shot_0010")).unwrap();
        assert!(index.contains(&path("demo/seq_10")));
        assert!(!index.contains(&path("demo/seq_10/shot_0010/fx")));
        assert!(matches!(index.remove(&path("demo/seq_10/shot_0010")), Err(Error::NotFound(_))));
        assert!(matches!(index.rename(&path("ghost"), "x"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rename_onto_sibling_keeps_both() {
        let mut index = sample();
        index.add(&path("demo/seq02")).unwrap();
        index.add(&path("demo/seq02/shot_0020")).unwrap();

        assert!(matches!(
            index.rename(&path("demo/seq01"), "seq02"),
            Err(Error::AlreadyExists(name)) if name == "seq02"
        ));
        assert!(index.contains(&path("demo/seq01/shot_0010/fx")));
        assert!(index.contains(&path("demo/seq02/shot_0020")));

        // the same name again is a no-op, not a clash
        assert_eq!(index.rename(&path("demo/seq01"), "seq01").unwrap(), "seq01");
        assert!(index.contains(&path("demo/seq01/shot_0010")));
    }

    #[test]
    fn test_prune_name_everywhere() {
        let mut index = sample();
        index.add(&path("other/fx")).unwrap();
        assert_eq!(index.prune_name("fx"), 2);
        assert!(!index.contains(&path("demo/seq01/shot_0010/fx")));
        assert!(index.contains(&path("demo/seq01/shot_0010/lighting")));
    }

    #[test]
    fn test_merge_project_keeps_others() {
        let mut index = sample();
        let mut replacement = Project::default();
        replacement.groups.insert("seq99".into(), Group::default());
        index.merge_project("demo", replacement);
        assert!(index.contains(&path("demo/seq99")));
        assert!(!index.contains(&path("demo/seq01")));
        assert!(index.contains(&path("other")));
    }

    #[test]
    fn test_tree_lines() {
        let index = sample();
        assert_eq!(
            index.tree_lines("demo").unwrap(),
            vec![
                "demo",
                "  assets",
                "    tree",
                "  seq01",
                "    shot_0010",
                "      fx",
                "      lighting",
            ]
        );
        assert!(index.tree_lines("missing").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config/trace_project_index.json");
        let index = sample();
        index.save(&file).unwrap();

        let text = fs::read_to_string(&file).unwrap();
        assert!(text.starts_with("{\n    \"demo\""));
        assert_eq!(ProjectIndex::load(&file).unwrap(), index);
    }

    #[test]
    fn test_missing_or_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("index.json");
        assert_eq!(ProjectIndex::load(&file).unwrap(), ProjectIndex::default());

        fs::write(&file, "{\"demo\": ").unwrap();
        assert_eq!(ProjectIndex::load(&file).unwrap(), ProjectIndex::default());
    }
}
