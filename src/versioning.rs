use crate::config::{Env, TASK_KEYS};
use crate::error::{Error, Result};
use crate::naming::format_version;
use crate::templates::{PathTemplates, render};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VERSION_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|[^A-Za-z])v(\d+)").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Version number carried by a file or folder name: the last `v<digits>`
/// tag that starts a word (so not `rev3`), else the first run of digits.
pub fn version_in_name(name: &str) -> Option<u32> {
    VERSION_TAG
        .captures_iter(name)
        .last()
        .and_then(|caps| caps[1].parse().ok())
        .or_else(|| DIGITS.find(name).and_then(|m| m.as_str().parse().ok()))
}

/// Highest version among the entries of `dir`, or `None` when the folder is
/// missing or nothing in it carries a number.
pub fn latest_version_number(dir: &Path) -> Result<Option<u32>> {
    if !dir.exists() {
        return Ok(None);
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut latest = None;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if let Some(version) = version_in_name(&entry.file_name().to_string_lossy()) {
            latest = latest.max(Some(version));
        }
    }
    Ok(latest)
}

/// First file inside a version folder of `base` whose name carries `version`.
/// Both folder and file must contain the zero-padded version string.
pub fn find_file_in_context(base: &Path, version: u32) -> Result<Option<PathBuf>> {
    let tag = format_version(version);
    let mut folders = sorted_entries(base)?;
    folders.retain(|p| p.is_dir() && file_name(p).contains(&tag));

    for folder in folders {
        let found = sorted_entries(&folder)?
            .into_iter()
            .find(|file| file_name(file).contains(&tag));
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// `<projects>/<show>/<group>/<item>/<task>` for the current environment.
pub fn task_context(templates: &PathTemplates, env: &Env) -> Result<PathBuf> {
    env.require(&TASK_KEYS)?;
    let pattern = templates.single("task_context")?;
    Ok(PathBuf::from(render(pattern, &env.template_vars())?))
}

/// Path for a new scene file. Starts at version 001 and moves past the latest
/// version already in the scenes folder when that file exists.
pub fn next_scene_path(
    templates: &PathTemplates,
    env: &Env,
    dcc: &str,
    ext: &str,
    name: &str,
) -> Result<Option<PathBuf>> {
    if name.is_empty() {
        return Ok(None);
    }
    env.require(&TASK_KEYS)?;

    let pattern = templates.single("scene_file")?;
    let mut vars = env.template_vars();
    vars.insert("dcc".into(), dcc.into());
    vars.insert("ext".into(), ext.into());
    vars.insert("name".into(), name.into());
    vars.insert("version".into(), format_version(1));

    let first = PathBuf::from(render(pattern, &vars)?);
    let Some(scenes) = first.parent().filter(|dir| dir.is_dir()) else {
        return Ok(Some(first));
    };
    if !first.is_file() {
        return Ok(Some(first));
    }

    let latest = latest_version_number(scenes)?.unwrap_or(0);
    let next = latest.checked_add(1).ok_or(Error::VersionOverflow(latest))?;
    vars.insert("version".into(), format_version(next));
    Ok(Some(PathBuf::from(render(pattern, &vars)?)))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
