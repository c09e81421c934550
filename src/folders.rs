use crate::error::{Error, Result};
use crate::project_index::ProjectIndex;
use crate::templates::DccTemplates;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Creates `dir` unless it already exists; records it in `created` if new.
fn ensure_dir(dir: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    created.push(dir.to_path_buf());
    Ok(())
}

/// Lays out `<parent>/<dcc>/<subfolder>` for each sub-folder of the DCC's template.
pub fn create_dcc_folders(
    parent: &Path,
    dcc: &str,
    templates: &DccTemplates,
) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for folder in templates.folders(dcc) {
        ensure_dir(&parent.join(dcc).join(folder), &mut created)?;
    }
    Ok(created)
}

/// Creates the on-disk tree of one project under `show_root`, down to task
/// folders, adding DCC sub-folders under every task when `dccs` is non-empty.
/// Returns the directories that did not exist before.
pub fn create_project_folders(
    index: &ProjectIndex,
    project: &str,
    show_root: &Path,
    dccs: &[String],
    templates: &DccTemplates,
) -> Result<Vec<PathBuf>> {
    let node = index
        .project(project)
        .ok_or_else(|| Error::NotFound(project.to_string()))?;

    let mut created = Vec::new();
    let project_dir = show_root.join(project);
    ensure_dir(&project_dir, &mut created)?;

    for (group_name, group) in &node.groups {
        let group_dir = project_dir.join(group_name);
        ensure_dir(&group_dir, &mut created)?;
        for (item_name, item) in &group.items {
            let item_dir = group_dir.join(item_name);
            ensure_dir(&item_dir, &mut created)?;
            for task_name in item.tasks.keys() {
                let task_dir = item_dir.join(task_name);
                ensure_dir(&task_dir, &mut created)?;
                for dcc in dccs {
                    created.extend(create_dcc_folders(&task_dir, dcc, templates)?);
                }
            }
        }
    }

    info!(%project, root = %show_root.display(), created = created.len(), "project folders created");
    Ok(created)
}

/// Creates a task folder in `item_dir` with DCC sub-folders.
pub fn create_task(
    item_dir: &Path,
    name: &str,
    dccs: &[String],
    templates: &DccTemplates,
) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let task_dir = item_dir.join(name);
    ensure_dir(&task_dir, &mut created)?;
    created.extend(add_dcc_folders(&task_dir, dccs, templates)?);
    Ok(created)
}

/// Adds DCC sub-folders to an existing task folder.
pub fn add_dcc_folders(
    task_dir: &Path,
    dccs: &[String],
    templates: &DccTemplates,
) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dcc in dccs {
        created.extend(create_dcc_folders(task_dir, dcc, templates)?);
    }
    info!(task = %task_dir.display(), created = created.len(), "DCC folders added");
    Ok(created)
}

/// Deletes a file, or a directory with its content. A file's parent folder
/// goes too when the file was the last thing in it.
pub fn remove_path(path: &Path) -> Result<()> {
    if !path.exists() {
        warn!(path = %path.display(), "nothing to remove");
        return Err(Error::NotFound(path.display().to_string()));
    }

    if path.is_dir() {
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "removed folder");
        return Ok(());
    }

    fs::remove_file(path).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), "removed file");
    // a bare file name has an empty parent: the working directory, which stays
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let empty = fs::read_dir(parent)
            .map_err(|e| Error::io(parent, e))?
            .next()
            .is_none();
        if empty {
            fs::remove_dir(parent).map_err(|e| Error::io(parent, e))?;
            info!(path = %parent.display(), "removed empty folder");
        }
    }
    Ok(())
}
