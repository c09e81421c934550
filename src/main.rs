mod config;
mod error;
mod folders;
mod naming;
mod project_index;
mod publish;
mod search;
mod sequence;
mod templates;
mod trie;
mod tui;
mod versioning;

use crate::config::{Env, PR_GROUP, PR_ITEM, PR_PROJECTS_PATH, PR_SHOW, PROJECTS_INDEX_PATH};
use crate::project_index::{IndexPath, ProjectIndex};
use crate::publish::{PublishedData, publish_key};
use crate::templates::{DccSelection, DccTemplates, PathTemplates};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Browse and maintain the show's project index, folders and publishes
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project index JSON file
    #[arg(long, global = true, env = "PROJECTS_INDEX_PATH")]
    index: Option<PathBuf>,

    /// Root folder that holds every show
    #[arg(long, global = true, env = "PR_PROJECTS_PATH")]
    projects_root: Option<PathBuf>,

    /// Path templates JSON (default: built-in)
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// DCC folder templates JSON (default: built-in)
    #[arg(long, global = true)]
    dcc_templates: Option<PathBuf>,

    /// Log file (default: tracepath.log in the temp dir)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Browse projects interactively (default)
    Browse,
    /// List projects starting with prefix (case-insensitive)
    Search { prefix: String },
    /// Print a project's hierarchy
    Tree { project: String },
    /// Add nodes, e.g. `demo/seq01/shot_0010/fx`
    Add {
        #[arg(required = true)]
        paths: Vec<IndexPath>,
    },
    /// Remove nodes and everything below them
    Remove {
        #[arg(required = true)]
        paths: Vec<IndexPath>,
    },
    /// Rename a node
    Rename { path: IndexPath, new_name: String },
    /// Create a project's folders on disk
    CreateFolders {
        project: String,
        /// DCC sub-folders to add under each task
        #[arg(long, num_args = 1..)]
        dccs: Vec<String>,
    },
    /// Create a task folder in the current item
    CreateTask {
        /// Task name
        #[arg(long)]
        name: String,
        /// DCC folder list
        #[arg(long, required = true, num_args = 1..)]
        dccs: Vec<String>,
    },
    /// Add DCC folders to the current task
    AddDccFolders {
        /// DCC folder list
        #[arg(long, required = true, num_args = 1..)]
        dccs: Vec<String>,
    },
    /// Print the path for a new scene file in the current task
    ScenePath {
        #[arg(long)]
        dcc: String,
        #[arg(long)]
        ext: String,
        #[arg(long)]
        name: String,
    },
    /// Print the highest version found in a folder
    LatestVersion { dir: PathBuf },
    /// Print the first file of a given version inside a versioned folder
    FindVersion { dir: PathBuf, version: u32 },
    /// Copy one project's hierarchy from another index file
    ImportProject { source: PathBuf, project: String },
    /// Group per-frame layer files into sequences
    Sequences {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Record a publish comment for the current item
    Publish {
        #[arg(long, env = "PR_GROUP")]
        group: String,
        #[arg(long, env = "PR_ITEM")]
        item: String,
        #[arg(long)]
        file: String,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Show the publish comment of a file
    Comment {
        #[arg(long, env = "PR_GROUP")]
        group: String,
        #[arg(long, env = "PR_ITEM")]
        item: String,
        #[arg(long)]
        file: String,
    },
    /// Delete a published file or folder and forget it in the publish data
    Delete {
        path: PathBuf,
        /// Also drop every index entry with this name
        #[arg(long)]
        prune: Option<String>,
    },
}

fn init_logging(cli: &Cli) -> Result<()> {
    let path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tracepath.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(cli.log_level)
        .init();
    Ok(())
}

fn load_env(cli: &Cli) -> Env {
    let mut env = Env::from_process();
    if let Some(root) = &cli.projects_root {
        env.set(PR_PROJECTS_PATH, root.to_string_lossy());
    }
    if let Some(index) = &cli.index {
        env.set(PROJECTS_INDEX_PATH, index.to_string_lossy());
    }
    env
}

fn resolve_dccs(templates: &DccTemplates, inputs: &[String]) -> Vec<String> {
    let DccSelection { accepted, skipped } = templates.resolve(inputs);
    if !skipped.is_empty() {
        warn!(?skipped, "no folder template, skipping");
        eprintln!("Skipped (no template found): {}", skipped.join(", "));
    }
    accepted
}

fn edit_index(env: &Env, edit: impl FnOnce(&mut ProjectIndex) -> Result<()>) -> Result<()> {
    let path = env.index_path()?;
    let mut index = ProjectIndex::load(&path)?;
    edit(&mut index)?;
    index.save(&path)?;
    Ok(())
}

fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_logging(&cli)?;
    let env = load_env(&cli);
    let command = cli.command.take().unwrap_or(Commands::Browse);

    let path_templates = || PathTemplates::load(cli.templates.as_deref());
    let dcc_templates = || DccTemplates::load(cli.dcc_templates.as_deref());

    match &command {
        Commands::Browse => {
            let index = ProjectIndex::load(&env.index_path()?)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(tui::run_tui(index))?;
        }
        Commands::Search { prefix } => {
            let index = ProjectIndex::load(&env.index_path()?)?;
            for name in search::matching_names(&index.project_names(), prefix) {
                println!("{name}");
            }
        }
        Commands::Tree { project } => {
            let index = ProjectIndex::load(&env.index_path()?)?;
            let lines = index
                .tree_lines(project)
                .with_context(|| format!("no project named '{project}'"))?;
            for line in lines {
                println!("{line}");
            }
        }
        Commands::Add { paths } => edit_index(&env, |index| {
            for path in paths {
                println!("{}", index.add(path)?);
            }
            Ok(())
        })?,
        Commands::Remove { paths } => edit_index(&env, |index| {
            for path in paths {
                index.remove(path)?;
            }
            Ok(())
        })?,
        Commands::Rename { path, new_name } => edit_index(&env, |index| {
            println!("{}", index.rename(path, new_name)?);
            Ok(())
        })?,
        Commands::CreateFolders { project, dccs } => {
            let templates = dcc_templates()?;
            let dccs = resolve_dccs(&templates, dccs);
            let index = ProjectIndex::load(&env.index_path()?)?;
            let created =
                folders::create_project_folders(&index, project, &env.projects_root()?, &dccs, &templates)?;
            print_paths(&created);
        }
        Commands::CreateTask { name, dccs } => {
            let templates = dcc_templates()?;
            let dccs = resolve_dccs(&templates, dccs);
            let name = naming::sanitize_name(name);
            let created = folders::create_task(&env.item_dir()?, &name, &dccs, &templates)?;
            print_paths(&created);

            if env.index_path().is_ok() {
                let show = env.get(PR_SHOW).unwrap_or_default();
                let group = env.get(PR_GROUP).unwrap_or_default();
                let item = env.get(PR_ITEM).unwrap_or_default();
                let task_path = IndexPath::new([show, group, item, name.as_str()])?;
                let indexed = edit_index(&env, |index| {
                    if !index.contains(&task_path) {
                        index.add(&task_path)?;
                    }
                    Ok(())
                });
                if let Err(err) = indexed {
                    warn!(%err, "task folder created but not added to the project index");
                }
            }
        }
        Commands::AddDccFolders { dccs } => {
            let templates = dcc_templates()?;
            let dccs = resolve_dccs(&templates, dccs);
            let task_dir = versioning::task_context(&path_templates()?, &env)?;
            let created = folders::add_dcc_folders(&task_dir, &dccs, &templates)?;
            print_paths(&created);
        }
        Commands::ScenePath { dcc, ext, name } => {
            match versioning::next_scene_path(&path_templates()?, &env, dcc, ext, name)? {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("a scene name is required"),
            }
        }
        Commands::LatestVersion { dir } => match versioning::latest_version_number(dir)? {
            Some(version) => println!("{}", naming::format_version(version)),
            None => anyhow::bail!("no versions found in {}", dir.display()),
        },
        Commands::FindVersion { dir, version } => match versioning::find_file_in_context(dir, *version)? {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!(
                "no file for version {} in {}",
                naming::format_version(*version),
                dir.display()
            ),
        },
        Commands::ImportProject { source, project } => {
            let other = ProjectIndex::load(source)?;
            let imported = other
                .project(project)
                .cloned()
                .with_context(|| format!("no project named '{project}' in {}", source.display()))?;
            edit_index(&env, |index| {
                index.merge_project(project, imported);
                Ok(())
            })?;
            info!(%project, source = %source.display(), "project imported");
        }
        Commands::Sequences { files } => {
            for line in sequence::preview(&sequence::group_sequences(files)) {
                println!("{line}");
            }
        }
        Commands::Publish {
            group,
            item,
            file,
            comment,
        } => {
            let folder = env.show_data_folder()?;
            let mut data = PublishedData::load_or_init(&folder)?;
            data.record(&publish_key(group, item), file, comment);
            data.save(&folder)?;
            println!("Published {file}");
        }
        Commands::Comment { group, item, file } => {
            let data = PublishedData::load_or_init(&env.show_data_folder()?)?;
            match data.comment(&publish_key(group, item), file) {
                Some(comment) => println!("{comment}"),
                None => anyhow::bail!("no publish recorded for {file}"),
            }
        }
        Commands::Delete { path, prune } => delete(&env, path, prune.as_deref())?,
    }

    Ok(())
}

/// Removes a path on disk, then every reference to it in the show's publish
/// data and, when asked, index entries carrying `prune` as their name.
fn delete(env: &Env, path: &Path, prune: Option<&str>) -> Result<()> {
    folders::remove_path(path)?;

    if let Ok(folder) = env.show_data_folder() {
        let mut data = PublishedData::load_or_init(&folder)?;
        let removed = data.remove_file(&path.to_string_lossy());
        if removed > 0 {
            data.save(&folder)?;
            info!(path = %path.display(), removed, "publish records dropped");
        }
    }

    if let Some(name) = prune {
        edit_index(env, |index| {
            let removed = index.prune_name(name);
            info!(%name, removed, "index entries pruned");
            Ok(())
        })?;
    }

    println!("Removed {}", path.display());
    Ok(())
}
