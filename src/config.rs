//! Project configuration. A syndication job is described by a
//! `blogroll.yaml` file; paths inside it are relative to the file itself,
//! so the tool can be invoked from anywhere inside the project tree.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::feed::FeedConfig;
use crate::filter::Filters;
use crate::github::GitHubSource;

pub const PROJECT_FILE: &str = "blogroll.yaml";

/// The author of the local content set, used for feed attribution.
#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

// The on-disk shape of the project file.
#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    posts: Option<PathBuf>,
    output: PathBuf,
    #[serde(default)]
    github: Option<GitHubSource>,
    #[serde(default)]
    filters: Option<Filters>,
    #[serde(default)]
    feed: Option<FeedConfig>,
}

/// A fully resolved syndication job.
pub struct Config {
    /// Directory of local post source files, if the project has any.
    pub posts_directory: Option<PathBuf>,

    /// Path of the JSON post list to write.
    pub output: PathBuf,

    pub github: Option<GitHubSource>,

    pub filters: Option<Filters>,

    pub feed: Option<FeedConfig>,
}

impl Config {
    /// Searches `dir` and its parents for a [`PROJECT_FILE`] and loads the
    /// first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file and resolves its paths against the file's
    /// parent directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path)?)
            .map_err(|e| anyhow!("decoding project file `{}`: {}", path.display(), e))?;
        match path.parent() {
            None => Err(anyhow!(
                "can't get parent directory for provided project file path `{}`",
                path.display()
            )),
            Some(project_root) => Ok(Config {
                posts_directory: project.posts.map(|posts| project_root.join(posts)),
                output: project_root.join(project.output),
                github: project.github,
                filters: project.filters,
                feed: project.feed,
            }),
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| anyhow!("opening project file `{}`: {}", path.display(), e))
}
