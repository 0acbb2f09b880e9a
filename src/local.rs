//! Reads the local content set: a directory tree of Markdown post source
//! files. Local posts go through the same front-matter and rendering path
//! as syndicated ones but carry `source = local` and no canonical URL.

use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::post::{Post, Source};

/// Walks `dir` and parses every `.md`/`.mdx` file into a local [`Post`].
/// Files that fail to parse are logged and skipped.
pub fn read_posts(dir: &Path) -> Result<Vec<Post>> {
    let mut posts = Vec::new();
    for result in WalkDir::new(dir) {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !is_post_file(&file_name) {
            continue;
        }
        let text = fs::read_to_string(entry.path())?;
        match Post::from_markdown(&file_name, &text, Source::Local, None) {
            Ok(post) => {
                debug!("parsed local post {}", post.id);
                posts.push(post);
            }
            Err(err) => warn!("skipping {}: {}", entry.path().display(), err),
        }
    }
    Ok(posts)
}

fn is_post_file(file_name: &str) -> bool {
    let name = file_name.to_ascii_lowercase();
    name.ends_with(".md") || name.ends_with(".mdx")
}

/// Represents the result of reading the local content set.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading the local content set.
#[derive(Debug)]
pub enum Error {
    /// Returned for directory-walking errors.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when walking the content directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
