//! Exports the [`run`] function which stitches together the high-level
//! steps of a syndication pass: reading the local content set
//! ([`crate::local`]), fetching and parsing posts from the source
//! repository ([`crate::github`], [`crate::post`]), filtering the
//! syndicated set ([`crate::filter`]), deduplicating, and sorting. The
//! final list is serialized with [`write_posts`].

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::github::{Fetcher, GitHubSource, RawPost};
use crate::local;
use crate::post::{Post, Source};

/// Runs a full syndication pass and returns the final post list, newest
/// first. A remote fetch failure downgrades to a warning and an empty
/// syndicated set, so the run still produces the local posts.
pub fn run(config: &Config, fetcher: &Fetcher) -> Result<Vec<Post>> {
    let mut posts = Vec::new();

    if let Some(dir) = &config.posts_directory {
        let local_posts = local::read_posts(dir)?;
        info!("adding {} local posts", local_posts.len());
        posts.extend(local_posts);
    }

    if let Some(source) = &config.github {
        info!("starting syndication from {}/{}", source.owner, source.repo);
        let raw_posts = match fetcher.fetch_posts(source) {
            Ok(raw_posts) => raw_posts,
            Err(err) => {
                warn!(
                    "fetching posts from {}/{}: {}",
                    source.owner, source.repo, err
                );
                Vec::new()
            }
        };
        let mut syndicated = parse_raw_posts(raw_posts, source);
        if let Some(filters) = &config.filters {
            info!("applying filters to {} syndicated posts", syndicated.len());
            syndicated = filters.apply(syndicated);
        }
        info!("adding {} syndicated posts", syndicated.len());
        posts.extend(syndicated);
    }

    let mut posts = deduplicate(posts);
    sort(&mut posts);
    info!("final post count: {}", posts.len());
    Ok(posts)
}

fn parse_raw_posts(raw_posts: Vec<RawPost>, source: &GitHubSource) -> Vec<Post> {
    let mut posts = Vec::new();
    for raw in raw_posts {
        match Post::from_markdown(
            &raw.file_name,
            &raw.text,
            Source::Syndicated,
            source.base_url.as_ref(),
        ) {
            Ok(post) => {
                debug!("parsed post: {} ({})", post.title, post.id);
                posts.push(post);
            }
            Err(err) => warn!("skipping {}: {}", raw.file_name, err),
        }
    }
    posts
}

/// Deduplicates posts by id. The first occurrence wins, except that a
/// locally authored post always replaces a syndicated one sharing its id.
fn deduplicate(posts: Vec<Post>) -> Vec<Post> {
    let mut deduplicated: HashMap<String, Post> = HashMap::new();
    for post in posts {
        match deduplicated.get(&post.id) {
            None => {
                deduplicated.insert(post.id.clone(), post);
            }
            Some(existing) => {
                if post.source == Source::Local && existing.source == Source::Syndicated {
                    info!("local post '{}' overrides syndicated version", post.title);
                    deduplicated.insert(post.id.clone(), post);
                } else {
                    debug!("skipping duplicate post '{}' ({})", post.title, post.id);
                }
            }
        }
    }
    deduplicated.into_values().collect()
}

// Date descending; ties broken by id so the output order is deterministic.
fn sort(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

/// Serializes the final post list to `path` as pretty-printed JSON,
/// creating parent directories as needed.
pub fn write_posts(posts: &[Post], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    serde_json::to_writer_pretty(File::create(path)?, posts)?;
    Ok(())
}

/// Represents the result of a syndication pass.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error during a syndication pass. Per-post failures are
/// logged and skipped; these variants are the unrecoverable ones.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading the local content set.
    Local(local::Error),

    /// Returned for errors serializing the final post list.
    Json(serde_json::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Local(err) => err.fmt(f),
            Error::Json(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Local(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<local::Error> for Error {
    /// Converts a [`local::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when reading the local content set.
    fn from(err: local::Error) -> Error {
        Error::Local(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator when serializing the post list.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::filter::Filters;
    use chrono::{NaiveDate, NaiveDateTime};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs::write;
    use url::Url;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn post(id: &str, date: NaiveDateTime, source: Source) -> Post {
        Post {
            id: id.to_owned(),
            title: format!("Post {}", id),
            date,
            description: String::new(),
            featured: None,
            tags: Vec::new(),
            categories: Vec::new(),
            series: None,
            series_order: None,
            content: String::new(),
            content_html: String::new(),
            stub: String::new(),
            word_count: 0,
            use_toc: false,
            source,
            canonical_url: None,
        }
    }

    #[test]
    fn test_deduplicate_local_wins_over_syndicated() {
        let posts = vec![
            post("shared", date(2024, 1, 1), Source::Syndicated),
            post("shared", date(2024, 2, 2), Source::Local),
        ];
        let deduplicated = deduplicate(posts);
        assert_eq!(deduplicated.len(), 1);
        assert_eq!(deduplicated[0].source, Source::Local);
        assert_eq!(deduplicated[0].date, date(2024, 2, 2));
    }

    #[test]
    fn test_deduplicate_first_wins_within_a_source() {
        let posts = vec![
            post("shared", date(2024, 1, 1), Source::Local),
            post("shared", date(2024, 2, 2), Source::Local),
        ];
        let deduplicated = deduplicate(posts);
        assert_eq!(deduplicated.len(), 1);
        assert_eq!(deduplicated[0].date, date(2024, 1, 1));
    }

    #[test]
    fn test_deduplicate_local_is_not_replaced() {
        let posts = vec![
            post("shared", date(2024, 1, 1), Source::Local),
            post("shared", date(2024, 2, 2), Source::Syndicated),
        ];
        let deduplicated = deduplicate(posts);
        assert_eq!(deduplicated.len(), 1);
        assert_eq!(deduplicated[0].source, Source::Local);
    }

    #[test]
    fn test_sort_newest_first_with_id_tie_break() {
        let mut posts = vec![
            post("beta", date(2024, 1, 1), Source::Local),
            post("alpha", date(2024, 1, 1), Source::Local),
            post("newest", date(2024, 6, 1), Source::Local),
        ];
        sort(&mut posts);
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "alpha", "beta"]);
    }

    #[test]
    fn test_write_posts_uses_camel_case_members() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data").join("posts.json");
        write_posts(&[post("p", date(2024, 1, 1), Source::Local)], &path)?;

        let json = fs::read_to_string(&path)?;
        assert!(json.contains("\"contentHtml\""));
        assert!(json.contains("\"wordCount\""));
        assert!(json.contains("\"useToc\""));
        assert!(json.contains("\"canonicalUrl\""));
        assert!(json.contains("\"source\": \"local\""));
        assert!(json.contains("\"date\": \"2024-01-01T00:00:00\""));
        Ok(())
    }

    // A whole pass: local posts on disk, remote posts behind a mock server,
    // filters on, one id collision.
    #[test]
    fn test_run_end_to_end() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write(
            dir.path().join("local-only.md"),
            "---\ntitle: Local Only\ndate: 2024-03-01\n---\nLocal body.",
        )?;
        write(
            dir.path().join("shared.md"),
            "---\ntitle: Shared (local copy)\ndate: 2024-04-01\n---\nLocal body.",
        )?;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/alice/notes/contents/posts");
            then.status(200).json_body(json!([
                {"name": "shared.md", "path": "posts/shared.md", "type": "file"},
                {"name": "remote-only.md", "path": "posts/remote-only.md", "type": "file"},
                {"name": "cooking.md", "path": "posts/cooking.md", "type": "file"}
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/shared.md");
            then.status(200).body(
                "---\ntitle: Shared (remote copy)\ndate: 2024-04-02\ncategories: [Programming]\n---\nRemote body.",
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/remote-only.md");
            then.status(200).body(
                "---\ntitle: Remote Only\ndate: 2024-05-01\ncategories: [Programming/Architecture]\n---\nRemote body.",
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/cooking.md");
            then.status(200).body(
                "---\ntitle: Cooking\ndate: 2024-06-01\ncategories: [Cooking]\n---\nRemote body.",
            );
        });

        let config = Config {
            posts_directory: Some(dir.path().to_owned()),
            output: dir.path().join("posts.json"),
            github: Some(GitHubSource {
                owner: String::from("alice"),
                repo: String::from("notes"),
                branch: String::from("main"),
                posts_directory: String::from("posts"),
                base_url: Some(Url::parse("https://blog.example.org")?),
            }),
            filters: Some(Filters {
                included_categories: vec![String::from("Programming")],
                excluded_categories: Vec::new(),
                excluded_tags: Vec::new(),
            }),
            feed: None,
        };

        let root = Url::parse(&server.base_url())?;
        let fetcher = Fetcher::with_roots(root.clone(), root)?;
        let posts = run(&config, &fetcher)?;

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["remote-only", "shared", "local-only"]);

        // The local copy won the id collision.
        let shared = &posts[1];
        assert_eq!(shared.source, Source::Local);
        assert_eq!(shared.title, "Shared (local copy)");

        // The syndicated survivor carries its canonical URL.
        assert_eq!(
            posts[0].canonical_url.as_ref().map(Url::as_str),
            Some("https://blog.example.org/blog/remote-only")
        );
        Ok(())
    }
}
