//! Fetches post source files from a GitHub repository: one contents-API
//! call to list the posts directory, then one raw download per Markdown
//! file. Individual download failures are logged and skipped so a single
//! bad file never sinks the whole listing pass.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, error, info, warn};
use url::Url;

const API_ROOT: &str = "https://api.github.com/";
const RAW_ROOT: &str = "https://raw.githubusercontent.com/";
const USER_AGENT: &str = concat!("blogroll/", env!("CARGO_PKG_VERSION"));

/// A remote post source: a directory of Markdown files in a GitHub
/// repository.
#[derive(Clone, Debug, Deserialize)]
pub struct GitHubSource {
    pub owner: String,

    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_posts_directory")]
    pub posts_directory: String,

    /// Site root used to build canonical URLs for syndicated posts.
    #[serde(default)]
    pub base_url: Option<Url>,
}

fn default_branch() -> String {
    String::from("main")
}

fn default_posts_directory() -> String {
    String::from("posts")
}

/// A post source file as fetched: its file name and raw text.
#[derive(Clone, Debug)]
pub struct RawPost {
    pub file_name: String,
    pub text: String,
}

/// Downloads post files from a [`GitHubSource`].
pub struct Fetcher {
    client: Client,
    api_root: Url,
    raw_root: Url,
}

impl Fetcher {
    /// Builds a fetcher against the public GitHub endpoints.
    pub fn new() -> Result<Fetcher> {
        Fetcher::with_roots(Url::parse(API_ROOT)?, Url::parse(RAW_ROOT)?)
    }

    /// Builds a fetcher against explicit API and raw-content roots. Tests
    /// point both at a mock server.
    pub fn with_roots(api_root: Url, raw_root: Url) -> Result<Fetcher> {
        Ok(Fetcher {
            client: Client::builder().user_agent(USER_AGENT).build()?,
            api_root,
            raw_root,
        })
    }

    /// Lists the source's posts directory and downloads every Markdown
    /// file in it. A failed listing is an error; a failed or empty file
    /// download is logged and skipped.
    pub fn fetch_posts(&self, source: &GitHubSource) -> Result<Vec<RawPost>> {
        let listing_url = self.api_root.join(&format!(
            "repos/{}/{}/contents/{}",
            source.owner, source.repo, source.posts_directory
        ))?;
        info!("fetching post list from {}", listing_url);

        let response = self
            .client
            .get(listing_url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .query(&[("ref", source.branch.as_str())])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::FORBIDDEN {
                let remaining = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("unknown");
                warn!("GitHub rate limit may be exceeded; remaining: {}", remaining);
            }
            return Err(Error::Status {
                url: listing_url,
                status,
            });
        }

        let entries: Vec<Entry> = response.json()?;
        let mut posts = Vec::new();
        for entry in entries.into_iter().filter(Entry::is_post_file) {
            match self.fetch_file(source, &entry.path) {
                Ok(text) if text.trim().is_empty() => {
                    debug!("skipping empty file {}", entry.name);
                }
                Ok(text) => {
                    debug!("fetched {} ({} bytes)", entry.name, text.len());
                    posts.push(RawPost {
                        file_name: entry.name,
                        text,
                    });
                }
                Err(err) => {
                    error!("fetching {}: {}", entry.name, err);
                }
            }
        }
        info!("fetched {} posts", posts.len());
        Ok(posts)
    }

    fn fetch_file(&self, source: &GitHubSource, path: &str) -> Result<String> {
        let url = self.raw_root.join(&format!(
            "{}/{}/{}/{}",
            source.owner, source.repo, source.branch, path
        ))?;
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }
        Ok(response.text()?)
    }
}

/// One entry of a contents-API directory listing.
#[derive(Deserialize)]
struct Entry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl Entry {
    fn is_post_file(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        self.kind == "file" && (name.ends_with(".md") || name.ends_with(".mdx"))
    }
}

/// Represents the result of a fetch operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error fetching from the source repository.
#[derive(Debug)]
pub enum Error {
    /// Returned when a request fails outright (connection, TLS, body
    /// decoding).
    Http(reqwest::Error),

    /// Returned when the server answers with a non-success status.
    Status { url: Url, status: StatusCode },

    /// Returned when a request URL cannot be assembled.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => err.fmt(f),
            Error::Status { url, status } => {
                write!(f, "request to `{}` failed with status {}", url, status)
            }
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Status { .. } => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for HTTP calls.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator when assembling request URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn source() -> GitHubSource {
        GitHubSource {
            owner: String::from("alice"),
            repo: String::from("notes"),
            branch: String::from("main"),
            posts_directory: String::from("posts"),
            base_url: None,
        }
    }

    fn fetcher(server: &MockServer) -> Result<Fetcher> {
        let root = Url::parse(&server.base_url())?;
        Fetcher::with_roots(root.clone(), root)
    }

    #[test]
    fn test_fetch_posts_filters_and_downloads() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/alice/notes/contents/posts")
                .query_param("ref", "main")
                .header("accept", "application/vnd.github.v3+json");
            then.status(200).json_body(json!([
                {"name": "first.md", "path": "posts/first.md", "type": "file"},
                {"name": "second.MDX", "path": "posts/second.MDX", "type": "file"},
                {"name": "notes.txt", "path": "posts/notes.txt", "type": "file"},
                {"name": "drafts", "path": "posts/drafts", "type": "dir"}
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/first.md");
            then.status(200).body("first body");
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/second.MDX");
            then.status(200).body("second body");
        });

        let posts = fetcher(&server)?.fetch_posts(&source())?;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].file_name, "first.md");
        assert_eq!(posts[0].text, "first body");
        assert_eq!(posts[1].file_name, "second.MDX");
        Ok(())
    }

    #[test]
    fn test_fetch_posts_skips_failed_and_empty_downloads() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/alice/notes/contents/posts");
            then.status(200).json_body(json!([
                {"name": "good.md", "path": "posts/good.md", "type": "file"},
                {"name": "broken.md", "path": "posts/broken.md", "type": "file"},
                {"name": "empty.md", "path": "posts/empty.md", "type": "file"}
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/good.md");
            then.status(200).body("good body");
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/broken.md");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/alice/notes/main/posts/empty.md");
            then.status(200).body("  \n");
        });

        let posts = fetcher(&server)?.fetch_posts(&source())?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].file_name, "good.md");
        Ok(())
    }

    #[test]
    fn test_fetch_posts_listing_failure_is_an_error() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/alice/notes/contents/posts");
            then.status(403).header("x-ratelimit-remaining", "0");
        });

        let result = fetcher(&server)?.fetch_posts(&source());
        assert!(matches!(
            result,
            Err(Error::Status {
                status: StatusCode::FORBIDDEN,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_fetch_posts_honors_branch_and_directory() -> Result<()> {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/alice/notes/contents/content/blog")
                .query_param("ref", "trunk");
            then.status(200).json_body(json!([]));
        });

        let mut source = source();
        source.branch = String::from("trunk");
        source.posts_directory = String::from("content/blog");
        let posts = fetcher(&server)?.fetch_posts(&source)?;
        assert!(posts.is_empty());
        listing.assert();
        Ok(())
    }
}
