//! Defines the [`Post`] record — the normalized shape shared by locally
//! authored and syndicated posts — and the logic for building one from a
//! source file name and its raw text. See [`Post::from_markdown`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use url::Url;

use crate::frontmatter;
use crate::markdown;

/// Where a post came from. Local entries take precedence during
/// deduplication.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Syndicated,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Local => write!(f, "local"),
            Source::Syndicated => write!(f, "syndicated"),
        }
    }
}

/// A normalized post record. Serializes to the JSON member names the site
/// consumes (camelCase).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// URL-safe identifier derived from the source file name.
    pub id: String,

    pub title: String,

    pub date: NaiveDateTime,

    pub description: String,

    /// Path of a featured image, if any.
    pub featured: Option<String>,

    pub tags: Vec<String>,

    /// Slash-delimited hierarchical category names
    /// (`Programming/Architecture`).
    pub categories: Vec<String>,

    pub series: Option<String>,

    pub series_order: Option<i32>,

    /// The Markdown body, header removed.
    pub content: String,

    pub content_html: String,

    /// Short excerpt used by list views; same text as `description`.
    pub stub: String,

    pub word_count: usize,

    pub use_toc: bool,

    pub source: Source,

    /// The authoritative external address of a syndicated post, used for
    /// attribution. Absent for local posts.
    pub canonical_url: Option<Url>,
}

impl Post {
    /// Builds a [`Post`] from a source file name and its raw text: splits
    /// the front matter, renders the body, derives the summary and word
    /// count, and fills fallbacks (file stem for a missing title, generated
    /// summary for a missing description). A missing or unparseable date is
    /// an error; callers log it and skip the file.
    pub fn from_markdown(
        file_name: &str,
        input: &str,
        source: Source,
        canonical_base: Option<&Url>,
    ) -> Result<Post> {
        let (header, body) = frontmatter::parse(input);
        let id = slug(file_name);
        let date = parse_date(header.date.as_deref())?;
        let description = match header.description {
            Some(description) => description,
            None => markdown::summary(body),
        };
        let canonical_url = match (source, canonical_base) {
            (Source::Syndicated, Some(base)) => Some(canonical_url(base, &id)?),
            _ => None,
        };

        Ok(Post {
            title: match header.title {
                Some(title) => title,
                None => file_stem(file_name).to_owned(),
            },
            date,
            stub: description.clone(),
            description,
            featured: header.featured,
            tags: header.tags,
            categories: header.categories,
            series: header.series,
            series_order: header.series_order,
            content_html: markdown::to_html(body),
            word_count: markdown::word_count(body),
            content: body.to_owned(),
            use_toc: header.use_toc,
            source,
            canonical_url,
            id,
        })
    }
}

/// Derives a URL-safe identifier from a source file name:
/// `My Awesome Post.mdx` becomes `my-awesome-post`.
pub fn slug(file_name: &str) -> String {
    slug::slugify(file_stem(file_name))
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// The canonical address of a syndicated post:
/// `{base}/blog/{slug}`, with no doubled slash.
fn canonical_url(base: &Url, id: &str) -> Result<Url> {
    let base = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{}/blog/{}", base, id)).map_err(Error::CanonicalUrl)
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parses a header date, trying each supported format in order. Date-only
/// values resolve to midnight.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDateTime> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Err(Error::MissingDate),
        Some(raw) => raw,
    };
    for format in DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(NaiveDateTime::new(date, NaiveTime::MIN));
        }
    }
    Err(Error::InvalidDate(raw.to_owned()))
}

/// Represents the result of building a [`Post`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`Post`] from a source file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter carries no date.
    MissingDate,

    /// Returned when no supported format matches the date field.
    InvalidDate(String),

    /// Returned when the canonical URL cannot be assembled.
    CanonicalUrl(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDate => write!(f, "missing date in front matter"),
            Error::InvalidDate(raw) => write!(f, "unsupported date format: `{}`", raw),
            Error::CanonicalUrl(err) => write!(f, "building canonical URL: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingDate => None,
            Error::InvalidDate(_) => None,
            Error::CanonicalUrl(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator when assembling URLs.
    fn from(err: url::ParseError) -> Error {
        Error::CanonicalUrl(err)
    }
}
