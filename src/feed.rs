//! Support for creating an Atom feed from the final post list. Entry ids
//! and links use a syndicated post's canonical URL when it has one, so
//! attribution points at the authoritative external address.

use crate::config::Author;
use crate::post::Post;
use atom_syndication::{Category, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::io::Write;
use url::Url;

/// The `feed` section of the project file. Presence of the section turns
/// feed generation on.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedConfig {
    pub title: String,

    /// The site's home page; doubles as the feed id and the base for entry
    /// URLs of posts with no canonical address.
    pub home_page: Url,

    #[serde(default)]
    pub author: Option<Author>,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and the final
/// list of [`Post`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

fn feed(config: &FeedConfig, posts: &[Post]) -> Result<Feed> {
    let mut feed = Feed::default();
    feed.title = Text::plain(config.title.clone());
    feed.id = config.home_page.to_string();
    feed.updated = Utc::now().into();
    feed.authors = author_to_people(config.author.clone());
    feed.links = vec![alternate_link(config.home_page.to_string())];
    feed.entries = feed_entries(config, posts)?;
    Ok(feed)
}

fn feed_entries(config: &FeedConfig, posts: &[Post]) -> Result<Vec<Entry>> {
    let mut entries = Vec::with_capacity(posts.len());
    for post in posts {
        let url = entry_url(config, post)?;
        let date: DateTime<FixedOffset> = Utc.from_utc_datetime(&post.date).into();

        let mut entry = Entry::default();
        entry.id = url.to_string();
        entry.title = Text::plain(post.title.clone());
        entry.updated = date;
        entry.published = Some(date);
        entry.authors = author_to_people(config.author.clone());
        entry.links = vec![alternate_link(url.into())];
        entry.summary = Some(Text::plain(post.description.clone()));
        entry.categories = post
            .categories
            .iter()
            .map(|name| {
                let mut category = Category::default();
                category.term = name.clone();
                category
            })
            .collect();
        entries.push(entry);
    }
    Ok(entries)
}

fn entry_url(config: &FeedConfig, post: &Post) -> Result<Url> {
    match &post.canonical_url {
        Some(url) => Ok(url.clone()),
        None => Ok(config.home_page.join(&format!("blog/{}", post.id))?),
    }
}

fn alternate_link(href: String) -> Link {
    let mut link = Link::default();
    link.href = href;
    link.rel = String::from("alternate");
    link
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name,
            email: author.email,
            uri: None,
            extensions: Default::default(),
        }],
        None => Vec::new(),
    }
}

/// Represents the result of a feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),

    /// Returned when an entry URL cannot be assembled.
    Url(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
            Error::Url(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible feed operations.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}
