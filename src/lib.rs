//! The library code for the `blogroll` syndication tool. The pipeline can
//! be generally broken down into three distinct steps:
//!
//! 1. Collecting posts: parsing the local content set from disk
//!    ([`crate::local`]) and fetching source files from the external
//!    repository ([`crate::github`]), both normalized into one record shape
//!    ([`crate::post`]).
//! 2. Deciding what stays: category/tag rules on the syndicated set
//!    ([`crate::filter`]), then deduplication and ordering
//!    ([`crate::syndicate`]).
//! 3. Writing the result: one JSON post list, plus an Atom feed when the
//!    project asks for one ([`crate::feed`]).
//!
//! Of the three, the first is the most involved: each source file is split
//! into a front-matter header and a Markdown body ([`crate::frontmatter`]),
//! and the body is rendered to HTML and to the plain-text view behind
//! summaries and word counts ([`crate::markdown`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod feed;
pub mod filter;
pub mod frontmatter;
pub mod github;
pub mod local;
pub mod markdown;
pub mod post;
pub mod syndicate;
