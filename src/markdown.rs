//! Converts post body Markdown to HTML and derives the plain-text view used
//! for summaries and word counts. Syndicated sources are MDX-flavored, so
//! embedded component tags (`<Callout … />`, `<Demo>…</Demo>`) are stripped
//! from the source text before any conversion.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag};
use regex::Regex;
use std::borrow::Cow;

/// Maximum length of a generated summary, in characters.
pub const SUMMARY_LENGTH: usize = 200;

// Matches capitalized component tags, self-closing or paired. Standard HTML
// tags are lowercase and pass through untouched.
static COMPONENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<[A-Z][a-zA-Z0-9]*(?:\s+[^>]*)?\s*/?>(?:.*?</[A-Z][a-zA-Z0-9]*>)?")
        .expect("component tag pattern")
});

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts Markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let cleaned = strip_components(markdown);
    let mut out = String::with_capacity(cleaned.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(&cleaned, options()));
    out
}

/// Removes embedded component tags from raw Markdown.
pub fn strip_components(markdown: &str) -> Cow<str> {
    COMPONENT_TAG.replace_all(markdown, "")
}

/// Derives a plain-text view of the Markdown by walking the event stream:
/// code blocks, inline code, and images are dropped, link text is kept,
/// block boundaries become newlines, and whitespace within a block is
/// collapsed.
pub fn plain_text(markdown: &str) -> String {
    let cleaned = strip_components(markdown);
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut skip = 0usize;
    for event in Parser::new_ext(&cleaned, options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Start(Tag::Image(..)) => skip += 1,
            Event::End(Tag::CodeBlock(_)) | Event::End(Tag::Image(..)) => {
                skip = skip.saturating_sub(1);
            }
            _ if skip > 0 => {}
            Event::Text(text) => current.push_str(&text),
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            Event::End(Tag::Paragraph) | Event::End(Tag::Heading(_)) | Event::End(Tag::Item) => {
                flush_block(&mut blocks, &mut current);
            }
            _ => {}
        }
    }
    flush_block(&mut blocks, &mut current);
    blocks.join("\n")
}

fn flush_block(blocks: &mut Vec<String>, current: &mut String) {
    let collapsed = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
    current.clear();
}

/// Generates a summary: the first paragraph of the plain-text view,
/// truncated to [`SUMMARY_LENGTH`] characters at a word boundary.
pub fn summary(markdown: &str) -> String {
    let text = plain_text(markdown);
    let first = text.lines().next().unwrap_or("").trim();
    if first.chars().count() <= SUMMARY_LENGTH {
        return first.to_owned();
    }
    let truncated: String = first.chars().take(SUMMARY_LENGTH).collect();
    let truncated = match truncated.rfind(' ') {
        Some(i) if i > 0 => truncated[..i].to_owned(),
        _ => truncated,
    };
    format!("{}...", truncated)
}

/// Counts whitespace-separated words in the plain-text view.
pub fn word_count(markdown: &str) -> usize {
    plain_text(markdown).split_whitespace().count()
}
