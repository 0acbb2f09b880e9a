//! Splits the `---`-fenced YAML header off a post source file and decodes it
//! into a typed [`Frontmatter`] record. Post files look like this:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Headers are optional and decoding is tolerant: a file with no fences, an
//! unterminated fence, or a header that fails to decode yields a default
//! (empty) record and the remaining text as body. Post sources are authored
//! in other repositories, so a malformed header must never abort a run.

use serde::{Deserialize, Deserializer};
use tracing::warn;

/// The metadata header of a post source file. Field names follow the
/// camelCase convention of the source repositories (`seriesOrder`,
/// `useToc`); unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Frontmatter {
    pub title: Option<String>,

    /// The date as written. Interpreted later by
    /// [`crate::post::parse_date`], which accepts several formats.
    pub date: Option<String>,

    pub description: Option<String>,

    /// Path of a featured image, if any.
    pub featured: Option<String>,

    /// Accepts a YAML sequence or a single comma-separated string.
    #[serde(deserialize_with = "tags_field")]
    pub tags: Vec<String>,

    /// Accepts a YAML sequence or a single string naming one category.
    #[serde(deserialize_with = "categories_field")]
    pub categories: Vec<String>,

    pub series: Option<String>,

    /// Accepts an integer or a string holding one.
    #[serde(deserialize_with = "order_field")]
    pub series_order: Option<i32>,

    pub use_toc: bool,
}

/// Splits `input` into its decoded header and body. Infallible by design;
/// see the module docs for the fallback behavior.
pub fn parse(input: &str) -> (Frontmatter, &str) {
    let (header, body) = match split_fences(input) {
        Some(parts) => parts,
        None => return (Frontmatter::default(), input),
    };
    match serde_yaml::from_str(header) {
        Ok(frontmatter) => (frontmatter, body.trim()),
        Err(err) => {
            warn!("discarding malformed front matter: {}", err);
            (Frontmatter::default(), body.trim())
        }
    }
}

/// Returns the text between the opening fence (which must be the first line)
/// and the closing fence, plus everything after the closing fence. Fence
/// lines may carry trailing whitespace.
fn split_fences(input: &str) -> Option<(&str, &str)> {
    let first_line_end = input.find('\n')?;
    if input[..first_line_end].trim_end() != "---" {
        return None;
    }
    let header_start = first_line_end + 1;
    let mut offset = header_start;
    while offset <= input.len() {
        let line_end = input[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(input.len());
        if input[offset..line_end].trim_end() == "---" {
            let body = if line_end < input.len() {
                &input[line_end + 1..]
            } else {
                ""
            };
            return Some((&input[header_start..offset], body));
        }
        offset = line_end + 1;
    }
    None
}

/// Decodes a tag list from either a sequence or a comma-separated string.
fn tags_field<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::Seq(values) => scalars_to_strings(values),
        StringOrSeq::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
    })
}

/// Decodes a category list from either a sequence or a single string. Unlike
/// tags, a bare string names exactly one category, because category names
/// may themselves contain separators (`Programming/Architecture`).
fn categories_field<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::Seq(values) => scalars_to_strings(values),
        StringOrSeq::One(s) => vec![s],
    })
}

/// Decodes a series order from an integer or a string holding one. Anything
/// else decodes as absent rather than failing the whole header.
fn order_field<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i32),
        Str(String),
        Other(serde_yaml::Value),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Some(n),
        Raw::Str(s) => s.trim().parse().ok(),
        Raw::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrSeq {
    Seq(Vec<serde_yaml::Value>),
    One(String),
}

// Sequences may mix strings with bare scalars (`tags: [2021, rust]`), so
// items are stringified individually instead of decoded as Vec<String>.
fn scalars_to_strings(values: Vec<serde_yaml::Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            serde_yaml::Value::String(s) => Some(s),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full_header() {
        let input = "---\n\
                     title: First Post\n\
                     date: 2024-01-15\n\
                     description: A post.\n\
                     tags: [rust, cli]\n\
                     categories:\n\
                     - Programming/Architecture\n\
                     series: Basics\n\
                     seriesOrder: 2\n\
                     useToc: true\n\
                     ---\n\
                     Body text.";
        let (frontmatter, body) = parse(input);
        assert_eq!(frontmatter.title.as_deref(), Some("First Post"));
        assert_eq!(frontmatter.date.as_deref(), Some("2024-01-15"));
        assert_eq!(frontmatter.description.as_deref(), Some("A post."));
        assert_eq!(frontmatter.tags, vec!["rust", "cli"]);
        assert_eq!(frontmatter.categories, vec!["Programming/Architecture"]);
        assert_eq!(frontmatter.series.as_deref(), Some("Basics"));
        assert_eq!(frontmatter.series_order, Some(2));
        assert!(frontmatter.use_toc);
        assert_eq!(body, "Body text.");
    }

    #[test]
    fn test_parse_missing_header() {
        let input = "Just a body, no fences.";
        let (frontmatter, body) = parse(input);
        assert!(frontmatter.title.is_none());
        assert_eq!(body, input);
    }

    #[test]
    fn test_parse_unterminated_fence() {
        let input = "---\ntitle: Broken\nBody without a closing fence.";
        let (frontmatter, body) = parse(input);
        assert!(frontmatter.title.is_none());
        assert_eq!(body, input);
    }

    #[test]
    fn test_parse_malformed_header_falls_back_to_body() {
        let input = "---\ntitle: [unclosed\n---\nStill the body.";
        let (frontmatter, body) = parse(input);
        assert!(frontmatter.title.is_none());
        assert_eq!(body, "Still the body.");
    }

    #[test]
    fn test_parse_partial_header() {
        let input = "---\ntitle: Only a Title\n---\nBody.";
        let (frontmatter, body) = parse(input);
        assert_eq!(frontmatter.title.as_deref(), Some("Only a Title"));
        assert!(frontmatter.date.is_none());
        assert!(frontmatter.tags.is_empty());
        assert!(!frontmatter.use_toc);
        assert_eq!(body, "Body.");
    }

    #[test]
    fn test_tags_from_comma_separated_string() {
        let (frontmatter, _) = parse("---\ntags: rust, cli , , tooling\n---\n");
        assert_eq!(frontmatter.tags, vec!["rust", "cli", "tooling"]);
    }

    #[test]
    fn test_tags_from_mixed_sequence() {
        let (frontmatter, _) = parse("---\ntags: [2021, rust]\n---\n");
        assert_eq!(frontmatter.tags, vec!["2021", "rust"]);
    }

    #[test]
    fn test_categories_from_bare_string_is_one_category() {
        let (frontmatter, _) = parse("---\ncategories: Programming/Architecture\n---\n");
        assert_eq!(frontmatter.categories, vec!["Programming/Architecture"]);
    }

    #[test]
    fn test_series_order_from_string() {
        let (frontmatter, _) = parse("---\nseriesOrder: \"7\"\n---\n");
        assert_eq!(frontmatter.series_order, Some(7));
    }

    #[test]
    fn test_series_order_unparseable_is_absent() {
        let (frontmatter, _) = parse("---\nseriesOrder: first\n---\n");
        assert_eq!(frontmatter.series_order, None);
    }

    #[test]
    fn test_fence_with_trailing_whitespace() {
        let (frontmatter, body) = parse("---   \ntitle: Spaced\n---  \nBody.");
        assert_eq!(frontmatter.title.as_deref(), Some("Spaced"));
        assert_eq!(body, "Body.");
    }
}
