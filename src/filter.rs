//! Inclusion/exclusion rules applied to syndicated posts. Exclusion wins
//! over inclusion: excluded tags are checked first, then excluded
//! categories, and only then the included-category gate.

use serde::Deserialize;
use tracing::{debug, info};

use crate::post::Post;

/// Category and tag rules from the `filters` section of the project file.
/// All lists default to empty; an empty rule set keeps every post.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Only posts matching at least one of these categories are kept
    /// (OR logic). Empty means no gate.
    pub included_categories: Vec<String>,

    /// Posts matching any of these categories are dropped.
    pub excluded_categories: Vec<String>,

    /// Posts carrying any of these tags are dropped.
    pub excluded_tags: Vec<String>,
}

impl Filters {
    /// Applies the rules to a batch of posts, keeping the survivors.
    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        let total = posts.len();
        let kept: Vec<Post> = posts.into_iter().filter(|p| self.includes(p)).collect();
        info!("filtered {} posts down to {}", total, kept.len());
        kept
    }

    /// Decides whether a single post passes the rules.
    pub fn includes(&self, post: &Post) -> bool {
        if post
            .tags
            .iter()
            .any(|tag| self.excluded_tags.iter().any(|x| x.eq_ignore_ascii_case(tag)))
        {
            debug!("excluding post '{}': has excluded tag", post.title);
            return false;
        }

        if post
            .categories
            .iter()
            .any(|category| matches_any(category, &self.excluded_categories))
        {
            debug!("excluding post '{}': has excluded category", post.title);
            return false;
        }

        if !self.included_categories.is_empty()
            && !post
                .categories
                .iter()
                .any(|category| matches_any(category, &self.included_categories))
        {
            debug!(
                "excluding post '{}': does not match included categories",
                post.title
            );
            return false;
        }

        true
    }
}

fn matches_any(post_category: &str, rules: &[String]) -> bool {
    rules.iter().any(|rule| matches_category(post_category, rule))
}

/// Case-insensitive hierarchical comparison on `/`: rule `Programming`
/// matches post category `Programming/Architecture` and vice versa, while
/// `Programmingx` matches neither.
fn matches_category(post_category: &str, rule: &str) -> bool {
    let post = post_category.to_lowercase();
    let rule = rule.to_lowercase();
    post == rule
        || post
            .strip_prefix(&rule)
            .map_or(false, |rest| rest.starts_with('/'))
        || rule
            .strip_prefix(&post)
            .map_or(false, |rest| rest.starts_with('/'))
}
