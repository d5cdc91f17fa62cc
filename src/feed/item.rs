use chrono::{DateTime, Utc};
use url::Url;

/// One timeline row: a bookmark from either the network feed or the user's own.
///
/// Items are rebuilt from scratch on every fetch and never mutated afterwards.
/// There is no id; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub url: Url,
    pub title: String,
    pub description: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// Rendered once at fetch time, so it goes stale until the next refresh.
    pub relative_time: String,
}

impl Item {
    /// Host of the bookmarked URL, used for favicon lookup and the row label.
    pub fn domain(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}
