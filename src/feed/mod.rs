//! Feed sources for the timeline.
//!
//! - [`item`] - the [`Item`] row entity
//! - [`parser`] - Pinboard JSON feed parsing
//! - [`fetcher`] - the [`FeedSource`] trait and the HTTP-backed [`PinboardSource`]
//! - [`merge`] - combining both sources into one newest-first list
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{merge_by_date, FeedSource, PinboardSource};
//!
//! let timeline = PinboardSource::new("timeline", network_url, client.clone());
//! let bookmarks = PinboardSource::new("bookmarks", own_url, client);
//! timeline.fetch().await?;
//! bookmarks.fetch().await?;
//! let rows = merge_by_date(&timeline.collection(), &bookmarks.collection());
//! ```

mod fetcher;
mod item;
mod merge;
mod parser;

pub use fetcher::{FeedSource, FetchError, PinboardSource};
pub(crate) use fetcher::read_limited_bytes;
pub use item::Item;
pub use merge::merge_by_date;
pub use parser::{parse_feed, ParseResult};
