//! PinFeed: a terminal timeline of Pinboard bookmarks.
//!
//! The network timeline and the user's own bookmarks are fetched, merged
//! newest-first, and shown as a scrollable list. Pasting a URL into the
//! terminal pops a banner that can be opened or dismissed.

pub mod app;
pub mod banner;
pub mod config;
pub mod favicon;
pub mod feed;
pub mod timeline;
pub mod ui;
pub mod util;
