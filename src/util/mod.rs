//! Utility functions shared by the feed layer and the UI.
//!
//! - **URL validation**: scheme checks before handing a URL to the browser
//! - **Text processing**: control-character stripping, width-aware truncation
//!   and relative timestamps for timeline rows

mod text;
mod url_validator;

pub use text::{display_width, format_relative_time, strip_control_chars, truncate_to_width};
pub use url_validator::{parse_copied_url, validate_url_for_open, UrlValidationError};
