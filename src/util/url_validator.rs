use thiserror::Error;
use url::Url;

/// Errors raised when a URL is not fit to be handed to the browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validate a URL before `open::that()` gets it.
///
/// Only `http` and `https` with a host are accepted; anything else
/// (`file://`, `javascript:`, custom handlers) could launch arbitrary programs
/// through the desktop's URL dispatcher.
pub fn validate_url_for_open(url: &Url) -> Result<(), UrlValidationError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(())
}

/// Interpret pasted/copied text as a URL.
///
/// Returns `None` unless the trimmed text is a single token that parses as an
/// http(s) URL with a host. Multi-line pastes and prose never count.
pub fn parse_copied_url(text: &str) -> Option<Url> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    validate_url_for_open(&url).ok()?;
    Some(url)
}
