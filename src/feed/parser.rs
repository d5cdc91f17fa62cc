use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::Item;
use crate::util::{format_relative_time, strip_control_chars};

/// One entry of a Pinboard JSON feed (`feeds.pinboard.in/json/...`).
///
/// Pinboard uses single-letter keys. Everything but the URL and date is
/// optional in practice; private notes come back with empty strings.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "u")]
    url: String,
    #[serde(rename = "d", default)]
    title: String,
    #[serde(rename = "n", default)]
    description: Option<String>,
    #[serde(rename = "a", default)]
    author: String,
    #[serde(rename = "dt")]
    date: String,
}

/// Items parsed from one feed body, plus how many entries were dropped.
#[derive(Debug)]
pub struct ParseResult {
    pub items: Vec<Item>,
    pub skipped: usize,
}

/// Parse a Pinboard JSON feed body into timeline items.
///
/// The body must be a JSON array; anything else is an error. Individual
/// entries whose URL or date do not parse are skipped and counted rather than
/// failing the whole feed. `now` anchors the precomputed relative time.
pub fn parse_feed(bytes: &[u8], now: DateTime<Utc>) -> Result<ParseResult, serde_json::Error> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;

    let mut items = Vec::with_capacity(raw.len());
    let mut skipped = 0;

    for value in raw {
        match serde_json::from_value::<RawEntry>(value)
            .ok()
            .and_then(|entry| into_item(entry, now))
        {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }

    Ok(ParseResult { items, skipped })
}

fn into_item(entry: RawEntry, now: DateTime<Utc>) -> Option<Item> {
    let url = Url::parse(entry.url.trim()).ok()?;
    let timestamp = DateTime::parse_from_rfc3339(entry.date.trim())
        .ok()?
        .with_timezone(&Utc);

    let title = strip_control_chars(entry.title.trim()).into_owned();
    let title = if title.is_empty() {
        url.to_string()
    } else {
        title
    };

    Some(Item {
        title,
        description: strip_control_chars(entry.description.as_deref().unwrap_or("").trim())
            .into_owned(),
        author: strip_control_chars(entry.author.trim()).into_owned(),
        relative_time: format_relative_time(timestamp, now),
        timestamp,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_full_entry() {
        let body = r#"[{
            "u": "https://example.com/post",
            "d": "A post",
            "n": "Worth reading",
            "a": "alice",
            "dt": "2024-03-10T10:00:00+00:00",
            "t": ["rust", "async"]
        }]"#;

        let result = parse_feed(body.as_bytes(), now()).unwrap();
        assert_eq!(result.skipped, 0);
        assert_eq!(result.items.len(), 1);

        let item = &result.items[0];
        assert_eq!(item.url.as_str(), "https://example.com/post");
        assert_eq!(item.title, "A post");
        assert_eq!(item.description, "Worth reading");
        assert_eq!(item.author, "alice");
        assert_eq!(item.timestamp, Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap());
        assert_eq!(item.relative_time, "2h");
        assert_eq!(item.domain(), "example.com");
    }

    #[test]
    fn test_offset_dates_normalized_to_utc() {
        let body = r#"[{"u": "https://e.com", "d": "x", "a": "a", "dt": "2024-03-10T19:00:00+09:00"}]"#;
        let result = parse_feed(body.as_bytes(), now()).unwrap();
        assert_eq!(
            result.items[0].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let body = r#"[
            {"u": "not a url", "d": "x", "a": "a", "dt": "2024-03-10T10:00:00Z"},
            {"u": "https://e.com", "d": "x", "a": "a", "dt": "yesterday"},
            {"d": "missing url", "dt": "2024-03-10T10:00:00Z"},
            {"u": "https://ok.com", "d": "ok", "a": "a", "dt": "2024-03-10T10:00:00Z"}
        ]"#;
        let result = parse_feed(body.as_bytes(), now()).unwrap();
        assert_eq!(result.skipped, 3);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "ok");
    }

    #[test]
    fn test_empty_title_falls_back_to_url() {
        let body = r#"[{"u": "https://e.com/x", "d": "", "dt": "2024-03-10T10:00:00Z"}]"#;
        let result = parse_feed(body.as_bytes(), now()).unwrap();
        assert_eq!(result.items[0].title, "https://e.com/x");
        assert_eq!(result.items[0].author, "");
    }

    #[test]
    fn test_control_chars_stripped() {
        let body = r#"[{"u": "https://e.com", "d": "evil\u001b[2Jtitle", "a": "a", "dt": "2024-03-10T10:00:00Z"}]"#;
        let result = parse_feed(body.as_bytes(), now()).unwrap();
        assert_eq!(result.items[0].title, "eviltitle");
    }

    #[test]
    fn test_non_array_body_is_error() {
        assert!(parse_feed(br#"{"error": "forbidden"}"#, now()).is_err());
        assert!(parse_feed(b"<html>", now()).is_err());
    }
}
