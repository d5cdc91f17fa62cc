//! Best-effort favicon fetching for timeline rows and the copy banner.
//!
//! Every request runs on its own spawned task and reports back through the
//! app event channel. Failures of any kind are dropped on the floor: the row
//! simply keeps its blank icon. Callers hold on to the returned `JoinHandle`
//! so a fetch can be aborted when its row is rebound or the banner goes away.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::app::AppEvent;
use crate::feed::read_limited_bytes;

/// Google's favicon service; any host serving `/s2/favicons?domain=` works.
pub const DEFAULT_PROVIDER: &str = "https://www.google.com";

const FAVICON_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FAVICON_SIZE: usize = 256 * 1024;

/// Which view a favicon result belongs to.
///
/// The generation is bumped every time a row or the banner is rebound, so a
/// late result for a previous binding can be recognised and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaviconTarget {
    Row { index: usize, generation: u64 },
    Banner { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Ico,
    Gif,
    Jpeg,
    Webp,
    Svg,
}

/// A fetched icon the terminal can represent.
///
/// Terminals cannot paint the bitmap itself, so only the format and the pixel
/// dimensions of the decoded image are kept. SVG is not rasterised and has no
/// dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favicon {
    pub format: ImageFormat,
    pub dimensions: Option<(u32, u32)>,
}

impl Favicon {
    /// Decode image bytes. `None` for anything that does not decode into an
    /// image (error pages, empty or truncated bodies).
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if looks_like_svg(bytes) {
            return Some(Self {
                format: ImageFormat::Svg,
                dimensions: None,
            });
        }

        let guessed = image::guess_format(bytes).ok()?;
        let format = match guessed {
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Ico => ImageFormat::Ico,
            image::ImageFormat::Gif => ImageFormat::Gif,
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::WebP => ImageFormat::Webp,
            other => {
                tracing::debug!(format = ?other, "Unsupported favicon format");
                return None;
            }
        };

        match image::load_from_memory_with_format(bytes, guessed) {
            Ok(decoded) => Some(Self {
                format,
                dimensions: Some((decoded.width(), decoded.height())),
            }),
            Err(e) => {
                tracing::debug!(error = %e, ?format, "Favicon bytes did not decode");
                None
            }
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Build the provider URL for `domain`.
///
/// Returns `None` when the provider is not a valid base URL or the domain is
/// empty; the caller then skips the fetch entirely.
pub fn favicon_url(provider: &str, domain: &str) -> Option<Url> {
    if domain.trim().is_empty() {
        return None;
    }
    let mut url = Url::parse(provider).ok()?.join("/s2/favicons").ok()?;
    url.query_pairs_mut().clear().append_pair("domain", domain);
    Some(url)
}

/// Spawns favicon fetches that report back as [`AppEvent::FaviconLoaded`].
#[derive(Clone)]
pub struct FaviconLoader {
    client: reqwest::Client,
    provider: String,
}

impl FaviconLoader {
    pub fn new(client: reqwest::Client, provider: impl Into<String>) -> Self {
        Self {
            client,
            provider: provider.into(),
        }
    }

    /// Start fetching the icon for `domain` on behalf of `target`.
    ///
    /// Returns `None` without spawning anything when no valid favicon URL can
    /// be built. Only a successfully identified image is sent back; every
    /// failure is logged at debug and otherwise ignored.
    pub fn load(
        &self,
        domain: &str,
        target: FaviconTarget,
        event_tx: &mpsc::Sender<AppEvent>,
    ) -> Option<JoinHandle<()>> {
        let url = favicon_url(&self.provider, domain)?;
        let client = self.client.clone();
        let tx = event_tx.clone();

        Some(tokio::spawn(async move {
            match fetch_favicon(&client, url.clone()).await {
                Some(favicon) => {
                    if tx
                        .send(AppEvent::FaviconLoaded { target, favicon })
                        .await
                        .is_err()
                    {
                        tracing::debug!("Favicon result dropped (receiver closed)");
                    }
                }
                None => tracing::debug!(url = %url, "Favicon unavailable"),
            }
        }))
    }
}

async fn fetch_favicon(client: &reqwest::Client, url: Url) -> Option<Favicon> {
    let response = tokio::time::timeout(FAVICON_TIMEOUT, client.get(url).send())
        .await
        .ok()?
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let bytes = read_limited_bytes(response, MAX_FAVICON_SIZE).await.ok()?;
    Favicon::decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encode(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let icon = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut bytes = std::io::Cursor::new(Vec::new());
        icon.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn png_16x16() -> Vec<u8> {
        encode(image::ImageFormat::Png, 16, 16)
    }

    #[test]
    fn test_favicon_url_encodes_domain() {
        let url = favicon_url(DEFAULT_PROVIDER, "https://example.com/a?b=c&d").unwrap();
        assert_eq!(url.path(), "/s2/favicons");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "domain");
        assert_eq!(value, "https://example.com/a?b=c&d");
    }

    #[test]
    fn test_favicon_url_rejects_bad_input() {
        assert!(favicon_url("not a provider", "example.com").is_none());
        assert!(favicon_url(DEFAULT_PROVIDER, "  ").is_none());
    }

    #[test]
    fn test_decode_png_dimensions() {
        let icon = Favicon::decode(&png_16x16()).unwrap();
        assert_eq!(icon.format, ImageFormat::Png);
        assert_eq!(icon.dimensions, Some((16, 16)));
    }

    #[test]
    fn test_decode_ico() {
        let icon = Favicon::decode(&encode(image::ImageFormat::Ico, 32, 32)).unwrap();
        assert_eq!(icon.format, ImageFormat::Ico);
        assert_eq!(icon.dimensions, Some((32, 32)));
    }

    #[test]
    fn test_decode_rejects_png_signature_without_image() {
        let mut junk = b"\x89PNG\r\n\x1a\n".to_vec();
        junk.extend_from_slice(b"this is not an image at all, just text after a signature");
        assert!(Favicon::decode(&junk).is_none());
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let png = png_16x16();
        assert!(Favicon::decode(&png[..png.len() / 2]).is_none());
        assert!(Favicon::decode(&png[..30]).is_none());
    }

    #[test]
    fn test_decode_svg_and_garbage() {
        let svg = Favicon::decode(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"x\"/>").unwrap();
        assert_eq!(svg.format, ImageFormat::Svg);
        assert!(Favicon::decode(b"<html>Not Found</html>").is_none());
        assert!(Favicon::decode(b"").is_none());
    }

    #[tokio::test]
    async fn test_load_delivers_icon_to_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s2/favicons"))
            .and(query_param("domain", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_16x16()))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(4);
        let loader = FaviconLoader::new(reqwest::Client::new(), server.uri());
        let target = FaviconTarget::Row { index: 3, generation: 7 };

        let handle = loader.load("example.com", target, &tx).unwrap();
        handle.await.unwrap();

        match rx.try_recv() {
            Ok(AppEvent::FaviconLoaded { target: got, favicon }) => {
                assert_eq!(got, target);
                assert_eq!(favicon.format, ImageFormat::Png);
            }
            _ => panic!("Expected FaviconLoaded"),
        }
    }

    #[tokio::test]
    async fn test_load_failure_is_silent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(4);
        let loader = FaviconLoader::new(reqwest::Client::new(), server.uri());

        let handle = loader
            .load("example.com", FaviconTarget::Banner { generation: 1 }, &tx)
            .unwrap();
        handle.await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_load_without_domain_spawns_nothing() {
        let (tx, _rx) = mpsc::channel(4);
        let loader = FaviconLoader::new(reqwest::Client::new(), DEFAULT_PROVIDER);
        assert!(loader
            .load("", FaviconTarget::Banner { generation: 1 }, &tx)
            .is_none());
    }
}
