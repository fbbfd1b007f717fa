//! Extracting links and assets from HTML bodies
//!
//! The engine consumes parsing through the [`Parser`] trait; [`HtmlParser`]
//! is the production implementation built on `scraper`. Extraction is
//! deliberately forgiving: crawled HTML is frequently malformed, so broken
//! attribute values are dropped rather than reported.

use scraper::{Html, Selector};
use url::Url;

/// Capability to extract URLs from an HTML document
pub trait Parser: Send + Sync {
    /// Extract `(links, assets)` from `body`, resolved against `base`
    ///
    /// Links come from `<a href>`; assets from `<link href>`,
    /// `<script src>` and `<img src>`. Both sequences preserve document
    /// order and keep duplicates. Values that cannot be resolved into a
    /// URL are silently skipped.
    fn parse(&self, base: &Url, body: &[u8]) -> (Vec<Url>, Vec<Url>);
}

/// [`Parser`] over a parsed HTML tree
pub struct HtmlParser {
    targets: Selector,
}

impl HtmlParser {
    pub fn new() -> Self {
        // Constant selector list, known to be valid.
        let targets = Selector::parse("a[href], link[href], script[src], img[src]")
            .expect("static selector list");

        Self { targets }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HtmlParser {
    fn parse(&self, base: &Url, body: &[u8]) -> (Vec<Url>, Vec<Url>) {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let mut links = Vec::new();
        let mut assets = Vec::new();

        for element in document.select(&self.targets) {
            let name = element.value().name();
            let attr = match name {
                "a" | "link" => "href",
                _ => "src",
            };

            let value = match element.value().attr(attr) {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            // RFC 3986 reference resolution; absolute values pass through.
            let resolved = match base.join(value) {
                Ok(url) => url,
                Err(_) => continue,
            };

            if name == "a" {
                links.push(resolved);
            } else {
                assets.push(resolved);
            }
        }

        (links, assets)
    }
}
