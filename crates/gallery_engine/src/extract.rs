use scraper::node::Element;
use scraper::{Html, Selector};
use url::Url;

use crate::ImageReference;

pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
const MAX_DECLARED_EXTENSION_LEN: usize = 5;
const MAX_URL_EXTENSION_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionReport {
    /// Number of `<img>` elements seen, usable or not.
    pub tags_found: usize,
    pub references: Vec<ImageReference>,
}

pub trait ReferenceExtractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractionReport;
}

/// Ordered list of attribute names; the first present, non-blank one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChain {
    names: Vec<String>,
}

impl AttributeChain {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn first_value<'a>(&self, element: &'a Element) -> Option<&'a str> {
        self.names
            .iter()
            .filter_map(|name| element.attr(name).map(str::trim))
            .find(|value| !value.is_empty())
    }
}

/// Extractor for lazily loaded article images (`data-src`, then `src`).
///
/// Relative URLs are not resolved: only absolute and protocol-relative
/// references survive.
#[derive(Debug, Clone)]
pub struct LazyImageExtractor {
    source_chain: AttributeChain,
    type_chain: AttributeChain,
    protocol_relative_scheme: String,
}

impl LazyImageExtractor {
    pub fn new() -> Self {
        Self {
            source_chain: AttributeChain::new(["data-src", "src"]),
            type_chain: AttributeChain::new(["data-type"]),
            protocol_relative_scheme: "http".to_string(),
        }
    }

    /// Scheme prefixed onto `//host/...` references.
    pub fn with_protocol_relative_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.protocol_relative_scheme = scheme.into();
        self
    }

    fn reference_for(&self, element: &Element) -> Option<ImageReference> {
        let raw = self.source_chain.first_value(element)?;
        let source_url = normalize_url(raw, &self.protocol_relative_scheme)?;
        let declared = self.type_chain.first_value(element);
        let extension = resolve_extension(declared, &source_url);
        Some(ImageReference {
            source_url,
            extension,
        })
    }
}

impl Default for LazyImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor for LazyImageExtractor {
    fn extract(&self, html: &str) -> ExtractionReport {
        let Ok(selector) = Selector::parse("img, noscript") else {
            return ExtractionReport::default();
        };

        let mut report = ExtractionReport::default();
        self.collect(&Html::parse_document(html), &selector, &mut report);
        report
    }
}

impl LazyImageExtractor {
    /// Walks `<img>` elements in document order.
    ///
    /// The parser runs with scripting enabled, so `<noscript>` content arrives
    /// as raw text; it is parsed again so fallback images count as well.
    fn collect(&self, doc: &Html, selector: &Selector, report: &mut ExtractionReport) {
        for element in doc.select(selector) {
            if element.value().name() == "noscript" {
                let inner: String = element.text().collect();
                if inner.contains('<') {
                    self.collect(&Html::parse_fragment(&inner), selector, report);
                }
                continue;
            }
            report.tags_found += 1;
            if let Some(reference) = self.reference_for(element.value()) {
                report.references.push(reference);
            }
        }
    }
}

fn normalize_url(raw: &str, protocol_relative_scheme: &str) -> Option<String> {
    let candidate = if raw.starts_with("//") {
        format!("{protocol_relative_scheme}:{raw}")
    } else {
        raw.to_string()
    };
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        Some(candidate)
    } else {
        None
    }
}

/// Declared subtype if short enough, else URL suffix, else the default.
pub fn resolve_extension(declared: Option<&str>, url: &str) -> String {
    let declared = declared
        .and_then(|value| value.rsplit('/').next())
        .map(str::trim)
        .filter(|subtype| !subtype.is_empty() && subtype.len() <= MAX_DECLARED_EXTENSION_LEN);
    if let Some(subtype) = declared {
        return subtype.to_ascii_lowercase();
    }
    extension_from_url(url).unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path().rsplit('/').next()?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_URL_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_mime_subtype_wins() {
        assert_eq!(resolve_extension(Some("image/png"), "https://a/b.gif"), "png");
        assert_eq!(resolve_extension(Some("jpeg"), "https://a/b"), "jpeg");
    }

    #[test]
    fn overlong_declared_type_falls_back_to_url_suffix() {
        assert_eq!(
            resolve_extension(Some("image/svg+xml"), "https://a/pic.webp?x=1"),
            "webp"
        );
    }

    #[test]
    fn url_suffix_ignores_query_and_long_extensions() {
        assert_eq!(resolve_extension(None, "https://a/pic.PNG?fmt=jpeg"), "png");
        assert_eq!(resolve_extension(None, "https://a/photo.jpeg2k"), "jpg");
        assert_eq!(resolve_extension(None, "https://a/b"), "jpg");
        assert_eq!(resolve_extension(None, "https://a/dir.v2/b"), "jpg");
    }

    #[test]
    fn extensions_are_lowercase_and_alphanumeric() {
        assert_eq!(resolve_extension(Some("IMAGE/PNG"), "https://a/b"), "png");
        assert_eq!(resolve_extension(None, "https://a/pic.j%20g"), "jpg");
        assert_eq!(resolve_extension(None, "https://a/pic.Gif"), "gif");
    }

    #[test]
    fn protocol_relative_urls_get_a_scheme() {
        assert_eq!(
            normalize_url("//cdn.example.com/a.jpg", "http").as_deref(),
            Some("http://cdn.example.com/a.jpg")
        );
        assert_eq!(normalize_url("/relative/a.jpg", "http"), None);
        assert_eq!(normalize_url("data:image/png;base64,AAAA", "http"), None);
    }
}
