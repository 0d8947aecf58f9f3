//! # Site Parser Registry
//!
//! Turns fetched HTML into a normalized `ParsedPage`. Parsers implement
//! `SiteParser` and are tried in registration order; the first whose
//! `can_parse` accepts the URL wins. The generic parser is held apart from
//! the site-specific list and always answers last, so every URL has a parser.
//!
//! ## Key Components
//!
//! - `SiteParser`: the parser capability
//! - `ParserRegistry`: ordered site parsers plus the generic fallback
//! - `GenericParser`: multilingual heading heuristics for any site
//! - `NorwegianParser`, `FinnishParser`: locale heuristics for known domains

mod generic;
pub mod html;
mod nordic;

pub use generic::GenericParser;
pub use nordic::{FinnishParser, NorwegianParser};

use serde::{Deserialize, Serialize};
use url::Url;

/// A course line found on a programme page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseFragment {
    pub title: String,
    pub ects: Option<f32>,
    /// Outcome items listed under the course, if any
    pub outcomes: Vec<String>,
}

/// Normalized result of parsing one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPage {
    pub title: String,
    /// Outcome candidates, deduplicated within the page
    pub ilos: Vec<String>,
    pub courses: Vec<CourseFragment>,
    pub aims: Vec<String>,
    /// Visible text with noise elements removed
    pub text: String,
    /// Detected language code
    pub language: String,
}

/// A parser for a family of sites
pub trait SiteParser: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Whether this parser handles `url`
    fn can_parse(&self, url: &str) -> bool;

    /// Parse `html` fetched from `url`
    fn parse(&self, html: &str, url: &str) -> ParsedPage;
}

/// Ordered parser registry with a generic fallback
pub struct ParserRegistry {
    site_parsers: Vec<Box<dyn SiteParser>>,
    fallback: GenericParser,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_site_parsers(vec![
            Box::new(NorwegianParser::default()),
            Box::new(FinnishParser::default()),
        ])
    }
}

impl ParserRegistry {
    /// Registry with only the generic parser
    pub fn new() -> Self {
        Self::with_site_parsers(Vec::new())
    }

    /// Registry trying `site_parsers` in order before the generic parser
    pub fn with_site_parsers(site_parsers: Vec<Box<dyn SiteParser>>) -> Self {
        Self {
            site_parsers,
            fallback: GenericParser::default(),
        }
    }

    /// Add a site parser after the existing ones, still ahead of the fallback
    pub fn register(&mut self, parser: Box<dyn SiteParser>) {
        self.site_parsers.push(parser);
    }

    /// The parser that handles `url`
    pub fn parser_for(&self, url: &str) -> &dyn SiteParser {
        self.site_parsers
            .iter()
            .find(|parser| parser.can_parse(url))
            .map(|parser| &**parser)
            .unwrap_or(&self.fallback)
    }

    /// Parse with the first matching parser
    pub fn parse(&self, html: &str, url: &str) -> ParsedPage {
        self.parser_for(url).parse(html, url)
    }

    /// Parser names in lookup order
    pub fn names(&self) -> Vec<&'static str> {
        self.site_parsers
            .iter()
            .map(|parser| parser.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }
}

/// Marker words for vocabulary sniffing, checked in order
const LANGUAGE_MARKERS: [(&str, &[&str]); 3] = [
    ("no", &["læringsutbytte", "studenten", "kandidaten"]),
    ("de", &["lernergebnisse", "studierende"]),
    ("fr", &["objectifs", "étudiant"]),
];

/// Guess the language of page text from marker words
pub fn detect_language(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    LANGUAGE_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| lowered.contains(marker)))
        .map(|(language, _)| *language)
}

/// Whether the URL's host is one of `domains` or a subdomain of one
pub fn host_matches(url: &str, domains: &[&str]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.strip_prefix("www.").unwrap_or(host);

    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.names(), vec!["norwegian", "finnish", "generic"]);

        assert_eq!(registry.parser_for("https://www.uia.no/en/studieplaner").name(), "norwegian");
        assert_eq!(registry.parser_for("https://student.ntnu.no/programme").name(), "norwegian");
        assert_eq!(registry.parser_for("https://www.aalto.fi/en/programmes").name(), "finnish");
        assert_eq!(registry.parser_for("https://example.edu/mba").name(), "generic");
        assert_eq!(registry.parser_for("not a url").name(), "generic");
    }

    #[test]
    fn test_host_matching_requires_label_boundary() {
        assert!(host_matches("https://uia.no/x", &["uia.no"]));
        assert!(host_matches("https://www.uia.no/x", &["uia.no"]));
        assert!(host_matches("https://kursinfo.uia.no/x", &["uia.no"]));
        assert!(!host_matches("https://fakeuia.no/x", &["uia.no"]));
    }

    #[test]
    fn test_registered_parser_precedes_fallback() {
        struct Fixed;
        impl SiteParser for Fixed {
            fn name(&self) -> &'static str {
                "fixed"
            }
            fn can_parse(&self, url: &str) -> bool {
                url.contains("example.edu")
            }
            fn parse(&self, _html: &str, _url: &str) -> ParsedPage {
                ParsedPage {
                    title: "Fixed".to_string(),
                    ..Default::default()
                }
            }
        }

        let mut registry = ParserRegistry::new();
        registry.register(Box::new(Fixed));
        assert_eq!(registry.parse("", "https://example.edu/").title, "Fixed");
        assert_eq!(registry.parser_for("https://other.edu/").name(), "generic");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("Læringsutbytte for programmet"), Some("no"));
        assert_eq!(detect_language("Lernergebnisse des Studiengangs"), Some("de"));
        assert_eq!(detect_language("Les objectifs du programme"), Some("fr"));
        assert_eq!(detect_language("Programme learning outcomes"), None);
    }
}
