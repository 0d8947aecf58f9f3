//! Parsers for Norwegian and Finnish university sites

use scraper::Html;
use tracing::debug;

use super::generic::{GenericParser, keyword_section_ilos};
use super::html::{
    NOISE_TAGS, SectionRules, collapse_whitespace, course_fragments, page_title, programme_aims,
    visible_text,
};
use super::{ParsedPage, SiteParser, detect_language, host_matches};

const NORWEGIAN_DOMAINS: &[&str] = &[
    "uia.no", "ntnu.no", "nhh.no", "bi.no", "uio.no", "uib.no", "uit.no", "usn.no",
];

/// Norwegian qualification framework headings: kunnskap (knowledge),
/// ferdigheter (skills), generell kompetanse/holdninger (attitudes)
const NORWEGIAN_HEADINGS: &[&str] = &[
    "kunnskap",
    "ferdighet",
    "generell kompetanse",
    "holdning",
    "læringsutbytte",
];

const FINNISH_DOMAINS: &[&str] = &["uwasa.fi", "aalto.fi", "hanken.fi", "helsinki.fi", "utu.fi"];

const FINNISH_HEADINGS: &[&str] = &[
    "learning outcome",
    "learning objective",
    "osaamistavoitteet",
    "oppimistavoitteet",
];

const FINNISH_MARKERS: &[&str] = &["osaamistavoitteet", "opintojaksot"];

/// Parser for Norwegian university programme pages
#[derive(Debug, Clone, Default)]
pub struct NorwegianParser;

impl SiteParser for NorwegianParser {
    fn name(&self) -> &'static str {
        "norwegian"
    }

    fn can_parse(&self, url: &str) -> bool {
        host_matches(url, NORWEGIAN_DOMAINS)
    }

    fn parse(&self, html: &str, url: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        let rules = SectionRules {
            min_item_chars: 15,
            min_paragraph_chars: Some(30),
            nested_items: false,
        };

        let mut ilos = keyword_section_ilos(&document, NORWEGIAN_HEADINGS, rules);
        if ilos.is_empty() {
            debug!("No Norwegian outcome headings on {}, using generic heuristics", url);
            ilos = GenericParser::extract_ilos(&document);
        }

        let text = collapse_whitespace(&visible_text(document.root_element(), NOISE_TAGS));
        let fallback_language = if url.contains("/en/") { "en" } else { "no" };
        let language = detect_language(&text).unwrap_or(fallback_language).to_string();

        ParsedPage {
            title: page_title(&document),
            ilos,
            courses: course_fragments(&document),
            aims: programme_aims(&document),
            text,
            language,
        }
    }
}

/// Parser for Finnish university programme pages
#[derive(Debug, Clone, Default)]
pub struct FinnishParser;

impl SiteParser for FinnishParser {
    fn name(&self) -> &'static str {
        "finnish"
    }

    fn can_parse(&self, url: &str) -> bool {
        host_matches(url, FINNISH_DOMAINS)
    }

    fn parse(&self, html: &str, url: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        let rules = SectionRules {
            min_item_chars: 15,
            min_paragraph_chars: None,
            nested_items: false,
        };

        let mut ilos = keyword_section_ilos(&document, FINNISH_HEADINGS, rules);
        if ilos.is_empty() {
            debug!("No Finnish outcome headings on {}, using generic heuristics", url);
            ilos = GenericParser::extract_ilos(&document);
        }

        let text = collapse_whitespace(&visible_text(document.root_element(), NOISE_TAGS));
        let lowered = text.to_lowercase();
        let language = if FINNISH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            "fi"
        } else {
            detect_language(&text).unwrap_or("en")
        };

        ParsedPage {
            title: page_title(&document),
            ilos,
            courses: course_fragments(&document),
            aims: programme_aims(&document),
            text,
            language: language.to_string(),
        }
    }
}
