//! Catch-all parser driven by multilingual heading heuristics

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::html::{
    NOISE_TAGS, SectionRules, collapse_whitespace, course_fragments, element_text,
    headings_matching, page_title, programme_aims, push_unique, section_items, select_all,
    strip_elements, visible_text,
};
use super::{ParsedPage, SiteParser, detect_language};

/// Outcome list items must be longer than this
const MIN_ILO_CHARS: usize = 20;

/// Outcome section headings in English, Norwegian, German and French
static ILO_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)learning\s*outcomes?|programme\s*outcomes?|program\s*outcomes?|intended\s*learning|what you will learn|on completion|graduates? will|læringsutbytte|kunnskaper|ferdigheter|lernergebnisse|lernziele|acquis\s*d.apprentissage|objectifs",
    )
    .expect("valid outcome section regex")
});

/// Knowledge/skill/competence heading words
const KSA_HEADINGS: &[&str] = &[
    "kunnskaper",
    "ferdigheter",
    "kompetanse",
    "knowledge",
    "skills",
    "competence",
    "kenntnisse",
    "fertigkeiten",
    "connaissances",
    "compétences",
];

static CONTENT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"content|main").expect("valid content class regex"));

/// Parser for any site
#[derive(Debug, Clone, Default)]
pub struct GenericParser;

impl GenericParser {
    /// Outcome candidates from outcome sections and KSA headings
    pub fn extract_ilos(document: &Html) -> Vec<String> {
        let mut ilos = Vec::new();

        // Dedicated containers led by an outcome heading
        for container in select_all(document.root_element(), "div, section, article") {
            let headings: Vec<ElementRef> = container
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| {
                    matches!(child.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                })
                .collect();

            let [heading] = headings.as_slice() else {
                continue;
            };
            if !ILO_SECTION.is_match(&element_text(*heading)) {
                continue;
            }

            let items = select_all(container, "li")
                .into_iter()
                .map(element_text)
                .filter(|text| text.chars().count() > MIN_ILO_CHARS);
            push_unique(&mut ilos, items);
        }

        // Headings followed by lists, up to the next heading
        let rules = SectionRules {
            min_item_chars: MIN_ILO_CHARS,
            min_paragraph_chars: None,
            nested_items: true,
        };
        for heading in select_all(document.root_element(), "h2, h3, h4, h5") {
            let text = element_text(heading);
            let lowered = text.to_lowercase();
            if ILO_SECTION.is_match(&text) || KSA_HEADINGS.iter().any(|k| lowered.contains(k)) {
                push_unique(&mut ilos, section_items(heading, rules));
            }
        }

        ilos
    }

    /// Main content element: `main`, then `article`, then a content-classed `div`
    fn content_root(document: &Html) -> ElementRef<'_> {
        let root = document.root_element();
        select_all(root, "main")
            .into_iter()
            .chain(select_all(root, "article"))
            .chain(select_all(root, "div").into_iter().filter(|div| {
                div.value()
                    .attr("class")
                    .is_some_and(|class| CONTENT_CLASS.is_match(class))
            }))
            .next()
            .unwrap_or(root)
    }
}

impl SiteParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn can_parse(&self, _url: &str) -> bool {
        true
    }

    fn parse(&self, html: &str, _url: &str) -> ParsedPage {
        let mut document = Html::parse_document(html);
        strip_elements(&mut document, NOISE_TAGS);
        let text = collapse_whitespace(&visible_text(Self::content_root(&document), NOISE_TAGS));
        let language = detect_language(&text).unwrap_or("en").to_string();

        ParsedPage {
            title: page_title(&document),
            ilos: Self::extract_ilos(&document),
            courses: course_fragments(&document),
            aims: programme_aims(&document),
            text,
            language,
        }
    }
}

/// Outcome candidates under headings containing `keywords`
pub(super) fn keyword_section_ilos(
    document: &Html,
    keywords: &[&str],
    rules: SectionRules,
) -> Vec<String> {
    let mut ilos = Vec::new();
    for heading in headings_matching(document, keywords) {
        push_unique(&mut ilos, section_items(heading, rules));
    }
    ilos
}
