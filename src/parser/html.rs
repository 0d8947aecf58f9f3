//! HTML traversal helpers shared by the site parsers

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

use super::CourseFragment;

/// Elements whose text never counts as page content
pub const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "nav", "footer", "header"];

/// Headings that open and close outcome sections
pub const SECTION_HEADINGS: &[&str] = &["h2", "h3", "h4", "h5"];

/// Course list headings, matched as lower-case substrings
const COURSE_HEADINGS: &[&str] = &[
    "courses",
    "course list",
    "course structure",
    "programme structure",
    "program structure",
    "curriculum",
    "modules",
    "emner",
    "opintojaksot",
    "lehrveranstaltungen",
];

/// Programme aims headings, matched as lower-case substrings
const AIM_HEADINGS: &[&str] = &[
    "programme aims",
    "program aims",
    "aims of the programme",
    "programme objectives",
    "program objectives",
    "purpose",
    "formål",
];

const MAX_COURSE_TITLE_CHARS: usize = 150;
const MIN_COURSE_OUTCOME_CHARS: usize = 20;
const MIN_AIM_CHARS: usize = 30;

static CREDITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:ects|studiepoeng|stp|sp|op|credits?)\b")
        .expect("valid credits regex")
});

/// What to collect from the siblings following a heading
#[derive(Debug, Clone, Copy)]
pub struct SectionRules {
    /// List items must be longer than this
    pub min_item_chars: usize,

    /// Paragraphs are collected when set, and must be longer than this
    pub min_paragraph_chars: Option<usize>,

    /// Include items of nested lists
    pub nested_items: bool,
}

/// Select all matches of `css` below `scope`
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            warn!("Failed to parse selector '{}': {}", css, e);
            Vec::new()
        }
    }
}

/// Detach every element matching one of `tags`, with its subtree
pub fn strip_elements(document: &mut Html, tags: &[&str]) {
    let ids: Vec<_> = select_all(document.root_element(), &tags.join(", "))
        .into_iter()
        .map(|element| (*element).id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Collapse runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an element, whitespace-collapsed
pub fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text below `element`, skipping the subtrees of `skip` tags
pub fn visible_text(element: ElementRef, skip: &[&str]) -> String {
    let mut pieces = Vec::new();
    collect_text(element, skip, &mut pieces);
    pieces.join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, skip: &[&str], pieces: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pieces.push(text);
                }
            }
            Node::Element(el) if !skip.contains(&el.name()) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, skip, pieces);
                }
            }
            _ => {}
        }
    }
}

/// Contents of the `<title>` element, or an empty string
pub fn page_title(document: &Html) -> String {
    select_all(document.root_element(), "title")
        .into_iter()
        .next()
        .map(element_text)
        .unwrap_or_default()
}

pub fn is_section_heading(name: &str) -> bool {
    SECTION_HEADINGS.contains(&name)
}

/// Section headings whose lower-cased text contains one of `keywords`
pub fn headings_matching<'a>(document: &'a Html, keywords: &[&str]) -> Vec<ElementRef<'a>> {
    select_all(document.root_element(), "h2, h3, h4, h5")
        .into_iter()
        .filter(|heading| {
            let text = element_text(*heading).to_lowercase();
            keywords.iter().any(|keyword| text.contains(keyword))
        })
        .collect()
}

/// Items of a list, either direct `li` children or every nested `li`
pub fn list_items<'a>(list: ElementRef<'a>, nested: bool) -> Vec<ElementRef<'a>> {
    if nested {
        select_all(list, "li")
    } else {
        list.children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li")
            .collect()
    }
}

/// Collect items from the siblings after `heading` until the next section heading
pub fn section_items(heading: ElementRef, rules: SectionRules) -> Vec<String> {
    let mut items = Vec::new();

    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        let name = sibling.value().name();
        if is_section_heading(name) {
            break;
        }

        match name {
            "ul" | "ol" => {
                for item in list_items(sibling, rules.nested_items) {
                    let text = element_text(item);
                    if text.chars().count() > rules.min_item_chars {
                        items.push(text);
                    }
                }
            }
            "p" => {
                if let Some(min_chars) = rules.min_paragraph_chars {
                    let text = element_text(sibling);
                    if text.chars().count() > min_chars {
                        items.push(text);
                    }
                }
            }
            _ => {}
        }
    }

    items
}

/// Append `items` to `target`, skipping exact duplicates
pub fn push_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Split a course line into its title and credit value
pub fn parse_course_line(line: &str) -> Option<(String, Option<f32>)> {
    let ects = CREDITS
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse::<f32>().ok());

    let without_credits = CREDITS.replace_all(line, "").replace("()", "");
    let title = collapse_whitespace(
        without_credits.trim_matches(|c: char| c.is_whitespace() || "-–|,:".contains(c)),
    );

    if title.is_empty() || title.chars().count() > MAX_COURSE_TITLE_CHARS {
        return None;
    }
    Some((title, ects))
}

fn course_from_item(item: ElementRef) -> Option<CourseFragment> {
    let line = collapse_whitespace(&visible_text(item, &["ul", "ol"]));
    let (title, ects) = parse_course_line(&line)?;

    let outcomes = select_all(item, "ul li, ol li")
        .into_iter()
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_COURSE_OUTCOME_CHARS)
        .collect();

    Some(CourseFragment {
        title,
        ects,
        outcomes,
    })
}

fn course_from_row(row: ElementRef) -> Option<CourseFragment> {
    let cells = select_all(row, "td");
    let first = cells.first()?;
    let (title, mut ects) = parse_course_line(&element_text(*first))?;

    if ects.is_none() {
        // credits often sit in their own column
        ects = cells[1..]
            .iter()
            .map(|cell| element_text(*cell))
            .find_map(|text| {
                parse_course_line(&text)
                    .and_then(|(_, ects)| ects)
                    .or_else(|| text.replace(',', ".").parse::<f32>().ok())
            });
    }

    Some(CourseFragment {
        title,
        ects,
        outcomes: Vec::new(),
    })
}

/// Course lists and tables under course-structure headings
pub fn course_fragments(document: &Html) -> Vec<CourseFragment> {
    let mut fragments: Vec<CourseFragment> = Vec::new();

    for heading in headings_matching(document, COURSE_HEADINGS) {
        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            let name = sibling.value().name();
            if is_section_heading(name) {
                break;
            }

            let found: Vec<CourseFragment> = match name {
                "ul" | "ol" => list_items(sibling, false)
                    .into_iter()
                    .filter_map(course_from_item)
                    .collect(),
                "table" => select_all(sibling, "tr")
                    .into_iter()
                    .filter_map(course_from_row)
                    .collect(),
                _ => Vec::new(),
            };

            for fragment in found {
                if !fragments.iter().any(|f| f.title == fragment.title) {
                    fragments.push(fragment);
                }
            }
        }
    }

    fragments
}

/// Paragraphs and list items under programme-aims headings
pub fn programme_aims(document: &Html) -> Vec<String> {
    let rules = SectionRules {
        min_item_chars: MIN_AIM_CHARS,
        min_paragraph_chars: Some(MIN_AIM_CHARS),
        nested_items: false,
    };

    let mut aims = Vec::new();
    for heading in headings_matching(document, AIM_HEADINGS) {
        push_unique(&mut aims, section_items(heading, rules));
    }
    aims
}
