//! Programme facts derived from URLs, titles and page text

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub const UNKNOWN_INSTITUTION: &str = "Unknown";
pub const UNKNOWN_PROGRAMME: &str = "Unknown Programme";

/// Phrases that indicate a published outcome mapping matrix
pub const ILO_MATRIX_TERMS: &[&str] = &[
    "learning outcome matrix",
    "ilo matrix",
    "curriculum map",
    "læringsutbyttematrise",
    "programme map",
];

/// Delivery modes, checked in order
const DELIVERY_MODES: &[(&str, &str)] = &[
    ("full-time", "Full-time"),
    ("part-time", "Part-time"),
    ("deltid", "Part-time"),
    ("heltid", "Full-time"),
    ("online", "Online"),
    ("blended", "Blended"),
];

static TOTAL_CREDITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{2,3})\s*(?:ects|studiepoeng|credits|op)\b").expect("valid credits regex")
});

static DURATION_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d)[\s-]*(?:years?|år|jahre|ans|vuotta)\b").expect("valid duration regex")
});

static DURATION_MONTHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[\s-]*months?\b").expect("valid duration regex")
});

/// Institution token from the URL host, e.g. `www.uia.no` gives `UIA`
pub fn derive_institution(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('.')
        .next()
        .filter(|token| !token.is_empty())
        .map(str::to_uppercase)
}

/// Programme name from a page title: the part before any `|` or `-`
pub fn derive_programme_name(title: &str) -> Option<String> {
    let name = title
        .split('|')
        .next()
        .and_then(|part| part.split('-').next())
        .map(str::trim)?;
    (!name.is_empty()).then(|| name.to_string())
}

pub fn has_ilo_matrix(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ILO_MATRIX_TERMS.iter().any(|term| lowered.contains(term))
}

/// Programme credit total: the first 60-360 credit figure in the text
pub fn total_ects(text: &str) -> Option<u32> {
    TOTAL_CREDITS
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|credits| (60..=360).contains(credits))
}

/// Programme duration in months from "2 years" or "18 months" style phrases
pub fn duration_months(text: &str) -> Option<u32> {
    let from_years = DURATION_YEARS
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|years| (1..=6).contains(years))
        .map(|years| years * 12);

    from_years.or_else(|| {
        DURATION_MONTHS
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|months| (6..=72).contains(months))
    })
}

pub fn delivery_mode(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    DELIVERY_MODES
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|(_, label)| label.to_string())
}

/// Truncate to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_institution() {
        assert_eq!(derive_institution("https://www.uia.no/en/programme").as_deref(), Some("UIA"));
        assert_eq!(derive_institution("https://nhh.no/").as_deref(), Some("NHH"));
        assert_eq!(derive_institution("not a url"), None);
    }

    #[test]
    fn test_derive_programme_name() {
        assert_eq!(
            derive_programme_name("MSc in Finance | Example University").as_deref(),
            Some("MSc in Finance")
        );
        assert_eq!(
            derive_programme_name("Master i økonomi - Universitetet i Agder").as_deref(),
            Some("Master i økonomi")
        );
        assert_eq!(derive_programme_name("  "), None);
    }

    #[test]
    fn test_has_ilo_matrix() {
        assert!(has_ilo_matrix("See the Curriculum Map below"));
        assert!(has_ilo_matrix("Læringsutbyttematrise for programmet"));
        assert!(!has_ilo_matrix("Learning outcomes"));
    }

    #[test]
    fn test_programme_facts() {
        let text = "A full-time programme of 120 ECTS over 2 years. Each course is 7.5 ECTS.";
        assert_eq!(total_ects(text), Some(120));
        assert_eq!(duration_months(text), Some(24));
        assert_eq!(delivery_mode(text).as_deref(), Some("Full-time"));

        assert_eq!(duration_months("An 18-month executive programme"), Some(18));
        assert_eq!(total_ects("Courses of 10 ECTS"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("økonomi", 3), "øko");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
