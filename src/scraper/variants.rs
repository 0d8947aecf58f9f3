//! Language variant discovery for programme URLs.
//!
//! A variant is a plain string substitution of a language marker. It may not
//! exist on the site; fetch failures on variants are expected.

/// (from, to) marker substitutions, applied to the original URL
pub const LANGUAGE_SWAPS: &[(&str, &str)] = &[
    ("/en/", "/no/"),
    ("/no/", "/en/"),
    ("/en/", "/de/"),
    ("/de/", "/en/"),
    ("/en/", "/fr/"),
    ("/fr/", "/en/"),
    ("/en/", "/fi/"),
    ("/fi/", "/en/"),
    ("?lang=en", "?lang=no"),
    ("?lang=no", "?lang=en"),
    ("/english/", "/norwegian/"),
    ("/norwegian/", "/english/"),
];

/// `url` followed by each distinct language variant of it
pub fn language_variants(url: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];
    for (from, to) in LANGUAGE_SWAPS {
        if url.contains(from) {
            let variant = url.replace(from, to);
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }
    variants
}

/// Expand every URL with its variants, keeping first-seen order
pub fn expand_urls(urls: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for url in urls {
        for variant in language_variants(url) {
            if !expanded.contains(&variant) {
                expanded.push(variant);
            }
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_path_variants() {
        let variants = language_variants("https://example.edu/en/programme");
        assert_eq!(
            variants,
            vec![
                "https://example.edu/en/programme",
                "https://example.edu/no/programme",
                "https://example.edu/de/programme",
                "https://example.edu/fr/programme",
                "https://example.edu/fi/programme",
            ]
        );
    }

    #[test]
    fn test_query_variant() {
        let variants = language_variants("https://example.edu/mba?lang=no");
        assert_eq!(
            variants,
            vec!["https://example.edu/mba?lang=no", "https://example.edu/mba?lang=en"]
        );
    }

    #[test]
    fn test_expand_deduplicates_across_inputs() {
        let urls = vec![
            "https://example.edu/en/mba".to_string(),
            "https://example.edu/no/mba".to_string(),
        ];
        let expanded = expand_urls(&urls);
        assert_eq!(expanded[0], "https://example.edu/en/mba");
        assert_eq!(expanded[1], "https://example.edu/no/mba");
        assert_eq!(expanded.len(), 5);
    }

    #[test]
    fn test_url_without_markers() {
        assert_eq!(language_variants("https://example.edu/mba"), vec!["https://example.edu/mba"]);
    }
}
