//! Language-tagged trigger verb tables.
//!
//! Lists are scanned in declaration order, language by language; the first
//! substring hit is reported as the matched verb.

use crate::programme::KsaCategory;

/// Trigger strings for one language
#[derive(Debug, Clone, Copy)]
pub struct VerbList {
    /// ISO 639-1 language code
    pub language: &'static str,
    /// Lower-case trigger strings
    pub verbs: &'static [&'static str],
}

pub const KNOWLEDGE_VERBS: &[VerbList] = &[
    VerbList {
        language: "en",
        verbs: &[
            "define", "describe", "identify", "know", "label", "list", "match", "name",
            "outline", "recall", "recognize", "reproduce", "select", "state", "understand",
            "explain", "interpret", "summarize", "classify", "compare",
            "demonstrate understanding", "possess knowledge", "have knowledge",
        ],
    },
    VerbList {
        language: "no",
        verbs: &["beskrive", "forklare", "identifisere", "gjenkjenne", "definere"],
    },
    VerbList {
        language: "de",
        verbs: &["beschreiben", "erklären", "identifizieren", "erkennen", "definieren"],
    },
    VerbList {
        language: "fr",
        verbs: &["décrire", "expliquer", "identifier", "reconnaître", "définir"],
    },
];

pub const SKILL_VERBS: &[VerbList] = &[
    VerbList {
        language: "en",
        verbs: &[
            "apply", "demonstrate", "employ", "illustrate", "interpret", "operate", "practice",
            "schedule", "sketch", "solve", "use", "write", "analyze", "analyse", "calculate",
            "categorize", "compare", "contrast", "criticize", "differentiate", "discriminate",
            "distinguish", "examine", "experiment", "question", "test", "create", "design",
            "develop", "formulate", "construct", "produce", "plan", "compose", "integrate",
            "evaluate", "assess", "argue", "defend", "judge", "support", "value", "critique",
            "recommend",
        ],
    },
    VerbList {
        language: "no",
        verbs: &["anvende", "analysere", "vurdere", "utvikle", "designe", "løse"],
    },
    VerbList {
        language: "de",
        verbs: &["anwenden", "analysieren", "bewerten", "entwickeln", "gestalten", "lösen"],
    },
    VerbList {
        language: "fr",
        verbs: &["appliquer", "analyser", "évaluer", "développer", "concevoir", "résoudre"],
    },
];

pub const ATTITUDE_VERBS: &[VerbList] = &[
    VerbList {
        language: "en",
        verbs: &[
            "appreciate", "accept", "commit", "defend", "demonstrate commitment", "display",
            "exhibit", "internalize", "value", "behave", "act ethically", "show responsibility",
            "take responsibility", "respect", "embrace",
        ],
    },
    VerbList {
        language: "no",
        verbs: &["verdsette", "akseptere", "forplikte", "respektere", "vise ansvar"],
    },
    VerbList {
        language: "de",
        verbs: &["wertschätzen", "akzeptieren", "verpflichten", "respektieren"],
    },
    VerbList {
        language: "fr",
        verbs: &["apprécier", "accepter", "engager", "respecter", "valoriser"],
    },
];

/// Vague verbs that make an outcome hard to assess
pub const WEAK_VERBS: &[VerbList] = &[
    VerbList {
        language: "en",
        verbs: &[
            "understand", "know", "be aware", "appreciate", "be familiar", "have knowledge",
            "possess", "gain insight", "learn about",
        ],
    },
    VerbList {
        language: "no",
        verbs: &["forstå", "kjenne til", "være kjent med", "ha kunnskap"],
    },
    VerbList {
        language: "de",
        verbs: &["verstehen", "kennen", "wissen", "vertraut sein"],
    },
    VerbList {
        language: "fr",
        verbs: &["comprendre", "connaître", "savoir", "être familier"],
    },
];

/// Verb tables for a category
pub fn category_verbs(category: KsaCategory) -> &'static [VerbList] {
    match category {
        KsaCategory::Knowledge => KNOWLEDGE_VERBS,
        KsaCategory::Skill => SKILL_VERBS,
        KsaCategory::Attitude => ATTITUDE_VERBS,
    }
}

/// First verb from `tables` contained in the lower-cased `text`
pub fn first_match(tables: &'static [VerbList], text: &str) -> Option<&'static str> {
    tables
        .iter()
        .flat_map(|list| list.verbs.iter().copied())
        .find(|verb| text.contains(verb))
}
