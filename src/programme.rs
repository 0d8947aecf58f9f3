//! # Programme Data Model
//!
//! Plain records produced by the scraper and consumed by the gap analysis.
//! They serialize to flat JSON documents for the storage collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::pillar::Pillar;

/// Knowledge / Skill / Attitude category of a learning outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KsaCategory {
    Knowledge,
    Skill,
    Attitude,
}

impl fmt::Display for KsaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Knowledge => "Knowledge",
            Self::Skill => "Skill",
            Self::Attitude => "Attitude",
        };
        f.write_str(name)
    }
}

/// Analysis of a single intended learning outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IloAnalysis {
    /// Outcome statement as found in the source
    pub text: String,

    /// Language code of the source page or document
    pub source_language: String,

    /// Category of the first matching trigger verb
    pub ksa_category: Option<KsaCategory>,

    /// The trigger verb that decided the category
    pub verb_found: Option<String>,

    /// Whether a weak or unmeasurable verb was found
    pub has_weak_verb: bool,

    /// False when a weak verb was found or no category verb was found
    pub is_measurable: bool,

    /// Human-readable quality issues
    pub quality_issues: Vec<String>,

    /// Semantic embedding, when an embedding service was available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Pillars this outcome is semantically close to
    #[serde(default)]
    pub matched_pillars: Vec<Pillar>,

    /// Best pillar similarity seen for this outcome
    #[serde(default)]
    pub best_match_score: f32,
}

impl IloAnalysis {
    /// Create an unanalysed outcome
    pub fn new(text: impl Into<String>, source_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            ksa_category: None,
            verb_found: None,
            has_weak_verb: false,
            is_measurable: true,
            quality_issues: Vec::new(),
            embedding: None,
            matched_pillars: Vec::new(),
            best_match_score: 0.0,
        }
    }
}

/// A curriculum course or module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseData {
    pub title: String,
    pub description: Option<String>,
    pub source_language: String,
    pub ects: Option<f32>,
    pub year: Option<u8>,
    pub semester: Option<String>,
    pub is_mandatory: Option<bool>,
    /// Course-level learning outcomes
    pub course_ilos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub matched_pillars: Vec<Pillar>,
}

impl CourseData {
    /// Create a course with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source_language: "en".to_string(),
            ects: None,
            year: None,
            semester: None,
            is_mandatory: None,
            course_ilos: Vec::new(),
            embedding: None,
            matched_pillars: Vec::new(),
        }
    }

    /// Set the credit value
    pub fn with_ects(mut self, ects: f32) -> Self {
        self.ects = Some(ects);
        self
    }

    /// Set the course-level outcomes
    pub fn with_ilos<I, S>(mut self, ilos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.course_ilos = ilos.into_iter().map(Into::into).collect();
        self
    }
}

/// Degree type inferred from the programme name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeType {
    #[serde(rename = "MBA")]
    Mba,
    #[serde(rename = "MSc")]
    Msc,
    #[serde(rename = "BSc")]
    Bsc,
    #[serde(rename = "PhD")]
    Phd,
}

impl DegreeType {
    /// Infer the degree type from a programme name.
    ///
    /// Checked in a fixed precedence order: MBA, MSc/Master, BSc/Bachelor,
    /// PhD/Doctor. The first match wins.
    pub fn infer(programme_name: &str) -> Option<Self> {
        let name = programme_name.to_lowercase();
        let precedence: [(&[&str], Self); 4] = [
            (&["mba"], Self::Mba),
            (&["msc", "master"], Self::Msc),
            (&["bsc", "bachelor"], Self::Bsc),
            (&["phd", "doctor"], Self::Phd),
        ];

        precedence
            .into_iter()
            .find(|(markers, _)| markers.iter().any(|marker| name.contains(marker)))
            .map(|(_, degree)| degree)
    }
}

impl fmt::Display for DegreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mba => "MBA",
            Self::Msc => "MSc",
            Self::Bsc => "BSc",
            Self::Phd => "PhD",
        };
        f.write_str(name)
    }
}

/// The scraped aggregate for one programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgrammeData {
    pub institution: String,
    pub programme_name: String,
    pub primary_url: String,

    pub degree_type: Option<DegreeType>,
    pub duration_months: Option<u32>,
    pub total_ects: Option<u32>,
    pub delivery_mode: Option<String>,
    /// Languages in first-seen order
    pub languages_of_instruction: Vec<String>,

    /// URLs that were fetched successfully
    pub urls_scraped: Vec<String>,

    /// Deduplicated outcomes in first-seen order
    pub programme_ilos: Vec<IloAnalysis>,
    pub courses: Vec<CourseData>,
    pub programme_aims: Vec<String>,

    /// Concatenated raw content, size-capped, kept for re-processing
    #[serde(default)]
    pub raw_html: String,
    #[serde(default)]
    pub raw_text: String,

    pub has_ilo_matrix: bool,

    pub scraped_at: DateTime<Utc>,
    pub scrape_notes: Vec<String>,
}

impl ProgrammeData {
    /// Create an empty programme record
    pub fn new(
        institution: impl Into<String>,
        programme_name: impl Into<String>,
        primary_url: impl Into<String>,
    ) -> Self {
        Self {
            institution: institution.into(),
            programme_name: programme_name.into(),
            primary_url: primary_url.into(),
            degree_type: None,
            duration_months: None,
            total_ects: None,
            delivery_mode: None,
            languages_of_instruction: Vec::new(),
            urls_scraped: Vec::new(),
            programme_ilos: Vec::new(),
            courses: Vec::new(),
            programme_aims: Vec::new(),
            raw_html: String::new(),
            raw_text: String::new(),
            has_ilo_matrix: false,
            scraped_at: Utc::now(),
            scrape_notes: Vec::new(),
        }
    }

    /// Check the record's invariants.
    ///
    /// Outcomes must be unique by folded text, and an outcome with a weak verb
    /// or without a category verb can never be measurable.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for ilo in &self.programme_ilos {
            if !seen.insert(fold_text(&ilo.text)) {
                return Err(Error::InvalidProgramme(format!(
                    "duplicate ILO: {}",
                    ilo.text
                )));
            }
            if ilo.is_measurable && (ilo.has_weak_verb || ilo.ksa_category.is_none()) {
                return Err(Error::InvalidProgramme(format!(
                    "ILO marked measurable without a strong category verb: {}",
                    ilo.text
                )));
            }
        }
        Ok(())
    }

    /// A copy without embedding vectors, for compact JSON output
    pub fn without_embeddings(&self) -> Self {
        let mut copy = self.clone();
        for ilo in &mut copy.programme_ilos {
            ilo.embedding = None;
        }
        for course in &mut copy.courses {
            course.embedding = None;
        }
        copy
    }
}

/// Case-folded, trimmed, whitespace-collapsed key used for deduplication
pub fn fold_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
