//! # Gap Analysis Engine
//!
//! Combines ILO analysis, pillar coverage and structural checks into a
//! bounded readiness score, an eligibility-gate matrix and a list of
//! recommendations. Analysis is a pure function of the `ProgrammeData`
//! plus the analyzer's configuration: no I/O, and the same input always
//! produces the same score.
//!
//! The only error is a programme that breaks its own invariants (duplicate
//! outcomes, or an outcome marked measurable despite a weak verb). Missing
//! content is never an error; it shows up as gaps and issues.

pub mod config;
pub mod gates;

pub use config::{
    ANALYZER_VERSION, DOCUMENTATION_MIN_PERCENT, ELIGIBILITY_MIN_SCORE, PILLAR_MATCH_THRESHOLD,
    STRONG_MATCH_THRESHOLD, ScoringConfig,
};
pub use gates::{EligibilityGates, GateId, GateStatus, evaluate_gates};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::pillar::{CoverageStrategy, KeywordCoverage, Pillar, PillarCoverage};
use crate::programme::{KsaCategory, ProgrammeData};

pub const GAP_NO_ILOS: &str = "no ILOs found";
pub const GAP_ERS_MISSING: &str = "ERS content missing - mandatory";
pub const ISSUE_ILOS_MISSING: &str = "Programme ILOs are missing entirely";
pub const ISSUE_NO_COURSES: &str = "No course structure found";
pub const ISSUE_NO_MATRIX: &str = "No ILO mapping matrix visible";
pub const REC_MATRIX: &str = "Create matrix: Course ILOs → Programme ILOs → Assessments";
pub const REC_DOCUMENT_COURSES: &str = "Document ILOs for all courses before submission";

/// Recommendation for a missing pillar
pub fn pillar_recommendation(pillar: Pillar) -> &'static str {
    match pillar {
        Pillar::International => "Add international/global perspective to curriculum",
        Pillar::Practice => "Strengthen links to business practice",
        Pillar::Ers => "Integrate ethics and sustainability across curriculum",
        Pillar::Digital => "Add digital transformation content",
    }
}

/// The scored assessment of one programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    /// Snapshot of the analyzed programme
    pub programme: ProgrammeData,

    pub readiness_score: u8,
    pub eligibility_pass: bool,

    pub ilo_count: usize,
    pub ilo_has_knowledge: bool,
    pub ilo_has_skills: bool,
    pub ilo_has_attitudes: bool,
    pub ilo_weak_verb_count: usize,
    pub ilo_issues: Vec<String>,

    pub courses_total: usize,
    pub courses_with_ilos: usize,
    /// Titles of courses without documented outcomes
    pub courses_no_ilos: Vec<String>,
    /// Percentage of courses with documented outcomes
    pub documentation_score: f64,

    pub pillar_coverage: PillarCoverage,
    pub missing_pillars: Vec<Pillar>,
    /// Which coverage strategy produced the pillar scores
    pub coverage_method: String,

    pub eligibility_gates: EligibilityGates,

    pub critical_gaps: Vec<String>,
    pub structure_issues: Vec<String>,
    pub recommendations: Vec<String>,

    pub estimated_fix_months: u32,
    pub analyzed_at: DateTime<Utc>,
    pub analyzer_version: String,
}

impl GapAnalysisResult {
    /// A copy whose programme snapshot carries no embedding vectors
    pub fn without_embeddings(&self) -> Self {
        Self {
            programme: self.programme.without_embeddings(),
            ..self.clone()
        }
    }
}

/// Scores programmes against the accreditation rubric
pub struct GapAnalyzer {
    config: ScoringConfig,
    coverage: Box<dyn CoverageStrategy>,
    gate_evidence: BTreeMap<GateId, GateStatus>,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl GapAnalyzer {
    /// Analyzer with keyword pillar coverage
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            coverage: Box::new(KeywordCoverage::default()),
            gate_evidence: BTreeMap::new(),
        }
    }

    /// Use a different pillar coverage strategy
    pub fn with_coverage(mut self, coverage: impl CoverageStrategy + 'static) -> Self {
        self.coverage = Box::new(coverage);
        self
    }

    /// Gate statuses established from external evidence
    pub fn with_gate_evidence(mut self, evidence: BTreeMap<GateId, GateStatus>) -> Self {
        self.gate_evidence = evidence;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Analyze one programme
    #[instrument(skip(self, programme), fields(programme = %programme.programme_name))]
    pub fn analyze_gaps(&self, programme: &ProgrammeData) -> Result<GapAnalysisResult> {
        programme.validate()?;
        let config = &self.config;

        let mut critical_gaps = Vec::new();
        let mut ilo_issues = Vec::new();
        let mut structure_issues = Vec::new();
        let mut recommendations = Vec::new();

        // ILO structure
        let ilos = &programme.programme_ilos;
        let ilo_count = ilos.len();
        let has_category =
            |category: KsaCategory| ilos.iter().any(|ilo| ilo.ksa_category == Some(category));
        let ilo_has_knowledge = has_category(KsaCategory::Knowledge);
        let ilo_has_skills = has_category(KsaCategory::Skill);
        let ilo_has_attitudes = has_category(KsaCategory::Attitude);
        let ilo_weak_verb_count = ilos.iter().filter(|ilo| ilo.has_weak_verb).count();

        if ilo_count == 0 {
            critical_gaps.push(GAP_NO_ILOS.to_string());
            ilo_issues.push(ISSUE_ILOS_MISSING.to_string());
        } else {
            if ilo_count < *config.ilo_count_range.start() {
                ilo_issues.push(format!("Only {ilo_count} ILOs - 5-6 recommended"));
            } else if ilo_count > *config.ilo_count_range.end() {
                ilo_issues.push(format!("{ilo_count} ILOs is too many - 5-6 recommended"));
            }

            for (present, focus, dimension) in [
                (ilo_has_knowledge, "Knowledge", "Knowledge"),
                (ilo_has_skills, "Skill", "Skills"),
                (ilo_has_attitudes, "Attitude", "Attitudes"),
            ] {
                if !present {
                    ilo_issues.push(format!("No {focus}-focused ILOs detected"));
                    critical_gaps.push(format!("Missing {dimension} dimension in ILOs"));
                }
            }

            if ilo_weak_verb_count > 0 {
                ilo_issues.push(format!("{ilo_weak_verb_count} ILOs use weak/unmeasurable verbs"));
            }
        }

        // Pillar coverage
        let pillar_coverage = self.coverage.coverage(programme);
        let missing_pillars = pillar_coverage.missing(config.pillar_match_threshold);
        let ers_missing = missing_pillars.contains(&Pillar::Ers);
        if ers_missing {
            critical_gaps.push(GAP_ERS_MISSING.to_string());
            recommendations.push(pillar_recommendation(Pillar::Ers).to_string());
        }
        for pillar in missing_pillars.iter().filter(|p| **p != Pillar::Ers) {
            recommendations.push(pillar_recommendation(*pillar).to_string());
        }

        // Structure
        if programme.courses.is_empty() {
            structure_issues.push(ISSUE_NO_COURSES.to_string());
        }
        if !programme.has_ilo_matrix {
            structure_issues.push(ISSUE_NO_MATRIX.to_string());
            recommendations.push(REC_MATRIX.to_string());
        }

        // Course documentation
        let courses_total = programme.courses.len();
        let courses_no_ilos: Vec<String> = programme
            .courses
            .iter()
            .filter(|course| course.course_ilos.is_empty())
            .map(|course| course.title.clone())
            .collect();
        let courses_with_ilos = courses_total - courses_no_ilos.len();
        let documentation_score = if courses_total > 0 {
            courses_with_ilos as f64 / courses_total as f64 * 100.0
        } else {
            0.0
        };
        if courses_total > 0 && documentation_score < config.documentation_min_percent {
            structure_issues.push(format!(
                "Only {courses_with_ilos}/{courses_total} courses have documented ILOs"
            ));
            recommendations.push(REC_DOCUMENT_COURSES.to_string());
        }

        let eligibility_gates = evaluate_gates(programme, config.gate_min_ilos, &self.gate_evidence);

        // Readiness score
        let mut score: i32 = 100;
        if ilo_count == 0 {
            score -= config.no_ilos_penalty;
        }
        if ers_missing {
            score -= config.missing_ers_penalty;
        }
        let missing_dimensions = [ilo_has_knowledge, ilo_has_skills, ilo_has_attitudes]
            .iter()
            .filter(|present| !**present)
            .count() as i32;
        score -= missing_dimensions * config.missing_dimension_penalty;
        score -= missing_pillars.len() as i32 * config.missing_pillar_penalty;
        score -= structure_issues.len() as i32 * config.structure_issue_penalty;
        score -= ilo_issues.len() as i32 * config.ilo_issue_penalty;
        if courses_total > 0 && documentation_score < 100.0 {
            score -= ((100.0 - documentation_score) / 10.0).floor() as i32;
        }
        let score = score.clamp(0, 100);

        let eligibility_pass = score >= config.eligibility_min_score && critical_gaps.is_empty();
        debug!(
            "Scored {}: {} ({} critical gaps)",
            programme.programme_name,
            score,
            critical_gaps.len()
        );

        Ok(GapAnalysisResult {
            programme: programme.clone(),
            readiness_score: score as u8,
            eligibility_pass,
            ilo_count,
            ilo_has_knowledge,
            ilo_has_skills,
            ilo_has_attitudes,
            ilo_weak_verb_count,
            ilo_issues,
            courses_total,
            courses_with_ilos,
            courses_no_ilos,
            documentation_score,
            pillar_coverage,
            missing_pillars,
            coverage_method: self.coverage.name().to_string(),
            eligibility_gates,
            critical_gaps,
            structure_issues,
            recommendations,
            estimated_fix_months: config.fix_months(score),
            analyzed_at: Utc::now(),
            analyzer_version: ANALYZER_VERSION.to_string(),
        })
    }
}

/// Analyze with the default configuration and keyword coverage
pub fn analyze_gaps(programme: &ProgrammeData) -> Result<GapAnalysisResult> {
    GapAnalyzer::default().analyze_gaps(programme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ilo::IloAnalyzer;
    use crate::programme::{CourseData, DegreeType};

    /// Six measurable outcomes covering all three dimensions and all pillars
    const STRONG_ILOS: [&str; 6] = [
        "Explain international finance theory and global capital markets",
        "Identify cross-cultural challenges in foreign subsidiaries",
        "Apply practical consulting methods to real-world business cases",
        "Design digital strategies using data analytics and fintech software",
        "Act ethically and embrace responsibility for sustainable business practice",
        "Demonstrate commitment to stakeholder governance and ESG reporting",
    ];

    fn programme(ilos: &[&str], courses: usize, documented: usize) -> ProgrammeData {
        let analyzer = IloAnalyzer::new();
        let mut programme = ProgrammeData::new("EXAMPLE", "MSc in Finance", "https://example.edu/msc");
        programme.degree_type = DegreeType::infer(&programme.programme_name);
        programme.programme_ilos = ilos.iter().map(|text| analyzer.analyze(text, "en")).collect();
        for i in 0..courses {
            let course = CourseData::new(format!("Course {i}"));
            let course = if i < documented {
                course.with_ilos(["Outcome statement for the course"])
            } else {
                course
            };
            programme.courses.push(course);
        }
        programme
    }

    #[test]
    fn test_strong_programme_scores_full_marks() {
        let mut programme = programme(&STRONG_ILOS, 4, 4);
        programme.has_ilo_matrix = true;

        let result = analyze_gaps(&programme).unwrap();
        assert!(result.ilo_has_knowledge && result.ilo_has_skills && result.ilo_has_attitudes);
        assert_eq!(result.ilo_weak_verb_count, 0);
        assert!(result.missing_pillars.is_empty(), "{:?}", result.pillar_coverage);
        assert!(result.critical_gaps.is_empty());
        assert_eq!(result.readiness_score, 100);
        assert!(result.eligibility_pass);
        assert_eq!(result.estimated_fix_months, 1);
        assert_eq!(result.documentation_score, 100.0);
        assert_eq!(result.eligibility_gates[&GateId::Elg4], GateStatus::Pass);
        assert_eq!(result.eligibility_gates[&GateId::Elg2], GateStatus::Pass);
        assert_eq!(result.coverage_method, "keyword");
    }

    #[test]
    fn test_empty_programme() {
        let programme = ProgrammeData::new("EXAMPLE", "Unknown Programme", "");
        let result = analyze_gaps(&programme).unwrap();

        assert_eq!(result.readiness_score, 0);
        assert!(!result.eligibility_pass);
        assert_eq!(result.critical_gaps, vec![GAP_NO_ILOS.to_string(), GAP_ERS_MISSING.to_string()]);
        assert!(result.critical_gaps.iter().any(|gap| gap == "no ILOs found"));
        assert_eq!(result.ilo_issues, vec![ISSUE_ILOS_MISSING.to_string()]);
        assert_eq!(
            result.structure_issues,
            vec![ISSUE_NO_COURSES.to_string(), ISSUE_NO_MATRIX.to_string()]
        );
        assert_eq!(result.missing_pillars, Pillar::ALL.to_vec());
        assert_eq!(result.eligibility_gates[&GateId::Elg4], GateStatus::Fail);
        assert_eq!(result.estimated_fix_months, 12);
        assert_eq!(
            result.recommendations,
            vec![
                "Integrate ethics and sustainability across curriculum",
                "Add international/global perspective to curriculum",
                "Strengthen links to business practice",
                "Add digital transformation content",
                REC_MATRIX,
            ]
        );
    }

    /// Outcomes that cover only ERS among the pillars, plus all three dimensions
    const ERS_ONLY_ILOS: [&str; 5] = [
        "Explain the theory of corporate finance and valuation",
        "Apply econometric methods to financial time series",
        "Act ethically when advising clients on investments",
        "Evaluate responsibility and sustainability in lending",
        "Identify conflicts of interest in asset management",
    ];

    #[test]
    fn test_pass_boundary_at_seventy() {
        // -15 three pillars, -5 no matrix, -5 documentation issue, -5 documentation penalty
        let programme = programme(&ERS_ONLY_ILOS, 10, 5);

        let result = analyze_gaps(&programme).unwrap();
        assert_eq!(
            result.missing_pillars,
            vec![Pillar::International, Pillar::Practice, Pillar::Digital],
            "{:?}",
            result.pillar_coverage
        );
        assert!(result.critical_gaps.is_empty(), "{:?}", result.critical_gaps);
        assert!(result.ilo_issues.is_empty(), "{:?}", result.ilo_issues);
        assert_eq!(result.readiness_score, 70);
        assert!(result.eligibility_pass);
        assert_eq!(result.estimated_fix_months, 3);
        assert_eq!(result.courses_no_ilos.len(), 5);
    }

    #[test]
    fn test_fails_below_seventy() {
        // Same as above with one less documented course: penalty rises to 6
        let programme = programme(&ERS_ONLY_ILOS, 10, 4);
        let result = analyze_gaps(&programme).unwrap();
        assert_eq!(result.readiness_score, 69);
        assert!(result.critical_gaps.is_empty());
        assert!(!result.eligibility_pass);
    }

    #[test]
    fn test_missing_dimension_is_issue_and_critical_gap() {
        let ilos = [
            "Explain the theory of corporate finance and valuation",
            "Apply econometric methods to financial time series",
            "Identify conflicts of interest in asset management",
        ];
        let result = analyze_gaps(&programme(&ilos, 0, 0)).unwrap();

        assert!(result.ilo_issues.contains(&"Only 3 ILOs - 5-6 recommended".to_string()));
        assert!(result.ilo_issues.contains(&"No Attitude-focused ILOs detected".to_string()));
        assert!(result.critical_gaps.contains(&"Missing Attitudes dimension in ILOs".to_string()));
        assert_eq!(result.eligibility_gates[&GateId::Elg4], GateStatus::Partial);
        assert!(!result.eligibility_pass);
    }

    #[test]
    fn test_weak_verbs_and_too_many_ilos() {
        let ilos: Vec<String> = (0..9)
            .map(|i| format!("Understand topic number {i} in corporate finance"))
            .collect();
        let refs: Vec<&str> = ilos.iter().map(String::as_str).collect();
        let result = analyze_gaps(&programme(&refs, 0, 0)).unwrap();

        assert_eq!(result.ilo_weak_verb_count, 9);
        assert!(result.ilo_issues.contains(&"9 ILOs is too many - 5-6 recommended".to_string()));
        assert!(result.ilo_issues.contains(&"9 ILOs use weak/unmeasurable verbs".to_string()));
    }

    #[test]
    fn test_score_is_deterministic() {
        let programme = programme(&ERS_ONLY_ILOS, 10, 7);
        let first = analyze_gaps(&programme).unwrap();
        let second = analyze_gaps(&programme).unwrap();
        assert_eq!(first.readiness_score, second.readiness_score);
        assert_eq!(first.critical_gaps, second.critical_gaps);
        assert_eq!(first.recommendations, second.recommendations);
    }

    #[test]
    fn test_invalid_programme_is_rejected() {
        let mut programme = programme(&ERS_ONLY_ILOS, 0, 0);
        let duplicate = programme.programme_ilos[0].clone();
        programme.programme_ilos.push(duplicate);
        assert!(matches!(analyze_gaps(&programme), Err(Error::InvalidProgramme(_))));
    }

    #[test]
    fn test_gate_evidence_and_custom_config() {
        let config = ScoringConfig {
            eligibility_min_score: 60,
            ..ScoringConfig::default()
        };
        let analyzer = GapAnalyzer::new(config)
            .with_gate_evidence(BTreeMap::from([(GateId::Elg6, GateStatus::Pass)]));

        let result = analyzer.analyze_gaps(&programme(&ERS_ONLY_ILOS, 10, 4)).unwrap();
        assert_eq!(result.eligibility_gates[&GateId::Elg6], GateStatus::Pass);
        assert_eq!(result.readiness_score, 69);
        assert!(result.eligibility_pass);
    }
}
