//! # Report Formatter
//!
//! Fixed-layout plain-text rendering of a `GapAnalysisResult`. Both reports
//! are pure functions of the result: identical input gives byte-identical
//! output, so they can be diffed and snapshot-tested.

use chrono::SecondsFormat;
use std::fmt::{self, Write};

use crate::gap::{GapAnalysisResult, PILLAR_MATCH_THRESHOLD, STRONG_MATCH_THRESHOLD};
use crate::pillar::Pillar;

const REPORT_WIDTH: usize = 70;
const PLAN_WIDTH: usize = 60;
const ILO_DISPLAY_CHARS: usize = 80;
const MAX_LISTED_COURSES: usize = 10;

/// Readiness band for a score
pub fn status_label(score: u8) -> &'static str {
    match score {
        80.. => "🟢 READY - Minor improvements needed",
        60.. => "🟡 PARTIAL - Significant work required",
        40.. => "🟠 AT RISK - Major gaps to address",
        _ => "🔴 NOT READY - Fundamental issues",
    }
}

fn pillar_icon(score: f64) -> &'static str {
    if score >= STRONG_MATCH_THRESHOLD {
        "✅"
    } else if score >= PILLAR_MATCH_THRESHOLD {
        "🟡"
    } else {
        "❌"
    }
}

fn documentation_icon(percent: f64) -> &'static str {
    if percent >= 90.0 {
        "✅"
    } else if percent >= 70.0 {
        "🟡"
    } else {
        "❌"
    }
}

fn check(present: bool) -> &'static str {
    if present { "✅" } else { "❌" }
}

fn truncate_display(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "{}", "-".repeat(REPORT_WIDTH))?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(REPORT_WIDTH))
}

/// Render the gap analysis report
pub fn format_gap_report(result: &GapAnalysisResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_gap_report(&mut out, result);
    out.truncate(out.trim_end_matches('\n').len());
    out
}

fn write_gap_report(out: &mut String, result: &GapAnalysisResult) -> fmt::Result {
    let programme = &result.programme;
    let rule = "=".repeat(REPORT_WIDTH);

    writeln!(out, "{rule}")?;
    writeln!(out, "PROGRAMME GAP ANALYSIS REPORT")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;
    writeln!(out, "Programme: {}", programme.programme_name)?;
    writeln!(out, "Institution: {}", programme.institution)?;
    writeln!(out, "URL: {}", programme.primary_url)?;
    writeln!(out, "Languages: {}", programme.languages_of_instruction.join(", "))?;
    writeln!(
        out,
        "Analysed: {}",
        result.analyzed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out)?;

    writeln!(out, "READINESS SCORE: {}/100", result.readiness_score)?;
    writeln!(out, "Status: {}", status_label(result.readiness_score))?;
    writeln!(
        out,
        "Estimated time to readiness: {} months",
        result.estimated_fix_months
    )?;
    writeln!(out)?;

    if !result.critical_gaps.is_empty() {
        section(out, "🚨 CRITICAL GAPS (Must fix before submission)")?;
        for gap in &result.critical_gaps {
            writeln!(out, "  ❌ {gap}")?;
        }
        writeln!(out)?;
    }

    section(out, "INTENDED LEARNING OUTCOMES (ILOs)")?;
    writeln!(out, "  Count: {} (optimal: 5-6)", result.ilo_count)?;
    writeln!(out, "  Knowledge dimension: {}", check(result.ilo_has_knowledge))?;
    writeln!(out, "  Skills dimension: {}", check(result.ilo_has_skills))?;
    writeln!(out, "  Attitudes dimension: {}", check(result.ilo_has_attitudes))?;
    writeln!(out, "  Weak verbs found: {}", result.ilo_weak_verb_count)?;
    if !result.ilo_issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Issues:")?;
        for issue in &result.ilo_issues {
            writeln!(out, "    ⚠️  {issue}")?;
        }
    }
    writeln!(out)?;

    if !programme.programme_ilos.is_empty() {
        writeln!(out, "  ILOs Found:")?;
        for (i, ilo) in programme.programme_ilos.iter().enumerate() {
            let category = ilo
                .ksa_category
                .map(|category| category.to_string())
                .unwrap_or_else(|| "?".to_string());
            let weak = if ilo.has_weak_verb { " ⚠️WEAK" } else { "" };
            writeln!(
                out,
                "    {}. [{category}]{weak} {}",
                i + 1,
                truncate_display(&ilo.text, ILO_DISPLAY_CHARS)
            )?;
        }
        writeln!(out)?;
    }

    if result.courses_total > 0 {
        section(out, "DOCUMENTATION STATUS")?;
        writeln!(
            out,
            "  Courses with ILOs: {}/{} ({:.0}%) {}",
            result.courses_with_ilos,
            result.courses_total,
            result.documentation_score,
            documentation_icon(result.documentation_score)
        )?;
        if !result.courses_no_ilos.is_empty() {
            writeln!(out)?;
            writeln!(out, "  Courses missing ILOs:")?;
            for title in result.courses_no_ilos.iter().take(MAX_LISTED_COURSES) {
                writeln!(out, "    ❌ {title}")?;
            }
            if result.courses_no_ilos.len() > MAX_LISTED_COURSES {
                writeln!(
                    out,
                    "    ... and {} more",
                    result.courses_no_ilos.len() - MAX_LISTED_COURSES
                )?;
            }
        }
        writeln!(out)?;
    }

    section(out, "PILLAR COVERAGE")?;
    for pillar in Pillar::ALL {
        let score = result.pillar_coverage.get(pillar);
        writeln!(
            out,
            "  {pillar}: {} ({:.0}%)",
            pillar_icon(score),
            score * 100.0
        )?;
    }
    if !result.missing_pillars.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Missing/weak pillars:")?;
        for pillar in &result.missing_pillars {
            writeln!(out, "    ❌ {pillar}")?;
        }
    }
    writeln!(out)?;

    if !result.structure_issues.is_empty() {
        section(out, "STRUCTURE ISSUES")?;
        for issue in &result.structure_issues {
            writeln!(out, "  ⚠️  {issue}")?;
        }
        writeln!(out)?;
    }

    if !result.recommendations.is_empty() {
        section(out, "RECOMMENDATIONS")?;
        for (i, recommendation) in result.recommendations.iter().enumerate() {
            writeln!(out, "  {}. {recommendation}", i + 1)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{rule}")?;
    writeln!(out, "END OF REPORT")?;
    writeln!(out, "{rule}")
}

/// Urgency of an improvement action, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl Priority {
    fn icon(&self) -> &'static str {
        match self {
            Self::Critical => "🚨",
            Self::High => "⚠️",
            Self::Medium => "📋",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
        };
        f.write_str(name)
    }
}

/// One entry of the improvement plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImprovementAction {
    pub priority: Priority,
    pub action: String,
    pub effort: &'static str,
}

impl ImprovementAction {
    fn new(priority: Priority, action: impl Into<String>, effort: &'static str) -> Self {
        Self {
            priority,
            action: action.into(),
            effort,
        }
    }
}

/// Pillar score below which the plan asks for curriculum work
const PLAN_PILLAR_THRESHOLD: f64 = 0.5;

/// Prioritized actions derived from an analysis, most urgent first
pub fn improvement_actions(result: &GapAnalysisResult) -> Vec<ImprovementAction> {
    let mut actions = Vec::new();

    if result.ilo_count == 0 {
        actions.push(ImprovementAction::new(
            Priority::Critical,
            "Document Programme ILOs (5-6 covering K/S/A)",
            "2-4 weeks",
        ));
    } else {
        if result.ilo_weak_verb_count > 0 {
            actions.push(ImprovementAction::new(
                Priority::High,
                format!("Rewrite {} ILOs with weak verbs", result.ilo_weak_verb_count),
                "1-2 weeks",
            ));
        }
        if result.ilo_count > 8 {
            actions.push(ImprovementAction::new(
                Priority::Medium,
                format!("Consolidate {} ILOs to 5-6", result.ilo_count),
                "1-2 weeks",
            ));
        }
        for (present, dimension) in [
            (result.ilo_has_knowledge, "Knowledge"),
            (result.ilo_has_skills, "Skills"),
            (result.ilo_has_attitudes, "Attitudes"),
        ] {
            if !present {
                actions.push(ImprovementAction::new(
                    Priority::High,
                    format!("Add ILOs covering the {dimension} dimension"),
                    "1-2 weeks",
                ));
            }
        }
    }

    if result.pillar_coverage.get(Pillar::Ers) < PLAN_PILLAR_THRESHOLD {
        actions.push(ImprovementAction::new(
            Priority::Critical,
            "Integrate ERS content into curriculum",
            "1 semester",
        ));
    }
    if result.pillar_coverage.get(Pillar::International) < PLAN_PILLAR_THRESHOLD {
        actions.push(ImprovementAction::new(
            Priority::Medium,
            "Strengthen international dimension",
            "1-2 months",
        ));
    }
    if !result.programme.has_ilo_matrix {
        actions.push(ImprovementAction::new(
            Priority::Medium,
            "Build ILO mapping matrix (courses → programme → assessments)",
            "2-4 weeks",
        ));
    }

    actions.sort_by_key(|action| action.priority);
    actions
}

/// Render the prioritized improvement plan
pub fn format_improvement_report(result: &GapAnalysisResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_improvement_report(&mut out, result);
    out.truncate(out.trim_end_matches('\n').len());
    out
}

fn write_improvement_report(out: &mut String, result: &GapAnalysisResult) -> fmt::Result {
    let actions = improvement_actions(result);
    let rule = "=".repeat(PLAN_WIDTH);
    let thin = "-".repeat(PLAN_WIDTH);

    writeln!(out, "{rule}")?;
    writeln!(out, "IMPROVEMENT PLAN")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Programme: {}", result.programme.programme_name)?;
    writeln!(out, "Institution: {}", result.programme.institution)?;
    writeln!(out)?;
    writeln!(out, "Actions Required: {}", actions.len())?;
    writeln!(out, "Estimated Timeline: {} months", result.estimated_fix_months)?;
    writeln!(out)?;
    writeln!(out, "{thin}")?;
    writeln!(out, "PRIORITIZED ACTIONS")?;
    writeln!(out, "{thin}")?;

    for action in &actions {
        writeln!(
            out,
            "  {} [{}] {}",
            action.priority.icon(),
            action.priority,
            action.action
        )?;
        writeln!(out, "      Effort: {}", action.effort)?;
        writeln!(out)?;
    }
    if actions.is_empty() {
        writeln!(out, "  ✅ No major improvements needed!")?;
    }

    writeln!(out)?;
    writeln!(out, "{rule}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::sample_programme;
    use crate::gap::analyze_gaps;
    use crate::programme::{CourseData, ProgrammeData};

    fn empty_result() -> GapAnalysisResult {
        let programme = ProgrammeData::new("EXAMPLE", "Unknown Programme", "https://example.edu");
        analyze_gaps(&programme).unwrap()
    }

    #[test]
    fn test_status_bands() {
        assert!(status_label(100).contains("READY"));
        assert!(status_label(80).starts_with("🟢"));
        assert!(status_label(79).starts_with("🟡"));
        assert!(status_label(60).starts_with("🟡"));
        assert!(status_label(40).starts_with("🟠"));
        assert!(status_label(39).starts_with("🔴"));
    }

    #[test]
    fn test_report_is_byte_stable() {
        let result = analyze_gaps(&sample_programme()).unwrap();
        assert_eq!(format_gap_report(&result), format_gap_report(&result.clone()));
    }

    #[test]
    fn test_report_sections_in_order() {
        let result = analyze_gaps(&sample_programme()).unwrap();
        let report = format_gap_report(&result);

        let headings = [
            "PROGRAMME GAP ANALYSIS REPORT",
            "READINESS SCORE:",
            "INTENDED LEARNING OUTCOMES (ILOs)",
            "ILOs Found:",
            "DOCUMENTATION STATUS",
            "PILLAR COVERAGE",
            "END OF REPORT",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|heading| report.find(heading).unwrap_or_else(|| panic!("missing {heading}")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        assert!(report.starts_with(&"=".repeat(70)));
        assert!(report.ends_with(&"=".repeat(70)));
        assert!(report.contains("Programme: MSc in Business Administration - Finance"));
        assert!(report.contains("⚠️WEAK"));
    }

    #[test]
    fn test_empty_programme_report() {
        let report = format_gap_report(&empty_result());
        assert!(report.contains("READINESS SCORE: 0/100"));
        assert!(report.contains("🔴 NOT READY"));
        assert!(report.contains("  ❌ no ILOs found"));
        assert!(report.contains("  ERS: ❌ (0%)"));
        assert!(report.contains("  1. Integrate ethics and sustainability across curriculum"));
        assert!(!report.contains("DOCUMENTATION STATUS"));
        assert!(!report.contains("ILOs Found:"));
    }

    #[test]
    fn test_long_ilo_is_truncated() {
        let mut programme = ProgrammeData::new("EXAMPLE", "Programme", "https://example.edu");
        let long = format!("Apply {}", "quantitative methods ".repeat(10));
        programme
            .programme_ilos
            .push(crate::ilo::IloAnalyzer::new().analyze(&long, "en"));
        let report = format_gap_report(&analyze_gaps(&programme).unwrap());

        let expected: String = long.chars().take(80).collect();
        assert!(report.contains(&format!("    1. [Skill] {expected}...")));
    }

    #[test]
    fn test_course_list_is_capped() {
        let mut programme = ProgrammeData::new("EXAMPLE", "Programme", "https://example.edu");
        programme.courses = (0..13).map(|i| CourseData::new(format!("Course {i}"))).collect();
        let report = format_gap_report(&analyze_gaps(&programme).unwrap());

        assert!(report.contains("  Courses with ILOs: 0/13 (0%) ❌"));
        assert!(report.contains("    ❌ Course 9"));
        assert!(!report.contains("    ❌ Course 10"));
        assert!(report.contains("    ... and 3 more"));
    }

    #[test]
    fn test_improvement_actions_for_empty_programme() {
        let actions = improvement_actions(&empty_result());
        let summary: Vec<(Priority, &str)> = actions
            .iter()
            .map(|action| (action.priority, action.action.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Priority::Critical, "Document Programme ILOs (5-6 covering K/S/A)"),
                (Priority::Critical, "Integrate ERS content into curriculum"),
                (Priority::Medium, "Strengthen international dimension"),
                (Priority::Medium, "Build ILO mapping matrix (courses → programme → assessments)"),
            ]
        );
    }

    #[test]
    fn test_improvement_report_layout() {
        let result = analyze_gaps(&sample_programme()).unwrap();
        let report = format_improvement_report(&result);

        assert!(report.starts_with(&"=".repeat(60)));
        assert!(report.contains("PRIORITIZED ACTIONS"));
        assert!(report.contains("[HIGH] Rewrite 3 ILOs with weak verbs"));
        assert!(report.contains("[MEDIUM] Consolidate 9 ILOs to 5-6"));
        assert!(report.contains("      Effort: 1-2 weeks"));
        assert_eq!(report, format_improvement_report(&result));
    }
}
