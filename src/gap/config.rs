//! Scoring constants and configuration for the gap analysis

use std::ops::RangeInclusive;

/// Pillars scoring below this are missing
pub const PILLAR_MATCH_THRESHOLD: f64 = 0.55;

/// Pillars at or above this are reported as strong
pub const STRONG_MATCH_THRESHOLD: f64 = 0.70;

/// Minimum readiness score for eligibility
pub const ELIGIBILITY_MIN_SCORE: i32 = 70;

/// Course documentation below this percentage is a structural issue
pub const DOCUMENTATION_MIN_PERCENT: f64 = 80.0;

/// Recommended number of programme ILOs
pub const ILO_COUNT_RANGE: RangeInclusive<usize> = 5..=8;

/// ILOs needed to pass the learning outcomes gate
pub const GATE_MIN_ILOS: usize = 5;

pub const NO_ILOS_PENALTY: i32 = 20;
pub const MISSING_ERS_PENALTY: i32 = 20;
pub const MISSING_DIMENSION_PENALTY: i32 = 10;
pub const MISSING_PILLAR_PENALTY: i32 = 5;
pub const STRUCTURE_ISSUE_PENALTY: i32 = 5;
pub const ILO_ISSUE_PENALTY: i32 = 3;

/// (minimum score, months to fix), checked in order
pub const FIX_MONTH_BANDS: [(i32, u32); 3] = [(80, 1), (60, 3), (40, 6)];
pub const FALLBACK_FIX_MONTHS: u32 = 12;

/// Version tag recorded on every analysis
pub const ANALYZER_VERSION: &str = "2.0";

/// Thresholds and penalty weights used by `GapAnalyzer`
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub pillar_match_threshold: f64,
    pub eligibility_min_score: i32,
    pub documentation_min_percent: f64,
    pub ilo_count_range: RangeInclusive<usize>,
    pub gate_min_ilos: usize,
    pub no_ilos_penalty: i32,
    pub missing_ers_penalty: i32,
    pub missing_dimension_penalty: i32,
    pub missing_pillar_penalty: i32,
    pub structure_issue_penalty: i32,
    pub ilo_issue_penalty: i32,
    pub fix_month_bands: Vec<(i32, u32)>,
    pub fallback_fix_months: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pillar_match_threshold: PILLAR_MATCH_THRESHOLD,
            eligibility_min_score: ELIGIBILITY_MIN_SCORE,
            documentation_min_percent: DOCUMENTATION_MIN_PERCENT,
            ilo_count_range: ILO_COUNT_RANGE,
            gate_min_ilos: GATE_MIN_ILOS,
            no_ilos_penalty: NO_ILOS_PENALTY,
            missing_ers_penalty: MISSING_ERS_PENALTY,
            missing_dimension_penalty: MISSING_DIMENSION_PENALTY,
            missing_pillar_penalty: MISSING_PILLAR_PENALTY,
            structure_issue_penalty: STRUCTURE_ISSUE_PENALTY,
            ilo_issue_penalty: ILO_ISSUE_PENALTY,
            fix_month_bands: FIX_MONTH_BANDS.to_vec(),
            fallback_fix_months: FALLBACK_FIX_MONTHS,
        }
    }
}

impl ScoringConfig {
    /// Months to fix for a readiness score
    pub fn fix_months(&self, score: i32) -> u32 {
        self.fix_month_bands
            .iter()
            .find(|(min_score, _)| score >= *min_score)
            .map(|(_, months)| *months)
            .unwrap_or(self.fallback_fix_months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_month_bands() {
        let config = ScoringConfig::default();
        assert_eq!(config.fix_months(100), 1);
        assert_eq!(config.fix_months(80), 1);
        assert_eq!(config.fix_months(79), 3);
        assert_eq!(config.fix_months(60), 3);
        assert_eq!(config.fix_months(40), 6);
        assert_eq!(config.fix_months(39), 12);
        assert_eq!(config.fix_months(0), 12);
    }
}
