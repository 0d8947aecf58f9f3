//! Eligibility gates.
//!
//! Ten gates, `ELG-1` to `ELG-10`. Only the business focus, degree and
//! learning-outcome gates can be judged from scraped data; the rest stay
//! `unknown` unless evidence is supplied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::programme::ProgrammeData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GateId {
    #[serde(rename = "ELG-1")]
    Elg1,
    #[serde(rename = "ELG-2")]
    Elg2,
    #[serde(rename = "ELG-3")]
    Elg3,
    #[serde(rename = "ELG-4")]
    Elg4,
    #[serde(rename = "ELG-5")]
    Elg5,
    #[serde(rename = "ELG-6")]
    Elg6,
    #[serde(rename = "ELG-7")]
    Elg7,
    #[serde(rename = "ELG-8")]
    Elg8,
    #[serde(rename = "ELG-9")]
    Elg9,
    #[serde(rename = "ELG-10")]
    Elg10,
}

impl GateId {
    pub const ALL: [GateId; 10] = [
        GateId::Elg1,
        GateId::Elg2,
        GateId::Elg3,
        GateId::Elg4,
        GateId::Elg5,
        GateId::Elg6,
        GateId::Elg7,
        GateId::Elg8,
        GateId::Elg9,
        GateId::Elg10,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Elg1 => "ELG-1",
            Self::Elg2 => "ELG-2",
            Self::Elg3 => "ELG-3",
            Self::Elg4 => "ELG-4",
            Self::Elg5 => "ELG-5",
            Self::Elg6 => "ELG-6",
            Self::Elg7 => "ELG-7",
            Self::Elg8 => "ELG-8",
            Self::Elg9 => "ELG-9",
            Self::Elg10 => "ELG-10",
        }
    }

    /// What the gate requires
    pub fn requirement(&self) -> &'static str {
        match self {
            Self::Elg1 => "Programme in business and management",
            Self::Elg2 => "Recognised degree award",
            Self::Elg3 => "At least two graduated cohorts",
            Self::Elg4 => "Programme learning outcomes defined",
            Self::Elg5 => "Quality assurance system in place",
            Self::Elg6 => "Qualified and sufficient faculty",
            Self::Elg7 => "Student services and support",
            Self::Elg8 => "Adequate resources and facilities",
            Self::Elg9 => "Programme governance and ownership",
            Self::Elg10 => "Financial sustainability",
        }
    }

    /// Whether the status can be overridden by supplied evidence
    pub fn accepts_evidence(&self) -> bool {
        !matches!(self, Self::Elg4)
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|gate| gate.code() == normalized)
            .ok_or_else(|| format!("unknown gate: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    Fail,
    Partial,
    Unknown,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for GateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "partial" => Ok(Self::Partial),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown gate status: {other}")),
        }
    }
}

/// Status for each of the ten gates
pub type EligibilityGates = BTreeMap<GateId, GateStatus>;

/// Evaluate all gates. `evidence` overrides every gate except ELG-4.
pub fn evaluate_gates(
    programme: &ProgrammeData,
    min_ilos: usize,
    evidence: &BTreeMap<GateId, GateStatus>,
) -> EligibilityGates {
    let ilo_count = programme.programme_ilos.len();

    GateId::ALL
        .into_iter()
        .map(|gate| {
            let derived = match gate {
                GateId::Elg1 => GateStatus::Pass,
                GateId::Elg2 if programme.degree_type.is_some() => GateStatus::Pass,
                GateId::Elg4 if ilo_count == 0 => GateStatus::Fail,
                GateId::Elg4 if ilo_count >= min_ilos => GateStatus::Pass,
                GateId::Elg4 => GateStatus::Partial,
                _ => GateStatus::Unknown,
            };
            let status = match evidence.get(&gate) {
                Some(status) if gate.accepts_evidence() => *status,
                _ => derived,
            };
            (gate, status)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programme::{DegreeType, IloAnalysis};

    fn programme_with_ilos(count: usize) -> ProgrammeData {
        let mut programme = ProgrammeData::new("TEST", "Programme", "https://example.edu");
        for i in 0..count {
            programme
                .programme_ilos
                .push(IloAnalysis::new(format!("Outcome number {i} for the programme"), "en"));
        }
        programme
    }

    #[test]
    fn test_learning_outcome_gate() {
        let none = BTreeMap::new();
        assert_eq!(evaluate_gates(&programme_with_ilos(0), 5, &none)[&GateId::Elg4], GateStatus::Fail);
        assert_eq!(evaluate_gates(&programme_with_ilos(3), 5, &none)[&GateId::Elg4], GateStatus::Partial);
        assert_eq!(evaluate_gates(&programme_with_ilos(5), 5, &none)[&GateId::Elg4], GateStatus::Pass);
    }

    #[test]
    fn test_default_gates() {
        let mut programme = programme_with_ilos(0);
        let gates = evaluate_gates(&programme, 5, &BTreeMap::new());
        assert_eq!(gates.len(), 10);
        assert_eq!(gates[&GateId::Elg1], GateStatus::Pass);
        assert_eq!(gates[&GateId::Elg2], GateStatus::Unknown);
        assert_eq!(gates[&GateId::Elg10], GateStatus::Unknown);

        programme.degree_type = Some(DegreeType::Msc);
        let gates = evaluate_gates(&programme, 5, &BTreeMap::new());
        assert_eq!(gates[&GateId::Elg2], GateStatus::Pass);
    }

    #[test]
    fn test_evidence_overrides_except_outcome_gate() {
        let evidence = BTreeMap::from([
            (GateId::Elg5, GateStatus::Pass),
            (GateId::Elg4, GateStatus::Pass),
        ]);
        let gates = evaluate_gates(&programme_with_ilos(0), 5, &evidence);
        assert_eq!(gates[&GateId::Elg5], GateStatus::Pass);
        assert_eq!(gates[&GateId::Elg4], GateStatus::Fail);
    }

    #[test]
    fn test_parse_gate_and_status() {
        assert_eq!("elg-10".parse::<GateId>(), Ok(GateId::Elg10));
        assert!("ELG-11".parse::<GateId>().is_err());
        assert_eq!("Partial".parse::<GateStatus>(), Ok(GateStatus::Partial));
        assert_eq!(serde_json::to_string(&GateId::Elg3).unwrap(), "\"ELG-3\"");
        assert_eq!(serde_json::to_string(&GateStatus::Unknown).unwrap(), "\"unknown\"");
    }
}
