//! # Pillar Coverage
//!
//! Scores how strongly a programme covers each of the four quality pillars:
//! International, Practice, ERS (ethics, responsibility, sustainability) and
//! Digital. Scores are in `[0, 1]`.
//!
//! Two strategies share the `CoverageStrategy` seam:
//!
//! - `KeywordCoverage`: counts pillar keywords in the programme's aggregated
//!   text; three distinct keyword hits saturate a pillar
//! - `SemanticCoverage`: compares stored ILO and course embeddings with
//!   pillar description vectors, falling back to keywords when the programme
//!   carries no embeddings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::Result;
use crate::model::{EmbeddingService, cosine_similarity};
use crate::programme::ProgrammeData;
use rig::embeddings::EmbeddingModel;

/// Quality pillar, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pillar {
    International,
    Practice,
    #[serde(rename = "ERS")]
    Ers,
    Digital,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [
        Pillar::International,
        Pillar::Practice,
        Pillar::Ers,
        Pillar::Digital,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::International => "International",
            Self::Practice => "Practice",
            Self::Ers => "ERS",
            Self::Digital => "Digital",
        }
    }

    /// Lower-case keywords counted by `KeywordCoverage`
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::International => &[
                "international", "global", "cross-cultural", "worldwide", "foreign", "abroad",
                "exchange", "intercultural",
            ],
            Self::Practice => &[
                "practical", "industry", "corporate", "business", "real-world", "case study",
                "internship", "project", "consultancy",
            ],
            Self::Ers => &[
                "ethics", "ethical", "responsibility", "sustainable", "sustainability", "csr",
                "governance", "esg", "stakeholder",
            ],
            // "ai" is a plain substring and also hits words like "maintain"
            Self::Digital => &[
                "digital", "technology", "data", "analytics", "ai", "artificial intelligence",
                "software", "fintech",
            ],
        }
    }

    /// Description embedded to build the pillar's reference vector
    pub fn description(&self) -> &'static str {
        match self {
            Self::International => {
                "International and global perspectives, cross-cultural management, student exchange and intercultural competence"
            }
            Self::Practice => {
                "Connection to business practice through industry projects, case studies, internships and corporate partnerships"
            }
            Self::Ers => {
                "Ethics, corporate responsibility and sustainability, including governance, ESG and stakeholder management"
            }
            Self::Digital => {
                "Digital transformation, data analytics, artificial intelligence, software and financial technology"
            }
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-pillar coverage scores in `[0, 1]`, ordered by pillar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PillarCoverage(BTreeMap<Pillar, f64>);

impl PillarCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score, clamped to `[0, 1]`
    pub fn insert(&mut self, pillar: Pillar, score: f64) {
        self.0.insert(pillar, score.clamp(0.0, 1.0));
    }

    /// Score for `pillar`, 0.0 when absent
    pub fn get(&self, pillar: Pillar) -> f64 {
        self.0.get(&pillar).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pillar, f64)> + '_ {
        self.0.iter().map(|(pillar, score)| (*pillar, *score))
    }

    /// Pillars scoring below `threshold`, in pillar order
    pub fn missing(&self, threshold: f64) -> Vec<Pillar> {
        Pillar::ALL
            .into_iter()
            .filter(|pillar| self.get(*pillar) < threshold)
            .collect()
    }
}

impl FromIterator<(Pillar, f64)> for PillarCoverage {
    fn from_iter<I: IntoIterator<Item = (Pillar, f64)>>(iter: I) -> Self {
        let mut coverage = Self::new();
        for (pillar, score) in iter {
            coverage.insert(pillar, score);
        }
        coverage
    }
}

/// A way of scoring pillar coverage for a programme
pub trait CoverageStrategy: Send + Sync {
    /// Short method name recorded with the analysis
    fn name(&self) -> &'static str;

    /// Score every pillar
    fn coverage(&self, programme: &ProgrammeData) -> PillarCoverage;
}

/// Keyword-count coverage over the programme's aggregated text
#[derive(Debug, Clone)]
pub struct KeywordCoverage {
    /// Characters of raw text included after the structured fields
    pub text_prefix_chars: usize,

    /// Distinct keyword hits that give a score of 1.0
    pub saturation: usize,
}

impl Default for KeywordCoverage {
    fn default() -> Self {
        Self {
            text_prefix_chars: 10_000,
            saturation: 3,
        }
    }
}

impl KeywordCoverage {
    /// Lower-cased text searched for keywords: name, ILOs, aims, course
    /// titles, then a prefix of the raw text
    pub fn coverage_text(&self, programme: &ProgrammeData) -> String {
        let mut parts: Vec<&str> = vec![&programme.programme_name];
        parts.extend(programme.programme_ilos.iter().map(|ilo| ilo.text.as_str()));
        parts.extend(programme.programme_aims.iter().map(String::as_str));
        parts.extend(programme.courses.iter().map(|course| course.title.as_str()));

        let prefix: String = programme.raw_text.chars().take(self.text_prefix_chars).collect();
        parts.push(&prefix);

        parts.join(" ").to_lowercase()
    }

    /// Number of the pillar's keywords present in `text`
    pub fn keyword_hits(pillar: Pillar, text: &str) -> usize {
        pillar
            .keywords()
            .iter()
            .filter(|keyword| text.contains(*keyword))
            .count()
    }
}

impl CoverageStrategy for KeywordCoverage {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn coverage(&self, programme: &ProgrammeData) -> PillarCoverage {
        let text = self.coverage_text(programme);
        let saturation = self.saturation.max(1) as f64;

        Pillar::ALL
            .into_iter()
            .map(|pillar| {
                let hits = Self::keyword_hits(pillar, &text);
                (pillar, (hits as f64 / saturation).min(1.0))
            })
            .collect()
    }
}

/// Embedding-similarity coverage against pillar description vectors
#[derive(Debug, Clone)]
pub struct SemanticCoverage {
    pillar_vectors: Vec<(Pillar, Vec<f32>)>,
    fallback: KeywordCoverage,
}

impl SemanticCoverage {
    /// Build from precomputed pillar vectors
    pub fn new(pillar_vectors: Vec<(Pillar, Vec<f32>)>) -> Self {
        Self {
            pillar_vectors,
            fallback: KeywordCoverage::default(),
        }
    }

    /// Embed every pillar description with `service`
    pub async fn from_service<E: EmbeddingModel>(service: &EmbeddingService<E>) -> Result<Self> {
        let descriptions = Pillar::ALL
            .iter()
            .map(|pillar| pillar.description().to_string())
            .collect();
        let vectors = service.embed_batch(descriptions).await?;
        Ok(Self::new(Pillar::ALL.into_iter().zip(vectors).collect()))
    }

    /// Similarity of `embedding` to each pillar, in pillar order
    pub fn similarities(&self, embedding: &[f32]) -> Vec<(Pillar, f32)> {
        self.pillar_vectors
            .iter()
            .map(|(pillar, vector)| (*pillar, cosine_similarity(embedding, vector)))
            .collect()
    }

    /// Pillars at or above `threshold` and the best similarity seen
    pub fn match_pillars(&self, embedding: &[f32], threshold: f32) -> (Vec<Pillar>, f32) {
        let similarities = self.similarities(embedding);
        let best = similarities
            .iter()
            .map(|(_, score)| *score)
            .fold(0.0_f32, f32::max);
        let matched = similarities
            .into_iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(pillar, _)| pillar)
            .collect();
        (matched, best)
    }
}

impl CoverageStrategy for SemanticCoverage {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn coverage(&self, programme: &ProgrammeData) -> PillarCoverage {
        let embeddings: Vec<&Vec<f32>> = programme
            .programme_ilos
            .iter()
            .filter_map(|ilo| ilo.embedding.as_ref())
            .chain(programme.courses.iter().filter_map(|course| course.embedding.as_ref()))
            .collect();

        if embeddings.is_empty() || self.pillar_vectors.is_empty() {
            debug!("No embeddings available, using keyword coverage");
            return self.fallback.coverage(programme);
        }

        Pillar::ALL
            .into_iter()
            .map(|pillar| {
                let best = self
                    .pillar_vectors
                    .iter()
                    .filter(|(p, _)| *p == pillar)
                    .flat_map(|(_, vector)| {
                        embeddings.iter().map(move |e| cosine_similarity(e, vector))
                    })
                    .fold(0.0_f32, f32::max);
                (pillar, f64::from(best))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programme::IloAnalysis;

    fn programme_with_text(raw_text: &str) -> ProgrammeData {
        let mut programme = ProgrammeData::new("TEST", "Programme", "https://example.edu");
        programme.raw_text = raw_text.to_string();
        programme
    }

    #[test]
    fn test_keyword_saturation() {
        let programme = programme_with_text("ethics responsibility sustainability");
        let coverage = KeywordCoverage::default().coverage(&programme);
        assert_eq!(coverage.get(Pillar::Ers), 1.0);

        let programme = programme_with_text("we teach ethics");
        let coverage = KeywordCoverage::default().coverage(&programme);
        assert!((coverage.get(Pillar::Ers) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(coverage.get(Pillar::International), 0.0);
    }

    #[test]
    fn test_keyword_text_includes_structured_fields() {
        let mut programme = programme_with_text("");
        programme.programme_ilos.push(IloAnalysis::new("Lead international teams", "en"));
        programme.programme_aims.push("A global outlook".to_string());
        programme.courses.push(crate::programme::CourseData::new("Cross-cultural Management"));

        let coverage = KeywordCoverage::default().coverage(&programme);
        assert_eq!(coverage.get(Pillar::International), 1.0);
    }

    #[test]
    fn test_keyword_prefix_limit() {
        let raw = format!("{} ethics ethical esg", "x".repeat(50));
        let programme = programme_with_text(&raw);
        let strategy = KeywordCoverage {
            text_prefix_chars: 40,
            saturation: 3,
        };
        assert_eq!(strategy.coverage(&programme).get(Pillar::Ers), 0.0);
    }

    #[test]
    fn test_missing_pillars_in_order() {
        let coverage: PillarCoverage = [
            (Pillar::International, 0.2),
            (Pillar::Practice, 0.9),
            (Pillar::Ers, 0.55),
            (Pillar::Digital, 0.1),
        ]
        .into_iter()
        .collect();
        assert_eq!(coverage.missing(0.55), vec![Pillar::International, Pillar::Digital]);
    }

    #[test]
    fn test_coverage_serializes_with_pillar_names() {
        let coverage: PillarCoverage = [(Pillar::Ers, 1.0)].into_iter().collect();
        let json = serde_json::to_string(&coverage).unwrap();
        assert_eq!(json, r#"{"ERS":1.0}"#);
    }

    #[test]
    fn test_semantic_coverage_uses_embeddings() {
        let semantic = SemanticCoverage::new(vec![
            (Pillar::International, vec![1.0, 0.0, 0.0, 0.0]),
            (Pillar::Practice, vec![0.0, 1.0, 0.0, 0.0]),
            (Pillar::Ers, vec![0.0, 0.0, 1.0, 0.0]),
            (Pillar::Digital, vec![0.0, 0.0, 0.0, 1.0]),
        ]);
        let mut programme = programme_with_text("");
        let mut ilo = IloAnalysis::new("Act ethically", "en");
        ilo.embedding = Some(vec![0.0, 0.0, 1.0, 0.0]);
        programme.programme_ilos.push(ilo);

        let coverage = semantic.coverage(&programme);
        assert_eq!(semantic.name(), "semantic");
        assert!((coverage.get(Pillar::Ers) - 1.0).abs() < 1e-6);
        assert_eq!(coverage.get(Pillar::Digital), 0.0);

        let (matched, best) = semantic.match_pillars(&[0.0, 0.0, 1.0, 0.0], 0.55);
        assert_eq!(matched, vec![Pillar::Ers]);
        assert!((best - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_semantic_falls_back_without_embeddings() {
        let semantic = SemanticCoverage::new(vec![(Pillar::Ers, vec![1.0])]);
        let programme = programme_with_text("ethics governance esg");
        assert_eq!(semantic.coverage(&programme).get(Pillar::Ers), 1.0);
    }

    #[tokio::test]
    async fn test_semantic_from_service() {
        use crate::model::mock_model::MockEmbeddingModel;

        let model = MockEmbeddingModel::new(2);
        model.set_vector("ethics", vec![0.0, 1.0]).await;
        let service = EmbeddingService::new(model);

        let semantic = SemanticCoverage::from_service(&service).await.unwrap();
        let similarities = semantic.similarities(&[0.0, 1.0]);
        assert_eq!(similarities.len(), 4);
        assert_eq!(similarities[2], (Pillar::Ers, 1.0));
    }
}
