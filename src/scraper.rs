//! # Programme Scraper
//!
//! Orchestrates one programme scrape: URL variant discovery, page fetching,
//! parsing, document harvesting, outcome deduplication and analysis, and
//! aggregation into a single `ProgrammeData`.
//!
//! Fetches may run concurrently, but results are consumed in URL-list order
//! so "first-seen" deduplication and "first non-empty title" are stable.
//! Per-URL and per-document failures are recorded as scrape notes; a scrape
//! always returns a best-effort record.

mod facts;
mod variants;

pub use facts::{
    ILO_MATRIX_TERMS, UNKNOWN_INSTITUTION, UNKNOWN_PROGRAMME, delivery_mode, derive_institution,
    derive_programme_name, duration_months, has_ilo_matrix, total_ects, truncate_chars,
};
pub use variants::{LANGUAGE_SWAPS, expand_urls, language_variants};

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rig::embeddings::EmbeddingModel;
use tracing::{debug, info, instrument, warn};

use crate::document::{DocumentExtractor, DocumentInput, Extraction};
use crate::fetcher::PageFetcher;
use crate::gap::PILLAR_MATCH_THRESHOLD;
use crate::ilo::{IloAnalyzer, harvest_outcome_sentences};
use crate::model::{EmbeddingService, GeminiEmbeddingModel};
use crate::parser::{CourseFragment, ParserRegistry};
use crate::pillar::SemanticCoverage;
use crate::programme::{CourseData, DegreeType, IloAnalysis, ProgrammeData, fold_text};

/// Configuration for programme scrapes
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Maximum number of fetches in flight
    pub concurrency: usize,

    /// Characters of concatenated HTML kept on the record
    pub max_raw_html_chars: usize,

    /// Characters of concatenated text kept on the record
    pub max_raw_text_chars: usize,

    /// Outcome candidates must be longer than this after trimming
    pub min_ilo_chars: usize,

    /// Language tag for outcomes harvested from documents
    pub document_language: String,

    /// Similarity at which an embedded outcome counts as matching a pillar
    pub pillar_match_threshold: f32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_raw_html_chars: 100_000,
            max_raw_text_chars: 50_000,
            min_ilo_chars: 20,
            document_language: "en".to_string(),
            pillar_match_threshold: PILLAR_MATCH_THRESHOLD as f32,
        }
    }
}

/// Builder for ScrapeConfig
#[derive(Debug, Default)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of concurrent fetches
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn max_raw_html_chars(mut self, max: usize) -> Self {
        self.config.max_raw_html_chars = max;
        self
    }

    pub fn max_raw_text_chars(mut self, max: usize) -> Self {
        self.config.max_raw_text_chars = max;
        self
    }

    /// Drop outcome candidates of at most this many characters
    pub fn min_ilo_chars(mut self, min: usize) -> Self {
        self.config.min_ilo_chars = min;
        self
    }

    pub fn pillar_match_threshold(mut self, threshold: f32) -> Self {
        self.config.pillar_match_threshold = threshold;
        self
    }

    pub fn document_language(mut self, language: impl Into<String>) -> Self {
        self.config.document_language = language.into();
        self
    }

    pub fn build(self) -> ScrapeConfig {
        self.config
    }
}

impl ScrapeConfig {
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::new()
    }
}

/// Inputs for one programme scrape
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
    pub institution: Option<String>,
    pub programme_name: Option<String>,
    pub documents: Vec<DocumentInput>,
    pub follow_variants: bool,
}

impl ScrapeRequest {
    /// Request for `urls`, following language variants
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            institution: None,
            programme_name: None,
            documents: Vec::new(),
            follow_variants: true,
        }
    }

    pub fn institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    pub fn programme_name(mut self, programme_name: impl Into<String>) -> Self {
        self.programme_name = Some(programme_name.into());
        self
    }

    pub fn document(mut self, document: DocumentInput) -> Self {
        self.documents.push(document);
        self
    }

    pub fn follow_variants(mut self, follow: bool) -> Self {
        self.follow_variants = follow;
        self
    }
}

/// Shared flag that stops a scrape from issuing further fetches
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome candidate with the language of its source
struct Candidate {
    text: String,
    language: String,
}

/// Everything gathered from pages and documents before analysis
#[derive(Default)]
struct Accumulator {
    title: String,
    candidates: Vec<Candidate>,
    courses: Vec<(CourseFragment, String)>,
    aims: Vec<String>,
    languages: Vec<String>,
    html: String,
    text: String,
    urls_scraped: Vec<String>,
    notes: Vec<String>,
}

impl Accumulator {
    fn add_language(&mut self, language: &str) {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_string());
        }
    }

    fn append_text(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

/// Scrapes programme pages and documents into a `ProgrammeData`
pub struct ProgrammeScraper<F, E = GeminiEmbeddingModel> {
    fetcher: F,
    registry: ParserRegistry,
    analyzer: IloAnalyzer,
    extractor: DocumentExtractor,
    embeddings: Option<EmbeddingService<E>>,
    config: ScrapeConfig,
    cancel: CancelHandle,
}

impl<F: PageFetcher> ProgrammeScraper<F> {
    /// Scraper with the default parsers and no embeddings
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            registry: ParserRegistry::default(),
            analyzer: IloAnalyzer::new(),
            extractor: DocumentExtractor::new(),
            embeddings: None,
            config: ScrapeConfig::default(),
            cancel: CancelHandle::new(),
        }
    }
}

impl<F, E> ProgrammeScraper<F, E>
where
    F: PageFetcher,
    E: EmbeddingModel,
{
    /// Attach an embedding service for outcome and course embeddings
    pub fn with_embeddings<E2: EmbeddingModel>(
        self,
        service: EmbeddingService<E2>,
    ) -> ProgrammeScraper<F, E2> {
        ProgrammeScraper {
            fetcher: self.fetcher,
            registry: self.registry,
            analyzer: self.analyzer,
            extractor: self.extractor,
            embeddings: Some(service),
            config: self.config,
            cancel: self.cancel,
        }
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: ScrapeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that stops this scraper issuing further fetches
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scrape one programme. Never fails: errors become scrape notes.
    #[instrument(skip(self, request), fields(urls = request.urls.len(), documents = request.documents.len()))]
    pub async fn scrape_programme(&self, request: ScrapeRequest) -> ProgrammeData {
        let primary_url = request.urls.first().cloned().unwrap_or_default();
        let urls = if request.follow_variants {
            expand_urls(&request.urls)
        } else {
            dedupe(&request.urls)
        };
        let requested: HashSet<&str> = request.urls.iter().map(String::as_str).collect();
        info!("Scraping {} URLs ({} requested)", urls.len(), request.urls.len());

        let mut acc = Accumulator::default();
        self.collect_pages(&urls, &requested, &mut acc).await;
        self.collect_documents(&request.documents, &mut acc);

        let mut programme = ProgrammeData::new(
            request
                .institution
                .or_else(|| derive_institution(&primary_url))
                .unwrap_or_else(|| UNKNOWN_INSTITUTION.to_string()),
            request
                .programme_name
                .or_else(|| derive_programme_name(&acc.title))
                .unwrap_or_else(|| UNKNOWN_PROGRAMME.to_string()),
            primary_url,
        );

        programme.programme_ilos = self.analyze_candidates(&acc.candidates);
        programme.courses = merge_courses(&acc.courses);
        programme.degree_type = DegreeType::infer(&programme.programme_name);
        programme.total_ects = total_ects(&acc.text);
        programme.duration_months = duration_months(&acc.text);
        programme.delivery_mode = delivery_mode(&acc.text);
        programme.has_ilo_matrix = has_ilo_matrix(&acc.text);
        programme.raw_html = truncate_chars(&acc.html, self.config.max_raw_html_chars);
        programme.raw_text = truncate_chars(&acc.text, self.config.max_raw_text_chars);
        programme.languages_of_instruction = acc.languages;
        programme.urls_scraped = acc.urls_scraped;
        programme.programme_aims = acc.aims;
        programme.scrape_notes = acc.notes;
        programme.scraped_at = Utc::now();

        if let Some(service) = &self.embeddings {
            self.embed_programme(service, &mut programme).await;
        }

        info!(
            "Scraped {}: {} ILOs, {} courses from {} pages",
            programme.programme_name,
            programme.programme_ilos.len(),
            programme.courses.len(),
            programme.urls_scraped.len()
        );
        programme
    }

    async fn collect_pages(&self, urls: &[String], requested: &HashSet<&str>, acc: &mut Accumulator) {
        let fetcher = &self.fetcher;
        let cancel = &self.cancel;

        let outcomes: Vec<_> = stream::iter(urls)
            .map(|url| async move {
                if cancel.is_cancelled() {
                    return (url, None);
                }
                (url, Some(fetcher.fetch(url).await))
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut skipped = 0;
        for (url, outcome) in outcomes {
            match outcome {
                None => skipped += 1,
                Some(Err(e)) if requested.contains(url.as_str()) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    acc.notes.push(format!("Failed to fetch {url}: {e}"));
                }
                Some(Err(e)) => debug!("Variant {} unavailable: {}", url, e),
                Some(Ok(page)) => {
                    let parser = self.registry.parser_for(url);
                    debug!("Parsing {} with {} parser", url, parser.name());
                    let parsed = parser.parse(&page.html, url);

                    if acc.title.is_empty() && !parsed.title.trim().is_empty() {
                        acc.title = parsed.title.trim().to_string();
                    }
                    acc.add_language(&parsed.language);
                    acc.candidates.extend(parsed.ilos.into_iter().map(|text| Candidate {
                        text,
                        language: parsed.language.clone(),
                    }));
                    acc.courses.extend(
                        parsed
                            .courses
                            .into_iter()
                            .map(|course| (course, parsed.language.clone())),
                    );
                    for aim in parsed.aims {
                        if !acc.aims.contains(&aim) {
                            acc.aims.push(aim);
                        }
                    }
                    acc.append_text(&parsed.text);
                    acc.html.push_str(&page.html);
                    acc.urls_scraped.push(url.clone());
                }
            }
        }

        if skipped > 0 {
            info!("Scrape cancelled, {} URLs not fetched", skipped);
            acc.notes.push(format!("Scrape cancelled: {skipped} URLs not fetched"));
        }
    }

    fn collect_documents(&self, documents: &[DocumentInput], acc: &mut Accumulator) {
        for document in documents {
            match self.extractor.extract_document(document) {
                Extraction::Text(text) => {
                    let harvested = harvest_outcome_sentences(&text);
                    debug!("Harvested {} outcome sentences from {}", harvested.len(), document.filename);
                    acc.candidates.extend(harvested.into_iter().map(|text| Candidate {
                        text,
                        language: self.config.document_language.clone(),
                    }));
                    acc.append_text(&text);
                }
                Extraction::Unsupported(reason) | Extraction::Failed(reason) => {
                    warn!("Skipping document {}: {}", document.filename, reason);
                    acc.notes.push(format!("Skipped document {}: {reason}", document.filename));
                }
            }
        }
    }

    /// Deduplicate candidates by folded text and analyze survivors in order
    fn analyze_candidates(&self, candidates: &[Candidate]) -> Vec<IloAnalysis> {
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter(|candidate| candidate.text.trim().chars().count() > self.config.min_ilo_chars)
            .filter(|candidate| seen.insert(fold_text(&candidate.text)))
            .map(|candidate| self.analyzer.analyze(candidate.text.trim(), &candidate.language))
            .collect()
    }

    /// Attach embeddings and pillar matches. Failures are logged and skipped.
    async fn embed_programme(&self, service: &EmbeddingService<E>, programme: &mut ProgrammeData) {
        let pillars = match SemanticCoverage::from_service(service).await {
            Ok(pillars) => Some(pillars),
            Err(e) => {
                warn!("Pillar embeddings unavailable: {}", e);
                None
            }
        };
        let threshold = self.config.pillar_match_threshold;

        for ilo in &mut programme.programme_ilos {
            match service.embed_text(&ilo.text).await {
                Ok(vector) => {
                    if let Some(pillars) = &pillars {
                        let (matched, best) = pillars.match_pillars(&vector, threshold);
                        ilo.matched_pillars = matched;
                        ilo.best_match_score = best;
                    }
                    ilo.embedding = Some(vector);
                }
                Err(e) => warn!("Embedding failed for ILO: {}", e),
            }
        }

        for course in &mut programme.courses {
            let text = match &course.description {
                Some(description) => format!("{}. {}", course.title, description),
                None => course.title.clone(),
            };
            match service.embed_text(&text).await {
                Ok(vector) => {
                    if let Some(pillars) = &pillars {
                        course.matched_pillars = pillars.match_pillars(&vector, threshold).0;
                    }
                    course.embedding = Some(vector);
                }
                Err(e) => warn!("Embedding failed for course {}: {}", course.title, e),
            }
        }
    }
}

fn dedupe(urls: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for url in urls {
        if !unique.contains(url) {
            unique.push(url.clone());
        }
    }
    unique
}

/// Merge course fragments by folded title, first occurrence wins
fn merge_courses(fragments: &[(CourseFragment, String)]) -> Vec<CourseData> {
    let mut courses: Vec<CourseData> = Vec::new();
    for (fragment, language) in fragments {
        let key = fold_text(&fragment.title);
        if let Some(existing) = courses.iter_mut().find(|c| fold_text(&c.title) == key) {
            if existing.ects.is_none() {
                existing.ects = fragment.ects;
            }
            if existing.course_ilos.is_empty() {
                existing.course_ilos = fragment.outcomes.clone();
            }
            continue;
        }

        let mut course = CourseData::new(fragment.title.clone()).with_ilos(fragment.outcomes.clone());
        course.ects = fragment.ects;
        course.source_language = language.clone();
        courses.push(course);
    }
    courses
}
