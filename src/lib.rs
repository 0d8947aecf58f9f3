//! # readiness - Programme Gap Analysis for Accreditation Reviews
//!
//! This crate assesses how ready a university programme is for an accreditation
//! review. It scrapes programme pages and documents, extracts intended learning
//! outcomes (ILOs), classifies them against a Knowledge/Skill/Attitude taxonomy
//! and scores the result against a fixed rubric of quality pillars.
//!
//! ## Pipeline
//!
//! - `fetcher`: bounded-timeout HTTP retrieval of programme pages
//! - `document`: PDF/DOCX/TXT text extraction for uploaded documents
//! - `parser`: site-aware HTML parsers behind an ordered registry
//! - `ilo`: multilingual ILO classification and quality checks
//! - `model`: optional embedding capability backed by `rig`
//! - `scraper`: orchestration into a single `ProgrammeData` aggregate
//! - `pillar` / `gap`: pillar coverage, readiness score and eligibility gates
//! - `report`: fixed-layout plain-text reports
//! - `storage`: page archive and analysis history
//!
//! ## Example
//!
//! ```rust,no_run
//! use readiness::fetcher::HttpFetcher;
//! use readiness::gap::GapAnalyzer;
//! use readiness::report::format_gap_report;
//! use readiness::scraper::{ProgrammeScraper, ScrapeRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scraper = ProgrammeScraper::new(HttpFetcher::new()?);
//!     let request = ScrapeRequest::new(["https://www.uia.no/en/studieplaner/programme/MAOKOam"]);
//!     let programme = scraper.scrape_programme(request).await;
//!
//!     let result = GapAnalyzer::default().analyze_gaps(&programme)?;
//!     println!("{}", format_gap_report(&result));
//!     Ok(())
//! }
//! ```

mod error;

pub mod demo;
pub mod document;
pub mod fetcher;
pub mod gap;
pub mod ilo;
pub mod model;
pub mod parser;
pub mod pillar;
pub mod programme;
pub mod report;
pub mod scraper;
pub mod storage;

pub use error::{Error, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::gap::{GapAnalysisResult, GapAnalyzer};
    pub use crate::programme::{CourseData, DegreeType, IloAnalysis, KsaCategory, ProgrammeData};
    pub use crate::scraper::{ProgrammeScraper, ScrapeRequest};
}
