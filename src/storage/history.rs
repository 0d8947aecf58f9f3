//! Append-only analysis history as JSON documents

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::{Result, StorageError};
use crate::gap::GapAnalysisResult;
use crate::programme::ProgrammeData;

pub const DEFAULT_STORE_PATH: &str = ".readiness/analyses";

const PROGRAMME_FILE: &str = "programme.json";
const ANALYSES_DIR: &str = "analyses";

/// Stable id for a programme: a slug of institution and programme name
pub fn programme_id(institution: &str, programme_name: &str) -> String {
    let mut slug = String::new();
    for c in format!("{institution} {programme_name}").chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Stores `<base>/<id>/programme.json` and `<base>/<id>/analyses/*.json`
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    base_path: PathBuf,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

impl AnalysisStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn programme_dir(&self, id: &str) -> PathBuf {
        self.base_path.join(id)
    }

    /// Save the programme and append the analysis. Returns the programme id.
    pub async fn save(
        &self,
        programme: &ProgrammeData,
        result: &GapAnalysisResult,
    ) -> Result<String> {
        let id = programme_id(&programme.institution, &programme.programme_name);
        let dir = self.programme_dir(&id);
        let analyses = dir.join(ANALYSES_DIR);
        fs::create_dir_all(&analyses).await?;

        let programme_json = serde_json::to_string_pretty(programme)?;
        fs::write(dir.join(PROGRAMME_FILE), programme_json).await?;

        let stamp = result.analyzed_at.format("%Y%m%dT%H%M%S%.6fZ").to_string();
        let path = next_free_path(&analyses, &stamp).await?;
        fs::write(&path, serde_json::to_string_pretty(result)?).await?;

        debug!("Saved analysis for {} to {}", id, path.display());
        Ok(id)
    }

    /// The stored programme record
    pub async fn load_programme(&self, id: &str) -> Result<ProgrammeData> {
        let path = self.programme_dir(id).join(PROGRAMME_FILE);
        match fs::read_to_string(&path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All stored analyses for a programme, newest first
    pub async fn history(&self, id: &str) -> Result<Vec<GapAnalysisResult>> {
        let dir = self.programme_dir(id).join(ANALYSES_DIR);
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let mut results = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let json = fs::read_to_string(&path).await?;
            match serde_json::from_str::<GapAnalysisResult>(&json) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Skipping unreadable analysis {}: {}", path.display(), e),
            }
        }

        results.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(results)
    }

    /// The most recent analysis
    pub async fn latest(&self, id: &str) -> Result<GapAnalysisResult> {
        self.history(id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Ids of every stored programme, sorted
    pub async fn list_programmes(&self) -> Result<Vec<String>> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// `<stamp>.json`, or `<stamp>-<n>.json` when that name is taken
async fn next_free_path(dir: &Path, stamp: &str) -> io::Result<PathBuf> {
    let mut path = dir.join(format!("{stamp}.json"));
    let mut n = 1;
    while fs::try_exists(&path).await? {
        path = dir.join(format!("{stamp}-{n}.json"));
        n += 1;
    }
    Ok(path)
}
