//! XML page archive and offline replay

use chrono::{DateTime, Utc};
use quick_xml::{de::from_str, se::to_string};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use super::{Result, StorageError};
use crate::fetcher::{FetchError, FetchedPage, PageFetcher};

pub const DEFAULT_ARCHIVE_PATH: &str = ".readiness/pages";

/// Archive file of a host's root page. Encoded keys never start with `_`.
const ROOT_FILE: &str = "_index.xml";

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '/' => encoded.push('_'),
            c if c.is_alphanumeric() => encoded.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("-{byte:02X}"));
                }
            }
        }
    }
    encoded
}

/// XML document root
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename = "pages")]
pub struct Pages {
    #[serde(rename = "page")]
    pub pages: Vec<PageEntry>,
}

/// One archived page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub url: String,
    pub status: u16,
    pub fetched_at: DateTime<Utc>,
    pub html: String,
}

impl From<FetchedPage> for PageEntry {
    fn from(page: FetchedPage) -> Self {
        PageEntry {
            url: page.url,
            status: page.status,
            fetched_at: page.fetched_at,
            html: page.html,
        }
    }
}

impl From<PageEntry> for FetchedPage {
    fn from(entry: PageEntry) -> Self {
        FetchedPage {
            url: entry.url,
            status: entry.status,
            html: entry.html,
            fetched_at: entry.fetched_at,
        }
    }
}

/// Page snapshots stored as `<base>/<host>/<path>.xml`
#[derive(Debug, Clone)]
pub struct PageArchive {
    base_path: PathBuf,
}

impl Default for PageArchive {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_PATH)
    }
}

impl PageArchive {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File holding the snapshot for `url`. Path and query are flattened
    /// into one file name: `/` becomes `_`, alphanumerics are kept and every
    /// other byte is written as `-XX`, so distinct URLs get distinct files.
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        let mut key = parsed.path().trim_matches('/').to_string();
        if let Some(query) = parsed.query() {
            key.push('?');
            key.push_str(query);
        }

        let filename = if key.is_empty() {
            ROOT_FILE.to_string()
        } else {
            format!("{}.xml", encode_key(&key))
        };

        Ok(self.base_path.join(host).join(filename))
    }

    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write a snapshot, replacing any earlier one for the same URL
    pub async fn store(&self, page: &FetchedPage) -> Result<PathBuf> {
        let path = self.path_for(&page.url)?;
        self.ensure_directories(&path).await?;

        let pages = Pages {
            pages: vec![PageEntry::from(page.clone())],
        };
        let xml = to_string(&pages)?;
        fs::write(
            &path,
            format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{xml}"),
        )
        .await?;
        debug!("Archived {} to {}", page.url, path.display());
        Ok(path)
    }

    /// Read the snapshot for `url`
    pub async fn load(&self, url: &str) -> Result<FetchedPage> {
        let path = self.path_for(url)?;
        let xml = match fs::read_to_string(&path).await {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(url.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let pages: Pages = from_str(&xml)?;

        // One page per file
        pages
            .pages
            .into_iter()
            .next()
            .map(FetchedPage::from)
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }

    pub async fn contains(&self, url: &str) -> bool {
        match self.path_for(url) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

impl PageFetcher for PageArchive {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        self.load(url).await.map_err(|e| match e {
            StorageError::NotFound(url) => FetchError::NotArchived(url),
            StorageError::UrlParse(e) => FetchError::UrlParse(e),
            other => FetchError::Other(other.to_string()),
        })
    }
}

/// A fetcher that archives every page it fetches successfully.
///
/// Archive write failures are logged and never fail the fetch.
#[derive(Debug, Clone)]
pub struct Archiving<F> {
    inner: F,
    archive: PageArchive,
}

impl<F: PageFetcher> Archiving<F> {
    pub fn new(inner: F, archive: PageArchive) -> Self {
        Self { inner, archive }
    }

    pub fn archive(&self) -> &PageArchive {
        &self.archive
    }
}

impl<F: PageFetcher> PageFetcher for Archiving<F> {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let page = self.inner.fetch(url).await?;
        if let Err(e) = self.archive.store(&page).await {
            warn!("Failed to archive {}: {}", url, e);
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HTML: &str = "<html><body><h2>Learning outcomes</h2><ul><li>Apply models &amp; methods</li></ul></body></html>";

    #[test]
    fn test_path_for() {
        let archive = PageArchive::new("/tmp/archive");
        assert_eq!(
            archive.path_for("https://example.edu/").unwrap(),
            Path::new("/tmp/archive/example.edu/_index.xml")
        );
        assert_eq!(
            archive.path_for("https://example.edu/en/programme/msc").unwrap(),
            Path::new("/tmp/archive/example.edu/en_programme_msc.xml")
        );
        assert_eq!(
            archive.path_for("https://example.edu/programme?lang=no").unwrap(),
            Path::new("/tmp/archive/example.edu/programme-3Flang-3Dno.xml")
        );
        assert!(matches!(
            archive.path_for("not a url"),
            Err(StorageError::UrlParse(_))
        ));
    }

    #[test]
    fn test_similar_urls_get_separate_files() {
        let archive = PageArchive::new("/tmp/archive");
        let paths: Vec<PathBuf> = [
            "https://example.edu/a/b",
            "https://example.edu/a_b",
            "https://example.edu/a-b?x",
            "https://example.edu/a-b",
            "https://example.edu/index",
            "https://example.edu/",
        ]
        .iter()
        .map(|url| archive.path_for(url).unwrap())
        .collect();

        for (i, path) in paths.iter().enumerate() {
            assert!(!paths[i + 1..].contains(path), "{}", path.display());
        }
        assert_eq!(paths[1], Path::new("/tmp/archive/example.edu/a-5Fb.xml"));
    }

    #[tokio::test]
    async fn test_colliding_names_replay_their_own_page() {
        let dir = tempdir().unwrap();
        let archive = PageArchive::new(dir.path());
        archive
            .store(&FetchedPage::new("https://example.edu/a/b", "<p>nested</p>"))
            .await
            .unwrap();
        archive
            .store(&FetchedPage::new("https://example.edu/a_b", "<p>flat</p>"))
            .await
            .unwrap();

        assert_eq!(archive.load("https://example.edu/a/b").await.unwrap().html, "<p>nested</p>");
        assert_eq!(archive.load("https://example.edu/a_b").await.unwrap().html, "<p>flat</p>");
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let dir = tempdir().unwrap();
        let archive = PageArchive::new(dir.path());
        let page = FetchedPage::new("https://example.edu/en/programme", HTML);

        let path = archive.store(&page).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(archive.contains(&page.url).await);

        let loaded = archive.load(&page.url).await.unwrap();
        assert_eq!(loaded.url, page.url);
        assert_eq!(loaded.status, 200);
        assert_eq!(loaded.html, HTML);
    }

    #[tokio::test]
    async fn test_missing_page_is_not_archived() {
        let dir = tempdir().unwrap();
        let archive = PageArchive::new(dir.path());

        assert!(!archive.contains("https://example.edu/missing").await);
        let result = archive.fetch("https://example.edu/missing").await;
        assert!(matches!(result, Err(FetchError::NotArchived(_))));
    }

    struct OnePage;

    impl PageFetcher for OnePage {
        async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
            if url.ends_with("/ok") {
                Ok(FetchedPage::new(url, HTML))
            } else {
                Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_archiving_fetcher_replays_offline() {
        let dir = tempdir().unwrap();
        let archiving = Archiving::new(OnePage, PageArchive::new(dir.path()));

        archiving.fetch("https://example.edu/ok").await.unwrap();
        assert!(archiving.fetch("https://example.edu/gone").await.is_err());

        let offline = PageArchive::new(dir.path());
        let replayed = offline.fetch("https://example.edu/ok").await.unwrap();
        assert_eq!(replayed.html, HTML);
        assert!(!offline.contains("https://example.edu/gone").await);
    }
}
