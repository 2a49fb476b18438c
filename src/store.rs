//! On-disk store for downloaded PDFs.
//!
//! Papers are filed as
//! `<root>/<YYYY-MM>/<primary category>/<id>_<title>.pdf`, where the month
//! is taken from the published timestamp and the category's dots become
//! underscores (`math.GT` -> `math_GT`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::models::{DownloadResult, DownloadStats, PaperInfo};
use crate::sources::PaperSource;
use crate::utils::sanitize_filename;

/// Directory used for papers without categories
pub const UNCATEGORIZED_DIR: &str = "uncategorized";

/// Number of file names reported in [`DownloadStats::recent_downloads`]
const RECENT_DOWNLOADS: usize = 10;

/// Organized PDF storage rooted at a download directory
#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

impl PaperStore {
    /// Create a store rooted at `root` (created lazily on first download)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root download directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a paper is (or would be) stored
    pub fn paper_path(&self, paper: &PaperInfo, custom_dir: Option<&Path>) -> PathBuf {
        let base = custom_dir.unwrap_or(&self.root);
        let date_dir = paper.published.format("%Y-%m").to_string();
        let category_dir = paper
            .categories
            .first()
            .map(|cat| sanitize_filename(&cat.replace('.', "_")))
            .unwrap_or_else(|| UNCATEGORIZED_DIR.to_string());
        let stem = sanitize_filename(&format!("{}_{}", paper.arxiv_id, paper.title));

        base.join(date_dir)
            .join(category_dir)
            .join(format!("{}.pdf", stem))
    }

    /// Download a paper's PDF into the store
    ///
    /// A file already present at the target path counts as success and
    /// is not fetched again. Failures are reported in the result.
    pub async fn save_paper(
        &self,
        source: &dyn PaperSource,
        paper: &PaperInfo,
        custom_dir: Option<&Path>,
    ) -> DownloadResult {
        let path = self.paper_path(paper, custom_dir);
        let path_str = path.to_string_lossy().to_string();

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("{} already downloaded at {}", paper.arxiv_id, path_str);
            return DownloadResult::success(&paper.arxiv_id, &paper.title, path_str);
        }

        match self.fetch_and_write(source, paper, &path).await {
            Ok(size) => {
                tracing::info!(
                    "Downloaded {} ({} bytes) to {}",
                    paper.arxiv_id,
                    size,
                    path_str
                );
                DownloadResult::success(&paper.arxiv_id, &paper.title, path_str)
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", paper.arxiv_id, e);
                DownloadResult::error(&paper.arxiv_id, &paper.title, e.to_string())
            }
        }
    }

    async fn fetch_and_write(
        &self,
        source: &dyn PaperSource,
        paper: &PaperInfo,
        path: &Path,
    ) -> Result<usize, crate::sources::SourceError> {
        let bytes = source.fetch_pdf(paper).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;

        Ok(bytes.len())
    }

    /// Summarize the PDFs under the store root
    ///
    /// A missing root yields empty statistics.
    pub async fn stats(&self) -> Result<DownloadStats, std::io::Error> {
        let files = collect_pdfs(&self.root).await?;

        let mut organization: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut total_bytes: u64 = 0;

        for file in &files {
            total_bytes += file.size;

            let relative = file.path.strip_prefix(&self.root).unwrap_or(&file.path);
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();

            // Only files filed as <month>/<category>/<name> are counted
            if let [date_dir, category_dir, _, ..] = parts.as_slice() {
                *organization
                    .entry(date_dir.clone())
                    .or_default()
                    .entry(category_dir.clone())
                    .or_insert(0) += 1;
            }
        }

        let mut recent: Vec<&PdfFile> = files.iter().collect();
        recent.sort_by(|a, b| b.modified.cmp(&a.modified));

        let total_size_mb = total_bytes as f64 / (1024.0 * 1024.0);

        Ok(DownloadStats {
            download_directory: self.root.to_string_lossy().to_string(),
            total_papers: files.len(),
            total_size_mb: (total_size_mb * 100.0).round() / 100.0,
            organization,
            recent_downloads: recent
                .into_iter()
                .take(RECENT_DOWNLOADS)
                .filter_map(|f| f.path.file_name())
                .map(|name| name.to_string_lossy().to_string())
                .collect(),
        })
    }
}

#[derive(Debug)]
struct PdfFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Recursively find `*.pdf` files below `root`
async fn collect_pdfs(root: &Path) -> Result<Vec<PdfFile>, std::io::Error> {
    let mut files = Vec::new();
    if !tokio::fs::try_exists(root).await? {
        return Ok(files);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = entry.metadata().await?;

            if metadata.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            {
                files.push(PdfFile {
                    path,
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                });
            }
        }
    }

    Ok(files)
}
