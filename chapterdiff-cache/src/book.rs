// Copyright 2025 Chapterdiff (https://github.com/chapterdiff)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Precomputed book cache loading.
//!
//! The cleanup pipeline leaves its whole-book diff artifact next to the
//! cleaned document. Absence, unreadability, and undecodability all look
//! the same to the caller: no artifact, fall back to live metadata.

use async_trait::async_trait;
use chapterdiff_core::BookDiffCache;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of the precomputed whole-book diff artifact.
#[async_trait]
pub trait BookCacheProvider: Send + Sync {
    async fn load_book_cache(&self, cleaned_path: &str) -> Option<BookDiffCache>;
}

/// Loads the artifact from `<cleaned document path>.bookdiff.json`.
#[derive(Default)]
pub struct FsBookCacheProvider;

impl FsBookCacheProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn artifact_path(cleaned_path: &str) -> PathBuf {
        PathBuf::from(format!("{cleaned_path}.bookdiff.json"))
    }
}

#[async_trait]
impl BookCacheProvider for FsBookCacheProvider {
    async fn load_book_cache(&self, cleaned_path: &str) -> Option<BookDiffCache> {
        let path = Self::artifact_path(cleaned_path);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read book diff artifact");
                return None;
            }
        };
        match serde_json::from_slice::<BookDiffCache>(&bytes) {
            Ok(cache) => {
                debug!(
                    path = %path.display(),
                    chapters = cache.chapters.len(),
                    completed = cache.completed,
                    "loaded book diff artifact"
                );
                Some(cache)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "undecodable book diff artifact");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterdiff_core::{BookDiffChapter, BOOK_DIFF_CACHE_VERSION};

    fn sample_cache() -> BookDiffCache {
        BookDiffCache {
            version: BOOK_DIFF_CACHE_VERSION,
            created_at: "2025-06-01T10:00:00Z".into(),
            updated_at: "2025-06-01T10:05:00Z".into(),
            ignore_whitespace: false,
            completed: true,
            chapters: vec![BookDiffChapter {
                id: "ch-1".into(),
                title: "One".into(),
                original_char_count: 10,
                cleaned_char_count: 10,
                change_count: 0,
                changes: Vec::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_load_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("book.cleaned.epub");
        let cleaned = cleaned.to_str().unwrap();
        let artifact = FsBookCacheProvider::artifact_path(cleaned);
        tokio::fs::write(&artifact, serde_json::to_vec(&sample_cache()).unwrap())
            .await
            .unwrap();

        let provider = FsBookCacheProvider::new();
        let cache = provider.load_book_cache(cleaned).await.unwrap();
        assert_eq!(cache.chapters.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_none() {
        let provider = FsBookCacheProvider::new();
        assert!(provider.load_book_cache("/nowhere/book.epub").await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("book.cleaned.epub");
        let cleaned = cleaned.to_str().unwrap();
        tokio::fs::write(FsBookCacheProvider::artifact_path(cleaned), b"junk")
            .await
            .unwrap();

        let provider = FsBookCacheProvider::new();
        assert!(provider.load_book_cache(cleaned).await.is_none());
    }
}
