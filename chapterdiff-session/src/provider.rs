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

//! Content provider seam.
//!
//! The document inspector that knows how to open books and pull chapter
//! text lives outside this workspace; the session only sees this trait.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the content provider.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Chapter descriptor returned by a metadata listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChapter {
    pub id: String,
    pub title: String,
    pub has_original: bool,
    pub has_cleaned: bool,
}

/// Both versions of one chapter's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterText {
    pub original: String,
    pub cleaned: String,
}

/// External source of chapter listings and chapter text.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn chapter_metadata(
        &self,
        original_path: &str,
        cleaned_path: &str,
    ) -> Result<Vec<ProviderChapter>, ProviderError>;

    async fn chapter_text(
        &self,
        original_path: &str,
        cleaned_path: &str,
        chapter_id: &str,
    ) -> Result<ChapterText, ProviderError>;
}
