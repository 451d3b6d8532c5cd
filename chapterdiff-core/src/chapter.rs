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

//! Chapter state: lightweight metadata, hydrated content, and the shape
//! persisted to the chapter cache.

use crate::token::DiffToken;
use serde::{Deserialize, Serialize};

/// A sparse change region inside a chapter, as produced by the upstream
/// cleanup pipeline.
///
/// `offset` is a character offset into the cleaned text. `removed` is the
/// original-side text replaced at that point and `added` the cleaned-side
/// text inserted there; either may be empty for a pure insertion or
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseChange {
    pub offset: usize,
    #[serde(default)]
    pub removed: String,
    #[serde(default)]
    pub added: String,
}

/// Per-chapter metadata. One entry exists for every chapter in the book,
/// whether or not the chapter is currently hydrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMeta {
    pub id: String,
    pub title: String,
    pub has_original: bool,
    pub has_cleaned: bool,
    /// Known change count, if the chapter has been diffed (now or by the
    /// upstream pipeline).
    #[serde(default)]
    pub change_count: Option<usize>,
    /// Whether the chapter's content is currently held in memory.
    #[serde(default)]
    pub is_loaded: bool,
    /// Whether the chapter is large enough to load progressively.
    #[serde(default)]
    pub is_oversized: bool,
    /// Sparse changes carried over from the precomputed book cache,
    /// cleared after hydration (or after a failed hydration attempt).
    #[serde(default)]
    pub cached_changes: Option<Vec<SparseChange>>,
    #[serde(default)]
    pub original_char_count: Option<usize>,
    #[serde(default)]
    pub cleaned_char_count: Option<usize>,
}

impl ChapterMeta {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            has_original: true,
            has_cleaned: true,
            change_count: None,
            is_loaded: false,
            is_oversized: false,
            cached_changes: None,
            original_char_count: None,
            cleaned_char_count: None,
        }
    }
}

/// A hydrated chapter: both text versions plus the current diff state.
///
/// `loaded_chars` tracks how much of the cleaned text the diff currently
/// covers; it only ever grows, up to `total_chars`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub original_text: String,
    pub cleaned_text: String,
    pub diff_tokens: Vec<DiffToken>,
    pub change_count: usize,
    pub loaded_chars: usize,
    pub total_chars: usize,
}

impl Chapter {
    /// Whether more of the chapter remains to be diffed.
    pub fn has_more_content(&self) -> bool {
        self.loaded_chars < self.total_chars
    }

    /// Fraction of the cleaned text covered by the current diff, in 0..=1.
    pub fn loading_progress(&self) -> f64 {
        if self.total_chars == 0 {
            1.0
        } else {
            (self.loaded_chars as f64 / self.total_chars as f64).min(1.0)
        }
    }
}

/// The value persisted per chapter in the on-disk cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedChapterData {
    pub diff_tokens: Vec<DiffToken>,
    pub change_count: usize,
    pub loaded_chars: usize,
    pub total_chars: usize,
    pub fully_loaded: bool,
}

impl CachedChapterData {
    pub fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            diff_tokens: chapter.diff_tokens.clone(),
            change_count: chapter.change_count,
            loaded_chars: chapter.loaded_chars,
            total_chars: chapter.total_chars,
            fully_loaded: chapter.loaded_chars >= chapter.total_chars,
        }
    }
}
