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

//! Precomputed whole-book diff cache.
//!
//! The cleanup pipeline that produces the cleaned document can also emit a
//! whole-book artifact holding a sparse change list per chapter. When the
//! artifact is present a session can build its chapter list without a
//! metadata round-trip and hydrate chapters without recomputing the diff.
//! The artifact is JSON with camelCase keys, matching what the pipeline
//! writes.

use crate::chapter::SparseChange;
use serde::{Deserialize, Serialize};

/// Artifact format version this crate understands. Any other version is
/// treated as if the artifact did not exist.
pub const BOOK_DIFF_CACHE_VERSION: u32 = 1;

/// One chapter's entry in the precomputed book cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDiffChapter {
    pub id: String,
    pub title: String,
    pub original_char_count: usize,
    pub cleaned_char_count: usize,
    pub change_count: usize,
    pub changes: Vec<SparseChange>,
}

/// The whole-book diff artifact produced by the cleanup pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDiffCache {
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    /// Whitespace sensitivity the artifact was produced with. A mismatch
    /// with the active setting makes the artifact unusable.
    pub ignore_whitespace: bool,
    /// False when the producing job stopped before covering every chapter.
    pub completed: bool,
    pub chapters: Vec<BookDiffChapter>,
}

impl BookDiffCache {
    /// Whether the artifact can be used under the given whitespace setting.
    pub fn is_usable(&self, ignore_whitespace: bool) -> bool {
        self.version == BOOK_DIFF_CACHE_VERSION && self.ignore_whitespace == ignore_whitespace
    }

    pub fn chapter(&self, id: &str) -> Option<&BookDiffChapter> {
        self.chapters.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{
            "version": 1,
            "createdAt": "2025-06-01T10:00:00Z",
            "updatedAt": "2025-06-01T10:05:00Z",
            "ignoreWhitespace": false,
            "completed": true,
            "chapters": [{
                "id": "ch-1",
                "title": "Chapter One",
                "originalCharCount": 120,
                "cleanedCharCount": 118,
                "changeCount": 2,
                "changes": [{"offset": 10, "removed": "teh", "added": "the"}]
            }]
        }"#;
        let cache: BookDiffCache = serde_json::from_str(json).unwrap();
        assert!(cache.is_usable(false));
        assert!(!cache.is_usable(true));
        let chapter = cache.chapter("ch-1").unwrap();
        assert_eq!(chapter.change_count, 2);
        assert_eq!(chapter.changes[0].added, "the");
    }

    #[test]
    fn test_version_mismatch_is_unusable() {
        let cache = BookDiffCache {
            version: 99,
            created_at: String::new(),
            updated_at: String::new(),
            ignore_whitespace: false,
            completed: true,
            chapters: Vec::new(),
        };
        assert!(!cache.is_usable(false));
    }
}
