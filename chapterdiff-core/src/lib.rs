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

//! Chapterdiff Core
//!
//! Fundamental data structures and the word-level diff algorithm shared by
//! every other crate in the workspace: diff tokens, chapter state, cache
//! entry shapes, the precomputed whole-book artifact, and the tokenizer +
//! LCS diff that everything downstream builds on.

pub mod book;
pub mod chapter;
pub mod config;
pub mod diff;
pub mod token;
pub mod tokenize;

pub use book::{BookDiffCache, BookDiffChapter, BOOK_DIFF_CACHE_VERSION};
pub use chapter::{CachedChapterData, Chapter, ChapterMeta, SparseChange};
pub use config::EngineConfig;
pub use diff::{compute_word_diff, DiffOptions};
pub use token::{
    apply_to_cleaned, apply_to_original, count_changes, summarize_changes, ChangeSummary,
    DiffKind, DiffToken,
};
pub use tokenize::tokenize;
