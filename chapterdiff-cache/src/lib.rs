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

//! Chapterdiff Cache
//!
//! The two cache tiers backing a comparison session:
//!
//! - a bounded in-memory tier holding hydrated chapters with separate
//!   LRU access tracking, and
//! - a persistent per-chapter store keyed by (original path, cleaned
//!   path, chapter id), with a single corruption check enforced at both
//!   the read and the write boundary.
//!
//! Also home to the loader for the precomputed whole-book artifact that
//! the cleanup pipeline may leave next to the cleaned document.

pub mod book;
pub mod error;
pub mod fs_store;
pub mod lru;
pub mod memory_store;
pub mod store;
pub mod validate;

pub use book::{BookCacheProvider, FsBookCacheProvider};
pub use error::{CacheError, CacheResult};
pub use fs_store::FsChapterStore;
pub use lru::ChapterLru;
pub use memory_store::MemoryChapterStore;
pub use store::{CacheKey, ChapterStore};
pub use validate::entry_is_valid;
