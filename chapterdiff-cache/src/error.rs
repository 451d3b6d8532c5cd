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

//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in the persistent cache tier.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying I/O failure.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Write refused: the entry would read back as corrupt.
    #[error("refusing to persist corrupt diff state for chapter {chapter_id}")]
    CorruptEntry { chapter_id: String },
}
