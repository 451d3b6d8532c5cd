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

//! Session error types.
//!
//! Only content failures are fatal to a session. Computation timeouts,
//! cache corruption, and hydration problems all degrade in place and are
//! never surfaced through this type.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced to the consumer of a comparison session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The content provider could not supply chapter metadata or text.
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    /// An operation that needs an active session was called without one.
    #[error("no active comparison session")]
    NoSession,

    /// The requested chapter id is not part of the book.
    #[error("unknown chapter: {0}")]
    UnknownChapter(String),
}
