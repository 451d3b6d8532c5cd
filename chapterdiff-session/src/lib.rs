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

//! Chapterdiff Session
//!
//! Owns a book comparison from first load to teardown: the session state
//! machine, lazy chapter hydration with progressive reveal, hydration
//! from the precomputed book cache, and the background loader that
//! streams the remaining chapters in while the reader works.
//!
//! All session state lives behind [`ComparisonEngine`]; every mutation
//! goes through its operations and lands as a consistent snapshot
//! followed by a change notification. Nothing here blocks on the diff
//! itself: the O(n·m) work happens in `chapterdiff-compute`, and stale
//! results are discarded by generation before they can touch state.

pub mod engine;
pub mod error;
pub mod hydrate;
pub mod provider;
pub mod settings;
pub mod state;
mod stream;
mod text;

pub use engine::ComparisonEngine;
pub use error::{SessionError, SessionResult};
pub use hydrate::{hydrate_from_changes, HydrationError};
pub use provider::{ChapterText, ContentProvider, ProviderChapter, ProviderError};
pub use settings::{InMemorySettings, SettingsProvider};
pub use state::{chapter_phase, ChapterPhase, SessionEvent, SessionPhase, SessionView};
