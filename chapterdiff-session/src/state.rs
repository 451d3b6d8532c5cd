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

//! Session lifecycle state machine and consumer-facing snapshots.

use chapterdiff_core::{Chapter, ChapterMeta};
use thiserror::Error;

/// Top-level session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    LoadingMetadata,
    Ready,
}

impl SessionPhase {
    pub fn is_ready(self) -> bool {
        matches!(self, SessionPhase::Ready)
    }
}

/// Events driving the session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoadRequested,
    MetadataReady,
    LoadFailed,
    Cleared,
}

#[derive(Debug, Error)]
#[error("invalid transition: {current:?} -> {event:?}")]
pub struct InvalidTransition {
    pub current: SessionPhase,
    pub event: SessionEvent,
}

impl SessionPhase {
    pub fn transition(self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        use SessionEvent::*;
        use SessionPhase::*;

        let next = match (self, event) {
            // A new load may interrupt any phase.
            (_, LoadRequested) => LoadingMetadata,
            (LoadingMetadata, MetadataReady) => Ready,
            (LoadingMetadata, LoadFailed) => Idle,
            (_, Cleared) => Idle,
            _ => return Err(InvalidTransition { current: self, event }),
        };

        Ok(next)
    }
}

/// Per-chapter loading phase, derived from hydration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterPhase {
    NotLoaded,
    /// Text fetch or first diff in flight.
    Loading,
    /// Resident with a partial diff that is still growing.
    Streaming,
    FullyLoaded,
}

/// Derive a chapter's phase from its resident content, if any, and
/// whether a hydration attempt is currently in flight for it.
pub fn chapter_phase(chapter: Option<&Chapter>, loading: bool) -> ChapterPhase {
    match chapter {
        None if loading => ChapterPhase::Loading,
        None => ChapterPhase::NotLoaded,
        Some(chapter) if chapter.has_more_content() => ChapterPhase::Streaming,
        Some(_) => ChapterPhase::FullyLoaded,
    }
}

/// Consistent, fully-formed snapshot of the session, handed to consumers
/// after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub original_path: String,
    pub cleaned_path: String,
    pub chapters_meta: Vec<ChapterMeta>,
    pub current_chapter_id: Option<String>,
    /// Whether a session-level load is in progress.
    pub loading: bool,
    /// Chapter currently being hydrated, if any.
    pub loading_chapter_id: Option<String>,
}
