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

//! Engine configuration.

use std::time::Duration;

/// Tunables for the comparison engine.
///
/// Defaults match production behavior; tests shrink the sizes to exercise
/// the progressive-load and eviction paths cheaply.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Characters of cleaned text diffed on first load of a chapter.
    pub initial_load_chars: usize,
    /// Characters added to the diffed prefix by each load-more step.
    pub load_more_chars: usize,
    /// Maximum number of hydrated chapters held in memory.
    pub max_cached_chapters: usize,
    /// Cleaned-text length above which a chapter is flagged oversized.
    pub oversize_threshold: usize,
    /// Pause between background streaming steps, so the host application
    /// is never starved.
    pub stream_step_delay: Duration,
    /// Whether to stream the rest of the book in the background once the
    /// current chapter is ready. Hosts that only ever show one chapter at
    /// a time can turn this off.
    pub background_streaming: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_load_chars: 20_000,
            load_more_chars: 20_000,
            max_cached_chapters: 5,
            oversize_threshold: 100_000,
            stream_step_delay: Duration::from_millis(150),
            background_streaming: true,
        }
    }
}
