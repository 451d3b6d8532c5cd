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

//! Background streaming loader.
//!
//! Walks the chapter list in order and fully loads every chapter that is
//! not complete yet, regardless of which chapter the reader is viewing.
//! Each step is bracketed by cancellation checks and cooperative yields,
//! and every computed result is re-validated against the session
//! generation before it is applied; a response that arrives after a
//! navigation or reload is dropped on the floor.

use crate::engine::EngineShared;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

enum Step {
    /// Chapter is fully loaded (or unloadable); move to the next one.
    Done,
    /// Chapter is not resident; run the full hydration path.
    Hydrate,
    /// Chapter is resident but partial; extend the diffed prefix.
    Extend { original_text: String, cleaned_text: String, new_loaded: usize },
}

fn next_step(shared: &EngineShared, id: &str) -> Step {
    let inner = shared.inner.read();
    match inner.chapters.peek(id) {
        None => Step::Hydrate,
        Some(chapter) if chapter.has_more_content() => Step::Extend {
            original_text: chapter.original_text.clone(),
            cleaned_text: chapter.cleaned_text.clone(),
            new_loaded: (chapter.loaded_chars + shared.config.load_more_chars)
                .min(chapter.total_chars),
        },
        Some(_) => Step::Done,
    }
}

/// Drive the whole book to fully loaded, one bounded step at a time.
pub(crate) async fn run(shared: Arc<EngineShared>, token: CancellationToken, generation: u64) {
    info!("background chapter streaming started");

    let ids: Vec<String> = {
        let inner = shared.inner.read();
        inner.chapters_meta.iter().map(|m| m.id.clone()).collect()
    };

    for id in ids {
        loop {
            if token.is_cancelled() || shared.is_stale(generation) {
                debug!("chapter streaming aborted");
                return;
            }
            // Give interactive work a chance to run before the next slice.
            tokio::task::yield_now().await;
            if token.is_cancelled() || shared.is_stale(generation) {
                debug!("chapter streaming aborted");
                return;
            }

            match next_step(&shared, &id) {
                Step::Done => break,
                Step::Hydrate => match shared.ensure_chapter_ready(&id, generation).await {
                    Ok(true) => {}
                    Ok(false) => {
                        if token.is_cancelled() || shared.is_stale(generation) {
                            return;
                        }
                        // Degraded: leave the chapter for a later revisit.
                        debug!(chapter_id = %id, "hydration produced nothing, skipping chapter");
                        break;
                    }
                    Err(error) => {
                        warn!(chapter_id = %id, %error, "chapter unavailable, skipping");
                        break;
                    }
                },
                Step::Extend { original_text, cleaned_text, new_loaded } => {
                    let tokens = shared
                        .compute_prefix(&original_text, &cleaned_text, new_loaded, generation)
                        .await;
                    // The response may arrive after an abort; check again
                    // before applying anything.
                    if token.is_cancelled() || shared.is_stale(generation) {
                        debug!("chapter streaming aborted");
                        return;
                    }
                    match tokens {
                        Some(tokens) => {
                            shared.apply_progress(&id, new_loaded, tokens, generation).await;
                        }
                        None => {
                            debug!(chapter_id = %id, "diff step produced no update, leaving chapter partial");
                            break;
                        }
                    }
                }
            }

            tokio::time::sleep(shared.config.stream_step_delay).await;
        }
    }

    info!("background chapter streaming finished");
}
