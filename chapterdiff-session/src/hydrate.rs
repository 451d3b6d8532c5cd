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

//! Sparse change expansion.
//!
//! The precomputed book cache stores only the regions that differ. Given
//! a chapter's full text, this module expands that sparse list back into
//! the complete token stream the viewer needs, validating as it goes: a
//! bad offset or a mismatch against the actual cleaned text means the
//! artifact cannot be trusted for this chapter and the caller falls back
//! to computing the diff live.

use crate::text::char_range;
use chapterdiff_core::{apply_to_cleaned, apply_to_original, tokenize, DiffToken, SparseChange};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrationError {
    /// A change offset lies outside the cleaned text or behind an
    /// earlier change.
    #[error("change offset {offset} is out of bounds")]
    OffsetOutOfBounds { offset: usize },

    /// The added text recorded for a change does not appear at its
    /// offset in the cleaned text.
    #[error("change at offset {offset} does not match the cleaned text")]
    TextMismatch { offset: usize },

    /// The expanded tokens do not reconstruct the source text.
    #[error("expanded tokens do not reconstruct the chapter text")]
    Reconstruction,
}

/// Expand a sparse change list into a full diff token stream.
///
/// `ignore_whitespace` must reflect the setting the artifact was produced
/// with; it decides whether the original text can be used as a second
/// reconstruction check (whitespace-insensitive diffs may legitimately
/// differ from the original in their unchanged runs).
pub fn hydrate_from_changes(
    changes: &[SparseChange],
    original_text: &str,
    cleaned_text: &str,
    ignore_whitespace: bool,
) -> Result<Vec<DiffToken>, HydrationError> {
    let total_chars = cleaned_text.chars().count();
    let mut tokens: Vec<DiffToken> = Vec::new();
    let mut cursor = 0usize;

    for change in changes {
        if change.offset < cursor || change.offset > total_chars {
            return Err(HydrationError::OffsetOutOfBounds { offset: change.offset });
        }

        let gap = char_range(cleaned_text, cursor, change.offset)
            .ok_or(HydrationError::OffsetOutOfBounds { offset: change.offset })?;
        tokens.extend(tokenize(gap).into_iter().map(DiffToken::unchanged));

        if !change.removed.is_empty() {
            tokens.push(DiffToken::removed(&change.removed));
        }

        if change.added.is_empty() {
            cursor = change.offset;
        } else {
            let added_chars = change.added.chars().count();
            let end = change.offset + added_chars;
            let actual = char_range(cleaned_text, change.offset, end)
                .ok_or(HydrationError::OffsetOutOfBounds { offset: change.offset })?;
            if actual != change.added {
                return Err(HydrationError::TextMismatch { offset: change.offset });
            }
            tokens.push(DiffToken::added(&change.added));
            cursor = end;
        }
    }

    let tail = char_range(cleaned_text, cursor, total_chars)
        .ok_or(HydrationError::Reconstruction)?;
    tokens.extend(tokenize(tail).into_iter().map(DiffToken::unchanged));

    if apply_to_cleaned(&tokens) != cleaned_text {
        return Err(HydrationError::Reconstruction);
    }
    if !ignore_whitespace && apply_to_original(&tokens) != original_text {
        return Err(HydrationError::Reconstruction);
    }

    Ok(tokens)
}
