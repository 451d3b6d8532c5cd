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

//! Diff tokens and change accounting.

use serde::{Deserialize, Serialize};

/// Classification of a single diff token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// Token is present in both versions.
    Unchanged,
    /// Token exists only in the cleaned version.
    Added,
    /// Token exists only in the original version.
    Removed,
}

/// One unit of a word-level diff: a word or whitespace run, tagged with
/// how it differs between the two versions.
///
/// Adjacent `Added` tokens and adjacent `Removed` tokens are merged into a
/// single token by the diff algorithm, so a multi-word insertion shows up
/// as one token. `Unchanged` tokens are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffToken {
    pub text: String,
    pub kind: DiffKind,
}

impl DiffToken {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: DiffKind::Unchanged }
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: DiffKind::Added }
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: DiffKind::Removed }
    }

    /// Whether this token represents a difference between the versions.
    pub fn is_change(&self) -> bool {
        self.kind != DiffKind::Unchanged
    }
}

/// Added/removed token counts for a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
}

impl ChangeSummary {
    pub fn total(&self) -> usize {
        self.added + self.removed
    }
}

/// Count the tokens that differ between the two versions.
pub fn count_changes(tokens: &[DiffToken]) -> usize {
    tokens.iter().filter(|t| t.is_change()).count()
}

/// Split the change count into added and removed.
pub fn summarize_changes(tokens: &[DiffToken]) -> ChangeSummary {
    let mut summary = ChangeSummary::default();
    for token in tokens {
        match token.kind {
            DiffKind::Added => summary.added += 1,
            DiffKind::Removed => summary.removed += 1,
            DiffKind::Unchanged => {}
        }
    }
    summary
}

/// Reconstruct the cleaned text: unchanged and added tokens, in order.
pub fn apply_to_cleaned(tokens: &[DiffToken]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != DiffKind::Removed)
        .map(|t| t.text.as_str())
        .collect()
}

/// Reconstruct the original text: unchanged and removed tokens, in order.
pub fn apply_to_original(tokens: &[DiffToken]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != DiffKind::Added)
        .map(|t| t.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_changes() {
        let tokens = vec![
            DiffToken::unchanged("The"),
            DiffToken::unchanged(" "),
            DiffToken::added("big "),
            DiffToken::unchanged("cat"),
            DiffToken::removed(" small"),
        ];
        assert_eq!(count_changes(&tokens), 2);
    }

    #[test]
    fn test_summarize_changes() {
        let tokens = vec![
            DiffToken::added("x"),
            DiffToken::added("y"),
            DiffToken::removed("z"),
            DiffToken::unchanged("w"),
        ];
        let summary = summarize_changes(&tokens);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_reconstruction() {
        let tokens = vec![
            DiffToken::unchanged("a "),
            DiffToken::removed("old "),
            DiffToken::added("new "),
            DiffToken::unchanged("b"),
        ];
        assert_eq!(apply_to_original(&tokens), "a old b");
        assert_eq!(apply_to_cleaned(&tokens), "a new b");
    }
}
