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

//! Word-level LCS diff.
//!
//! Computes a minimal word diff between two texts using the classic
//! O(n·m) longest-common-subsequence dynamic program over word/whitespace
//! tokens. The output is deterministic: results are persisted and compared
//! across runs, so identical inputs must always produce byte-identical
//! token lists.

use crate::token::{DiffKind, DiffToken};
use crate::tokenize::{is_whitespace_token, tokenize};
use serde::{Deserialize, Serialize};

/// Options affecting token comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Treat any two whitespace runs as equal.
    pub ignore_whitespace: bool,
}

fn tokens_match(a: &str, b: &str, options: &DiffOptions) -> bool {
    if a == b {
        return true;
    }
    options.ignore_whitespace && is_whitespace_token(a) && is_whitespace_token(b)
}

/// Compute the word-level diff between `original` and `cleaned`.
///
/// Backtracking resolves ties by preferring an addition over a removal.
/// Adjacent added tokens and adjacent removed tokens are merged into one
/// token each; unchanged tokens stay one per word or whitespace run.
/// Unchanged token text is taken from the cleaned side (the side a viewer
/// renders), which matters only when `ignore_whitespace` is set.
pub fn compute_word_diff(original: &str, cleaned: &str, options: &DiffOptions) -> Vec<DiffToken> {
    if original.is_empty() && cleaned.is_empty() {
        return Vec::new();
    }
    // Either side empty: the whole other side is one token, no DP needed.
    if original.is_empty() {
        return vec![DiffToken::added(cleaned)];
    }
    if cleaned.is_empty() {
        return vec![DiffToken::removed(original)];
    }

    let a = tokenize(original);
    let b = tokenize(cleaned);
    let m = a.len();
    let n = b.len();

    // dp[i][j] = LCS length of a[..i] and b[..j], flattened row-major.
    let width = n + 1;
    let mut dp = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            dp[i * width + j] = if tokens_match(&a[i - 1], &b[j - 1], options) {
                dp[(i - 1) * width + (j - 1)] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + (j - 1)])
            };
        }
    }

    // Backtrack from dp[m][n]. An addition is taken whenever it does not
    // shorten the common subsequence, which also fixes the tie-break
    // between an addition and a removal in the addition's favor.
    let mut reversed: Vec<DiffToken> = Vec::with_capacity(m + n);
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        if j > 0 && dp[i * width + j] == dp[i * width + (j - 1)] {
            reversed.push(DiffToken::added(&b[j - 1]));
            j -= 1;
        } else if i > 0 && dp[i * width + j] == dp[(i - 1) * width + j] {
            reversed.push(DiffToken::removed(&a[i - 1]));
            i -= 1;
        } else {
            reversed.push(DiffToken::unchanged(&b[j - 1]));
            i -= 1;
            j -= 1;
        }
    }
    reversed.reverse();

    merge_change_runs(reversed)
}

/// Merge adjacent added runs and adjacent removed runs into single tokens.
fn merge_change_runs(tokens: Vec<DiffToken>) -> Vec<DiffToken> {
    let mut merged: Vec<DiffToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match merged.last_mut() {
            Some(last)
                if last.kind == token.kind && last.kind != DiffKind::Unchanged =>
            {
                last.text.push_str(&token.text);
            }
            _ => merged.push(token),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{apply_to_cleaned, apply_to_original, count_changes};

    fn diff(a: &str, b: &str) -> Vec<DiffToken> {
        compute_word_diff(a, b, &DiffOptions::default())
    }

    #[test]
    fn test_identical_inputs() {
        let tokens = diff("The cat sat.", "The cat sat.");
        assert!(tokens.iter().all(|t| t.kind == DiffKind::Unchanged));
        assert_eq!(count_changes(&tokens), 0);
        assert_eq!(apply_to_cleaned(&tokens), "The cat sat.");
    }

    #[test]
    fn test_empty_original() {
        let tokens = diff("", "hello world");
        assert_eq!(tokens, vec![DiffToken::added("hello world")]);
    }

    #[test]
    fn test_empty_cleaned() {
        let tokens = diff("hello world", "");
        assert_eq!(tokens, vec![DiffToken::removed("hello world")]);
    }

    #[test]
    fn test_both_empty() {
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn test_insertion_scenario() {
        let tokens = diff("The cat sat.", "The big cat sat down.");
        assert_eq!(
            tokens,
            vec![
                DiffToken::unchanged("The"),
                DiffToken::unchanged(" "),
                DiffToken::added("big "),
                DiffToken::unchanged("cat"),
                DiffToken::unchanged(" "),
                DiffToken::unchanged("sat"),
                DiffToken::added(" down"),
                DiffToken::unchanged("."),
            ]
        );
        assert_eq!(count_changes(&tokens), 2);
    }

    #[test]
    fn test_replacement_emits_removal_before_addition() {
        let tokens = diff("one two three", "one 2 three");
        assert_eq!(
            tokens,
            vec![
                DiffToken::unchanged("one"),
                DiffToken::unchanged(" "),
                DiffToken::removed("two"),
                DiffToken::added("2"),
                DiffToken::unchanged(" "),
                DiffToken::unchanged("three"),
            ]
        );
    }

    #[test]
    fn test_adjacent_changes_merge() {
        let tokens = diff("a b", "a x y z b");
        let added: Vec<_> = tokens.iter().filter(|t| t.kind == DiffKind::Added).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].text, "x y z ");
    }

    #[test]
    fn test_unchanged_tokens_not_merged() {
        let tokens = diff("a b c", "a b c");
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_reconstruction_both_directions() {
        let a = "It was the best of times, it was the worst of times.";
        let b = "It was truly the best of days, it was the worst of nights.";
        let tokens = diff(a, b);
        assert_eq!(apply_to_original(&tokens), a);
        assert_eq!(apply_to_cleaned(&tokens), b);
    }

    #[test]
    fn test_determinism() {
        let a = "alpha beta gamma delta epsilon";
        let b = "alpha gamma beta delta zeta";
        assert_eq!(diff(a, b), diff(a, b));
    }

    #[test]
    fn test_ignore_whitespace_matches_differing_runs() {
        let options = DiffOptions { ignore_whitespace: true };
        let tokens = compute_word_diff("a  b", "a b", &options);
        assert_eq!(count_changes(&tokens), 0);
        // Unchanged text comes from the cleaned side.
        assert_eq!(apply_to_cleaned(&tokens), "a b");
    }

    #[test]
    fn test_whitespace_sensitive_by_default() {
        let tokens = diff("a  b", "a b");
        assert!(count_changes(&tokens) > 0);
    }
}
