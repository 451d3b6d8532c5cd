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

//! Cache entry validation, applied at every read and write boundary.

use chapterdiff_core::CachedChapterData;

/// Whether a cache entry is internally consistent.
///
/// A chapter with content always diffs to at least one token, even when
/// nothing changed, so an empty token list alongside a nonzero total is
/// corruption rather than a "no changes" result. Such an entry must never
/// be served or written: served, it would silently render a chapter as
/// having no text at all.
pub fn entry_is_valid(entry: &CachedChapterData) -> bool {
    !(entry.diff_tokens.is_empty() && entry.total_chars > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterdiff_core::DiffToken;

    fn entry(tokens: Vec<DiffToken>, total_chars: usize) -> CachedChapterData {
        CachedChapterData {
            diff_tokens: tokens,
            change_count: 0,
            loaded_chars: total_chars,
            total_chars,
            fully_loaded: true,
        }
    }

    #[test]
    fn test_empty_tokens_with_content_is_corrupt() {
        assert!(!entry_is_valid(&entry(Vec::new(), 100)));
    }

    #[test]
    fn test_empty_tokens_without_content_is_valid() {
        assert!(entry_is_valid(&entry(Vec::new(), 0)));
    }

    #[test]
    fn test_tokens_with_content_is_valid() {
        assert!(entry_is_valid(&entry(vec![DiffToken::unchanged("text")], 4)));
    }
}
