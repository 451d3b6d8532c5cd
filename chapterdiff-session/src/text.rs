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

//! Character-offset helpers for prefix truncation and sparse-change
//! expansion. All offsets are in characters, not bytes, so slicing stays
//! on UTF-8 boundaries.

/// Byte index of the `chars`-th character, or `None` when the string is
/// shorter than that.
pub(crate) fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    let mut seen = 0usize;
    for (index, _) in s.char_indices() {
        if seen == chars {
            return Some(index);
        }
        seen += 1;
    }
    // One past the last character is the end of the string.
    (seen == chars).then_some(s.len())
}

/// First `chars` characters of `s`; the whole string when shorter.
pub(crate) fn take_chars(s: &str, chars: usize) -> &str {
    match byte_offset(s, chars) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Characters `start..end` of `s`, or `None` when out of bounds.
pub(crate) fn char_range(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let start_byte = byte_offset(s, start)?;
    let end_byte = byte_offset(s, end)?;
    Some(&s[start_byte..end_byte])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_ascii() {
        assert_eq!(take_chars("hello world", 5), "hello");
        assert_eq!(take_chars("hi", 5), "hi");
        assert_eq!(take_chars("hi", 0), "");
    }

    #[test]
    fn test_take_chars_multibyte() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_char_range() {
        assert_eq!(char_range("hello", 1, 4), Some("ell"));
        assert_eq!(char_range("héllo", 1, 2), Some("é"));
        assert_eq!(char_range("abc", 0, 3), Some("abc"));
        assert_eq!(char_range("abc", 2, 2), Some(""));
        assert_eq!(char_range("abc", 2, 4), None);
        assert_eq!(char_range("abc", 3, 2), None);
    }
}
