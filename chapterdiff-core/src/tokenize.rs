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

//! Word/whitespace tokenizer.

#[derive(PartialEq, Clone, Copy)]
enum CharClass {
    Word,
    Whitespace,
    Punctuation,
}

fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Whitespace
    } else if ch.is_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// Split text into word, whitespace, and punctuation tokens.
///
/// Each token is a maximal run of one character class. Keeping whitespace
/// runs as their own tokens means concatenating the result reproduces the
/// input exactly; keeping punctuation separate from words means a trailing
/// period does not make the whole word read as changed. Empty tokens are
/// never produced.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_class = CharClass::Word;

    for ch in text.chars() {
        let class = classify(ch);
        if !current.is_empty() && class != current_class {
            tokens.push(std::mem::take(&mut current));
        }
        current_class = class;
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Whether a token is a whitespace run.
pub(crate) fn is_whitespace_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_sentence() {
        assert_eq!(tokenize("The cat sat."), vec!["The", " ", "cat", " ", "sat", "."]);
    }

    #[test]
    fn test_punctuation_splits_from_words() {
        assert_eq!(tokenize("wait... what?!"), vec!["wait", "...", " ", "what", "?!"]);
        assert_eq!(tokenize("don't"), vec!["don", "'", "t"]);
    }

    #[test]
    fn test_whitespace_runs_preserved() {
        assert_eq!(tokenize("a  b\n\tc"), vec!["a", "  ", "b", "\n\t", "c"]);
    }

    #[test]
    fn test_leading_and_trailing_whitespace() {
        assert_eq!(tokenize("  word  "), vec!["  ", "word", "  "]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_rejoin_is_identity() {
        let text = "  The quick\t\tbrown\nfox  jumps ";
        assert_eq!(tokenize(text).concat(), text);
    }

    #[test]
    fn test_unicode() {
        let text = "café\u{00a0}naïve";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec!["café", "\u{00a0}", "naïve"]);
        assert_eq!(tokens.concat(), text);
    }

    proptest! {
        #[test]
        fn prop_rejoin_reproduces_input(text in "\\PC{0,200}") {
            prop_assert_eq!(tokenize(&text).concat(), text);
        }

        #[test]
        fn prop_no_empty_tokens(text in ".{0,200}") {
            prop_assert!(tokenize(&text).iter().all(|t| !t.is_empty()));
        }
    }
}
