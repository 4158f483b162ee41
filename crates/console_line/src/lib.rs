//! Headless line tokenizer shared by the dispatch engine and completion pipeline.
//!
//! This crate intentionally implements only the small grammar the console core needs:
//! quote/escape-aware word splitting with byte offsets, first-word extraction, and locating
//! the word under a cursor.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One word of a split line, with its byte span in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Word text with quoting and escapes resolved.
    pub text: String,
    /// Byte offset of the first character of the word (including an opening quote).
    pub start: usize,
    /// Byte offset one past the last character of the word.
    pub end: usize,
}

/// Tokenization error for a malformed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LineSplitError {
    /// A quoted segment was never closed.
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    /// The line ended in the middle of an escape sequence.
    #[error("dangling escape sequence")]
    DanglingEscape,
}

/// Splits `line` into words, honoring single/double quotes and backslash escapes.
pub fn split_words(line: &str) -> Result<Vec<Word>, LineSplitError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = None::<usize>;
    let mut end = 0usize;
    let mut quote = None::<char>;
    let mut chars = line.char_indices();

    while let Some((index, ch)) = chars.next() {
        match quote {
            Some(active) if ch == active => {
                quote = None;
                end = index + ch.len_utf8();
            }
            Some(_) if ch == '\\' => {
                let Some((next_index, next)) = chars.next() else {
                    return Err(LineSplitError::DanglingEscape);
                };
                current.push(next);
                end = next_index + next.len_utf8();
            }
            Some(_) => {
                current.push(ch);
                end = index + ch.len_utf8();
            }
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                start.get_or_insert(index);
                end = index + ch.len_utf8();
            }
            None if ch.is_whitespace() => {
                if let Some(word_start) = start.take() {
                    words.push(Word {
                        text: std::mem::take(&mut current),
                        start: word_start,
                        end,
                    });
                }
            }
            None if ch == '\\' => {
                start.get_or_insert(index);
                let Some((next_index, next)) = chars.next() else {
                    return Err(LineSplitError::DanglingEscape);
                };
                current.push(next);
                end = next_index + next.len_utf8();
            }
            None => {
                start.get_or_insert(index);
                current.push(ch);
                end = index + ch.len_utf8();
            }
        }
    }

    if quote.is_some() {
        return Err(LineSplitError::UnterminatedQuote);
    }
    if let Some(word_start) = start.take() {
        words.push(Word {
            text: current,
            start: word_start,
            end,
        });
    }

    Ok(words)
}

/// First whitespace-delimited token of `line`; empty when the line is blank.
///
/// This is the cheap lookup-key extraction used before a full parse; it ignores quoting.
pub fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Last word of a split line, if any.
pub fn last_word(words: &[Word]) -> Option<&Word> {
    words.last()
}

/// The word whose span contains `cursor`, including a cursor sitting just past its end.
pub fn word_at(words: &[Word], cursor: usize) -> Option<&Word> {
    words
        .iter()
        .find(|word| word.start <= cursor && cursor <= word.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(words: &[Word]) -> Vec<&str> {
        words.iter().map(|word| word.text.as_str()).collect()
    }

    #[test]
    fn splits_plain_words_with_offsets() {
        let words = split_words("greet --name Bob").expect("split");
        assert_eq!(texts(&words), ["greet", "--name", "Bob"]);
        assert_eq!(words[0].start, 0);
        assert_eq!(words[0].end, 5);
        assert_eq!(words[2].start, 13);
        assert_eq!(words[2].end, 16);
    }

    #[test]
    fn resolves_quoted_segments() {
        let words = split_words("open \"hello world\"").expect("split");
        assert_eq!(texts(&words), ["open", "hello world"]);
        assert_eq!(words[1].start, 5);
    }

    #[test]
    fn resolves_escaped_whitespace() {
        let words = split_words("open hello\\ world").expect("split");
        assert_eq!(texts(&words), ["open", "hello world"]);
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert_eq!(
            split_words("open \"unterminated"),
            Err(LineSplitError::UnterminatedQuote)
        );
    }

    #[test]
    fn rejects_dangling_escape() {
        assert_eq!(split_words("open trailing\\"), Err(LineSplitError::DanglingEscape));
    }

    #[test]
    fn first_word_handles_blank_lines() {
        assert_eq!(first_word("  greet --name Bob"), "greet");
        assert_eq!(first_word("   "), "");
        assert_eq!(first_word(""), "");
    }

    #[test]
    fn word_at_locates_cursor_word() {
        let words = split_words("greet --na").expect("split");
        assert_eq!(word_at(&words, 8).map(|word| word.text.as_str()), Some("--na"));
        assert_eq!(word_at(&words, 10).map(|word| word.text.as_str()), Some("--na"));
        assert_eq!(last_word(&words).map(|word| word.text.as_str()), Some("--na"));
    }
}
