//! Reference token scanner.
//!
//! Finds `{payload}` and `@identifier` occurrences in directive content. The
//! reported `index`/`length` are character offsets so that diagnostics can
//! map them straight onto editor columns.

use serde::Serialize;
use std::ops::Range;

/// A single reference occurrence within a scanned string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTokenMatch {
    /// Full token text including its wrapper (`{Alice}`, `@alice`).
    pub token: String,
    /// The payload with the wrapper removed and whitespace trimmed.
    pub reference: String,
    /// Zero-based character offset of the token's first character.
    pub index: usize,
    /// Token length in characters.
    pub length: usize,
    /// UTF-8 byte span of the token.
    #[serde(skip)]
    pub byte_range: Range<usize>,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Scan `text` left to right for non-overlapping reference tokens.
pub fn extract_reference_tokens(text: &str) -> Vec<ReferenceTokenMatch> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(text.len());
    let mut matches = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i].1 {
            '\\' => {
                // Escaped character, never a token start.
                i += 2;
            }
            '{' => {
                let mut j = i + 1;
                let mut closing = None;
                while j < chars.len() {
                    match chars[j].1 {
                        '{' => break,
                        '}' => {
                            closing = Some(j);
                            break;
                        }
                        _ => j += 1,
                    }
                }

                let Some(end) = closing else {
                    i += 1;
                    continue;
                };
                let byte_range = byte_at(i)..byte_at(end + 1);
                let token = &text[byte_range.clone()];
                let reference = token[1..token.len() - 1].trim();
                if reference.is_empty() {
                    i += 1;
                    continue;
                }
                matches.push(ReferenceTokenMatch {
                    token: token.to_string(),
                    reference: reference.to_string(),
                    index: i,
                    length: end + 1 - i,
                    byte_range,
                });
                i = end + 1;
            }
            '@' => {
                let follows_word = i > 0 && chars[i - 1].1.is_alphanumeric();
                let mut j = i + 1;
                while j < chars.len() && is_identifier_char(chars[j].1) {
                    j += 1;
                }
                if follows_word || j == i + 1 {
                    i += 1;
                    continue;
                }
                let byte_range = byte_at(i)..byte_at(j);
                let token = &text[byte_range.clone()];
                matches.push(ReferenceTokenMatch {
                    token: token.to_string(),
                    reference: token[1..].to_string(),
                    index: i,
                    length: j - i,
                    byte_range,
                });
                i = j;
            }
            _ => i += 1,
        }
    }

    matches
}

/// Strip a `{…}` or `@` wrapper. Returns the inner text and whether a wrapper was present.
pub fn unwrap_reference(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}') {
        (trimmed[1..trimmed.len() - 1].trim(), true)
    } else if let Some(rest) = trimmed.strip_prefix('@') {
        (rest.trim(), true)
    } else {
        (trimmed, false)
    }
}
