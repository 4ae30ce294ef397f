//! Agent name normalization.
//!
//! Names are compared case- and diacritic-insensitively: `"Alice Cooper"`,
//! `"alice_cooper"` and `"Alicé  COOPER"` all normalize to `"alice-cooper"`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize an agent name into its lookup key.
///
/// Letters and digits are kept (lowercased, compatibility-decomposed, without
/// combining marks); every run of other characters collapses into a single
/// `-`, and leading/trailing separators are dropped. Idempotent.
pub fn normalize_agent_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        for lowered in c.to_lowercase() {
            for folded in std::iter::once(lowered).nfkd() {
                if is_combining_mark(folded) {
                    continue;
                }
                if folded.is_alphanumeric() {
                    if pending_separator && !normalized.is_empty() {
                        normalized.push('-');
                    }
                    pending_separator = false;
                    normalized.push(folded);
                } else {
                    pending_separator = true;
                }
            }
        }
    }

    normalized
}
