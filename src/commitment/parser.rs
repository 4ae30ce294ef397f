//! Commitment parser.
//!
//! Turns a book (plain-text agent source) into its agent name, the ordered
//! list of commitments and the lines that belong to no commitment. Parsing is
//! total: it never fails, malformed input only yields fewer commitments.

use super::registry::DirectiveRegistry;
use serde::{Deserialize, Serialize};

/// One keyword-introduced block of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommitment {
    /// Opaque directive type reported by the matching directive.
    #[serde(rename = "type")]
    pub directive_type: String,
    /// Inline payload plus continuation lines, trimmed.
    pub content: String,
    /// 1-based line of the directive keyword.
    pub line_number: usize,
    /// 1-based last line owned by this commitment (inclusive).
    pub end_line_number: usize,
    /// The untouched directive line.
    pub original_line: String,
}

/// Result of [`parse_agent_source`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSourceParseResult {
    pub agent_name: Option<String>,
    pub agent_name_line_number: Option<usize>,
    pub commitments: Vec<ParsedCommitment>,
    pub non_commitment_lines: Vec<String>,
}

/// Whether a line is a horizontal rule: three or more of the same `-`, `_` or
/// `*`, optionally separated by spaces or tabs.
pub fn is_horizontal_rule(line: &str) -> bool {
    let mut marker = None;
    let mut count = 0;
    for c in line.chars() {
        match c {
            ' ' | '\t' => continue,
            '-' | '_' | '*' => match marker {
                None => {
                    marker = Some(c);
                    count = 1;
                }
                Some(m) if m == c => count += 1,
                Some(_) => return false,
            },
            _ => return false,
        }
    }
    count >= 3
}

/// Split a source into lines, tolerating `\r\n` endings.
pub(crate) fn split_lines(source: &str) -> Vec<&str> {
    source
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

struct OpenCommitment {
    directive_type: String,
    line_number: usize,
    original_line: String,
    lines: Vec<String>,
}

impl OpenCommitment {
    fn close(self, end_line_number: usize) -> ParsedCommitment {
        ParsedCommitment {
            directive_type: self.directive_type,
            content: self.lines.join("\n").trim().to_string(),
            line_number: self.line_number,
            end_line_number,
            original_line: self.original_line,
        }
    }
}

enum ParserState {
    SeekingName,
    OutsideCommitment,
    InCommitment(OpenCommitment),
}

/// Parse a book into agent name, commitments and non-commitment lines.
pub fn parse_agent_source(source: &str, registry: &DirectiveRegistry) -> AgentSourceParseResult {
    let mut result = AgentSourceParseResult::default();
    let mut state = ParserState::SeekingName;
    let lines = split_lines(source);
    let total_lines = lines.len();

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();

        state = match state {
            ParserState::SeekingName => {
                if trimmed.is_empty() {
                    ParserState::SeekingName
                } else if is_horizontal_rule(trimmed) {
                    result.non_commitment_lines.push(line.to_string());
                    ParserState::SeekingName
                } else if registry.match_start(trimmed).is_some() {
                    // Directive-looking lines before the agent name are dropped.
                    ParserState::SeekingName
                } else {
                    result.agent_name = Some(trimmed.to_string());
                    result.agent_name_line_number = Some(line_number);
                    ParserState::OutsideCommitment
                }
            }
            current if is_horizontal_rule(trimmed) => {
                if let ParserState::InCommitment(open) = current {
                    result.commitments.push(open.close(line_number - 1));
                }
                result.non_commitment_lines.push(line.to_string());
                ParserState::OutsideCommitment
            }
            current => match registry.match_start(trimmed) {
                Some(matcher) => {
                    if let ParserState::InCommitment(open) = current {
                        result.commitments.push(open.close(line_number - 1));
                    }
                    let inline = matcher.match_full(trimmed).unwrap_or_default();
                    ParserState::InCommitment(OpenCommitment {
                        directive_type: matcher.directive_type().to_string(),
                        line_number,
                        original_line: line.to_string(),
                        lines: vec![inline],
                    })
                }
                None => match current {
                    ParserState::InCommitment(mut open) => {
                        open.lines.push(line.to_string());
                        ParserState::InCommitment(open)
                    }
                    other => {
                        result.non_commitment_lines.push(line.to_string());
                        other
                    }
                },
            },
        };
    }

    if let ParserState::InCommitment(open) = state {
        result.commitments.push(open.close(total_lines));
    }

    result
}
