//! Editor diagnostics for agent references that fail to resolve.
//!
//! Each reference token inside a `FROM`, `TEAM` or `IMPORT` commitment is
//! resolved through the supplied resolver, once per distinct
//! `(directive type, normalized reference)` pair, and every occurrence of a
//! failing pair becomes a ranged diagnostic.

use crate::commitment::{
    is_reference_directive, parse_agent_source, split_lines, DirectiveRegistry,
    INHERITANCE_DIRECTIVE, TEAMMATE_DIRECTIVE,
};
use crate::name::normalize_agent_name;
use crate::reference::extract_reference_tokens;
use crate::resolver::{AgentReferenceResolver, VOID_SENTINEL};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Value of [`ReferenceDiagnostic::source`].
pub const DIAGNOSTIC_SOURCE: &str = "agent-references";

/// One unresolved reference occurrence.
///
/// Lines are 1-based. `start_column` is the 1-based column of the token's
/// opening character; `end_column` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDiagnostic {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: String,
    pub source: String,
    pub commitment_type: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDiagnosticsReport {
    /// Ordered by position.
    pub diagnostics: Vec<ReferenceDiagnostic>,
    /// Distinct unresolved teammate references, in order of first appearance.
    pub missing_references: Vec<String>,
}

impl ReferenceDiagnosticsReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A reference token of a reference commitment with its document range
/// (same conventions as [`ReferenceDiagnostic`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedReference {
    pub commitment_type: String,
    pub token: String,
    pub reference: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl LocatedReference {
    fn key(&self) -> (String, String) {
        let normalized = normalize_agent_name(&self.reference);
        let reference = if normalized.is_empty() {
            self.reference.trim().to_string()
        } else {
            normalized
        };
        (self.commitment_type.clone(), reference)
    }
}

/// Zero-based `(line offset, column)` of every character in `text`.
fn char_positions(text: &str) -> Vec<(usize, usize)> {
    let mut positions = Vec::with_capacity(text.len());
    let (mut line, mut column) = (0, 0);
    for c in text.chars() {
        positions.push((line, column));
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    positions
}

/// Reference tokens of every `FROM`/`TEAM`/`IMPORT` commitment, in document order.
pub fn locate_reference_tokens(source: &str, registry: &DirectiveRegistry) -> Vec<LocatedReference> {
    let lines = split_lines(source);
    let parsed = parse_agent_source(source, registry);
    let mut occurrences = Vec::new();

    for commitment in parsed
        .commitments
        .iter()
        .filter(|c| is_reference_directive(&c.directive_type))
    {
        let first = commitment.line_number - 1;
        let last = commitment.end_line_number.min(lines.len());
        if first >= last {
            continue;
        }
        let text = lines[first..last].join("\n");
        let positions = char_positions(&text);

        for token in extract_reference_tokens(&text) {
            let Some(&(start_offset, start_col)) = positions.get(token.index) else {
                continue;
            };
            let Some(&(end_offset, end_col)) = positions.get(token.index + token.length - 1)
            else {
                continue;
            };
            occurrences.push(LocatedReference {
                commitment_type: commitment.directive_type.clone(),
                token: token.token,
                reference: token.reference,
                start_line: commitment.line_number + start_offset,
                start_column: start_col + 1,
                end_line: commitment.line_number + end_offset,
                end_column: end_col + 2,
            });
        }
    }
    occurrences
}

fn is_failed_output(directive_type: &str, output: &str) -> bool {
    let output = output.trim();
    if directive_type == INHERITANCE_DIRECTIVE {
        output == VOID_SENTINEL
    } else {
        output.is_empty()
    }
}

/// Diagnostics for every unresolved reference in `source`.
pub async fn compute_reference_diagnostics(
    source: &str,
    registry: &DirectiveRegistry,
    resolver: &dyn AgentReferenceResolver,
) -> ReferenceDiagnosticsReport {
    let occurrences = locate_reference_tokens(source, registry);

    // Failure message per key; `None` when the key resolved.
    let mut outcomes: HashMap<(String, String), Option<String>> = HashMap::new();
    for occurrence in &occurrences {
        let key = occurrence.key();
        if outcomes.contains_key(&key) {
            continue;
        }

        // Isolate this resolution from anything queued earlier.
        resolver.consume_resolution_issues();
        let output = resolver
            .resolve_directive_content(&occurrence.commitment_type, &occurrence.token)
            .await;
        let issues = resolver.consume_resolution_issues();

        let outcome = match issues.into_iter().next() {
            Some(issue) => Some(issue.message),
            None if is_failed_output(&occurrence.commitment_type, &output) => Some(format!(
                "Agent \"{}\" could not be resolved.",
                occurrence.reference
            )),
            None => None,
        };
        outcomes.insert(key, outcome);
    }

    let mut report = ReferenceDiagnosticsReport::default();
    let mut missing_seen = HashSet::new();
    for occurrence in occurrences {
        let key = occurrence.key();
        let Some(Some(message)) = outcomes.get(&key) else {
            continue;
        };
        if occurrence.commitment_type == TEAMMATE_DIRECTIVE && missing_seen.insert(key.1.clone()) {
            report.missing_references.push(occurrence.reference.clone());
        }
        report.diagnostics.push(ReferenceDiagnostic {
            start_line: occurrence.start_line,
            start_column: occurrence.start_column,
            end_line: occurrence.end_line,
            end_column: occurrence.end_column,
            message: message.clone(),
            source: DIAGNOSTIC_SOURCE.to_string(),
            commitment_type: occurrence.commitment_type,
            reference: occurrence.reference,
        });
    }

    report
        .diagnostics
        .sort_by_key(|d| (d.start_line, d.start_column));
    debug!(
        diagnostics = report.diagnostics.len(),
        missing = report.missing_references.len(),
        "Computed reference diagnostics"
    );
    report
}
