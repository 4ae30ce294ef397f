//! Format parse results, reference tokens, diagnostics and route targets as text.

use crate::commitment::AgentSourceParseResult;
use crate::diagnostics::{LocatedReference, ReferenceDiagnosticsReport};
use crate::resolver::{AgentReferenceResolutionIssue, EmbeddedAgent};
use crate::route::RouteTarget;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Longest commitment content shown in a table cell.
const CONTENT_PREVIEW_CHARS: usize = 60;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn preview(content: &str) -> String {
    let single_line = content.replace('\n', " ⏎ ");
    if single_line.chars().count() <= CONTENT_PREVIEW_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(CONTENT_PREVIEW_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

/// Agent name, commitments table and embedded agents.
pub fn format_parse_result_text(result: &AgentSourceParseResult, embedded: &[EmbeddedAgent]) -> String {
    let mut out = String::new();
    match (&result.agent_name, result.agent_name_line_number) {
        (Some(name), Some(line)) => {
            out.push_str(&format!("{} {} (line {})\n\n", "Agent:".bold(), name, line))
        }
        _ => out.push_str(&format!("{}\n\n", "No agent name found".yellow())),
    }

    out.push_str(&format!("{}\n", format_section_heading("Commitments")));
    if result.commitments.is_empty() {
        out.push_str("  (none)\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Lines", "Type", "Content"]);
        for commitment in &result.commitments {
            let lines = if commitment.end_line_number > commitment.line_number {
                format!("{}-{}", commitment.line_number, commitment.end_line_number)
            } else {
                commitment.line_number.to_string()
            };
            table.add_row(vec![
                lines,
                commitment.directive_type.clone(),
                preview(&commitment.content),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !embedded.is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Embedded agents")));
        for agent in embedded {
            out.push_str(&format!(
                "  {} ({}, line {})\n",
                agent.agent_name, agent.normalized_name, agent.start_line
            ));
        }
    }
    out
}

pub fn format_tokens_text(located: &[LocatedReference]) -> String {
    if located.is_empty() {
        return "No agent references found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Position", "Type", "Token", "Reference"]);
    for reference in located {
        table.add_row(vec![
            format!("{}:{}", reference.start_line, reference.start_column),
            reference.commitment_type.clone(),
            reference.token.clone(),
            reference.reference.clone(),
        ]);
    }
    table.to_string()
}

/// One `path:line:col` line per diagnostic, then the missing teammates.
pub fn format_diagnostics_text(path: &str, report: &ReferenceDiagnosticsReport) -> String {
    if report.is_clean() {
        return format!("{} {}", "✓".green(), "All agent references resolve.");
    }

    let mut out = String::new();
    for diagnostic in &report.diagnostics {
        out.push_str(&format!(
            "{}:{}:{}: {} [{}] {}\n",
            path,
            diagnostic.start_line,
            diagnostic.start_column,
            "error".red().bold(),
            diagnostic.commitment_type,
            diagnostic.message
        ));
    }
    if !report.missing_references.is_empty() {
        out.push_str(&format!(
            "\n{} {}\n",
            "Missing teammates:".yellow(),
            report.missing_references.join(", ")
        ));
    }
    out.push_str(&format!(
        "\n{} unresolved reference(s)",
        report.diagnostics.len()
    ));
    out
}

pub fn format_route_target_text(identifier: &str, target: Option<&RouteTarget>) -> String {
    match target {
        Some(RouteTarget::Local {
            canonical_id,
            canonical_url,
        }) => format!("{} {} → {} ({})", "local".green(), identifier, canonical_url, canonical_id),
        Some(RouteTarget::Remote { url }) => {
            format!("{} {} → {}", "remote".cyan(), identifier, url)
        }
        None => format!("{} No route for '{}'", "✗".red(), identifier),
    }
}

pub fn format_resolution_text(resolved: &str, issues: &[AgentReferenceResolutionIssue]) -> String {
    let mut out = resolved.to_string();
    for issue in issues {
        out.push_str(&format!(
            "\n{} {} ({})",
            "warning:".yellow().bold(),
            issue.message,
            issue.token
        ));
    }
    out
}
