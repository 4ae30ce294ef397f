//! Directive registry: the ordered set of keyword matchers the parser consults.

use regex::Regex;
use std::sync::Arc;

/// Directive type of the inheritance commitment (`FROM <parent>`).
pub const INHERITANCE_DIRECTIVE: &str = "FROM";
/// Directive type of the teammate list commitment (`TEAM <agents>`).
pub const TEAMMATE_DIRECTIVE: &str = "TEAM";
/// Directive type of the import commitment (`IMPORT <agent>`).
pub const IMPORT_DIRECTIVE: &str = "IMPORT";

/// Directive types whose content may carry agent references.
pub const REFERENCE_DIRECTIVES: [&str; 3] =
    [INHERITANCE_DIRECTIVE, TEAMMATE_DIRECTIVE, IMPORT_DIRECTIVE];

/// Returns true when commitments of this type may reference other agents.
pub fn is_reference_directive(directive_type: &str) -> bool {
    REFERENCE_DIRECTIVES.contains(&directive_type)
}

/// A single directive matcher.
///
/// Both methods receive the trimmed line. Directive semantics are irrelevant
/// to parsing; the parser only asks "does a directive start here" and "what is
/// its inline payload".
pub trait DirectiveMatcher: Send + Sync {
    /// Opaque directive type reported on parsed commitments.
    fn directive_type(&self) -> &str;

    /// Whether the line opens a directive of this type.
    fn match_start(&self, line: &str) -> bool;

    /// Inline payload following the keyword, `None` when the line does not match.
    fn match_full(&self, line: &str) -> Option<String>;
}

/// Keyword-based matcher (`PERSONA ...`, `META IMAGE ...`).
///
/// Keywords are matched case-sensitively; multi-word keywords accept any run
/// of whitespace between their words.
#[derive(Debug, Clone)]
pub struct KeywordDirective {
    directive_type: String,
    start: Regex,
    full: Regex,
}

impl KeywordDirective {
    /// Build a matcher whose directive type is the keyword itself.
    pub fn new(keyword: &str) -> Self {
        Self::with_type(keyword, keyword)
    }

    /// Build a matcher reporting `directive_type` for lines starting with `keyword`.
    pub fn with_type(directive_type: &str, keyword: &str) -> Self {
        let pattern = keyword
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        // Both patterns are built from escaped literals and cannot fail to compile.
        let start = Regex::new(&format!(r"^{pattern}(?:\s|$)"))
            .unwrap_or_else(|_| unreachable!("escaped keyword pattern"));
        let full = Regex::new(&format!(r"(?s)^{pattern}(?:\s+(?P<contents>.*))?$"))
            .unwrap_or_else(|_| unreachable!("escaped keyword pattern"));
        Self {
            directive_type: directive_type.to_string(),
            start,
            full,
        }
    }
}

impl DirectiveMatcher for KeywordDirective {
    fn directive_type(&self) -> &str {
        &self.directive_type
    }

    fn match_start(&self, line: &str) -> bool {
        self.start.is_match(line)
    }

    fn match_full(&self, line: &str) -> Option<String> {
        self.full.captures(line).map(|captures| {
            captures
                .name("contents")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        })
    }
}

/// Ordered list of directive matchers; the first matcher that accepts a line wins.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    matchers: Vec<Arc<dyn DirectiveMatcher>>,
}

/// Default keyword set. Multi-word keywords precede their single-word prefixes.
const STANDARD_KEYWORDS: &[&str] = &[
    "META IMAGE",
    "META LINK",
    "META COLOR",
    "META FONT",
    "META",
    "PERSONA",
    "RULE",
    "RULES",
    "GOAL",
    "KNOWLEDGE",
    "STYLE",
    "SAMPLE",
    "EXAMPLE",
    "FORMAT",
    "MODEL",
    "ACTION",
    "SCENARIO",
    "MEMORY",
    "MESSAGE",
    "INITIAL MESSAGE",
    "USE BROWSER",
    "USE SEARCH ENGINE",
    "NOTE",
    "CLOSED",
    "FROM",
    "IMPORT",
    "TEAM",
];

impl DirectiveRegistry {
    /// Empty registry: nothing is a directive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard keyword set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for keyword in STANDARD_KEYWORDS {
            registry.register(KeywordDirective::new(keyword));
        }
        registry
    }

    /// Append a matcher at the lowest precedence.
    pub fn register<M: DirectiveMatcher + 'static>(&mut self, matcher: M) {
        self.matchers.push(Arc::new(matcher));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<M: DirectiveMatcher + 'static>(mut self, matcher: M) -> Self {
        self.register(matcher);
        self
    }

    /// First matcher whose start pattern accepts the trimmed line.
    pub fn match_start(&self, trimmed_line: &str) -> Option<&dyn DirectiveMatcher> {
        self.matchers
            .iter()
            .map(|matcher| matcher.as_ref())
            .find(|matcher| matcher.match_start(trimmed_line))
    }

    pub fn directive_types(&self) -> Vec<&str> {
        self.matchers.iter().map(|m| m.directive_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("directive_types", &self.directive_types())
            .finish()
    }
}
