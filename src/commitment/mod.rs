//! Commitments: typed, keyword-introduced blocks of an agent book.

mod parser;
mod registry;

pub use parser::{is_horizontal_rule, parse_agent_source, AgentSourceParseResult, ParsedCommitment};
pub(crate) use parser::split_lines;
pub use registry::{
    is_reference_directive, DirectiveMatcher, DirectiveRegistry, KeywordDirective,
    IMPORT_DIRECTIVE, INHERITANCE_DIRECTIVE, REFERENCE_DIRECTIVES, TEAMMATE_DIRECTIVE,
};
