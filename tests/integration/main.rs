//! Integration tests for agent book parsing and reference resolution

mod book_scoped_routing;
mod cache_provider;
mod cli_parse;
mod diagnostics_scenarios;
mod directory_registry;
mod properties;
mod resolution_scenarios;
mod support;
