//! CLI Tooling
//!
//! Command-line interface over a workspace: parse books, inspect their agent
//! references, check that every reference resolves and resolve route targets.

use crate::commitment::{parse_agent_source, DirectiveRegistry};
use crate::config::{BookConfig, ConfigLoader};
use crate::diagnostics::{compute_reference_diagnostics, locate_reference_tokens};
use crate::error::BookError;
use crate::logging::LoggingConfig;
use crate::registry::DirectoryAgentCollection;
use crate::resolver::{
    extract_embedded_agents, BookScopedAgentReferenceResolver, FederatedResolverFactory,
    HttpFederationClient, ProvideOptions, ResolverCacheProvider,
};
use crate::route::RouteTargetNormalizer;
use crate::tooling::format::{
    format_diagnostics_text, format_parse_result_text, format_resolution_text,
    format_route_target_text, format_tokens_text,
};
use clap::{Parser, Subcommand};
use reqwest::Url;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Agentbook CLI - agent book parsing and reference resolution
#[derive(Parser)]
#[command(name = "agentbook")]
#[command(about = "Parse agent books and resolve references between agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of *.book files serving as the local agent registry
    #[arg(long)]
    pub agents_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings from the config with CLI flags applied on top.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a book and show its commitments
    Parse {
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the agent references of a book's FROM, TEAM and IMPORT commitments
    Tokens {
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Report agent references that do not resolve
    Check {
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve an agent reference to the page it routes to
    Route {
        identifier: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve the references in one directive's content
    Resolve {
        /// Directive type, e.g. TEAM
        directive: String,
        content: String,
    },
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Parse { .. } => "parse",
        Commands::Tokens { .. } => "tokens",
        Commands::Check { .. } => "check",
        Commands::Route { .. } => "route",
        Commands::Resolve { .. } => "resolve",
    }
}

/// Rendered command result and the process exit code it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, exit_code: 0 }
    }

    fn failed(text: String) -> Self {
        Self { text, exit_code: 1 }
    }
}

fn validate_format(format: &str) -> Result<(), BookError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(BookError::ConfigError(format!(
            "Invalid output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// Composition root of the CLI: configuration, local registry, federation
/// client, resolver cache and route normalizer.
pub struct CliContext {
    workspace_root: PathBuf,
    config: BookConfig,
    registry: DirectiveRegistry,
    local_server_url: Url,
    resolver_cache: Arc<ResolverCacheProvider>,
    route_normalizer: RouteTargetNormalizer,
    runtime: tokio::runtime::Runtime,
}

impl CliContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        agents_dir: Option<PathBuf>,
    ) -> Result<Self, BookError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate()?;
        let local_server_url = config.server_url()?;

        let registry = DirectiveRegistry::standard();
        let agents_dir = agents_dir
            .map(|dir| {
                if dir.is_absolute() {
                    dir
                } else {
                    workspace_root.join(dir)
                }
            })
            .unwrap_or_else(|| config.resolve_agents_dir(&workspace_root));
        let collection = Arc::new(DirectoryAgentCollection::new(agents_dir, registry.clone()));

        let client = HttpFederationClient::new(
            config.federation.timeout(),
            &config.federation.agents_endpoint,
        )?;
        let factory = FederatedResolverFactory::new(
            collection,
            Arc::new(config.federated_servers.clone()),
            Arc::new(client),
            local_server_url.clone(),
        )
        .with_fetch_timeout(config.federation.timeout());
        let resolver_cache = Arc::new(
            ResolverCacheProvider::new(Arc::new(factory)).with_ttl(config.resolver_cache_ttl()),
        );
        let route_normalizer =
            RouteTargetNormalizer::new(resolver_cache.clone(), local_server_url.clone());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            workspace_root,
            config,
            registry,
            local_server_url,
            resolver_cache,
            route_normalizer,
            runtime,
        })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Run one command.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, BookError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, BookError> {
        match command {
            Commands::Parse { file, format } => self.handle_parse(file, format),
            Commands::Tokens { file, format } => self.handle_tokens(file, format),
            Commands::Check { file, format } => self.handle_check(file, format),
            Commands::Route { identifier, format } => self.handle_route(identifier, format),
            Commands::Resolve { directive, content } => self.handle_resolve(directive, content),
        }
    }

    fn read_book(&self, file: &Path) -> Result<String, BookError> {
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.workspace_root.join(file)
        };
        std::fs::read_to_string(&path)
            .map_err(|e| BookError::IoError(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn handle_parse(&self, file: &Path, format: &str) -> Result<CommandOutput, BookError> {
        validate_format(format)?;
        let source = self.read_book(file)?;
        let result = parse_agent_source(&source, &self.registry);
        let embedded = extract_embedded_agents(&source, &self.registry);

        if format == "json" {
            let value = json!({
                "agentName": result.agent_name,
                "agentNameLineNumber": result.agent_name_line_number,
                "commitments": result.commitments,
                "nonCommitmentLines": result.non_commitment_lines,
                "embeddedAgents": embedded,
            });
            return Ok(CommandOutput::ok(serde_json::to_string_pretty(&value)?));
        }
        Ok(CommandOutput::ok(format_parse_result_text(&result, &embedded)))
    }

    fn handle_tokens(&self, file: &Path, format: &str) -> Result<CommandOutput, BookError> {
        validate_format(format)?;
        let source = self.read_book(file)?;
        let located = locate_reference_tokens(&source, &self.registry);
        if format == "json" {
            return Ok(CommandOutput::ok(serde_json::to_string_pretty(&located)?));
        }
        Ok(CommandOutput::ok(format_tokens_text(&located)))
    }

    fn handle_check(&self, file: &Path, format: &str) -> Result<CommandOutput, BookError> {
        validate_format(format)?;
        let source = self.read_book(file)?;
        let parent_identifier = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let report = self.runtime.block_on(async {
            let fallback = self.resolver_cache.provide(ProvideOptions::default()).await?;
            let scoped = BookScopedAgentReferenceResolver::from_book(
                &parent_identifier,
                &source,
                &self.registry,
                self.local_server_url.clone(),
                fallback,
            );
            Ok::<_, BookError>(compute_reference_diagnostics(&source, &self.registry, &scoped).await)
        })?;

        let text = if format == "json" {
            serde_json::to_string_pretty(&report)?
        } else {
            format_diagnostics_text(&file.display().to_string(), &report)
        };
        Ok(if report.is_clean() {
            CommandOutput::ok(text)
        } else {
            CommandOutput::failed(text)
        })
    }

    fn handle_route(&self, identifier: &str, format: &str) -> Result<CommandOutput, BookError> {
        validate_format(format)?;
        let target = self
            .runtime
            .block_on(self.route_normalizer.resolve(identifier));

        let text = if format == "json" {
            serde_json::to_string_pretty(&json!({
                "identifier": identifier,
                "target": target,
            }))?
        } else {
            format_route_target_text(identifier, target.as_ref())
        };
        Ok(match target {
            Some(_) => CommandOutput::ok(text),
            None => CommandOutput::failed(text),
        })
    }

    fn handle_resolve(&self, directive: &str, content: &str) -> Result<CommandOutput, BookError> {
        let (resolved, issues) = self.runtime.block_on(async {
            let resolver = self.resolver_cache.provide(ProvideOptions::default()).await?;
            // Drain stale issues; one command runs at a time on the shared resolver.
            resolver.consume_resolution_issues();
            let resolved = resolver.resolve_directive_content(directive, content).await;
            Ok::<_, BookError>((resolved, resolver.consume_resolution_issues()))
        })?;
        Ok(CommandOutput::ok(format_resolution_text(&resolved, &issues)))
    }
}
