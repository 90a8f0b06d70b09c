//! mcpchat terminal front-end

mod commands;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use mcpchat_core::config::FileConfigProvider;
use mcpchat_core::logging::{ConsoleLogger, Logger};
use mcpchat_core::model::{AzureOpenAiClient, ModelClient};
use mcpchat_core::secrets::{EnvSecretStore, SecretStore};
use mcpchat_core::tools::{ToolFilter, ToolRegistry};
use mcpchat_core::{ChatSession, ConfigFile, McpTransport, PostToolPolicy, SurfaceKind, SurfacedMessage};
use mcpchat_catalog::CatalogToolSession;
use mcpchat_postgres::PostgresToolSession;

use commands::{Command, USAGE};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Show tool results as they are
    Direct,
    /// Let the model summarize tool results
    Summarized,
}

impl From<PolicyArg> for PostToolPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Direct => PostToolPolicy::Direct,
            PolicyArg::Summarized => PostToolPolicy::Summarized,
        }
    }
}

#[derive(Parser)]
#[command(name = "mcpchat")]
#[command(about = "Chat with an LLM that can call tools on MCP servers, PostgreSQL and OpenMetadata")]
#[command(version)]
struct Cli {
    /// Workspace root holding .config/mcpchat/config.yaml
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// PostgreSQL connection string, overriding DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Skip the built-in PostgreSQL tools
    #[arg(long)]
    no_postgres: bool,

    /// Skip the built-in OpenMetadata catalog tools
    #[arg(long)]
    no_catalog: bool,

    /// What to do with tool results
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new().verbose(cli.verbose));
    let secrets: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::new());

    let config = FileConfigProvider::load_merged(
        &FileConfigProvider::user(),
        &FileConfigProvider::workspace(&cli.workspace),
    )
    .context("Failed to load configuration")?;

    let mut chat = build_session(&cli, &config, secrets.as_ref(), logger.clone());

    println!("mcpchat {}. Type /help for commands.", env!("CARGO_PKG_VERSION"));
    for notice in chat.startup_notices() {
        show(&notice);
    }

    if !cli.no_postgres && config.database.is_enabled() {
        match PostgresToolSession::from_config(
            cli.database_url.as_deref(),
            &config.database,
            secrets.clone(),
            logger.clone(),
        ) {
            Ok(session) => show(&chat.connect_provider(mcpchat_postgres::PROVIDER_NAME, Arc::new(session)).await),
            Err(e) => show(&SurfacedMessage::notice(format!("PostgreSQL tools unavailable: {}", e))),
        }
    }

    if !cli.no_catalog && config.catalog.is_enabled() {
        let session = CatalogToolSession::new(config.catalog.clone(), secrets.clone(), logger.clone());
        // Without host and credentials the catalog is only offered when asked for.
        if session.is_configured() || config.catalog.enabled == Some(true) {
            show(&chat.connect_provider(mcpchat_catalog::PROVIDER_NAME, Arc::new(session)).await);
        }
    }

    for (name, transport) in &config.mcp_servers {
        show(&chat.connect_mcp_server(name, transport).await);
    }

    run_loop(&mut chat).await
}

/// Build the chat session, degrading when the model cannot be configured
fn build_session(
    cli: &Cli,
    config: &ConfigFile,
    secrets: &dyn SecretStore,
    logger: Arc<dyn Logger>,
) -> ChatSession {
    let registry = Arc::new(ToolRegistry::new(logger.clone()));

    let model = config
        .llm
        .resolve(secrets)
        .map_err(|e| e.to_string())
        .and_then(|azure| AzureOpenAiClient::new(azure, logger.clone()).map_err(|e| e.to_string()));

    let chat = match model {
        Ok(client) => {
            let client: Arc<dyn ModelClient> = Arc::new(client);
            ChatSession::new(registry, client, logger)
        }
        Err(problem) => ChatSession::degraded(registry, problem, logger),
    };

    let policy = cli.policy.map(PostToolPolicy::from).unwrap_or_else(|| config.dispatch.policy());
    let chat = chat
        .with_policy(policy)
        .with_call_timeout(config.dispatch.call_timeout())
        .with_disabled_tools(config.dispatch.disabled_tools());

    match &config.llm.system_prompt {
        Some(prompt) => chat.with_system_prompt(prompt.clone()),
        None => chat,
    }
}

async fn run_loop(chat: &mut ChatSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{}", usage);
                continue;
            }
        };

        match command {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{}", USAGE),
            Command::Tools => list_tools(chat.registry()),
            Command::History => {
                for message in chat.history() {
                    println!("{}: {}", message.role, message.text().unwrap_or("<tool calls>"));
                }
            }
            Command::Connect { name, command, args } => {
                let transport = McpTransport::stdio(command, args);
                show(&chat.connect_mcp_server(&name, &transport).await);
            }
            Command::Disconnect { name } => show(&chat.disconnect_provider(&name)),
            Command::Enable { tool } => show(&chat.set_tool_enabled(&tool, true)),
            Command::Disable { tool } => show(&chat.set_tool_enabled(&tool, false)),
            Command::Message(text) => match chat.handle_user_message(&text).await {
                Ok(report) => report.replies.iter().for_each(show),
                Err(e) => show(&SurfacedMessage::error(e.to_string())),
            },
        }
    }

    Ok(())
}

fn list_tools(registry: &ToolRegistry) {
    let tools = registry.get_tools(&ToolFilter::all());
    if tools.is_empty() {
        println!("No tools connected.");
        return;
    }
    for tool in tools {
        let state = if tool.enabled { "" } else { " (disabled)" };
        println!("[{}] {}{}: {}", tool.provider, tool.name, state, tool.description);
    }
}

fn show(message: &SurfacedMessage) {
    match message.kind {
        SurfaceKind::Assistant => println!("\n{}\n", message.content),
        SurfaceKind::ToolResult => println!("\n[{}]\n{}\n", message.author, message.content),
        SurfaceKind::ToolFailure => eprintln!("\n[{}] failed: {}\n", message.author, message.content),
        SurfaceKind::Notice => println!("{}", message.content),
        SurfaceKind::Error => eprintln!("Error: {}", message.content),
    }
}
