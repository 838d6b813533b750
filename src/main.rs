use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use clarion_language_server::config::IndexConfig;
use clarion_language_server::logging::init_logger;
use clarion_language_server::lsp::{ClarionBackend, Workspace};
use clarion_language_server::project::InMemoryIndex;

#[derive(Parser)]
#[command(name = "clarion-language-server")]
#[command(about = "Language server for Clarion sources: outline, folding, links and go-to-definition")]
#[command(version)]
struct Args {
    /// Log filter for stderr, e.g. "debug" or "clarion_language_server=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log file
    #[arg(long)]
    no_file_log: bool,

    /// JSON index configuration (projects, search and redirection paths)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workspace root used when neither --config nor initializationOptions are given
    #[arg(long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)
        .context("Failed to initialize logging")?;

    let startup_config = match (&args.config, &args.root) {
        (Some(path), _) => Some(
            IndexConfig::load(path).with_context(|| format!("Failed to load configuration {:?}", path))?,
        ),
        (None, Some(root)) => Some(IndexConfig::for_workspace_root(root)),
        (None, None) => None,
    };
    info!(
        "Starting clarion-language-server {} (config: {:?})",
        env!("CARGO_PKG_VERSION"),
        args.config
    );

    let workspace = Arc::new(Workspace::new(Arc::new(InMemoryIndex::new())));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| ClarionBackend::new(client, workspace.clone(), startup_config.clone()));

    Server::new(stdin, stdout, socket).serve(service).await;
    info!("Server stopped");
    Ok(())
}
