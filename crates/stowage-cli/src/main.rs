//! CLI entry point - the composition root.
//!
//! Infrastructure is wired together only through [`bootstrap`]; command
//! dispatch routes to handlers.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use stowage_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::resolve(cli.store_dir.as_deref(), &cli.session)?;
    let ctx = bootstrap(config).await?;

    let result = match command {
        Commands::Paths => handlers::paths::execute(&ctx).await,
        Commands::Download { url, name, detach } => {
            handlers::download::execute(&ctx, &url, name, detach).await
        }
        Commands::Resume => handlers::resume::execute(&ctx).await,
        Commands::Path { name } => handlers::files::path(&ctx, &name).await,
        Commands::Remove { name } => handlers::files::remove(&ctx, &name).await,
        Commands::Image(command) => handlers::image::execute(&ctx, command),
    };

    ctx.shutdown().await;
    result
}
