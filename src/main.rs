// ABOUTME: Entry point for the liftoff CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use liftoff::config;
use liftoff::error::Result;
use liftoff::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output.clone()).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let project = || commands::Project::discover(&cwd, &cli);

    match &cli.command {
        Commands::Init {
            application,
            account_id,
            force,
        } => {
            config::init_config(&cwd, application.as_deref(), account_id.as_deref(), *force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::GetTag { version } => {
            commands::get_tag(&project()?, version.as_deref(), &output).await
        }
        Commands::BuildImage { version } => {
            commands::build_image(&project()?, version.as_deref(), output).await
        }
        Commands::PushImage {
            environment,
            version,
        } => commands::push_image(&project()?, environment, version.as_deref(), output).await,
        Commands::Upload {
            environment,
            version,
            force,
            additional_tags,
        } => {
            let options = commands::UploadOptions {
                version: version.clone(),
                force: *force,
                additional_tags: additional_tags.clone(),
            };
            commands::upload(&project()?, environment, options, output).await
        }
        Commands::TaskDefinition {
            environment,
            version,
        } => {
            commands::task_definition(&project()?, environment, version.as_deref(), output).await
        }
        Commands::Deploy {
            environment,
            version,
            force_rebuild,
        } => {
            commands::deploy(
                &project()?,
                environment,
                version.as_deref(),
                *force_rebuild,
                output,
            )
            .await
        }
    }
}
