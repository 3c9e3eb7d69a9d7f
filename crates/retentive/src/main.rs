mod cli;
mod commands;

use clap::Parser;
use cli::{CheckpointAction, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Status => commands::status::run(),
        Commands::Monitor { once, interval_ms } => commands::monitor::run(once, interval_ms),
        Commands::Truncate {
            file,
            max_bytes,
            content_type,
        } => commands::truncate::run(&file, max_bytes, content_type.as_deref()),
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Save {
                input,
                output,
                blob_dir,
            } => commands::checkpoint::save(&input, &output, blob_dir.as_deref()),
            CheckpointAction::Restore {
                input,
                output,
                blob_dir,
            } => commands::checkpoint::restore(&input, &output, blob_dir.as_deref()),
        },
        Commands::Blobs { dir, verify } => commands::blobs::run(dir.as_deref(), verify),
        Commands::Analyze { file } => commands::analyze::run(&file),
        Commands::Adapt {
            file,
            pressure,
            provider,
        } => commands::adapt::run(&file, pressure, &provider),
        Commands::Report { file, blob_dir } => commands::report::run(&file, blob_dir.as_deref()),
        Commands::Diagnostic => commands::diagnostic::run(),
        Commands::Version => commands::version::run(),
    }
}
