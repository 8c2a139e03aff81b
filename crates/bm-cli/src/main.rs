mod commands;

use clap::{Parser, Subcommand};
use commands::{ExportArgs, InspectArgs, PreviewArgs};

/// Boletim Maker developer tool: export and inspect saved projects
#[derive(Parser, Debug)]
#[command(name = "boletim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a four-page project to a two-sheet booklet PDF
    Export(ExportArgs),

    /// Write the low-resolution sheet previews as JPEG files
    Preview(PreviewArgs),

    /// Summarize a project's pages and widgets
    Inspect(InspectArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Export(args) => runtime.block_on(commands::export(args)),
        Command::Preview(args) => runtime.block_on(commands::preview(args)),
        Command::Inspect(args) => commands::inspect(args),
    }
}
