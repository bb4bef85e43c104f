mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docpress")]
#[command(version, about = "Static site generator for documentation", long_about = None)]
struct Cli {
    /// Show debug logs (overridden by DOCPRESS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Build the site into the output directory
    Build {
        /// Path to the project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output directory, overriding docpress.toml
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Skip server rendering; every page renders on the client
        #[arg(long)]
        no_ssg: bool,
    },

    /// Build, then serve the output locally
    Preview {
        /// Path to the project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Rebuild and reload the browser when sources change
        #[arg(short, long)]
        watch: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("DOCPRESS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            path,
            out_dir,
            no_ssg,
        } => {
            let options = commands::build::BuildOptions {
                out_dir,
                ssg: if no_ssg { Some(false) } else { None },
            };
            commands::build::run(path, options).await
        }
        Command::Preview { path, port, watch } => commands::preview::run(path, port, watch).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "docpress", &mut io::stdout());
            Ok(())
        }
    }
}
