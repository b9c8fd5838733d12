use clap::{Parser, Subcommand, ValueEnum};

use quarry::app::{self, ConsumerKind};

#[derive(Parser, Debug)]
#[command(name = "quarry", version, about = "Message-driven crawl-and-analyze pipeline workers")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one consumer process bound to its pipeline queue.
    Consume {
        #[arg(value_enum)]
        stage: StageArg,
    },
    /// Publish a pipeline seed message.
    Seed {
        #[command(subcommand)]
        seed: SeedCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StageArg {
    /// analysis.filesize — tarball size measurement
    Filesize,
    /// analysis.pdepend — pDepend source analysis
    Pdepend,
}

#[derive(Subcommand, Debug)]
enum SeedCommand {
    /// Seed a Gitweb server crawl for one project.
    Gitweb {
        #[arg(long, default_value = "TYPO3")]
        project: String,
    },
}

#[tokio::main]
async fn main() {
    // Default level = INFO for this crate, WARN for everything else.
    // Override at runtime via RUST_LOG, e.g. RUST_LOG=quarry=debug,lapin=warn.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quarry=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Consume { stage } => {
            let kind = match stage {
                StageArg::Filesize => ConsumerKind::Filesize,
                StageArg::Pdepend => ConsumerKind::PDepend,
            };
            app::run_consumer(&cli.config, kind).await
        }
        Command::Seed {
            seed: SeedCommand::Gitweb { project },
        } => app::run_seed_gitweb(&cli.config, &project).await,
    };

    if let Err(e) = result {
        tracing::error!("❌ fatal: {e}");
        std::process::exit(1);
    }
}
