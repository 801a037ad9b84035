use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use seatwatch_cli::commands::{self, check::CheckArgs};

#[derive(Parser)]
#[command(name = "seatwatch")]
#[command(author, version)]
#[command(
    about = "Watch a cascading course form for open seat batches",
    long_about = "Seatwatch drives a Chrome instance through a cascading region / centre / course \
                  form, reads the availability table behind each course, and reports batches with \
                  open seats to the terminal and optionally to Telegram."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check of the configured form and report the results
    Check(CheckArgs),

    /// Locate the Chrome binary a check would launch
    Chrome {
        /// Path to Chrome binary (overrides auto-detection)
        #[arg(long)]
        chrome_path: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(after_long_help = COMPLETION_HELP)]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

const COMPLETION_HELP: &str = "\
SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    Bash (add to ~/.bashrc):
        eval \"$(seatwatch completion --shell bash)\"

    Zsh (add to ~/.zshrc):
        eval \"$(seatwatch completion --shell zsh)\"

    Fish:
        seatwatch completion --shell fish > ~/.config/fish/completions/seatwatch.fish
";

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Check(args) => commands::check::execute(args),
        Commands::Chrome { chrome_path } => commands::chrome::execute(chrome_path),
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "seatwatch=debug,seatwatch_cli=debug,seatwatch_core=debug,seatwatch_browser=debug,seatwatch_notify=debug",
        )
    } else {
        EnvFilter::new(
            "seatwatch=info,seatwatch_cli=info,seatwatch_core=info,seatwatch_browser=info,seatwatch_notify=info",
        )
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
