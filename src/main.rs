use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use xfx::ThemeAction;
use xfx::core::Theme;
use xfx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeMode {
    Light,
    Dark,
    Toggle,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount using the remembered currency pair
    Convert {
        /// Amount to convert, thousands separators allowed
        #[arg(allow_hyphen_values = true)]
        amount: Option<String>,
        /// Source currency code
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Swap the remembered source and target currencies
    Swap,
    /// List available currencies
    Currencies,
    /// Show recent conversions
    History,
    /// Show or change the color theme
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },
    /// Start an interactive conversion session
    Session,
}

impl From<Commands> for xfx::AppCommand {
    fn from(cmd: Commands) -> xfx::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => xfx::AppCommand::Convert { amount, from, to },
            Commands::Swap => xfx::AppCommand::Swap,
            Commands::Currencies => xfx::AppCommand::Currencies,
            Commands::History => xfx::AppCommand::History,
            Commands::Theme { mode } => xfx::AppCommand::Theme(match mode {
                None => ThemeAction::Show,
                Some(ThemeMode::Light) => ThemeAction::Set(Theme::Light),
                Some(ThemeMode::Dark) => ThemeAction::Set(Theme::Dark),
                Some(ThemeMode::Toggle) => ThemeAction::Toggle,
            }),
            Commands::Session => xfx::AppCommand::Session,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xfx::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => xfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
