pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::cli::theme::ThemeAction;
use crate::core::config::AppConfig;
use crate::core::{ConversionEngine, PreferenceStore};
use crate::providers::FrankfurterProvider;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    Swap,
    Currencies,
    History,
    Theme(ThemeAction),
    Session,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let prefs = PreferenceStore::new(store::open_collection(&data_path));
    let mut engine = ConversionEngine::new(prefs, config.defaults.pair());
    let provider = Arc::new(FrankfurterProvider::new(
        &config.providers.frankfurter.base_url,
    ));

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(
                &mut engine,
                provider.as_ref(),
                amount.as_deref(),
                from.as_deref(),
                to.as_deref(),
            )
            .await
        }
        AppCommand::Swap => cli::swap::run(&mut engine),
        AppCommand::Currencies => cli::currencies::run(&mut engine, provider.as_ref()).await,
        AppCommand::History => {
            println!(
                "{}",
                cli::history::render_history(engine.history(), engine.theme())
            );
            Ok(())
        }
        AppCommand::Theme(action) => cli::theme::run(&mut engine, action),
        AppCommand::Session => {
            let session = cli::session::Session::new(engine, provider, std::io::stdout());
            session.run(BufReader::new(tokio::io::stdin())).await?;
            Ok(())
        }
    }
}
