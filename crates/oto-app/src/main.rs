use anyhow::Result;
use clap::Parser;
use oto_core::config::AppConfig;

pub mod capture;
pub mod cli;
pub mod train;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    // 3. Charger la config
    let config = resolve_config(&cli)?;

    // 4. Dispatcher la sous-commande
    let result = match &cli.command {
        cli::Command::Capture { port, output } => {
            let mut capture_config = config.capture;
            if let Some(port) = port {
                capture_config.port.clone_from(port);
            }
            if let Some(output) = output {
                capture_config.output.clone_from(output);
            }
            capture_config.validate()?;
            capture::run_capture(&capture_config)
        }
        cli::Command::Train { data_dir, model } => {
            let mut train_config = config.train;
            if let Some(data_dir) = data_dir {
                train_config.data_dir.clone_from(data_dir);
            }
            if let Some(model) = model {
                train_config.model_path.clone_from(model);
            }
            train_config.validate()?;
            train::run_train(&train_config)
        }
        cli::Command::Predict { file, model } => {
            let mut train_config = config.train;
            if let Some(model) = model {
                train_config.model_path.clone_from(model);
            }
            train::run_predict(&train_config, file)
        }
    };

    // 5. Journaliser la faute avant de sortir (le port série, lui, est déjà
    // rendu par le drop de la boucle de capture)
    if let Err(ref e) = result {
        log::error!("Erreur fatale : {e:#}");
    }
    result
}

/// Resolve config: file if present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<AppConfig> {
    if cli.config.exists() {
        oto_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(AppConfig::default())
    }
}
