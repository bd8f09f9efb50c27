use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// otolith : capture série PCM, débruitage et classification sonore.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/otolith.toml.
    #[arg(short, long, default_value = "config/otolith.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Sous-commandes de l'outil.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture le flux série, filtre et enregistre en WAV.
    Capture {
        /// Port série (prioritaire sur la config).
        #[arg(long)]
        port: Option<String>,

        /// Fichier WAV de sortie (prioritaire sur la config).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Entraîne le classifieur SVM sur un dossier de WAV étiquetés.
    Train {
        /// Dossier des fichiers `label_*.wav` (prioritaire sur la config).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Fichier du modèle produit (prioritaire sur la config).
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Classe un fichier WAV avec un modèle sauvegardé.
    Predict {
        /// Fichier WAV à classer.
        file: PathBuf,

        /// Fichier du modèle (prioritaire sur la config).
        #[arg(long)]
        model: Option<PathBuf>,
    },
}
