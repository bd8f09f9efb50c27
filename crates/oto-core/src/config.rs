use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration de la capture série → WAV.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut correspondant
/// au montage de référence (Arduino sur `/dev/ttyUSB0`, PCM 16 kHz).
///
/// # Example
/// ```
/// use oto_core::config::CaptureConfig;
/// let config = CaptureConfig::default();
/// assert_eq!(config.sample_rate, 16_000);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Chemin du port série (ex. `/dev/ttyUSB0`, `COM3`).
    pub port: String,
    /// Baud rate du lien série.
    pub baud_rate: u32,
    /// Fréquence d'échantillonnage du flux PCM, en Hz.
    pub sample_rate: u32,
    /// Durée d'une fenêtre de capture, en secondes.
    pub window_secs: u32,
    /// Fréquence centrale du filtre coupe-bande, en Hz.
    pub notch_hz: f64,
    /// Facteur de qualité du filtre coupe-bande.
    pub notch_q: f64,
    /// Fichier WAV de sortie (créé puis étendu fenêtre par fenêtre).
    pub output: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9_600,
            sample_rate: 16_000,
            window_secs: 5,
            notch_hz: 8_000.0,
            notch_q: 30.0,
            output: PathBuf::from("filtered_audio.wav"),
        }
    }
}

impl CaptureConfig {
    /// Target number of samples in one complete capture window.
    #[must_use]
    pub fn window_samples(&self) -> usize {
        self.sample_rate as usize * self.window_secs as usize
    }

    /// Validate field ranges.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if a field is out of range.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sample_rate == 0 {
            return Err(CoreError::Config("sample_rate doit être > 0".into()));
        }
        if self.window_secs == 0 {
            return Err(CoreError::Config("window_secs doit être > 0".into()));
        }
        if self.notch_q <= 0.0 {
            return Err(CoreError::Config("notch_q doit être > 0".into()));
        }
        if self.notch_hz <= 0.0 || self.notch_hz >= f64::from(self.sample_rate) / 2.0 {
            return Err(CoreError::Config(format!(
                "notch_hz doit être dans (0, {})",
                f64::from(self.sample_rate) / 2.0
            )));
        }
        Ok(())
    }
}

/// Configuration de l'entraînement du classifieur.
///
/// # Example
/// ```
/// use oto_core::config::TrainConfig;
/// let config = TrainConfig::default();
/// assert_eq!(config.mfcc_dim, 13);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Dossier contenant les fichiers `label_*.wav` (scan non récursif).
    pub data_dir: PathBuf,
    /// Nombre de coefficients MFCC par frame d'analyse.
    pub mfcc_dim: usize,
    /// Part du dataset allouée à l'entraînement (le reste sert au test).
    pub train_ratio: f64,
    /// Graine du mélange train/test, pour la reproductibilité.
    pub seed: u64,
    /// Fichier de sortie du modèle entraîné.
    pub model_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            mfcc_dim: 13,
            train_ratio: 0.8,
            seed: 5,
            model_path: PathBuf::from("svm_model.bin"),
        }
    }
}

impl TrainConfig {
    /// Validate field ranges.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if a field is out of range.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.mfcc_dim == 0 {
            return Err(CoreError::Config("mfcc_dim doit être > 0".into()));
        }
        if self.train_ratio <= 0.0 || self.train_ratio >= 1.0 {
            return Err(CoreError::Config(
                "train_ratio doit être dans (0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration complète, telle que chargée depuis le fichier TOML.
///
/// Les deux sections sont optionnelles ; une section absente retombe sur
/// ses valeurs par défaut.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Section `[capture]`.
    pub capture: CaptureConfig,
    /// Section `[train]`.
    pub train: TrainConfig,
}

/// Charge la configuration depuis un fichier TOML.
///
/// # Errors
/// Retourne une erreur si le fichier est illisible ou mal formé.
///
/// # Example
/// ```no_run
/// use oto_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/otolith.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_setup() {
        let config = AppConfig::default();
        assert_eq!(config.capture.baud_rate, 9_600);
        assert_eq!(config.capture.window_samples(), 80_000);
        assert!((config.train.train_ratio - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.train.seed, 5);
        assert!(config.capture.validate().is_ok());
        assert!(config.train.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nport = \"COM3\"\nwindow_secs = 2").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.capture.port, "COM3");
        assert_eq!(config.capture.window_secs, 2);
        // Champs absents : défauts
        assert_eq!(config.capture.sample_rate, 16_000);
        assert_eq!(config.train.mfcc_dim, 13);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let capture = CaptureConfig {
            window_secs: 0,
            ..CaptureConfig::default()
        };
        assert!(capture.validate().is_err());

        let capture = CaptureConfig {
            notch_hz: 9_000.0, // au-delà de Nyquist pour 16 kHz
            ..CaptureConfig::default()
        };
        assert!(capture.validate().is_err());

        let train = TrainConfig {
            train_ratio: 1.0,
            ..TrainConfig::default()
        };
        assert!(train.validate().is_err());
    }
}
