use std::path::Path;

use anyhow::{Context, Result};
use oto_core::config::TrainConfig;
use oto_train::SoundClassifier;
use oto_train::report::format_report;

/// Entraîne le classifieur et imprime le rapport d'évaluation.
///
/// # Errors
/// Retourne une erreur si le pipeline d'entraînement échoue (dossier
/// illisible, dataset trop petit, solveur, persistance).
pub fn run_train(config: &TrainConfig) -> Result<()> {
    let outcome = oto_train::run_training(config)?;

    println!(
        "Accuracy: {:.4} ({} train / {} test)",
        outcome.accuracy, outcome.train_size, outcome.test_size
    );
    println!();
    print!("{}", format_report(&outcome.report));
    println!();
    println!("Modèle SVM sauvegardé vers {}.", config.model_path.display());

    Ok(())
}

/// Classe un fichier WAV avec le modèle sauvegardé.
///
/// # Errors
/// Retourne une erreur si le modèle est illisible, si l'extraction échoue
/// ou si la dimension du vecteur ne correspond pas au modèle.
pub fn run_predict(config: &TrainConfig, file: &Path) -> Result<()> {
    let classifier = SoundClassifier::load(&config.model_path)
        .with_context(|| format!("Chargement du modèle {}", config.model_path.display()))?;

    let features = oto_audio::mfcc::feature_vector(file, config.mfcc_dim)
        .with_context(|| format!("Extraction impossible pour {}", file.display()))?;

    let label = classifier.predict_one(&features)?;
    println!("{} → {label}", file.display());

    Ok(())
}
