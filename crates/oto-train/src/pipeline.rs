use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, Axis};
use oto_core::config::TrainConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::{Dataset, load_dataset};
use crate::error::TrainError;
use crate::report::{ClassMetrics, accuracy, per_class_metrics};
use crate::svm::SoundClassifier;

/// Résultat d'un entraînement complet.
pub struct TrainingOutcome {
    /// Exactitude sur la partition de test.
    pub accuracy: f64,
    /// Métriques par classe sur la partition de test.
    pub report: Vec<ClassMetrics>,
    /// Modèle entraîné (déjà persisté sous `config.model_path`).
    pub classifier: SoundClassifier,
    /// Taille de la partition d'entraînement.
    pub train_size: usize,
    /// Taille de la partition de test.
    pub test_size: usize,
}

/// Pipeline d'entraînement : scan du dossier, extraction MFCC, découpage
/// train/test à graine fixée, entraînement SVM, évaluation, persistance.
///
/// # Errors
/// Retourne une erreur si le dossier est illisible, si le dataset est trop
/// petit pour être découpé, si le solveur échoue ou si la persistance du
/// modèle échoue. Les fautes par fichier sont absorbées en amont par
/// l'extraction.
pub fn run_training(config: &TrainConfig) -> Result<TrainingOutcome, TrainError> {
    log::info!("Étape 1/4 : Extraction des caractéristiques");
    let dataset = load_dataset(&config.data_dir, config.mfcc_dim)?;

    let n = dataset.len();
    if n < 2 {
        return Err(TrainError::DatasetTooSmall(n));
    }

    let (records, targets, labels) = to_matrix(&dataset)?;

    log::info!("Étape 2/4 : Découpage train/test (graine {})", config.seed);
    let (train_idx, test_idx) = split_indices(n, config.train_ratio, config.seed);

    let train_records = records.select(Axis(0), &train_idx);
    let train_targets: Vec<usize> = train_idx.iter().map(|&i| targets[i]).collect();
    let test_records = records.select(Axis(0), &test_idx);
    let test_targets: Vec<usize> = test_idx.iter().map(|&i| targets[i]).collect();

    log::info!(
        "Étape 3/4 : Entraînement SVM linéaire ({} train / {} test, {} classe(s))",
        train_idx.len(),
        test_idx.len(),
        labels.len()
    );
    let classifier = SoundClassifier::fit(&train_records, &train_targets, labels)?;

    let predicted = classifier.predict_batch(&test_records);
    let accuracy = accuracy(&test_targets, &predicted);
    let report = per_class_metrics(&test_targets, &predicted, classifier.labels());

    log::info!("Étape 4/4 : Persistance du modèle");
    classifier.save(&config.model_path)?;

    Ok(TrainingOutcome {
        accuracy,
        report,
        classifier,
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    })
}

/// Matrice de caractéristiques + cibles indexées + table d'étiquettes
/// (triée, déterministe).
fn to_matrix(dataset: &Dataset) -> Result<(Array2<f64>, Vec<usize>, Vec<String>), TrainError> {
    let unique: BTreeSet<&str> = dataset.labels.iter().map(String::as_str).collect();
    let labels: Vec<String> = unique.iter().map(|&l| l.to_string()).collect();
    let label_index: BTreeMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    let targets: Vec<usize> = dataset
        .labels
        .iter()
        .map(|l| label_index[l.as_str()])
        .collect();

    let dim = dataset.feature_dim();
    let flat: Vec<f64> = dataset.features.iter().flatten().copied().collect();
    let records = Array2::from_shape_vec((dataset.len(), dim), flat)?;

    Ok((records, targets, labels))
}

/// Mélange `0..n` avec la graine donnée et coupe selon `train_ratio`.
///
/// Les deux partitions sont toujours non vides.
fn split_indices(n: usize, train_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = ((n as f64) * train_ratio).floor() as usize;
    let n_train = n_train.clamp(1, n - 1);
    let test = indices.split_off(n_train);
    (indices, test)
}
