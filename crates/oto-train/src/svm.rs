use std::path::Path;

use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::TrainError;

/// Une machine binaire du schéma un-contre-un.
#[derive(Serialize, Deserialize)]
struct PairMachine {
    /// Index d'étiquette prédit quand la machine répond vrai.
    pos: usize,
    /// Index d'étiquette prédit quand la machine répond faux.
    neg: usize,
    svm: Svm<f64, bool>,
}

/// Classifieur multi-classes : SVM linéaires un-contre-un avec vote
/// majoritaire.
///
/// Le solveur sous-jacent ne sépare que deux classes ; une machine est
/// entraînée par paire d'étiquettes et la prédiction retient l'étiquette la
/// plus votée. Égalité départagée par ordre d'étiquette (déterministe).
///
/// Sérialisable en bincode ; immuable une fois sauvegardé.
#[derive(Serialize, Deserialize)]
pub struct SoundClassifier {
    labels: Vec<String>,
    feature_dim: usize,
    machines: Vec<PairMachine>,
}

impl SoundClassifier {
    /// Entraîne une machine par paire d'étiquettes.
    ///
    /// `targets[i]` est l'index dans `labels` de l'étiquette de la ligne `i`
    /// de `records`.
    ///
    /// # Errors
    /// Retourne une erreur si le solveur échoue sur une paire.
    pub fn fit(
        records: &Array2<f64>,
        targets: &[usize],
        labels: Vec<String>,
    ) -> Result<Self, TrainError> {
        let mut machines = Vec::new();

        for pos in 0..labels.len() {
            for neg in (pos + 1)..labels.len() {
                let idx: Vec<usize> = targets
                    .iter()
                    .enumerate()
                    .filter(|&(_, &t)| t == pos || t == neg)
                    .map(|(i, _)| i)
                    .collect();
                if idx.is_empty() {
                    continue;
                }

                let pair_records = records.select(Axis(0), &idx);
                let pair_targets: Array1<bool> =
                    idx.iter().map(|&i| targets[i] == pos).collect();

                let dataset = linfa::Dataset::new(pair_records, pair_targets);
                let svm = Svm::<f64, bool>::params()
                    .linear_kernel()
                    .fit(&dataset)
                    .map_err(|e| TrainError::Svm(e.to_string()))?;

                machines.push(PairMachine { pos, neg, svm });
            }
        }

        Ok(Self {
            labels,
            feature_dim: records.ncols(),
            machines,
        })
    }

    /// Prédit l'index d'étiquette de chaque ligne de `records`.
    #[must_use]
    pub fn predict_batch(&self, records: &Array2<f64>) -> Vec<usize> {
        let mut votes = vec![vec![0usize; self.labels.len()]; records.nrows()];

        for machine in &self.machines {
            let preds: Array1<bool> = machine.svm.predict(records);
            for (row, &is_pos) in preds.iter().enumerate() {
                let winner = if is_pos { machine.pos } else { machine.neg };
                votes[row][winner] += 1;
            }
        }

        votes
            .into_iter()
            .map(|row_votes| {
                // Égalité : la première étiquette l'emporte.
                let mut best = 0;
                for (i, &count) in row_votes.iter().enumerate() {
                    if count > row_votes[best] {
                        best = i;
                    }
                }
                best
            })
            .collect()
    }

    /// Prédit l'étiquette d'un seul vecteur de caractéristiques.
    ///
    /// # Errors
    /// Retourne une erreur si la longueur du vecteur ne correspond pas à la
    /// dimension d'entraînement.
    pub fn predict_one(&self, features: &[f64]) -> Result<&str, TrainError> {
        if features.len() != self.feature_dim {
            return Err(TrainError::DimensionMismatch {
                expected: self.feature_dim,
                got: features.len(),
            });
        }

        let records = Array2::from_shape_vec((1, features.len()), features.to_vec())?;
        let idx = self.predict_batch(&records)[0];
        Ok(&self.labels[idx])
    }

    /// Table des étiquettes, dans l'ordre des index de prédiction.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Dimension des vecteurs d'entraînement.
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Sérialise le modèle en bincode.
    ///
    /// # Errors
    /// Retourne une erreur si la sérialisation échoue.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TrainError> {
        Ok(bincode::serialize(self)?)
    }

    /// Sauvegarde le modèle sur disque.
    ///
    /// # Errors
    /// Retourne une erreur si la sérialisation ou l'écriture échoue.
    pub fn save(&self, path: &Path) -> Result<(), TrainError> {
        std::fs::write(path, self.to_bytes()?)?;
        log::info!("Modèle SVM sauvegardé vers {}", path.display());
        Ok(())
    }

    /// Recharge un modèle sauvegardé.
    ///
    /// # Errors
    /// Retourne une erreur si le fichier est illisible ou mal formé.
    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deux nuages bien séparés sur la première coordonnée.
    fn toy_data() -> (Array2<f64>, Vec<usize>, Vec<String>) {
        let mut rows: Vec<f64> = Vec::new();
        let mut targets = Vec::new();
        for i in 0..8 {
            let offset = f64::from(i) * 0.01;
            rows.extend([-1.0 - offset, 0.5]);
            targets.push(0);
            rows.extend([1.0 + offset, -0.5]);
            targets.push(1);
        }
        let records = Array2::from_shape_vec((16, 2), rows).unwrap();
        let labels = vec!["gauche".to_string(), "droite".to_string()];
        (records, targets, labels)
    }

    #[test]
    fn separable_classes_are_recovered() {
        let (records, targets, labels) = toy_data();
        let model = SoundClassifier::fit(&records, &targets, labels).unwrap();

        let preds = model.predict_batch(&records);
        assert_eq!(preds, targets);
    }

    #[test]
    fn predict_one_checks_dimension() {
        let (records, targets, labels) = toy_data();
        let model = SoundClassifier::fit(&records, &targets, labels).unwrap();

        assert_eq!(model.predict_one(&[-2.0, 0.4]).unwrap(), "gauche");
        assert!(matches!(
            model.predict_one(&[0.0; 5]),
            Err(TrainError::DimensionMismatch { expected: 2, got: 5 })
        ));
    }

    #[test]
    fn round_trips_through_bincode() {
        let (records, targets, labels) = toy_data();
        let model = SoundClassifier::fit(&records, &targets, labels).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svm_model.bin");
        model.save(&path).unwrap();

        let reloaded = SoundClassifier::load(&path).unwrap();
        assert_eq!(reloaded.labels(), model.labels());
        assert_eq!(reloaded.feature_dim(), 2);
        assert_eq!(reloaded.predict_batch(&records), model.predict_batch(&records));
    }
}
