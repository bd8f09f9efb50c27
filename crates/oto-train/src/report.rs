use std::fmt::Write as _;

/// Métriques d'évaluation d'une classe sur la partition de test.
#[derive(Clone, Debug)]
pub struct ClassMetrics {
    /// Étiquette de la classe.
    pub label: String,
    /// Précision : vrais positifs / prédits positifs.
    pub precision: f64,
    /// Rappel : vrais positifs / réels positifs.
    pub recall: f64,
    /// Moyenne harmonique précision/rappel.
    pub f1: f64,
    /// Nombre d'exemplaires réels dans la partition.
    pub support: usize,
}

/// Part des prédictions exactes.
///
/// # Panics
/// Panics si les deux tranches n'ont pas la même longueur.
#[must_use]
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    assert_eq!(truth.len(), predicted.len());
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    hits as f64 / truth.len() as f64
}

/// Précision, rappel et F1 par classe, à la manière d'un
/// `classification_report`.
///
/// Une classe sans prédiction (ou sans exemplaire) reçoit 0.0 pour la
/// métrique indéfinie.
#[must_use]
pub fn per_class_metrics(
    truth: &[usize],
    predicted: &[usize],
    labels: &[String],
) -> Vec<ClassMetrics> {
    labels
        .iter()
        .enumerate()
        .map(|(class, label)| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (&t, &p) in truth.iter().zip(predicted) {
                match (t == class, p == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }

            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Met en forme le rapport par classe en table alignée.
#[must_use]
pub fn format_report(metrics: &[ClassMetrics]) -> String {
    let width = metrics
        .iter()
        .map(|m| m.label.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>width$}  precision  recall  f1-score  support",
        ""
    );
    for m in metrics {
        let _ = writeln!(
            out,
            "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
            m.label, m.precision, m.recall, m.f1, m.support
        );
    }
    out
}
