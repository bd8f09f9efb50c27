use std::path::{Path, PathBuf};

use crate::error::TrainError;

/// Dataset étiqueté : collections parallèles, appariées par index.
///
/// INVARIANT : `features.len() == labels.len()`, et tous les vecteurs de
/// `features` ont la même longueur.
pub struct Dataset {
    /// Un vecteur MFCC aplati par fichier retenu.
    pub features: Vec<Vec<f64>>,
    /// Étiquette de chaque vecteur, dérivée du nom de fichier.
    pub labels: Vec<String>,
}

impl Dataset {
    /// Nombre d'entrées appariées.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Vrai si aucun fichier n'a été retenu.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Longueur commune des vecteurs de caractéristiques.
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }
}

/// Étiquette d'un fichier : la partie du nom précédant le premier `_`.
///
/// Un nom sans `_` sert d'étiquette tel quel, extension comprise.
#[must_use]
pub fn label_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    match name.split('_').next() {
        Some(head) if !head.is_empty() => head.to_string(),
        _ => name,
    }
}

/// Liste triée des fichiers `*.wav` immédiats du dossier (scan non
/// récursif).
///
/// Le tri par nom rend l'ordre du dataset indépendant du système de
/// fichiers, donc le découpage train/test reproductible à graine fixée.
///
/// # Errors
/// Retourne une erreur si le dossier est illisible.
pub fn scan_wav_files(dir: &Path) -> Result<Vec<PathBuf>, TrainError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Assemble le dataset à partir des fichiers WAV d'un dossier.
///
/// Chaque fichier dont l'extraction échoue est journalisé et ignoré ; le
/// scan continue. Les vecteurs dont la longueur diffère du premier retenu
/// sont également ignorés : une matrice ne peut pas mélanger des clips de
/// durées différentes.
///
/// # Errors
/// Retourne une erreur si le dossier lui-même est illisible.
pub fn load_dataset(dir: &Path, mfcc_dim: usize) -> Result<Dataset, TrainError> {
    let files = scan_wav_files(dir)?;
    log::info!("{} fichier(s) WAV dans {}", files.len(), dir.display());

    let mut features: Vec<Vec<f64>> = Vec::with_capacity(files.len());
    let mut labels: Vec<String> = Vec::with_capacity(files.len());

    for path in &files {
        let Some(vector) = oto_audio::mfcc::feature_vector(path, mfcc_dim) else {
            continue;
        };

        if let Some(first) = features.first() {
            if vector.len() != first.len() {
                log::warn!(
                    "Fichier {} ignoré : {} coefficients au lieu de {}",
                    path.display(),
                    vector.len(),
                    first.len()
                );
                continue;
            }
        }

        labels.push(label_of(path));
        features.push(vector);
    }

    log::info!("{} fichier(s) retenus dans le dataset", features.len());
    Ok(Dataset { features, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn write_tone(path: &Path, freq: f32, len: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..len {
            let s = (f32::from(i16::MAX) * 0.4
                * (std::f32::consts::TAU * freq * i as f32 / 16_000.0).sin())
                as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn label_comes_before_first_underscore() {
        assert_eq!(label_of(Path::new("catA_1.wav")), "catA");
        assert_eq!(label_of(Path::new("dir/chien_aboie_03.wav")), "chien");
        // Sans underscore : le nom entier fait office d'étiquette.
        assert_eq!(label_of(Path::new("brut.wav")), "brut.wav");
    }

    #[test]
    fn assembles_labeled_pairs_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("catA_1.wav"), 300.0, 8192);
        write_tone(&dir.path().join("catA_2.wav"), 320.0, 8192);
        write_tone(&dir.path().join("catB_1.wav"), 3000.0, 8192);
        // Non-WAV : jamais scanné
        std::fs::write(dir.path().join("notes.txt"), b"rien").unwrap();
        // WAV corrompu : extraction en échec, fichier ignoré
        std::fs::write(dir.path().join("cassé_1.wav"), b"pas du RIFF").unwrap();

        let dataset = load_dataset(dir.path(), 13).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.features.len(), dataset.labels.len());

        let label_set: BTreeSet<&str> =
            dataset.labels.iter().map(String::as_str).collect();
        assert_eq!(label_set, BTreeSet::from(["catA", "catB"]));
    }

    #[test]
    fn mismatched_clip_length_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("catA_1.wav"), 300.0, 8192);
        write_tone(&dir.path().join("catB_1.wav"), 3000.0, 8192);
        // Durée différente : vecteur plus long, exclu de la matrice
        write_tone(&dir.path().join("catC_1.wav"), 500.0, 16_384);

        let dataset = load_dataset(dir.path(), 13).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.labels.contains(&"catC".to_string()));
    }

    #[test]
    fn empty_directory_yields_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = load_dataset(dir.path(), 13).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.feature_dim(), 0);
    }

    #[test]
    fn missing_directory_is_fatal() {
        assert!(load_dataset(Path::new("/nonexistent/dir"), 13).is_err());
    }
}
