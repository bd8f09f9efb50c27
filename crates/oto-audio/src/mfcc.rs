use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use realfft::RealFftPlanner;

use crate::error::AudioError;

/// Taille de la fenêtre d'analyse FFT.
const FRAME_SIZE: usize = 2048;
/// Pas entre deux frames d'analyse.
const HOP_SIZE: usize = 512;
/// Nombre de bandes du banc de filtres mel.
const MEL_BANDS: usize = 26;

/// Extracteur MFCC : FFT réelle fenêtrée, banc de filtres mel triangulaire,
/// DCT-II orthonormale.
///
/// Pré-alloue le plan FFT et les tampons de travail ; le banc de filtres est
/// dimensionné à la construction pour la fréquence nominale donnée.
///
/// # Example
/// ```
/// use oto_audio::mfcc::MfccExtractor;
/// let mut extractor = MfccExtractor::new(16000.0, 13);
/// let samples = vec![0.0f32; 4096];
/// let coeffs = extractor.extract(&samples);
/// assert_eq!(coeffs.len(), 13 * 5);
/// ```
pub struct MfccExtractor {
    n_coeffs: usize,
    plan: Arc<dyn realfft::RealToComplex<f32>>,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    /// Coefficients de la fenêtre de Hann.
    window: Vec<f32>,
    /// Une ligne de poids par bande mel, sur les bins de la FFT réelle.
    filterbank: Vec<Vec<f32>>,
}

impl MfccExtractor {
    /// Construit l'extracteur pour une fréquence nominale donnée.
    ///
    /// # Panics
    /// Panics si `nominal_rate` n'est pas strictement positive.
    #[must_use]
    pub fn new(nominal_rate: f32, n_coeffs: usize) -> Self {
        assert!(nominal_rate > 0.0, "fréquence nominale invalide");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(FRAME_SIZE);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        // Fenêtre de Hann
        let window: Vec<f32> = (0..FRAME_SIZE)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (FRAME_SIZE as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            n_coeffs,
            plan,
            input_buf,
            spectrum_buf,
            scratch,
            window,
            filterbank: build_filterbank(nominal_rate, MEL_BANDS),
        }
    }

    /// Extrait les MFCC de toutes les frames du clip, aplatis frame par
    /// frame.
    ///
    /// Un clip plus court que `FRAME_SIZE` ne produit aucune frame.
    pub fn extract(&mut self, samples: &[f32]) -> Vec<f32> {
        let mut coeffs = Vec::new();
        let mut start = 0;

        while start + FRAME_SIZE <= samples.len() {
            let mel_log = self.mel_frame(&samples[start..start + FRAME_SIZE]);
            coeffs.extend(self.dct(&mel_log));
            start += HOP_SIZE;
        }

        coeffs
    }

    /// Log-énergies du banc mel pour une frame de `FRAME_SIZE` échantillons.
    fn mel_frame(&mut self, frame: &[f32]) -> Vec<f32> {
        for (slot, (&s, &w)) in self
            .input_buf
            .iter_mut()
            .zip(frame.iter().zip(self.window.iter()))
        {
            *slot = s * w;
        }

        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            return vec![0.0; MEL_BANDS];
        }

        let power: Vec<f32> = self
            .spectrum_buf
            .iter()
            .map(|c| c.re * c.re + c.im * c.im)
            .collect();

        self.filterbank
            .iter()
            .map(|row| {
                let energy: f32 = row.iter().zip(&power).map(|(w, p)| w * p).sum();
                energy.max(1e-10).ln()
            })
            .collect()
    }

    /// DCT-II orthonormale, tronquée aux `n_coeffs` premiers coefficients.
    fn dct(&self, mel_log: &[f32]) -> Vec<f32> {
        let m_len = mel_log.len() as f32;

        (0..self.n_coeffs)
            .map(|k| {
                let sum: f32 = mel_log
                    .iter()
                    .enumerate()
                    .map(|(m, &v)| {
                        (std::f32::consts::PI * k as f32 * (2.0 * m as f32 + 1.0)
                            / (2.0 * m_len))
                            .cos()
                            * v
                    })
                    .sum();
                let scale = if k == 0 {
                    (1.0 / m_len).sqrt()
                } else {
                    (2.0 / m_len).sqrt()
                };
                sum * scale
            })
            .collect()
    }
}

/// Banc de filtres triangulaires espacés sur l'échelle mel, couvrant
/// `[0, nominal_rate / 2]` sur les bins de la FFT réelle.
fn build_filterbank(nominal_rate: f32, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = FRAME_SIZE / 2 + 1;
    let bin_hz = nominal_rate / FRAME_SIZE as f32;
    let max_mel = hz_to_mel(nominal_rate / 2.0);

    let edges: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
        .collect();

    (1..=n_mels)
        .map(|m| {
            let (lo, center, hi) = (edges[m - 1], edges[m], edges[m + 1]);
            let mut row = vec![0.0f32; n_bins];
            for (k, weight) in row.iter_mut().enumerate() {
                let f = k as f32 * bin_hz;
                if f > lo && f < center {
                    *weight = (f - lo) / (center - lo).max(f32::EPSILON);
                } else if f >= center && f < hi {
                    *weight = (hi - f) / (hi - center).max(f32::EPSILON);
                }
            }
            row
        })
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Extrait le vecteur de caractéristiques aplati d'un fichier audio.
///
/// Toute faute (ouverture, décodage, clip trop court) est journalisée et
/// produit `None` : l'appelant ignore le fichier au lieu d'interrompre le
/// scan.
#[must_use]
pub fn feature_vector(path: &Path, n_coeffs: usize) -> Option<Vec<f64>> {
    match try_feature_vector(path, n_coeffs) {
        Ok(features) => Some(features),
        Err(e) => {
            log::warn!("Fichier {} ignoré : {e}", path.display());
            None
        }
    }
}

fn try_feature_vector(path: &Path, n_coeffs: usize) -> Result<Vec<f64>> {
    let (samples, _rate) = crate::decode::decode_file(path)?;

    if samples.is_empty() {
        return Err(AudioError::ClipTooShort(path.display().to_string()).into());
    }

    // Le banc de filtres est dimensionné sur le nombre total d'échantillons
    // du clip, pas sur la fréquence décodée.
    let nominal_rate = samples.len() as f32;
    let mut extractor = MfccExtractor::new(nominal_rate, n_coeffs);
    let coeffs = extractor.extract(&samples);

    if coeffs.is_empty() {
        return Err(AudioError::ClipTooShort(path.display().to_string()).into());
    }

    Ok(coeffs.into_iter().map(f64::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn coefficient_count_follows_frame_count() {
        let mut extractor = MfccExtractor::new(16_000.0, 13);
        // (4096 - 2048) / 512 + 1 = 5 frames
        let long = vec![0.1f32; 4096];
        assert_eq!(extractor.extract(&long).len(), 13 * 5);
        // Plus court qu'une frame : aucun coefficient
        let short = vec![0.1f32; 100];
        assert!(extractor.extract(&short).is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let samples: Vec<f32> = (0..8192)
            .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / 16_000.0).sin())
            .collect();
        let a = MfccExtractor::new(16_000.0, 13).extract(&samples);
        let b = MfccExtractor::new(16_000.0, 13).extract(&samples);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_tones_yield_distinct_features() {
        let dir = tempfile::tempdir().unwrap();
        let low = dir.path().join("low_1.wav");
        let high = dir.path().join("high_1.wav");
        write_tone(&low, 300.0, 8192);
        write_tone(&high, 3000.0, 8192);

        let a = feature_vector(&low, 13).unwrap();
        let b = feature_vector(&high, 13).unwrap();
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn missing_file_yields_none() {
        assert!(feature_vector(Path::new("/nonexistent/clip.wav"), 13).is_none());
    }

    #[test]
    fn non_audio_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.wav");
        std::fs::write(&path, b"rien d'audio ici").unwrap();
        assert!(feature_vector(&path, 13).is_none());
    }

    #[test]
    fn tiny_clip_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("court_1.wav");
        write_tone(&path, 440.0, 256); // < FRAME_SIZE
        assert!(feature_vector(&path, 13).is_none());
    }
}
