use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::AudioError;

/// Session d'écriture WAV en deux phases : création, puis ajouts.
///
/// `create` écrit l'en-tête (mono, 16 bits, fréquence fixe) une seule fois ;
/// `append` n'existe que sur la session retournée, ce qui empêche d'ajouter
/// des frames dans un format différent de celui de l'en-tête.
///
/// # Example
/// ```no_run
/// use oto_audio::wav::WavSink;
/// let mut sink = WavSink::create("filtered_audio.wav", 16000).unwrap();
/// sink.append(&[0i16; 1024]).unwrap();
/// ```
pub struct WavSink {
    path: PathBuf,
    spec: WavSpec,
}

impl WavSink {
    /// Crée un nouveau conteneur WAV vide et retourne la session d'ajout.
    ///
    /// Écrase un fichier existant du même nom.
    ///
    /// # Errors
    /// Retourne une erreur si le fichier ne peut être créé.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, AudioError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        WavWriter::create(path.as_ref(), spec)?.finalize()?;
        log::info!("Conteneur WAV créé : {}", path.as_ref().display());

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            spec,
        })
    }

    /// Ajoute des frames au conteneur, dans le format de la session.
    ///
    /// Rouvre le fichier en mode ajout et met à jour les métadonnées de
    /// longueur du conteneur à la clôture.
    ///
    /// # Errors
    /// Retourne une erreur si le fichier a disparu ou si son en-tête ne
    /// correspond plus à celui de la session.
    pub fn append(&mut self, frames: &[i16]) -> Result<(), AudioError> {
        let mut writer = WavWriter::append(&self.path)?;
        for &sample in frames {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Format de la session, fixé à la création.
    #[must_use]
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Chemin du conteneur.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
