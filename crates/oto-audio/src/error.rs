use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Serial transport error.
    #[error("Erreur du port série : {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error on the byte stream.
    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),

    /// WAV container error.
    #[error("Erreur du conteneur WAV : {0}")]
    Wav(#[from] hound::Error),

    /// Clip shorter than one analysis frame.
    #[error("Clip trop court pour une frame d'analyse : {0}")]
    ClipTooShort(String),
}
