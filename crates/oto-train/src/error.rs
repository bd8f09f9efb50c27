use thiserror::Error;

/// Errors originating from the training module.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Filesystem error (directory scan, model persistence).
    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),

    /// Not enough usable files to split train/test.
    #[error("Dataset trop petit : {0} fichier(s) exploitable(s)")]
    DatasetTooSmall(usize),

    /// SVM solver failure.
    #[error("Erreur du solveur SVM : {0}")]
    Svm(String),

    /// Feature matrix shape error.
    #[error("Forme de matrice invalide : {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Model (de)serialization failure.
    #[error("Erreur de sérialisation du modèle : {0}")]
    Model(#[from] bincode::Error),

    /// Feature vector length does not match the trained model.
    #[error("Dimension de caractéristiques inattendue : {got} (modèle : {expected})")]
    DimensionMismatch {
        /// Dimension the model was trained on.
        expected: usize,
        /// Dimension of the incoming vector.
        got: usize,
    },
}
