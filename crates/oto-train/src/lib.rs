// Assemblage du dataset, entraînement SVM et évaluation pour otolith.

pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod svm;

pub use error::TrainError;
pub use pipeline::{TrainingOutcome, run_training};
pub use svm::SoundClassifier;
