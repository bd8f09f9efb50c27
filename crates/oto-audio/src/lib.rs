// Capture série, filtrage coupe-bande, conteneur WAV et extraction MFCC pour otolith.

pub mod decode;
pub mod error;
pub mod mfcc;
pub mod notch;
pub mod serial;
pub mod wav;

pub use error::AudioError;
