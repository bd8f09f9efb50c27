use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::AudioError;

/// Fournit des octets PCM bruts à la boucle de capture.
///
/// Implémenté par : `SerialSource` (matériel), doubles de test en mémoire.
///
/// # Example
/// ```
/// use oto_audio::serial::ByteSource;
/// use oto_audio::error::AudioError;
///
/// struct DummySource;
/// impl ByteSource for DummySource {
///     fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<usize, AudioError> { Ok(0) }
///     fn discard_pending(&mut self) -> Result<(), AudioError> { Ok(()) }
/// }
/// ```
pub trait ByteSource {
    /// Lit les octets actuellement disponibles dans `buf`.
    ///
    /// Retourne le nombre d'octets lus ; `0` signifie que le poll a expiré
    /// sans données. Ne bloque jamais au-delà du timeout de poll.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;

    /// Purge les tampons d'entrée et de sortie du transport.
    ///
    /// CONTRAT : appelé sur TOUS les chemins de sortie d'une fenêtre de
    /// capture. Aucun octet résiduel ne doit fuir dans la fenêtre suivante.
    fn discard_pending(&mut self) -> Result<(), AudioError>;
}

/// Port série possédé, ouvert une seule fois au démarrage du process.
///
/// La fermeture est garantie par le drop, quel que soit le chemin de sortie
/// de la boucle de capture.
///
/// # Example
/// ```no_run
/// use oto_audio::serial::SerialSource;
/// let source = SerialSource::open("/dev/ttyUSB0", 9600).unwrap();
/// ```
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    /// Timeout d'un poll de lecture. Borne la latence de détection de
    /// l'interruption, pas la durée totale d'une fenêtre.
    const POLL_TIMEOUT: Duration = Duration::from_millis(100);

    /// Ouvre le port série à la vitesse demandée.
    ///
    /// # Errors
    /// Retourne une erreur si le port est introuvable ou occupé.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, AudioError> {
        let port = serialport::new(path, baud_rate)
            .timeout(Self::POLL_TIMEOUT)
            .open()?;
        log::info!("Port série ouvert : {path} @ {baud_rate} bauds");
        Ok(Self { port })
    }
}

impl ByteSource for SerialSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            // Poll expiré : pas une erreur, la boucle revérifie l'interruption.
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(AudioError::Io(e)),
        }
    }

    fn discard_pending(&mut self) -> Result<(), AudioError> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}

/// Capture une fenêtre complète d'échantillons PCM 16 bits little-endian.
///
/// Accumule les octets lus jusqu'à détenir au moins `target_samples`
/// échantillons (2 octets chacun). La dernière lecture peut dépasser la
/// cible ; l'excédent est conservé, jamais tronqué.
///
/// Retourne `None` si `interrupt` a été levé : fin de session, pas une
/// erreur. Le flag n'est observé qu'aux frontières d'itération de poll,
/// jamais au milieu d'une lecture.
///
/// # Errors
/// Retourne une erreur si le transport échoue. Les tampons du transport
/// sont purgés avant de retourner, sur tous les chemins.
pub fn capture_window<S: ByteSource>(
    source: &mut S,
    target_samples: usize,
    interrupt: &AtomicBool,
) -> Result<Option<Vec<i16>>, AudioError> {
    let outcome = accumulate(source, target_samples, interrupt);

    if let Err(e) = source.discard_pending() {
        log::warn!("Purge des tampons série échouée : {e}");
    }

    let Some(bytes) = outcome? else {
        return Ok(None);
    };

    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    log::info!("{} échantillons capturés.", samples.len());
    Ok(Some(samples))
}

fn accumulate<S: ByteSource>(
    source: &mut S,
    target_samples: usize,
    interrupt: &AtomicBool,
) -> Result<Option<Vec<u8>>, AudioError> {
    let target_bytes = target_samples * 2;
    let mut pending = Vec::with_capacity(target_bytes);
    let mut chunk = [0u8; 512];

    while pending.len() < target_bytes {
        if interrupt.load(Ordering::SeqCst) {
            log::info!("Interruption détectée, fin de la capture.");
            return Ok(None);
        }
        let n = source.read_chunk(&mut chunk)?;
        pending.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(pending))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source en mémoire livrant `chunk_len` octets par poll.
    struct ScriptedSource {
        data: Vec<u8>,
        cursor: usize,
        chunk_len: usize,
        discards: usize,
    }

    impl ScriptedSource {
        fn new(data: Vec<u8>, chunk_len: usize) -> Self {
            Self {
                data,
                cursor: 0,
                chunk_len,
                discards: 0,
            }
        }
    }

    impl ByteSource for ScriptedSource {
        fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
            let remaining = self.data.len() - self.cursor;
            let n = self.chunk_len.min(remaining).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
            self.cursor += n;
            Ok(n)
        }

        fn discard_pending(&mut self) -> Result<(), AudioError> {
            self.discards += 1;
            Ok(())
        }
    }

    #[test]
    fn window_holds_at_least_target_samples() {
        // Livraison par paquets de 7 octets : la dernière lecture dépasse
        // la cible et l'excédent doit être conservé.
        for (target, chunk_len) in [(16, 7), (100, 13), (1, 512)] {
            let data = vec![0xAB; target * 2 + 64];
            let mut source = ScriptedSource::new(data, chunk_len);
            let interrupt = AtomicBool::new(false);

            let window = capture_window(&mut source, target, &interrupt)
                .unwrap()
                .unwrap();
            assert!(window.len() >= target, "fenêtre incomplète pour {target}");
        }
    }

    #[test]
    fn samples_are_little_endian_i16() {
        let mut source = ScriptedSource::new(vec![0x01, 0x00, 0xFF, 0xFF], 4);
        let interrupt = AtomicBool::new(false);
        let window = capture_window(&mut source, 2, &interrupt).unwrap().unwrap();
        assert_eq!(window, vec![1, -1]);
    }

    #[test]
    fn interrupt_yields_none_and_flushes() {
        let mut source = ScriptedSource::new(Vec::new(), 64);
        let interrupt = AtomicBool::new(true);
        let window = capture_window(&mut source, 1000, &interrupt).unwrap();
        assert!(window.is_none());
        assert_eq!(source.discards, 1, "tampons non purgés après interruption");
    }

    #[test]
    fn buffers_flushed_on_success_too() {
        let mut source = ScriptedSource::new(vec![0; 8], 8);
        let interrupt = AtomicBool::new(false);
        let _ = capture_window(&mut source, 4, &interrupt).unwrap();
        assert_eq!(source.discards, 1);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        // 9 octets livrés pour 4 échantillons demandés : l'octet impair
        // final n'appartient à aucun échantillon complet.
        let mut source = ScriptedSource::new(vec![0; 9], 9);
        let interrupt = AtomicBool::new(false);
        let window = capture_window(&mut source, 4, &interrupt).unwrap().unwrap();
        assert_eq!(window.len(), 4);
    }
}
