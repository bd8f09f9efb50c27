use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use oto_audio::notch::NotchFilter;
use oto_audio::serial::{SerialSource, capture_window};
use oto_audio::wav::WavSink;
use oto_core::config::CaptureConfig;

/// Boucle de capture : fenêtre série → filtre coupe-bande → ajout WAV.
///
/// Tourne indéfiniment jusqu'à interruption (Ctrl-C, signalée par une
/// fenêtre `None`) ou faute. Le port série est possédé par cette fonction
/// et rendu sur tous les chemins de sortie.
///
/// # Errors
/// Retourne une erreur si le port, le filtre ou le conteneur WAV échoue.
pub fn run_capture(config: &CaptureConfig) -> Result<()> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Installation du handler Ctrl-C impossible")?;

    let mut source = SerialSource::open(&config.port, config.baud_rate)?;
    let mut sink = WavSink::create(&config.output, config.sample_rate)?;
    let mut filter = NotchFilter::new(
        config.notch_hz,
        config.notch_q,
        f64::from(config.sample_rate),
    );

    let target = config.window_samples();

    loop {
        log::info!("Capture de {} s de données audio...", config.window_secs);
        let Some(window) = capture_window(&mut source, target, &interrupt)? else {
            log::info!("Fin de session.");
            break;
        };

        log::info!("Application du filtre coupe-bande...");
        let filtered = filter.apply(&window);

        log::info!("Ajout de la fenêtre filtrée à {}...", sink.path().display());
        sink.append(&filtered)?;

        log::info!("Fenêtre traitée et enregistrée.");
    }

    Ok(())
}
