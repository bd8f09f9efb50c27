use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Filtre coupe-bande IIR pour le débruitage des fenêtres capturées.
///
/// Coefficients biquad (design notch standard : fréquence centrale + facteur
/// de qualité), pré-calculés à la construction. Le planner FFT est conservé
/// pour réutiliser les plans d'une fenêtre à l'autre.
///
/// # Example
/// ```
/// use oto_audio::notch::NotchFilter;
/// let mut filter = NotchFilter::new(8000.0, 30.0, 16000.0);
/// let filtered = filter.apply(&[0i16; 256]);
/// assert_eq!(filtered.len(), 256);
/// ```
pub struct NotchFilter {
    b: [f64; 3],
    a: [f64; 3],
    planner: FftPlanner<f64>,
}

impl NotchFilter {
    /// Construit le filtre pour une fréquence centrale, un facteur de
    /// qualité et une fréquence d'échantillonnage donnés.
    #[must_use]
    pub fn new(center_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        Self {
            b: [1.0 / a0, -2.0 * cos_w0 / a0, 1.0 / a0],
            a: [1.0, -2.0 * cos_w0 / a0, (1.0 - alpha) / a0],
            planner: FftPlanner::new(),
        }
    }

    /// Applique le filtre à une fenêtre d'échantillons.
    ///
    /// Le biquad est déroulé sur la suite des bins fréquentiels de la FFT,
    /// pas sur le signal temporel. La partie réelle de la transformée
    /// inverse est ramenée en i16 par troncature modulaire (pas de
    /// saturation).
    ///
    /// La sortie a toujours la même longueur que l'entrée.
    pub fn apply(&mut self, window: &[i16]) -> Vec<i16> {
        if window.is_empty() {
            return Vec::new();
        }

        let n = window.len();
        let fft = self.planner.plan_fft_forward(n);
        let ifft = self.planner.plan_fft_inverse(n);

        let mut bins: Vec<Complex<f64>> = window
            .iter()
            .map(|&s| Complex::new(f64::from(s), 0.0))
            .collect();

        fft.process(&mut bins);
        self.run_biquad(&mut bins);
        ifft.process(&mut bins);

        // rustfft ne normalise pas la transformée inverse.
        let scale = 1.0 / n as f64;
        bins.iter()
            .map(|c| (c.re * scale) as i64 as i16)
            .collect()
    }

    /// Forme directe II transposée, état complexe, coefficients réels.
    fn run_biquad(&self, series: &mut [Complex<f64>]) {
        let mut z1 = Complex::new(0.0, 0.0);
        let mut z2 = Complex::new(0.0, 0.0);

        for x in series.iter_mut() {
            let y = *x * self.b[0] + z1;
            z1 = *x * self.b[1] - y * self.a[1] + z2;
            z2 = *x * self.b[2] - y * self.a[2];
            *x = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_stays_zero() {
        let mut filter = NotchFilter::new(8000.0, 30.0, 16000.0);
        for len in [1, 7, 64, 1000] {
            let filtered = filter.apply(&vec![0i16; len]);
            assert_eq!(filtered.len(), len);
            assert!(filtered.iter().all(|&s| s == 0), "non nul pour len={len}");
        }
    }

    #[test]
    fn output_length_matches_input_length() {
        let mut filter = NotchFilter::new(8000.0, 30.0, 16000.0);
        for len in 1..48 {
            let window: Vec<i16> = (0..len).map(|i| (i as i16) * 31).collect();
            assert_eq!(filter.apply(&window).len(), len);
        }
    }

    #[test]
    fn empty_window_yields_empty() {
        let mut filter = NotchFilter::new(8000.0, 30.0, 16000.0);
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn unit_gain_at_dc() {
        // Un notch laisse passer le continu : b(1) / a(1) = 1.
        let filter = NotchFilter::new(8000.0, 30.0, 16000.0);
        let num: f64 = filter.b.iter().sum();
        let den: f64 = filter.a.iter().sum();
        assert!((num / den - 1.0).abs() < 1e-12);
    }
}
