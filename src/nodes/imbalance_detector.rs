use dasp_sample::Sample;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::spectrum::{RustFftAnalyzer, SpectrumAnalyzer};

/// Number of samples (per channel) fed into one spectral evaluation. Longer
/// blocks are truncated to this length; shorter blocks are not evaluated.
pub const FFT_SIZE: usize = 128;

/// Spectral lines this close to DC carry mostly noise and are excluded from
/// both the average and the peak search.
const MIN_BIN: usize = 5;

/// Outcome of one spectral evaluation of a corrected block pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Spectrum too weak to judge; the observation is discarded.
    NoSignal,
    /// The strongest line suppresses its mirror image well enough.
    Aligned,
    /// The mirror image is comparable to the strongest line.
    Misaligned,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// The strongest spectral line must exceed the band average by this
    /// factor before a verdict is trusted.
    pub spectral_avg_multiplier: f32,
    /// Peak-to-image power ratios below this are classified as misaligned.
    pub min_imbalance_ratio: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            spectral_avg_multiplier: 10.0,
            min_imbalance_ratio: 4.0,
        }
    }
}

/// Scores whether a quadrature block pair exhibits the mirrored-image
/// spectral signature of a one-sample channel misalignment.
///
/// A healthy quadrature signal concentrates its strongest line on one side
/// of the spectrum and suppresses the mirror bin; a one-sample lag between
/// the channels raises the mirror bin to a comparable level. The score is
/// the power ratio between the strongest line and its image.
pub struct ImbalanceDetector {
    config: DetectorConfig,
    analyzer: Box<dyn SpectrumAnalyzer>,
    scratch: Vec<Complex<f32>>,
    power: Vec<f32>,
}

impl ImbalanceDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_analyzer(config, Box::new(RustFftAnalyzer::new(FFT_SIZE)))
    }

    /// Builds a detector around an externally supplied spectral transform.
    pub fn with_analyzer(config: DetectorConfig, analyzer: Box<dyn SpectrumAnalyzer>) -> Self {
        Self {
            config,
            analyzer,
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            power: vec![0.0; FFT_SIZE],
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DetectorConfig) {
        self.config = config;
    }

    /// Evaluates the first `FFT_SIZE` samples of an already delay-corrected
    /// block pair.
    pub fn evaluate(&mut self, block_i: &[i16], block_q: &[i16]) -> Verdict {
        if block_i.len() < FFT_SIZE || block_q.len() < FFT_SIZE {
            return Verdict::NoSignal;
        }

        // Normalize to full-scale floats and interleave I/Q as the real and
        // imaginary parts of one complex sequence.
        for (n, slot) in self.scratch.iter_mut().enumerate() {
            *slot = Complex::new(block_i[n].to_sample::<f32>(), block_q[n].to_sample::<f32>());
        }
        self.analyzer.forward(&mut self.scratch);
        self.analyzer.magnitude_squared(&self.scratch, &mut self.power);

        // Find the strongest spectral line and the average line power,
        // skipping the bins around DC on both sides.
        let mut average_power = 0.0f32;
        let mut maximum_power = 0.0f32;
        let mut max_line = MIN_BIN;
        for (line, &power) in self
            .power
            .iter()
            .enumerate()
            .take(FFT_SIZE - MIN_BIN)
            .skip(MIN_BIN)
        {
            average_power += power;
            if power > maximum_power {
                max_line = line;
                maximum_power = power;
            }
        }
        average_power /= (FFT_SIZE - 2 * MIN_BIN) as f32;

        // Only lines well above the spectral floor are trustworthy.
        if maximum_power <= self.config.spectral_avg_multiplier * average_power {
            return Verdict::NoSignal;
        }

        let imbalance_ratio = maximum_power / self.power[FFT_SIZE - max_line];
        if imbalance_ratio < self.config.min_imbalance_ratio {
            Verdict::Misaligned
        } else {
            Verdict::Aligned
        }
    }
}
