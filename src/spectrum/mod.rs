use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// The spectral transform consumed by the imbalance detector: a forward
/// complex FFT plus a power-spectrum reduction. Kept behind a trait so the
/// detector can be exercised with synthetic spectra.
pub trait SpectrumAnalyzer {
    /// In-place forward transform of a complex time-domain buffer.
    fn forward(&mut self, buffer: &mut [Complex<f32>]);

    /// Writes `|input[k]|^2` for each bin into `output`.
    fn magnitude_squared(&self, input: &[Complex<f32>], output: &mut [f32]);
}

pub struct RustFftAnalyzer {
    forward_fft: Arc<dyn Fft<f32>>,
}

impl RustFftAnalyzer {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward_fft: planner.plan_fft_forward(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.forward_fft.len()
    }
}

impl SpectrumAnalyzer for RustFftAnalyzer {
    fn forward(&mut self, buffer: &mut [Complex<f32>]) {
        self.forward_fft.process(buffer);
    }

    fn magnitude_squared(&self, input: &[Complex<f32>], output: &mut [f32]) {
        debug_assert!(output.len() >= input.len());
        for (out, bin) in output.iter_mut().zip(input.iter()) {
            *out = bin.norm_sqr();
        }
    }
}
