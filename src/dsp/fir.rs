//! Streaming FIR filter stage.
//!
//! Applies a [`FirFilter`] to complex samples by causal convolution,
//! `y[n] = Σ taps[k] * x[n - k]`. The most recent `N - 1` inputs are kept in a
//! ring buffer, so a stream can be filtered in chunks of any size and the
//! result matches filtering the whole stream at once. History starts out as
//! zeros.
//!
//! # Example
//!
//! ```
//! use rustfft::num_complex::Complex;
//! use iq_demod::dsp::{design_lowpass, DspBlock, FilterSpec, FirFilterStage};
//!
//! let filter = design_lowpass(&FilterSpec::new(5_000.0, 10_000.0, 60.0, 250_000.0)).unwrap();
//! let mut stage = FirFilterStage::new(filter);
//! let out = stage.process(&vec![Complex::new(1.0, 0.0); 500]);
//! assert_eq!(out.len(), 500);
//! assert!((out[499].re - 1.0).abs() < 1e-3);
//! ```

use rustfft::num_complex::Complex;

use super::design::FirFilter;
use super::DspBlock;

#[derive(Debug, Clone)]
pub struct FirFilterStage {
    filter: FirFilter,
    /// Previous `N - 1` inputs; `history[head]` is the newest
    history: Vec<Complex<f32>>,
    head: usize,
}

impl FirFilterStage {
    pub fn new(filter: FirFilter) -> Self {
        let history = vec![Complex::new(0.0, 0.0); filter.len().saturating_sub(1)];
        Self {
            filter,
            history,
            head: 0,
        }
    }

    pub fn filter(&self) -> &FirFilter {
        &self.filter
    }

    /// Filter one sample, then push it into the history
    pub fn process_sample(&mut self, x: Complex<f32>) -> Complex<f32> {
        let taps = self.filter.taps();
        let Some((&first, rest)) = taps.split_first() else {
            return Complex::new(0.0, 0.0);
        };

        let mut acc = x * first;
        let len = self.history.len();
        if len == 0 {
            return acc;
        }

        let mut idx = self.head;
        for &tap in rest {
            acc += self.history[idx] * tap;
            idx = if idx == 0 { len - 1 } else { idx - 1 };
        }

        self.head = (self.head + 1) % len;
        self.history[self.head] = x;
        acc
    }
}

impl DspBlock for FirFilterStage {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        data.iter().map(|&x| self.process_sample(x)).collect()
    }

    fn reset(&mut self) {
        for s in self.history.iter_mut() {
            *s = Complex::new(0.0, 0.0);
        }
        self.head = 0;
    }
}
