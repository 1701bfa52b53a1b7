//! A single-pole DC blocking filter for complex samples.
//!
//! Implements `y[n] = x[n] - x[n-1] + alpha * y[n-1]`. The zero at DC removes
//! any constant bias, the pole at `alpha` keeps the notch narrow. Values of
//! `alpha` closer to 1 give a narrower notch and a slower settling time.
//!
//! # Example
//! ```
//! use rustfft::num_complex::Complex;
//! use iq_demod::dsp::{DcBlocker, DspBlock};
//!
//! let mut blocker = DcBlocker::new(0.99).unwrap();
//! let biased = vec![Complex::new(0.5, -0.25); 2000];
//! let out = blocker.process(&biased);
//! assert!(out[1999].norm() < 1e-3);
//! ```

use rustfft::num_complex::Complex;

use super::DspBlock;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct DcBlocker {
    alpha: f32,
    /// Previous input sample
    last_in: Complex<f32>,
    /// Previous output sample
    last_out: Complex<f32>,
}

impl DcBlocker {
    /// Create a DC blocker; `alpha` must lie strictly between 0 and 1
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::configuration(format!(
                "dc block alpha must be in (0, 1), got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha: alpha as f32,
            last_in: Complex::new(0.0, 0.0),
            last_out: Complex::new(0.0, 0.0),
        })
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl DspBlock for DcBlocker {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut out = Vec::with_capacity(data.len());
        for &x in data {
            let y = x - self.last_in + self.last_out * self.alpha;
            self.last_in = x;
            self.last_out = y;
            out.push(y);
        }
        out
    }

    fn reset(&mut self) {
        self.last_in = Complex::new(0.0, 0.0);
        self.last_out = Complex::new(0.0, 0.0);
    }
}
