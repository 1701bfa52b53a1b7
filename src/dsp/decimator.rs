//! Integer-factor decimator.
//!
//! Keeps samples 0, M, 2M, ... of the whole stream and drops the rest. The
//! position within the current group of `M` samples is carried between calls,
//! so chunk boundaries do not have to be multiples of `M`.
//!
//! The decimator does not filter. It relies on an upstream low-pass stage whose
//! cutoff lies below half of the decimated rate.
//!
//! # Example
//!
//! ```rust
//! use iq_demod::dsp::decimator::Decimator;
//! use iq_demod::dsp::DspBlock;
//! use rustfft::num_complex::Complex;
//!
//! let mut decimator = Decimator::new(8).unwrap();
//!
//! let input: Vec<Complex<f32>> = (0..1024)
//!     .map(|i| Complex::new(i as f32, 0.0))
//!     .collect();
//!
//! let output = decimator.process(&input);
//! assert_eq!(output.len(), 128);
//! assert_eq!(output[3].re, 24.0);
//! ```

use rustfft::num_complex::Complex;

use super::{DspBlock, SampleStream};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Decimator {
    factor: usize,
    /// Samples still to drop before the next one is kept
    skip: usize,
}

impl Decimator {
    /// Creates a new decimator with the specified decimation factor.
    ///
    /// Returns a configuration error if `factor` is 0.
    pub fn new(factor: usize) -> Result<Self> {
        if factor < 1 {
            return Err(Error::configuration(
                "decimation factor must be at least 1",
            ));
        }
        Ok(Self { factor, skip: 0 })
    }

    /// Returns the decimation factor.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Sample rate after decimation
    pub fn output_rate(&self, input_rate: f64) -> f64 {
        input_rate / self.factor as f64
    }

    /// Decimate a complete stream, dividing its rate by the factor
    pub fn decimate(&mut self, stream: &SampleStream) -> SampleStream {
        SampleStream::new(
            self.output_rate(stream.sample_rate),
            self.process(&stream.samples),
        )
    }
}

impl DspBlock for Decimator {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut output = Vec::with_capacity(data.len() / self.factor + 1);
        for &s in data {
            if self.skip == 0 {
                output.push(s);
                self.skip = self.factor - 1;
            } else {
                self.skip -= 1;
            }
        }
        output
    }

    fn reset(&mut self) {
        self.skip = 0;
    }
}
