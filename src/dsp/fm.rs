//! FM demodulation.
//!
//! [`FmDemodulator`] is a phase-difference discriminator: for consecutive
//! samples it outputs `arg(x[n + 1] * conj(x[n]))`, the phase step in radians
//! per sample, in the principal range (-π, π]. Multiplying by
//! `sample_rate / 2π` gives the instantaneous frequency in Hz.
//!
//! A stream of `L` samples yields `L - 1` outputs. The last sample of each chunk
//! is kept so the first output of the next chunk pairs with it.
//!
//! # Example
//!
//! ```
//! use iq_demod::dsp::FmDemodulator;
//! use rustfft::num_complex::Complex;
//!
//! let mut demod = FmDemodulator::new();
//! let samples = vec![
//!     Complex::new(1.0, 0.0),
//!     Complex::new(0.0, 1.0),
//!     Complex::new(-1.0, 0.0),
//! ];
//! let phase = demod.process(&samples);
//! assert_eq!(phase.len(), 2);
//! assert!((phase[0] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
//! ```

use std::f32::consts::PI;

use rustfft::num_complex::Complex;

use super::{DemodulatedStream, SampleStream};
use crate::error::{Error, Result, Stage};

/// Phase-difference FM discriminator.
#[derive(Debug, Clone, Default)]
pub struct FmDemodulator {
    /// Last sample of the previous chunk
    last: Option<Complex<f32>>,
}

impl FmDemodulator {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Demodulate the next chunk of the stream.
    ///
    /// Returns one value per input sample, except for the very first sample of
    /// the stream which only serves as the phase reference.
    pub fn process(&mut self, samples: &[Complex<f32>]) -> Vec<f32> {
        let mut phases = Vec::with_capacity(samples.len());
        for &sample in samples {
            if let Some(last) = self.last {
                phases.push(phase_step(last, sample));
            }
            self.last = Some(sample);
        }
        phases
    }

    /// Demodulate a complete stream.
    ///
    /// Fails with [`Error::InsufficientData`] if the stream has fewer than two
    /// samples.
    pub fn demodulate(&mut self, stream: &SampleStream) -> Result<DemodulatedStream> {
        if stream.len() < 2 {
            return Err(Error::InsufficientData {
                stage: Stage::FmDemodulator,
                required: 2,
                available: stream.len(),
            });
        }
        self.reset();
        Ok(DemodulatedStream::new(
            stream.sample_rate,
            self.process(&stream.samples),
        ))
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Phase advance from `prev` to `next`, in (-π, π]
fn phase_step(prev: Complex<f32>, next: Complex<f32>) -> f32 {
    let d = (next * prev.conj()).arg();
    if d <= -PI {
        PI
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn exponential(omega: f64, len: usize) -> Vec<Complex<f32>> {
        (0..len)
            .map(|n| {
                let phase = omega * n as f64;
                Complex::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect()
    }

    #[test]
    fn test_constant_frequency_gives_constant_output() {
        for omega in [0.0, 0.1, -0.7, 1.5, 3.0, -3.0] {
            let mut demod = FmDemodulator::new();
            let out = demod.process(&exponential(omega, 300));
            assert_eq!(out.len(), 299);
            for &v in &out {
                assert_relative_eq!(v as f64, omega, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_frequency_above_pi_wraps() {
        // 4.0 rad/sample aliases to 4.0 - 2π
        let mut demod = FmDemodulator::new();
        let out = demod.process(&exponential(4.0, 50));
        for &v in &out {
            assert_relative_eq!(v as f64, 4.0 - std::f64::consts::TAU, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_half_turn_maps_to_positive_pi() {
        let prev = Complex::new(1.0, 0.0);
        let next = Complex::new(-1.0, -0.0);
        assert_eq!(phase_step(prev, next), PI);
    }

    #[test]
    fn test_amplitude_does_not_matter() {
        let mut demod = FmDemodulator::new();
        let samples = vec![Complex::new(3.0, 0.0), Complex::new(0.0, 0.01)];
        let out = demod.process(&samples);
        assert_relative_eq!(out[0], std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_insufficient_data() {
        let mut demod = FmDemodulator::new();
        for len in [0, 1] {
            let stream = SampleStream::new(1_000.0, vec![Complex::new(1.0, 0.0); len]);
            match demod.demodulate(&stream) {
                Err(Error::InsufficientData {
                    stage, available, ..
                }) => {
                    assert_eq!(stage, Stage::FmDemodulator);
                    assert_eq!(available, len);
                }
                other => panic!("expected InsufficientData, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_demodulate_stream_length_and_rate() {
        let mut demod = FmDemodulator::new();
        let stream = SampleStream::new(25_000.0, exponential(0.2, 10));
        let out = demod.demodulate(&stream).unwrap();
        assert_eq!(out.len(), 9);
        assert_eq!(out.sample_rate, 25_000.0);
    }

    #[test]
    fn test_chunked_matches_single_call() {
        let input: Vec<Complex<f32>> = (0..500)
            .map(|n| Complex::from_polar(1.0, (n as f32 * 0.01).sin() * 5.0))
            .collect();
        let mut whole = FmDemodulator::new();
        let expected = whole.process(&input);

        let mut chunked = FmDemodulator::new();
        let mut actual = Vec::new();
        for chunk in input.chunks(1) {
            actual.extend(chunked.process(chunk));
        }
        assert_eq!(actual, expected);
        assert_eq!(actual.len(), 499);
    }
}
