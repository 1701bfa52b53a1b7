//! Numerically controlled oscillator (NCO) downconverter.
//!
//! Shifts the channel at `offset_hz` to 0 Hz by multiplying every sample with
//! `exp(j * phase)`, where the phase advances by `-2π * offset / sample_rate`
//! per sample. The phase is a running accumulator wrapped into (-π, π] after
//! every sample, so precision does not degrade on long recordings and the
//! oscillator continues seamlessly across chunk boundaries.
//!
//! The offset is used as given, including values beyond the Nyquist
//! frequency: a capture that holds an alias of a higher channel is tuned by
//! naming the alias frequency.
//!
//! # Example
//!
//! ```
//! use rustfft::num_complex::Complex;
//! use iq_demod::dsp::{Downconverter, DspBlock};
//!
//! // A tone at +10 kHz ends up at DC
//! let rate = 100_000.0;
//! let mut mixer = Downconverter::new(10_000.0, rate).unwrap();
//! let tone: Vec<Complex<f32>> = (0..16)
//!     .map(|n| Complex::from_polar(1.0, (std::f64::consts::TAU * 0.1 * n as f64) as f32))
//!     .collect();
//! let mixed = mixer.process(&tone);
//! assert!((mixed[15] - Complex::new(1.0, 0.0)).norm() < 1e-4);
//! ```

use std::f64::consts::{PI, TAU};

use rustfft::num_complex::Complex;

use super::DspBlock;
use crate::error::{Error, Result};

/// Wrap a phase into (-π, π]
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase - TAU * ((phase + PI) / TAU).floor();
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[derive(Debug, Clone)]
pub struct Downconverter {
    /// Current oscillator phase in radians, always within (-π, π]
    phase: f64,
    /// Phase step per sample in radians
    increment: f64,
    offset_hz: f64,
}

impl Downconverter {
    /// Create a downconverter moving `offset_hz` to baseband
    ///
    /// # Arguments
    ///
    /// * `offset_hz` - Signed channel offset in Hz; positive moves a channel
    ///   above the centre down to DC
    /// * `sample_rate` - Input sample rate in Hz
    pub fn new(offset_hz: f64, sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::configuration(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if !offset_hz.is_finite() {
            return Err(Error::configuration(format!(
                "mix frequency must be finite, got {}",
                offset_hz
            )));
        }

        Ok(Self {
            phase: 0.0,
            increment: wrap_phase(-TAU * offset_hz / sample_rate),
            offset_hz,
        })
    }

    pub fn offset_hz(&self) -> f64 {
        self.offset_hz
    }

    /// Phase step per sample, wrapped into (-π, π]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Current oscillator phase in radians
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl DspBlock for Downconverter {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut out = Vec::with_capacity(data.len());
        for &s in data {
            let lo = Complex::new(self.phase.cos() as f32, self.phase.sin() as f32);
            out.push(s * lo);
            self.phase = wrap_phase(self.phase + self.increment);
        }
        out
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}
