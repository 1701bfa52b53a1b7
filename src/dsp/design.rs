//! Kaiser windowed-sinc low-pass filter design.
//!
//! Given a passband edge, a stopband edge and a stopband attenuation, the
//! designer picks the Kaiser shape parameter β and the filter length from
//! Kaiser's empirical formulas, then windows an ideal low-pass impulse
//! response whose corner sits in the middle of the transition band.
//!
//! # Example
//!
//! ```
//! use iq_demod::dsp::{design_lowpass, FilterSpec};
//!
//! let spec = FilterSpec::new(5_000.0, 10_000.0, 60.0, 250_000.0);
//! let filter = design_lowpass(&spec).unwrap();
//! assert_eq!(filter.len() % 2, 1);
//! assert!((filter.dc_gain() - 1.0).abs() < 1e-4);
//! ```

use std::f64::consts::PI;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Extra tap pairs tried when the first design misses the stopband target
const MAX_REFINEMENT_STEPS: usize = 32;

/// Longest filter the designer will produce
pub const MAX_TAPS: usize = 1 << 20;

/// Low-pass filter requirements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Passband edge in Hz
    pub cutoff_hz: f64,
    /// Stopband edge in Hz
    pub stopband_hz: f64,
    /// Minimum attenuation at and beyond the stopband edge, in dB
    pub attenuation_db: f64,
    /// Sample rate the filter runs at, in Hz
    pub sample_rate: f64,
}

impl FilterSpec {
    pub fn new(cutoff_hz: f64, stopband_hz: f64, attenuation_db: f64, sample_rate: f64) -> Self {
        Self {
            cutoff_hz,
            stopband_hz,
            attenuation_db,
            sample_rate,
        }
    }

    /// Transition width normalised to the Nyquist frequency
    pub fn transition_width(&self) -> f64 {
        (self.stopband_hz - self.cutoff_hz) / (self.sample_rate / 2.0)
    }

    fn validate(&self) -> Result<()> {
        let all_finite = self.cutoff_hz.is_finite()
            && self.stopband_hz.is_finite()
            && self.attenuation_db.is_finite()
            && self.sample_rate.is_finite();
        if !all_finite {
            return Err(Error::filter_design(format!(
                "all filter parameters must be finite: {:?}",
                self
            )));
        }
        if self.sample_rate <= 0.0 {
            return Err(Error::filter_design(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.cutoff_hz <= 0.0 {
            return Err(Error::filter_design(format!(
                "cutoff must be positive, got {} Hz",
                self.cutoff_hz
            )));
        }
        if self.cutoff_hz >= self.sample_rate / 2.0 {
            return Err(Error::filter_design(format!(
                "cutoff {} Hz is not below the Nyquist frequency {} Hz",
                self.cutoff_hz,
                self.sample_rate / 2.0
            )));
        }
        if self.transition_width() <= 0.0 {
            return Err(Error::filter_design(format!(
                "stopband edge {} Hz must lie above the cutoff {} Hz",
                self.stopband_hz, self.cutoff_hz
            )));
        }
        if self.stopband_hz > self.sample_rate / 2.0 {
            return Err(Error::filter_design(format!(
                "stopband edge {} Hz lies above the Nyquist frequency {} Hz",
                self.stopband_hz,
                self.sample_rate / 2.0
            )));
        }
        if self.attenuation_db <= 0.0 {
            return Err(Error::filter_design(format!(
                "stopband attenuation must be positive, got {} dB",
                self.attenuation_db
            )));
        }
        Ok(())
    }
}

/// Real FIR coefficients with their DC gain.
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    taps: Vec<f32>,
    dc_gain: f32,
}

impl FirFilter {
    /// Wrap precomputed coefficients; the DC gain is their sum
    pub fn new(taps: Vec<f32>) -> Self {
        let dc_gain = taps.iter().sum();
        Self { taps, dc_gain }
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn dc_gain(&self) -> f32 {
        self.dc_gain
    }

    /// Group delay in samples of the linear-phase response
    pub fn group_delay(&self) -> f64 {
        (self.taps.len().saturating_sub(1)) as f64 / 2.0
    }

    /// Magnitude of the frequency response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        let (re, im) = self
            .taps
            .iter()
            .enumerate()
            .fold((0.0f64, 0.0f64), |(re, im), (k, &tap)| {
                let arg = omega * k as f64;
                (re + tap as f64 * arg.cos(), im - tap as f64 * arg.sin())
            });
        (re * re + im * im).sqrt()
    }

    /// Attenuation at `freq_hz` in dB (positive means the tone is reduced)
    pub fn attenuation_db_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        -20.0 * self.magnitude_at(freq_hz, sample_rate).max(f64::MIN_POSITIVE).log10()
    }
}

/// Kaiser shape parameter β for a stopband attenuation in dB
pub fn kaiser_beta(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

/// Number of taps for the given attenuation and normalised transition width.
///
/// Always odd so the filter is Type-I linear phase.
pub fn kaiser_length(attenuation_db: f64, transition_width: f64) -> usize {
    let estimate = ((attenuation_db - 8.0) / (2.285 * transition_width * PI)).ceil() + 1.0;
    // Saturates at usize::MAX for vanishing widths; NaN falls through to 1
    let taps = if estimate >= 1.0 {
        estimate as usize
    } else {
        1
    };
    taps | 1
}

/// Generate a Kaiser window with shape parameter β
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }

    let half = (length - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(beta);

    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / i0_beta
        })
        .collect()
}

/// Modified Bessel function of the first kind, order 0 (power series)
fn bessel_i0(x: f64) -> f64 {
    let half_x = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..500 {
        term *= (half_x / k as f64) * (half_x / k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

/// Windowed-sinc low-pass taps with the corner at `corner` cycles/sample
fn windowed_sinc(length: usize, corner: f64, beta: f64) -> Vec<f32> {
    let window = kaiser_window(length, beta);
    let mid = (length - 1) as f64 / 2.0;

    let raw: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(n, w)| {
            let x = n as f64 - mid;
            let ideal = if x == 0.0 {
                2.0 * corner
            } else {
                (2.0 * PI * corner * x).sin() / (PI * x)
            };
            ideal * w
        })
        .collect();

    // Normalize to unity gain at DC
    let norm: f64 = raw.iter().sum();
    raw.iter().map(|v| (v / norm) as f32).collect()
}

/// Design a low-pass FIR filter meeting `spec`.
///
/// `cutoff_hz` is the passband edge: the windowed-sinc corner sits halfway
/// between it and the stopband edge. A classic `firwin(N, cutoff)` design puts
/// its -6 dB point at the cutoff instead, so with the same parameters this
/// filter passes slightly more bandwidth (for 5 kHz / 10 kHz the -6 dB point
/// is near 7.5 kHz rather than 5 kHz).
///
/// Fails with [`Error::FilterDesign`] if the transition width or attenuation
/// is not positive, the cutoff is not below the Nyquist frequency, or the
/// transition is so narrow that more than [`MAX_TAPS`] taps would be needed.
pub fn design_lowpass(spec: &FilterSpec) -> Result<FirFilter> {
    spec.validate()?;

    let delta = spec.transition_width();
    let beta = kaiser_beta(spec.attenuation_db);
    let corner = (spec.cutoff_hz + spec.stopband_hz) / 2.0 / spec.sample_rate;
    let mut length = kaiser_length(spec.attenuation_db, delta);
    if length > MAX_TAPS {
        return Err(Error::filter_design(format!(
            "transition band {} Hz to {} Hz needs about {} taps, more than the limit of {}",
            spec.cutoff_hz, spec.stopband_hz, length, MAX_TAPS
        )));
    }

    let mut filter = FirFilter::new(windowed_sinc(length, corner, beta));
    for _ in 0..MAX_REFINEMENT_STEPS {
        if filter.attenuation_db_at(spec.stopband_hz, spec.sample_rate) >= spec.attenuation_db {
            break;
        }
        if length + 2 > MAX_TAPS {
            break;
        }
        length += 2;
        filter = FirFilter::new(windowed_sinc(length, corner, beta));
    }

    let achieved = filter.attenuation_db_at(spec.stopband_hz, spec.sample_rate);
    if achieved < spec.attenuation_db {
        warn!(
            requested_db = spec.attenuation_db,
            achieved_db = achieved,
            "stopband attenuation target not reached"
        );
    }
    debug!(
        taps = filter.len(),
        beta,
        transition_width = delta,
        stopband_db = achieved,
        "designed low-pass filter"
    );

    Ok(filter)
}
