//! Digital Signal Processing (DSP) module.
//!
//! Streaming building blocks for narrowband FM reception. Every block owns its
//! own state and can be fed a stream in chunks of any size: the output of a
//! chunked run is identical to the output of a single call on the whole
//! stream.
//!
//! # Modules
//! - `dc_block`: single-pole DC blocking filter.
//! - `mixer`: NCO-based downconverter.
//! - `design`: Kaiser windowed-sinc low-pass design.
//! - `fir`: streaming FIR filter stage.
//! - `decimator`: integer-factor decimation.
//! - `fm`: phase-difference FM discriminator.
//!
//! # Traits
//! - [`DspBlock`]: a complex-in, complex-out streaming block.

use rustfft::num_complex::Complex;

pub mod dc_block;
pub mod decimator;
pub mod design;
pub mod fir;
pub mod fm;
pub mod mixer;

pub use dc_block::DcBlocker;
pub use decimator::Decimator;
pub use design::{design_lowpass, FilterSpec, FirFilter};
pub use fir::FirFilterStage;
pub use fm::FmDemodulator;
pub use mixer::Downconverter;

pub trait DspBlock {
    /// Process the next chunk of the stream
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>>;

    /// Return to the state of a freshly constructed block
    fn reset(&mut self);
}

/// Ordered complex samples at a constant sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStream {
    pub sample_rate: f64,
    pub samples: Vec<Complex<f32>>,
}

impl SampleStream {
    pub fn new(sample_rate: f64, samples: Vec<Complex<f32>>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Run the whole stream through `block`, keeping the rate
    pub fn apply<B: DspBlock>(&self, block: &mut B) -> SampleStream {
        SampleStream::new(self.sample_rate, block.process(&self.samples))
    }
}

/// Real-valued discriminator output at the decimated rate.
///
/// `samples[n]` is the phase step from decimated input `n` to `n + 1`, so it
/// is timestamped at decimated input `n + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemodulatedStream {
    pub sample_rate: f64,
    pub samples: Vec<f32>,
}

impl DemodulatedStream {
    pub fn new(sample_rate: f64, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time in seconds of output sample `n`, relative to the first input sample
    pub fn timestamp(&self, n: usize) -> f64 {
        (n + 1) as f64 / self.sample_rate
    }

    /// Convert radians-per-sample values to instantaneous frequency in Hz
    pub fn to_hertz(&self) -> DemodulatedStream {
        let scale = (self.sample_rate / std::f64::consts::TAU) as f32;
        DemodulatedStream::new(
            self.sample_rate,
            self.samples.iter().map(|&s| s * scale).collect(),
        )
    }
}

/// Index of the first non-finite sample, if any
pub(crate) fn first_non_finite(data: &[Complex<f32>]) -> Option<usize> {
    data.iter().position(|s| !s.re.is_finite() || !s.im.is_finite())
}
