pub mod wav;

use rustfft::num_complex::Complex;

use crate::error::Result;

pub use wav::WavIqSource;

/// Supplier of complex IQ samples for the pipeline
pub trait SampleSource {
    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Read up to `max_samples` samples
    /// Returns None once the source is exhausted
    fn next_chunk(&mut self, max_samples: usize) -> Result<Option<Vec<Complex<f32>>>>;
}

/// IQ samples already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    sample_rate: u32,
    samples: Vec<Complex<f32>>,
    position: usize,
}

impl MemorySource {
    pub fn new(sample_rate: u32, samples: Vec<Complex<f32>>) -> Self {
        Self {
            sample_rate,
            samples,
            position: 0,
        }
    }
}

impl SampleSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_chunk(&mut self, max_samples: usize) -> Result<Option<Vec<Complex<f32>>>> {
        if self.position >= self.samples.len() || max_samples == 0 {
            return Ok(None);
        }
        let end = self.position.saturating_add(max_samples).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}
