use hound::{SampleFormat, WavReader};
use rustfft::num_complex::Complex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::SampleSource;
use crate::error::{Error, Result};

/// Chunked reader for IQ recordings stored as stereo WAV
/// I = left channel, Q = right channel
/// Integer formats are scaled to [-1.0, 1.0), float samples pass through unchanged
pub struct WavIqSource {
    reader: WavReader<BufReader<File>>,
    sample_rate: u32,
    /// None for float files, otherwise the integer full-scale value
    int_scale: Option<f32>,
}

impl WavIqSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        // Validate format
        if spec.channels != 2 {
            return Err(Error::format(format!(
                "Expected stereo WAV (I/Q), got {} channels",
                spec.channels
            )));
        }

        let int_scale = match spec.sample_format {
            SampleFormat::Float => None,
            SampleFormat::Int => Some((1u64 << spec.bits_per_sample.saturating_sub(1)) as f32),
        };

        Ok(Self {
            reader,
            sample_rate: spec.sample_rate,
            int_scale,
        })
    }

    /// Number of IQ frames in the file
    pub fn total_samples(&self) -> usize {
        self.reader.len() as usize / 2
    }
}

impl SampleSource for WavIqSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_chunk(&mut self, max_samples: usize) -> Result<Option<Vec<Complex<f32>>>> {
        // Frames left in the file; bounds the preallocation for huge chunk sizes
        let remaining = self.reader.samples::<i32>().size_hint().0 / 2;
        let mut samples = Vec::with_capacity(max_samples.min(remaining));

        match self.int_scale {
            None => {
                let mut iter = self.reader.samples::<f32>();
                while samples.len() < max_samples {
                    match (iter.next(), iter.next()) {
                        (Some(i), Some(q)) => samples.push(Complex::new(i?, q?)),
                        (Some(i), None) => {
                            i?;
                            return Err(unpaired_sample());
                        }
                        (None, _) => break,
                    }
                }
            }
            Some(max_val) => {
                let mut iter = self.reader.samples::<i32>();
                while samples.len() < max_samples {
                    match (iter.next(), iter.next()) {
                        (Some(i), Some(q)) => {
                            samples.push(Complex::new(i? as f32 / max_val, q? as f32 / max_val))
                        }
                        (Some(i), None) => {
                            i?;
                            return Err(unpaired_sample());
                        }
                        (None, _) => break,
                    }
                }
            }
        }

        if samples.is_empty() {
            Ok(None)
        } else {
            Ok(Some(samples))
        }
    }
}

fn unpaired_sample() -> Error {
    Error::format("WAV data ends with an I sample that has no matching Q sample")
}
