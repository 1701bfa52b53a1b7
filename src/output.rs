use chrono::{DateTime, Local};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Consumer of demodulated samples
pub trait SampleSink {
    /// Called once before the first write with the output sample rate in Hz
    fn begin(&mut self, sample_rate: f64) -> Result<()>;

    fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Flush and close; no writes follow
    fn finish(&mut self) -> Result<()>;

    /// Discard whatever was written; called instead of `finish` when a run fails
    fn abort(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Demodulated audio written as mono float32 WAV (playable, and readable by inspectrum)
/// The container rate is the output rate rounded down to whole Hz
pub struct WavAudioSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    samples_written: u64,
}

impl WavAudioSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
            samples_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }
}

impl SampleSink for WavAudioSink {
    fn begin(&mut self, sample_rate: f64) -> Result<()> {
        let rate = sample_rate.floor();
        if !(rate >= 1.0 && rate <= u32::MAX as f64) {
            return Err(Error::configuration(format!(
                "output sample rate {} Hz cannot be stored in a WAV file",
                sample_rate
            )));
        }

        let spec = WavSpec {
            channels: 1,
            sample_rate: rate as u32,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        self.writer = Some(WavWriter::create(&self.path, spec)?);
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::format("WAV sink written before begin()"))?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        // Dropping the writer closes the file before it is removed
        if self.writer.take().is_none() {
            return Ok(());
        }
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Generate the default output filename for a run started at `base_time`
pub fn generate_filename(base_time: DateTime<Local>) -> String {
    format!("demod_{}.wav", base_time.format("%Y-%m-%d_%H-%M-%S"))
}
