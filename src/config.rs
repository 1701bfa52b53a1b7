//! Pipeline configuration.
//!
//! Options can come from a TOML file, e.g.
//!
//! ```toml
//! mix_frequency_hz = 629000
//! lowpass_cutoff_hz = 5000
//! lowpass_stopband_hz = 10000
//! stopband_attenuation_db = 60
//! decimation_factor = 166
//! ```
//!
//! Missing keys fall back to the defaults. The camelCase spellings
//! (`dcBlockAlpha`, `mixFrequencyHz`, ...) are accepted as aliases.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::dsp::FilterSpec;
use crate::error::{Error, Result};

/// Unit of the demodulated output samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputScale {
    /// Phase step per sample, in radians
    #[default]
    Radians,
    /// Instantaneous frequency deviation, in Hz
    Hertz,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemodConfig {
    /// DC blocker pole, strictly between 0 and 1
    #[serde(alias = "dcBlockAlpha")]
    pub dc_block_alpha: f64,
    /// Channel offset moved to baseband, may exceed the Nyquist frequency
    #[serde(alias = "mixFrequencyHz")]
    pub mix_frequency_hz: f64,
    /// Low-pass passband edge in Hz
    #[serde(alias = "lowpassCutoffHz")]
    pub lowpass_cutoff_hz: f64,
    /// Low-pass stopband edge in Hz
    #[serde(alias = "lowpassStopbandHz")]
    pub lowpass_stopband_hz: f64,
    #[serde(alias = "stopbandAttenuationDb")]
    pub stopband_attenuation_db: f64,
    #[serde(alias = "decimationFactor")]
    pub decimation_factor: usize,
    /// Input samples processed per chunk
    #[serde(alias = "chunkSize")]
    pub chunk_size: usize,
    #[serde(alias = "outputScale")]
    pub output_scale: OutputScale,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            dc_block_alpha: 0.99,
            mix_frequency_hz: 0.0,
            lowpass_cutoff_hz: 5_000.0,
            lowpass_stopband_hz: 10_000.0,
            stopband_attenuation_db: 60.0,
            decimation_factor: 10,
            chunk_size: 65_536,
            output_scale: OutputScale::Radians,
        }
    }
}

impl DemodConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Sample rate after decimation
    pub fn output_rate(&self, input_rate: f64) -> f64 {
        input_rate / self.decimation_factor.max(1) as f64
    }

    /// The low-pass filter this configuration asks for at `input_rate`
    pub fn filter_spec(&self, input_rate: f64) -> FilterSpec {
        FilterSpec::new(
            self.lowpass_cutoff_hz,
            self.lowpass_stopband_hz,
            self.stopband_attenuation_db,
            input_rate,
        )
    }

    /// Check every option against the input sample rate.
    ///
    /// Returns the filter specification to design on success. Filter-specific
    /// limits (transition width, attenuation) are left to the designer.
    pub fn validate(&self, sample_rate: u32) -> Result<FilterSpec> {
        if sample_rate == 0 {
            return Err(Error::configuration("sample rate must be positive"));
        }
        if !(self.dc_block_alpha > 0.0 && self.dc_block_alpha < 1.0) {
            return Err(Error::configuration(format!(
                "dc_block_alpha must be in (0, 1), got {}",
                self.dc_block_alpha
            )));
        }
        if !self.mix_frequency_hz.is_finite() {
            return Err(Error::configuration(format!(
                "mix_frequency_hz must be finite, got {}",
                self.mix_frequency_hz
            )));
        }
        if self.decimation_factor < 1 {
            return Err(Error::configuration(
                "decimation_factor must be at least 1",
            ));
        }
        if self.chunk_size < 1 {
            return Err(Error::configuration("chunk_size must be at least 1"));
        }

        let input_rate = sample_rate as f64;
        let decimated_nyquist = self.output_rate(input_rate) / 2.0;
        if self.lowpass_cutoff_hz >= decimated_nyquist {
            return Err(Error::configuration(format!(
                "lowpass_cutoff_hz {} Hz must be below half the decimated rate ({} Hz)",
                self.lowpass_cutoff_hz, decimated_nyquist
            )));
        }
        if self.lowpass_stopband_hz > decimated_nyquist {
            warn!(
                stopband_hz = self.lowpass_stopband_hz,
                decimated_nyquist,
                "stopband edge lies above the decimated Nyquist frequency, transition band will alias"
            );
        }
        if self.mix_frequency_hz.abs() > input_rate / 2.0 {
            warn!(
                mix_frequency_hz = self.mix_frequency_hz,
                sample_rate,
                "mix frequency exceeds the input Nyquist frequency, tuning to an alias"
            );
        }

        Ok(self.filter_spec(input_rate))
    }
}
