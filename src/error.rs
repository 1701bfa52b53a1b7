//! Error handling for the demodulation pipeline
//!
//! Configuration and filter design problems are reported before any sample is
//! processed. Once streaming starts, the first stage fault aborts the run and
//! carries the stage name and the sample index that triggered it.

use std::fmt;
use std::io;

use thiserror::Error;

/// A specialized Result type for iq-demod operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage, used to attribute streaming faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    DcBlocker,
    Downconverter,
    LowPassFilter,
    Decimator,
    FmDemodulator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::DcBlocker => "dc blocker",
            Stage::Downconverter => "downconverter",
            Stage::LowPassFilter => "low-pass filter",
            Stage::Decimator => "decimator",
            Stage::FmDemodulator => "fm demodulator",
        };
        f.write_str(name)
    }
}

/// Error type for iq-demod operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid rate, factor or option, caught before streaming
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Filter specification outside the range the Kaiser design accepts
    #[error("Filter design failure: {0}")]
    FilterDesign(String),

    /// Stream too short for a stage's minimum window
    #[error("Insufficient data: {stage} needs at least {required} samples, got {available}")]
    InsufficientData {
        stage: Stage,
        required: usize,
        available: usize,
    },

    /// Non-finite value produced by a stage
    #[error("Numeric anomaly: {stage} produced a non-finite value at sample {index}")]
    NumericAnomaly { stage: Stage, index: u64 },

    /// Sample container has an unexpected layout
    #[error("Format error: {0}")]
    Format(String),

    /// I/O error from a sample source or sink
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WAV container error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Malformed configuration file
    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a filter design error with a custom message
    pub fn filter_design<S: Into<String>>(msg: S) -> Self {
        Error::FilterDesign(msg.into())
    }

    /// Create a format error with a custom message
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }
}
