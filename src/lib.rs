//! Narrowband FM demodulation of complex baseband (IQ) recordings.
//!
//! A recording is DC blocked, shifted so the channel of interest sits at
//! 0 Hz, low-pass filtered with a Kaiser-windowed FIR, decimated, and FM
//! discriminated into a real-valued stream of phase steps.
//!
//! ```no_run
//! use iq_demod::{run_into, DemodConfig, WavAudioSink, WavIqSource};
//!
//! let config = DemodConfig {
//!     mix_frequency_hz: 629_000.0,
//!     decimation_factor: 166,
//!     ..Default::default()
//! };
//! let mut source = WavIqSource::open("capture.wav")?;
//! let mut sink = WavAudioSink::new("audio.wav");
//! run_into(&config, &mut source, &mut sink)?;
//! # Ok::<(), iq_demod::Error>(())
//! ```

pub mod config;
pub mod dsp;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod spectrum;

pub use config::{DemodConfig, OutputScale};
pub use dsp::{DemodulatedStream, SampleStream};
pub use error::{Error, Result, Stage};
pub use input::{MemorySource, SampleSource, WavIqSource};
pub use output::{SampleSink, WavAudioSink};
pub use pipeline::{run, run_into, Pipeline, RunSummary};
