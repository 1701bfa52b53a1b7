//! End-to-end demodulation pipeline.
//!
//! DC block -> downconvert -> low-pass -> decimate -> FM discriminate, applied
//! chunk by chunk. Each stage owns its state, so memory use depends on the
//! chunk size and the filter length, not on the length of the recording.
//!
//! Every stage's output is checked for non-finite values. The first one aborts
//! the run with [`Error::NumericAnomaly`], naming the stage and the index of
//! the offending sample in that stage's output stream.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::{debug, info, warn, Level};

use crate::config::{DemodConfig, OutputScale};
use crate::dsp::{
    design_lowpass, first_non_finite, DcBlocker, Decimator, DemodulatedStream, Downconverter,
    DspBlock, FirFilter, FirFilterStage, FmDemodulator,
};
use crate::error::{Error, Result, Stage};
use crate::input::SampleSource;
use crate::output::SampleSink;
use crate::spectrum::{dominant_frequency, peak_frequency};

const STAGE_COUNT: usize = 6;

/// Totals reported at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub input_rate: u32,
    pub output_rate: f64,
    pub input_samples: u64,
    pub output_samples: u64,
    pub chunks: u64,
    pub filter_taps: usize,
}

pub struct Pipeline {
    dc_blocker: DcBlocker,
    mixer: Downconverter,
    lowpass: FirFilterStage,
    decimator: Decimator,
    demodulator: FmDemodulator,
    input_rate: u32,
    output_rate: f64,
    scale: OutputScale,
    /// Samples produced so far by each stage, indexed by `Stage as usize`
    produced: [u64; STAGE_COUNT],
    planner: FftPlanner<f32>,
}

impl Pipeline {
    /// Validate `config` against `sample_rate`, design the low-pass filter and
    /// build every stage. Nothing is processed if this fails.
    pub fn new(config: &DemodConfig, sample_rate: u32) -> Result<Self> {
        let spec = config.validate(sample_rate)?;
        let filter = design_lowpass(&spec)?;
        let input_rate = sample_rate as f64;

        info!(
            taps = filter.len(),
            dc_gain = filter.dc_gain(),
            cutoff_hz = spec.cutoff_hz,
            stopband_hz = spec.stopband_hz,
            attenuation_db = spec.attenuation_db,
            "low-pass filter ready"
        );

        let pipeline = Self {
            dc_blocker: DcBlocker::new(config.dc_block_alpha)?,
            mixer: Downconverter::new(config.mix_frequency_hz, input_rate)?,
            lowpass: FirFilterStage::new(filter),
            decimator: Decimator::new(config.decimation_factor)?,
            demodulator: FmDemodulator::new(),
            input_rate: sample_rate,
            output_rate: config.output_rate(input_rate),
            scale: config.output_scale,
            produced: [0; STAGE_COUNT],
            planner: FftPlanner::new(),
        };

        debug!(
            dc_block_alpha = config.dc_block_alpha,
            mix_frequency_hz = pipeline.mixer.offset_hz(),
            phase_increment = pipeline.mixer.increment(),
            decimation_factor = pipeline.decimator.factor(),
            output_rate = pipeline.output_rate,
            "pipeline stages configured"
        );

        Ok(pipeline)
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Rate of the demodulated output in Hz
    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    pub fn filter(&self) -> &FirFilter {
        self.lowpass.filter()
    }

    /// Number of samples `stage` has produced so far
    pub fn produced(&self, stage: Stage) -> u64 {
        self.produced[stage as usize]
    }

    /// Run one chunk of raw IQ samples through every stage
    pub fn process_chunk(&mut self, chunk: &[Complex<f32>]) -> Result<Vec<f32>> {
        let first_chunk = self.produced(Stage::Source) == 0;

        self.check(Stage::Source, chunk)?;
        let blocked = self.dc_blocker.process(chunk);
        self.check(Stage::DcBlocker, &blocked)?;
        let mixed = self.mixer.process(&blocked);
        self.check(Stage::Downconverter, &mixed)?;
        let filtered = self.lowpass.process(&mixed);
        self.check(Stage::LowPassFilter, &filtered)?;
        let decimated = self.decimator.process(&filtered);
        self.check(Stage::Decimator, &decimated)?;

        let mut audio = self.demodulator.process(&decimated);
        if let Some(i) = audio.iter().position(|v| !v.is_finite()) {
            return Err(Error::NumericAnomaly {
                stage: Stage::FmDemodulator,
                index: self.produced(Stage::FmDemodulator) + i as u64,
            });
        }
        self.produced[Stage::FmDemodulator as usize] += audio.len() as u64;

        if first_chunk && !chunk.is_empty() && tracing::enabled!(Level::DEBUG) {
            self.report_spectra(&[
                (Stage::DcBlocker, &blocked),
                (Stage::Downconverter, &mixed),
                (Stage::LowPassFilter, &filtered),
                (Stage::Decimator, &decimated),
            ]);
            if let Some(peak) = dominant_frequency(&audio, self.output_rate, &mut self.planner) {
                debug!(
                    stage = %Stage::FmDemodulator,
                    peak_hz = peak.frequency_hz,
                    power_db = peak.power_db,
                    "spectral peak"
                );
            }
        }

        if self.scale == OutputScale::Hertz {
            let hz_per_radian = (self.output_rate / std::f64::consts::TAU) as f32;
            for v in audio.iter_mut() {
                *v *= hz_per_radian;
            }
        }

        Ok(audio)
    }

    /// Check end-of-stream conditions once the source is exhausted
    pub fn finish(&self) -> Result<()> {
        let decimated = self.produced(Stage::Decimator);
        if decimated < 2 {
            return Err(Error::InsufficientData {
                stage: Stage::FmDemodulator,
                required: 2,
                available: decimated as usize,
            });
        }
        Ok(())
    }

    /// Return every stage to its initial state
    pub fn reset(&mut self) {
        self.dc_blocker.reset();
        self.mixer.reset();
        self.lowpass.reset();
        self.decimator.reset();
        self.demodulator.reset();
        self.produced = [0; STAGE_COUNT];
    }

    fn check(&mut self, stage: Stage, data: &[Complex<f32>]) -> Result<()> {
        let offset = self.produced[stage as usize];
        if let Some(i) = first_non_finite(data) {
            return Err(Error::NumericAnomaly {
                stage,
                index: offset + i as u64,
            });
        }
        self.produced[stage as usize] = offset + data.len() as u64;
        Ok(())
    }

    fn report_spectra(&mut self, stages: &[(Stage, &Vec<Complex<f32>>)]) {
        for &(stage, data) in stages {
            let rate = if stage == Stage::Decimator {
                self.output_rate
            } else {
                self.input_rate as f64
            };
            if let Some(peak) = peak_frequency(data, rate, &mut self.planner) {
                debug!(
                    stage = %stage,
                    peak_hz = peak.frequency_hz,
                    power_db = peak.power_db,
                    "spectral peak"
                );
            }
        }
    }

    fn summary(&self, chunks: u64) -> RunSummary {
        RunSummary {
            input_rate: self.input_rate,
            output_rate: self.output_rate,
            input_samples: self.produced(Stage::Source),
            output_samples: self.produced(Stage::FmDemodulator),
            chunks,
            filter_taps: self.filter().len(),
        }
    }
}

/// Stream `source` through the pipeline into `sink`, one chunk at a time
///
/// If processing fails after the sink was opened, the sink is aborted so no
/// truncated output is left behind.
pub fn run_into<S, K>(config: &DemodConfig, source: &mut S, sink: &mut K) -> Result<RunSummary>
where
    S: SampleSource + ?Sized,
    K: SampleSink + ?Sized,
{
    let mut pipeline = Pipeline::new(config, source.sample_rate())?;
    info!(
        input_rate = pipeline.input_rate(),
        output_rate = pipeline.output_rate(),
        chunk_size = config.chunk_size,
        "starting demodulation"
    );

    sink.begin(pipeline.output_rate())?;
    let chunks = match stream_chunks(&mut pipeline, config.chunk_size, &mut *source, &mut *sink) {
        Ok(chunks) => chunks,
        Err(e) => {
            if let Err(cleanup) = sink.abort() {
                warn!(error = %cleanup, "could not discard partial output");
            }
            return Err(e);
        }
    };

    let summary = pipeline.summary(chunks);
    info!(
        input_samples = summary.input_samples,
        output_samples = summary.output_samples,
        chunks = summary.chunks,
        "demodulation finished"
    );
    Ok(summary)
}

fn stream_chunks<S, K>(
    pipeline: &mut Pipeline,
    chunk_size: usize,
    source: &mut S,
    sink: &mut K,
) -> Result<u64>
where
    S: SampleSource + ?Sized,
    K: SampleSink + ?Sized,
{
    let mut chunks = 0u64;
    while let Some(chunk) = source.next_chunk(chunk_size)? {
        let audio = pipeline.process_chunk(&chunk)?;
        sink.write(&audio)?;
        chunks += 1;
    }
    pipeline.finish()?;
    sink.finish()?;
    Ok(chunks)
}

/// Demodulate `source` completely and return the output in memory
pub fn run<S>(config: &DemodConfig, source: &mut S) -> Result<DemodulatedStream>
where
    S: SampleSource + ?Sized,
{
    let mut collector = CollectSink::default();
    run_into(config, source, &mut collector)?;
    Ok(DemodulatedStream::new(collector.sample_rate, collector.samples))
}

#[derive(Default)]
struct CollectSink {
    sample_rate: f64,
    samples: Vec<f32>,
}

impl SampleSink for CollectSink {
    fn begin(&mut self, sample_rate: f64) -> Result<()> {
        self.sample_rate = sample_rate;
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
