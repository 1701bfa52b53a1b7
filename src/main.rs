use chrono::Local;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::{info, Level};

use iq_demod::output::generate_filename;
use iq_demod::{run_into, DemodConfig, OutputScale, SampleSource, WavAudioSink, WavIqSource};

/// Demodulate a narrowband FM channel from an IQ recording
#[derive(Parser, Debug)]
#[command(name = "iq-demod")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input stereo WAV file (I = left, Q = right)
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// Output WAV file [default: demod_<timestamp>.wav]
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// TOML configuration file, overridden by the options below
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Offset of the channel to demodulate, in Hz
    #[arg(short, long, value_name = "HZ", allow_negative_numbers = true)]
    mix_freq: Option<f64>,

    /// Low-pass passband edge in Hz
    #[arg(long, value_name = "HZ")]
    cutoff: Option<f64>,

    /// Low-pass stopband edge in Hz
    #[arg(long, value_name = "HZ")]
    stopband: Option<f64>,

    /// Stopband attenuation in dB
    #[arg(long, value_name = "DB")]
    attenuation: Option<f64>,

    /// Integer decimation factor
    #[arg(short, long, value_name = "M")]
    decimation: Option<usize>,

    /// DC blocker pole, between 0 and 1
    #[arg(long, value_name = "A")]
    dc_alpha: Option<f64>,

    /// IQ samples read per chunk
    #[arg(long, value_name = "N")]
    chunk_size: Option<usize>,

    /// Unit of the output samples
    #[arg(long, value_enum)]
    scale: Option<OutputScale>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply_overrides(&self, config: &mut DemodConfig) {
        if let Some(hz) = self.mix_freq {
            config.mix_frequency_hz = hz;
        }
        if let Some(hz) = self.cutoff {
            config.lowpass_cutoff_hz = hz;
        }
        if let Some(hz) = self.stopband {
            config.lowpass_stopband_hz = hz;
        }
        if let Some(db) = self.attenuation {
            config.stopband_attenuation_db = db;
        }
        if let Some(m) = self.decimation {
            config.decimation_factor = m;
        }
        if let Some(alpha) = self.dc_alpha {
            config.dc_block_alpha = alpha;
        }
        if let Some(n) = self.chunk_size {
            config.chunk_size = n;
        }
        if let Some(scale) = self.scale {
            config.output_scale = scale;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => DemodConfig::from_toml_file(path)?,
        None => DemodConfig::default(),
    };
    args.apply_overrides(&mut config);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(generate_filename(Local::now())));

    let mut source = WavIqSource::open(&args.input_file)?;
    info!(
        input = %args.input_file.display(),
        sample_rate = source.sample_rate(),
        iq_samples = source.total_samples(),
        "opened recording"
    );

    let mut sink = WavAudioSink::new(&output_path);
    let summary = run_into(&config, &mut source, &mut sink)?;

    println!(
        "Demodulated {} IQ samples at {} Hz into {} samples at {:.1} Hz",
        summary.input_samples, summary.input_rate, summary.output_samples, summary.output_rate
    );
    println!("Filter: {} taps", summary.filter_taps);
    println!("Output: {}", output_path.display());

    Ok(())
}
