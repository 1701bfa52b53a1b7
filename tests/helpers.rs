//! Test helper utilities for generating synthetic I/Q signals
#![allow(dead_code)]

use rustfft::num_complex::Complex;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

/// Generate a complex exponential exp(j·2π·f·n/fs)
pub fn complex_tone(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<Complex<f32>> {
    (0..num_samples)
        .map(|n| {
            let phase = TAU * frequency * n as f64 / sample_rate;
            Complex::new(phase.cos() as f32, phase.sin() as f32)
        })
        .collect()
}

/// Generate a unit-amplitude FM signal modulated by a single tone
///
/// # Arguments
/// * `carrier` - Carrier offset from 0 Hz
/// * `tone` - Modulating tone frequency in Hz
/// * `deviation` - Peak frequency deviation in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `num_samples` - Number of samples to generate
pub fn fm_tone(
    carrier: f64,
    tone: f64,
    deviation: f64,
    sample_rate: f64,
    num_samples: usize,
) -> Vec<Complex<f32>> {
    let mut phase = 0.0f64;
    let mut out = Vec::with_capacity(num_samples);
    for n in 0..num_samples {
        out.push(Complex::new(phase.cos() as f32, phase.sin() as f32));
        let t = n as f64 / sample_rate;
        let instantaneous = carrier + deviation * (TAU * tone * t).sin();
        phase = (phase + TAU * instantaneous / sample_rate) % TAU;
    }
    out
}

/// Root mean square of a signal after removing its mean
pub fn ac_rms(samples: &[f32]) -> f64 {
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
    let power = samples
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / samples.len() as f64;
    power.sqrt()
}

/// Unique path in the system temp directory
pub fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("iq_demod_{}_{}.wav", name, std::process::id()))
}

/// Write interleaved I/Q as a 16-bit stereo WAV
pub fn write_iq_wav(path: &Path, sample_rate: u32, samples: &[Complex<f32>]) {
    write_iq_wav_int(path, sample_rate, 16, samples);
}

/// Write interleaved I/Q as an integer stereo WAV with `bits` per sample
///
/// 8-bit files are stored unsigned, as the WAV format requires; hound
/// converts on write and read.
pub fn write_iq_wav_int(path: &Path, sample_rate: u32, bits: u16, samples: &[Complex<f32>]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let full_scale = ((1i32 << (bits - 1)) - 1) as f32;
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create IQ WAV");
    for s in samples {
        writer
            .write_sample((s.re * full_scale).round() as i32)
            .expect("Failed to write I");
        writer
            .write_sample((s.im * full_scale).round() as i32)
            .expect("Failed to write Q");
    }
    writer.finalize().expect("Failed to finalize IQ WAV");
}
