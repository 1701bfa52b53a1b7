//! Integration tests for WAV input and output
//!
//! Writes an IQ recording to a temporary file, demodulates it through the
//! same library path the binary uses and reads the audio back.

mod helpers;

use iq_demod::input::SampleSource;
use iq_demod::{run_into, DemodConfig, Error, WavAudioSink, WavIqSource};
use std::fs;

#[test]
fn test_wav_iq_source_reads_int16_stereo() {
    let path = helpers::temp_wav("source");
    let samples = helpers::complex_tone(1_000.0, 48_000.0, 1_000);
    helpers::write_iq_wav(&path, 48_000, &samples);

    let mut source = WavIqSource::open(&path).expect("Failed to open IQ WAV");
    assert_eq!(source.sample_rate(), 48_000);
    assert_eq!(source.total_samples(), 1_000);

    let chunk = source.next_chunk(300).unwrap().expect("No data");
    assert_eq!(chunk.len(), 300);
    for (got, want) in chunk.iter().zip(samples.iter()) {
        assert!((got.re - want.re).abs() < 1e-3);
        assert!((got.im - want.im).abs() < 1e-3);
    }

    let mut total = chunk.len();
    while let Some(chunk) = source.next_chunk(300).unwrap() {
        total += chunk.len();
    }
    assert_eq!(total, 1_000);

    fs::remove_file(&path).ok();
}

#[test]
fn test_mono_input_is_rejected() {
    let path = helpers::temp_wav("mono");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    assert!(matches!(WavIqSource::open(&path), Err(Error::Format(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_file_round_trip() {
    let input = helpers::temp_wav("roundtrip_in");
    let output = helpers::temp_wav("roundtrip_out");
    helpers::write_iq_wav(
        &input,
        48_000,
        &helpers::fm_tone(6_000.0, 400.0, 500.0, 48_000.0, 7_000),
    );

    // 48 kHz / 7 = 6857.14 Hz, stored as 6857 Hz
    let config = DemodConfig {
        mix_frequency_hz: 6_000.0,
        lowpass_cutoff_hz: 2_000.0,
        lowpass_stopband_hz: 3_000.0,
        decimation_factor: 7,
        chunk_size: 1_024,
        ..Default::default()
    };

    let mut source = WavIqSource::open(&input).unwrap();
    let mut sink = WavAudioSink::new(&output);
    let summary = run_into(&config, &mut source, &mut sink).unwrap();
    assert_eq!(summary.input_samples, 7_000);
    assert_eq!(summary.output_samples, 999);
    assert_eq!(summary.chunks, 7);
    assert_eq!(sink.samples_written(), 999);

    let mut reader = hound::WavReader::open(&output).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 6_857);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);

    let audio: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(audio.len(), 999);
    assert!(audio.iter().all(|v| v.is_finite() && v.abs() <= std::f32::consts::PI));

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}

#[test]
fn test_missing_input_reports_wav_error() {
    let path = helpers::temp_wav("does_not_exist");
    assert!(matches!(WavIqSource::open(&path), Err(Error::Wav(_))));
}

#[test]
fn test_wav_iq_source_reads_8bit_stereo() {
    let path = helpers::temp_wav("source_8bit");
    let samples = helpers::complex_tone(1_000.0, 48_000.0, 1_000);
    helpers::write_iq_wav_int(&path, 48_000, 8, &samples);

    let mut source = WavIqSource::open(&path).expect("Failed to open 8-bit IQ WAV");
    assert_eq!(source.total_samples(), 1_000);

    let chunk = source.next_chunk(1_000).unwrap().expect("No data");
    assert_eq!(chunk.len(), 1_000);
    for (got, want) in chunk.iter().zip(samples.iter()) {
        // One 8-bit step is 1/128
        assert!((got.re - want.re).abs() < 0.02, "I {} vs {}", got.re, want.re);
        assert!((got.im - want.im).abs() < 0.02, "Q {} vs {}", got.im, want.im);
        assert!(got.re >= -1.0 && got.re < 1.0);
    }

    fs::remove_file(&path).ok();
}

#[test]
fn test_8bit_file_round_trip() {
    let input = helpers::temp_wav("roundtrip8_in");
    let output = helpers::temp_wav("roundtrip8_out");
    helpers::write_iq_wav_int(
        &input,
        48_000,
        8,
        &helpers::fm_tone(6_000.0, 400.0, 500.0, 48_000.0, 7_000),
    );

    let config = DemodConfig {
        mix_frequency_hz: 6_000.0,
        lowpass_cutoff_hz: 2_000.0,
        lowpass_stopband_hz: 3_000.0,
        decimation_factor: 7,
        ..Default::default()
    };
    let mut source = WavIqSource::open(&input).unwrap();
    let mut sink = WavAudioSink::new(&output);
    let summary = run_into(&config, &mut source, &mut sink).unwrap();
    assert_eq!(summary.output_samples, 999);

    let mut reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().sample_rate, 6_857);
    let audio: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(audio.len(), 999);

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}

#[test]
fn test_unbounded_chunk_size_reads_whole_file() {
    let input = helpers::temp_wav("huge_chunk_in");
    let output = helpers::temp_wav("huge_chunk_out");
    helpers::write_iq_wav(
        &input,
        250_000,
        &helpers::complex_tone(2_000.0, 250_000.0, 1_000),
    );

    let config = DemodConfig {
        chunk_size: usize::MAX,
        ..Default::default()
    };
    let mut source = WavIqSource::open(&input).unwrap();
    let mut sink = WavAudioSink::new(&output);
    let summary = run_into(&config, &mut source, &mut sink).unwrap();
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.input_samples, 1_000);
    assert_eq!(summary.output_samples, 99);

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}

#[test]
fn test_failed_run_leaves_no_output() {
    let input = helpers::temp_wav("too_short_in");
    let output = helpers::temp_wav("too_short_out");
    // 5 frames decimate by 10 to a single sample
    helpers::write_iq_wav(&input, 250_000, &helpers::complex_tone(0.0, 250_000.0, 5));

    let mut source = WavIqSource::open(&input).unwrap();
    let mut sink = WavAudioSink::new(&output);
    let result = run_into(&DemodConfig::default(), &mut source, &mut sink);
    assert!(matches!(result, Err(Error::InsufficientData { .. })));
    assert!(!output.exists());

    fs::remove_file(&input).ok();
}

#[test]
fn test_truncated_recording_reports_read_error() {
    let path = helpers::temp_wav("truncated");
    helpers::write_iq_wav(&path, 48_000, &helpers::complex_tone(1_000.0, 48_000.0, 1_000));

    // Cut the last Q sample off the data chunk
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - 2).unwrap();
    drop(file);

    let mut source = WavIqSource::open(&path).unwrap();
    let mut frames = 0;
    let result = loop {
        match source.next_chunk(256) {
            Ok(Some(chunk)) => frames += chunk.len(),
            other => break other,
        }
    };
    assert!(matches!(result, Err(Error::Wav(_))), "got {:?}", result.map(|c| c.map(|c| c.len())));
    assert!(frames < 1_000);

    fs::remove_file(&path).ok();
}
