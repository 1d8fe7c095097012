#![allow(dead_code)]

use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use drillcut_core::{encode, AudioBuffer, AudioFormat, Metadata};

pub const SAMPLE_RATE: u32 = 8_000;
/// Tone length of each synthetic sentence.
pub const TONE_MS: u64 = 40;
/// Pause between synthetic sentences.
pub const GAP_MS: u64 = 60;
/// Minimum silence that separates the synthetic sentences.
pub const MIN_SILENCE_MS: u64 = 30;

/// Write a 16-bit mono WAV containing `sentences` tones separated by pauses.
///
/// The fixture is synthesised so that no binary assets live in the
/// repository. Sentence boundaries fall on whole milliseconds, which keeps the
/// detector's output exact.
pub fn write_drill<P: AsRef<Path>>(path: P, sentences: usize) -> Result<(), Box<dyn Error>> {
    let mut samples = Vec::new();
    push_silence(&mut samples, 200);
    for sentence in 0..sentences {
        push_tone(&mut samples, TONE_MS, 330.0 + (sentence % 7) as f32 * 40.0);
        push_silence(&mut samples, GAP_MS);
    }
    push_silence(&mut samples, 140);
    write_wav(path, &samples)
}

fn push_silence(samples: &mut Vec<i16>, ms: u64) {
    let frames = (SAMPLE_RATE as u64 * ms / 1_000) as usize;
    samples.extend(std::iter::repeat(0).take(frames));
}

fn push_tone(samples: &mut Vec<i16>, ms: u64, frequency: f32) {
    let frames = SAMPLE_RATE as u64 * ms / 1_000;
    for n in 0..frames {
        let theta = (n as f32 / SAMPLE_RATE as f32) * 2.0 * std::f32::consts::PI * frequency;
        samples.push(((theta + 0.3).sin() * i16::MAX as f32 * 0.5) as i16);
    }
}

fn write_wav<P: AsRef<Path>>(path: P, samples: &[i16]) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;
    let data_len = (samples.len() * 2) as u32;
    file.write_all(b"RIFF")?;
    file.write_all(&(36u32 + data_len).to_le_bytes())?;
    file.write_all(b"WAVE")?;
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?;
    file.write_all(&SAMPLE_RATE.to_le_bytes())?;
    file.write_all(&(SAMPLE_RATE * 2).to_le_bytes())?;
    file.write_all(&2u16.to_le_bytes())?;
    file.write_all(&16u16.to_le_bytes())?;
    file.write_all(b"data")?;
    file.write_all(&data_len.to_le_bytes())?;
    for sample in samples {
        file.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}

/// A constant-level mono clip lasting exactly `ms`.
pub fn clip(ms: u64, level: f32) -> AudioBuffer {
    let frames = (SAMPLE_RATE as u64 * ms / 1_000) as usize;
    AudioBuffer::new(SAMPLE_RATE, 1, vec![level; frames]).expect("valid clip")
}

/// Populate `dir` with `0001.wav ..= {count:04}.wav`, each `ms` long.
pub fn write_track(dir: &Path, count: u32, ms: u64) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    for sequence in 1..=count {
        let path = dir.join(format!("{sequence:04}.wav"));
        encode(&clip(ms, 0.25), &path, AudioFormat::Wav, &Metadata::default())?;
    }
    Ok(())
}

pub fn write_chime(path: &Path, ms: u64) -> Result<(), Box<dyn Error>> {
    encode(&clip(ms, 0.5), path, AudioFormat::Wav, &Metadata::default())?;
    Ok(())
}

/// A stereo chime recorded at `sample_rate` instead of the track rate.
pub fn write_chime_at(path: &Path, ms: u64, sample_rate: u32) -> Result<(), Box<dyn Error>> {
    let frames = (u64::from(sample_rate) * ms / 1_000) as usize;
    let chime = AudioBuffer::new(sample_rate, 2, vec![0.5; frames * 2])?;
    encode(&chime, path, AudioFormat::Wav, &Metadata::default())?;
    Ok(())
}

pub fn sorted_file_names(dir: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    Ok(names)
}
