//! Decoding with Symphonia and encoding to WAV or MP3.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::audio::AudioBuffer;
use crate::error::{DrillcutError, Result};

/// Container formats accepted as split input and produced by join.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// Recognise a format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("wav") {
            Some(Self::Wav)
        } else if extension.eq_ignore_ascii_case("mp3") {
            Some(Self::Mp3)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Tags written alongside encoded audio where the container supports them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub artist: Option<String>,
    pub title: Option<String>,
}

/// Decode a WAV or MP3 file completely into memory.
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    let format = AudioFormat::from_path(path)
        .ok_or_else(|| DrillcutError::UnsupportedInput(path.to_path_buf()))?;

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or(DrillcutError::MissingDefaultTrack)?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(DrillcutError::UnsupportedCodec);
    }

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DrillcutError::MissingSampleRate)?;
    let mut channels = track
        .codec_params
        .channels
        .map(|layout| layout.count() as u16);

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;
    let mut samples = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let capacity = decoded.capacity() as u64;
                let mut buffer = SampleBuffer::<f32>::new(capacity, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
                channels = Some(spec.channels.count() as u16);
            }
            Err(SymphoniaError::DecodeError(message)) => {
                debug!("skipping undecodable packet in '{}': {message}", path.display());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let channels = channels.ok_or_else(|| {
        DrillcutError::InvalidAudio(format!("'{}' has no channel layout", path.display()))
    })?;
    debug!(
        "decoded '{}': {} Hz, {channels} channel(s), {} samples",
        path.display(),
        sample_rate,
        samples.len()
    );

    AudioBuffer::new(sample_rate, channels, samples)
}

/// Encode `buffer` to `path` in the requested format.
///
/// WAV is written directly as 16-bit PCM. MP3 is produced by streaming the
/// same WAV data through the `ffmpeg` executable, which also applies the tags.
pub fn encode(
    buffer: &AudioBuffer,
    path: &Path,
    format: AudioFormat,
    metadata: &Metadata,
) -> Result<()> {
    match format {
        AudioFormat::Wav => {
            if metadata != &Metadata::default() {
                debug!("WAV output does not carry tags, ignoring them for '{}'", path.display());
            }
            let mut writer = WavWriter::create(path, wav_spec(buffer))?;
            write_pcm(&mut writer, buffer)?;
            writer.finalize()?;
            Ok(())
        }
        AudioFormat::Mp3 => encode_mp3(buffer, path, metadata),
    }
}

fn wav_spec(buffer: &AudioBuffer) -> WavSpec {
    WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn write_pcm<W>(writer: &mut WavWriter<W>, buffer: &AudioBuffer) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    let mut pcm = writer.get_i16_writer(buffer.samples().len() as u32);
    for &sample in buffer.samples() {
        pcm.write_sample((sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16);
    }
    pcm.flush()?;
    Ok(())
}

fn encode_mp3(buffer: &AudioBuffer, path: &Path, metadata: &Metadata) -> Result<()> {
    let mut wav = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut wav, wav_spec(buffer))?;
        write_pcm(&mut writer, buffer)?;
        writer.finalize()?;
    }

    let mut command = Command::new("ffmpeg");
    command.args(["-hide_banner", "-loglevel", "error", "-y", "-f", "wav", "-i", "pipe:0"]);
    if let Some(artist) = &metadata.artist {
        command.arg("-metadata").arg(format!("artist={artist}"));
    }
    if let Some(title) = &metadata.title {
        command.arg("-metadata").arg(format!("title={title}"));
    }
    command
        .args(["-codec:a", "libmp3lame", "-q:a", "2"])
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|err| match err.kind() {
        ErrorKind::NotFound => {
            DrillcutError::Encoder("ffmpeg executable not found; install it or use WAV output".into())
        }
        _ => DrillcutError::Io(err),
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(wav.get_ref())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(DrillcutError::Encoder(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recognises_formats_case_insensitively() {
        assert_eq!(AudioFormat::from_path(Path::new("a/B.WAV")), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path(Path::new("track.Mp3")), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(AudioFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn decode_rejects_unknown_extensions() {
        let err = decode(Path::new("input.flac")).unwrap_err();
        assert!(matches!(err, DrillcutError::UnsupportedInput(_)));
    }

    #[test]
    fn wav_survives_an_encode_decode_cycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let samples: Vec<f32> = (0..800).map(|i| ((i % 40) as f32 - 20.0) / 40.0).collect();
        let buffer = AudioBuffer::new(8_000, 2, samples).unwrap();

        encode(&buffer, &path, AudioFormat::Wav, &Metadata::default()).unwrap();
        let decoded = decode(&path).unwrap();

        assert_eq!(decoded.sample_rate(), 8_000);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.frames(), 400);
        for (a, b) in decoded.samples().iter().zip(buffer.samples()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    fn ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn artist_tag(path: &Path) -> Option<String> {
        use symphonia::core::meta::{StandardTagKey, Tag};

        let file = File::open(path).ok()?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        hint.with_extension("mp3");
        let mut probed = get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;

        let mut tags: Vec<Tag> = Vec::new();
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                tags.extend(revision.tags().iter().cloned());
            }
        }
        if let Some(revision) = probed.format.metadata().current() {
            tags.extend(revision.tags().iter().cloned());
        }
        tags.into_iter()
            .find(|tag| tag.std_key == Some(StandardTagKey::Artist))
            .map(|tag| tag.value.to_string())
    }

    #[test]
    fn mp3_is_encoded_through_ffmpeg_with_tags() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not found, skipping MP3 encode test");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("Review - 0001.mp3");
        let samples: Vec<f32> = (0..22_050)
            .map(|n| 0.4 * (std::f32::consts::TAU * 440.0 * n as f32 / 22_050.0).sin())
            .collect();
        let buffer = AudioBuffer::new(22_050, 1, samples).unwrap();
        let metadata = Metadata {
            artist: Some("drillcut".into()),
            title: Some("Review - 0001".into()),
        };

        encode(&buffer, &path, AudioFormat::Mp3, &metadata).unwrap();
        let decoded = decode(&path).unwrap();

        assert_eq!(decoded.sample_rate(), 22_050);
        assert_eq!(decoded.channels(), 1);
        let duration = decoded.duration_ms();
        assert!((950..=1_200).contains(&duration), "decoded {duration} ms");
        let peak = decoded
            .samples()
            .iter()
            .fold(0.0f32, |peak, sample| peak.max(sample.abs()));
        assert!(peak > 0.2, "decoded audio is too quiet: {peak}");
        assert_eq!(artist_tag(&path).as_deref(), Some("drillcut"));
    }
}
