//! In-memory audio representation shared by the split and join passes.

use crate::error::{DrillcutError, Result};
use crate::resample::resample;

/// Decoded, interleaved audio held entirely in memory.
///
/// Samples are normalised to `[-1.0, 1.0]`. All time arithmetic is done in
/// whole milliseconds, so `duration_ms` rounds down to the last complete
/// millisecond.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Wrap interleaved samples, checking that they describe whole frames.
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DrillcutError::InvalidAudio(
                "sample rate must be greater than zero".into(),
            ));
        }
        if channels == 0 {
            return Err(DrillcutError::InvalidAudio(
                "channel count must be greater than zero".into(),
            ));
        }
        if samples.len() % usize::from(channels) != 0 {
            return Err(DrillcutError::InvalidAudio(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// A buffer containing no frames.
    pub fn empty(sample_rate: u32, channels: u16) -> Result<Self> {
        Self::new(sample_rate, channels, Vec::new())
    }

    /// Digital silence lasting `duration_ms`.
    pub fn silent(duration_ms: u64, sample_rate: u32, channels: u16) -> Result<Self> {
        let frames = ms_to_frames(duration_ms, sample_rate);
        Self::new(
            sample_rate,
            channels,
            vec![0.0; frames * usize::from(channels)],
        )
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1_000 / u64::from(self.sample_rate)
    }

    /// Index of the first frame at or after `ms`, clamped to the buffer.
    pub fn frame_at(&self, ms: u64) -> usize {
        ms_to_frames(ms, self.sample_rate).min(self.frames())
    }

    /// Copy the frames in `[start_ms, end_ms)` into a new buffer.
    ///
    /// Both bounds are clamped to the buffer; an inverted range yields an
    /// empty buffer.
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let start = self.frame_at(start_ms);
        let end = self.frame_at(end_ms).max(start);
        let channels = usize::from(self.channels);

        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[start * channels..end * channels].to_vec(),
        }
    }

    /// Append `other` after `self`, producing a new buffer in `self`'s format.
    ///
    /// `other` is resampled and remixed to match when its format differs.
    pub fn concat(&self, other: &AudioBuffer) -> Result<AudioBuffer> {
        let mut timeline = Timeline::from_buffer(self.clone());
        timeline.push(other)?;
        Ok(timeline.finish())
    }

    /// Return this buffer with `channels` channels.
    ///
    /// Mono is spread to every output channel and any layout can be averaged
    /// down to mono. Other conversions are rejected.
    pub fn with_channels(&self, channels: u16) -> Result<AudioBuffer> {
        if channels == self.channels {
            return Ok(self.clone());
        }

        let samples = if self.channels == 1 {
            self.samples
                .iter()
                .flat_map(|&sample| std::iter::repeat(sample).take(usize::from(channels)))
                .collect()
        } else if channels == 1 {
            self.samples
                .chunks_exact(usize::from(self.channels))
                .map(|frame| frame.iter().sum::<f32>() / f32::from(self.channels))
                .collect()
        } else {
            return Err(DrillcutError::FormatMismatch {
                left_rate: self.sample_rate,
                left_channels: channels,
                right_rate: self.sample_rate,
                right_channels: self.channels,
            });
        };

        AudioBuffer::new(self.sample_rate, channels, samples)
    }
}

pub(crate) fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    let frames = u128::from(ms) * u128::from(sample_rate) / 1_000;
    usize::try_from(frames).unwrap_or(usize::MAX)
}

/// Growable buffer used while stitching clips together.
///
/// The format is fixed by the first buffer pushed; later buffers are resampled
/// to its rate and remixed to its channel count.
#[derive(Debug, Default)]
pub struct Timeline {
    format: Option<(u32, u16)>,
    samples: Vec<f32>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_buffer(buffer: AudioBuffer) -> Self {
        Self {
            format: Some((buffer.sample_rate, buffer.channels)),
            samples: buffer.samples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        match self.format {
            Some((rate, channels)) => {
                (self.samples.len() / usize::from(channels)) as u64 * 1_000 / u64::from(rate)
            }
            None => 0,
        }
    }

    pub fn push(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let (rate, channels) = *self
            .format
            .get_or_insert((buffer.sample_rate, buffer.channels));

        if buffer.sample_rate == rate && buffer.channels == channels {
            self.samples.extend_from_slice(&buffer.samples);
            return Ok(());
        }

        let converted = resample(buffer, rate)?.with_channels(channels)?;
        self.samples.extend_from_slice(&converted.samples);
        Ok(())
    }

    /// Append `duration_ms` of silence in the timeline's format.
    ///
    /// Before the first real buffer has fixed the format there is nothing to
    /// measure silence against, so the call is ignored.
    pub fn push_silence(&mut self, duration_ms: u64) {
        if let Some((rate, channels)) = self.format {
            let len = ms_to_frames(duration_ms, rate) * usize::from(channels);
            self.samples.resize(self.samples.len() + len, 0.0);
        }
    }

    /// Take the accumulated audio, leaving the timeline empty and unformatted.
    pub fn take(&mut self) -> Option<AudioBuffer> {
        let (sample_rate, channels) = self.format.take()?;
        Some(AudioBuffer {
            sample_rate,
            channels,
            samples: std::mem::take(&mut self.samples),
        })
    }

    fn finish(mut self) -> AudioBuffer {
        let (sample_rate, channels) = self.format.unwrap_or((1, 1));
        AudioBuffer {
            sample_rate,
            channels,
            samples: std::mem::take(&mut self.samples),
        }
    }
}
