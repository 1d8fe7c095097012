//! Sample-rate conversion for buffers that meet on one timeline.

use log::debug;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::AudioBuffer;
use crate::error::{DrillcutError, Result};

/// Input frames handed to the resampler per call.
const CHUNK_FRAMES: usize = 1_024;

fn parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Convert `buffer` to `sample_rate`, keeping its channel layout.
///
/// The result holds `frames * sample_rate / buffer.sample_rate()` frames
/// (rounded down), aligned with the input: the resampler's start-up delay is
/// trimmed and its tail flushed.
pub fn resample(buffer: &AudioBuffer, sample_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate() == sample_rate {
        return Ok(buffer.clone());
    }
    if buffer.is_empty() {
        return AudioBuffer::empty(sample_rate, buffer.channels());
    }

    let channels = usize::from(buffer.channels());
    let frames = buffer.frames();
    let expected = usize::try_from(
        frames as u128 * u128::from(sample_rate) / u128::from(buffer.sample_rate()),
    )
    .unwrap_or(usize::MAX);
    let ratio = f64::from(sample_rate) / f64::from(buffer.sample_rate());

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, parameters(), CHUNK_FRAMES, channels)
            .map_err(|e| DrillcutError::Resample(e.to_string()))?;

    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in buffer.samples().chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    let delay = resampler.output_delay();
    let wanted = expected + delay;
    let mut output = vec![Vec::with_capacity(wanted); channels];
    let mut append = |block: Vec<Vec<f32>>| {
        for (channel, samples) in output.iter_mut().zip(block) {
            channel.extend(samples);
        }
    };

    let mut position = 0;
    while position + resampler.input_frames_next() <= frames {
        let next = resampler.input_frames_next();
        let block: Vec<&[f32]> = planar
            .iter()
            .map(|channel| &channel[position..position + next])
            .collect();
        append(
            resampler
                .process(&block, None)
                .map_err(|e| DrillcutError::Resample(e.to_string()))?,
        );
        position += next;
    }
    if position < frames {
        let block: Vec<&[f32]> = planar.iter().map(|channel| &channel[position..]).collect();
        append(
            resampler
                .process_partial(Some(block.as_slice()), None)
                .map_err(|e| DrillcutError::Resample(e.to_string()))?,
        );
    }

    while output[0].len() < wanted {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| DrillcutError::Resample(e.to_string()))?;
        if tail[0].is_empty() {
            break;
        }
        for (channel, samples) in output.iter_mut().zip(tail) {
            channel.extend(samples);
        }
    }

    let mut samples = Vec::with_capacity(expected * channels);
    for frame in delay..wanted {
        for channel in &output {
            samples.push(channel.get(frame).copied().unwrap_or(0.0));
        }
    }

    debug!(
        "resampled {frames} frame(s) at {} Hz to {expected} frame(s) at {sample_rate} Hz",
        buffer.sample_rate()
    );
    AudioBuffer::new(sample_rate, buffer.channels(), samples)
}
