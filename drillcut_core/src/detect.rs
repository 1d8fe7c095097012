//! Amplitude-threshold silence detection.
//!
//! A window of `min_silence_len_ms` slides across the buffer in one
//! millisecond steps. Windows whose RMS level is at or below the threshold are
//! silent; overlapping silent windows merge into silent runs, and everything
//! between those runs is reported as non-silent content.

use log::debug;

use crate::audio::{ms_to_frames, AudioBuffer};

/// Distance between successive window starts.
pub const SEEK_STEP_MS: u64 = 1;

/// Half-open time range `[start_ms, end_ms)` within a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Interval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn len_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Convert a dBFS level to a linear amplitude where full scale is 1.0.
pub fn dbfs_to_amplitude(dbfs: f64) -> f64 {
    10f64.powf(dbfs / 20.0)
}

/// Running sum of squared samples, one entry per millisecond boundary.
///
/// Windows always start and end on whole milliseconds, so the frames inside a
/// millisecond never need to be addressed individually.
struct Energy {
    prefix: Vec<f64>,
    channels: f64,
    sample_rate: u32,
}

impl Energy {
    fn new(buffer: &AudioBuffer) -> Self {
        let duration = buffer.duration_ms() as usize;
        let channels = usize::from(buffer.channels());
        let samples = buffer.samples();

        let mut prefix = Vec::with_capacity(duration + 1);
        let mut total = 0.0f64;
        let mut start = 0;
        prefix.push(total);
        for ms in 1..=duration as u64 {
            let end = ms_to_frames(ms, buffer.sample_rate());
            total += samples[start * channels..end * channels]
                .iter()
                .map(|&sample| f64::from(sample) * f64::from(sample))
                .sum::<f64>();
            prefix.push(total);
            start = end;
        }

        Self {
            prefix,
            channels: f64::from(buffer.channels()),
            sample_rate: buffer.sample_rate(),
        }
    }

    fn rms(&self, start_ms: u64, end_ms: u64) -> f64 {
        let last = self.prefix.len() - 1;
        let start = (start_ms as usize).min(last);
        let end = (end_ms as usize).min(last);
        if end <= start {
            return 0.0;
        }

        let frames = ms_to_frames(end as u64, self.sample_rate)
            - ms_to_frames(start as u64, self.sample_rate);
        let count = frames as f64 * self.channels;
        if count == 0.0 {
            return 0.0;
        }
        ((self.prefix[end] - self.prefix[start]).max(0.0) / count).sqrt()
    }
}

/// Find the silent runs of at least `min_silence_len_ms`.
pub fn detect_silence(
    buffer: &AudioBuffer,
    min_silence_len_ms: u64,
    silence_threshold_dbfs: f64,
) -> Vec<Interval> {
    let duration = buffer.duration_ms();
    let window = min_silence_len_ms.max(1);
    if duration < window {
        return Vec::new();
    }

    let threshold = dbfs_to_amplitude(silence_threshold_dbfs);
    let energy = Energy::new(buffer);
    let last_start = duration - window;

    let silent_starts = (0..=last_start)
        .step_by(SEEK_STEP_MS as usize)
        .chain((last_start % SEEK_STEP_MS != 0).then_some(last_start))
        .filter(|&start| energy.rms(start, start + window) <= threshold);

    let mut runs = Vec::new();
    let mut current: Option<(u64, u64)> = None;
    for start in silent_starts {
        current = match current {
            None => Some((start, start)),
            Some((run_start, previous)) => {
                let contiguous = start == previous + SEEK_STEP_MS;
                let separated = start > previous + window;
                if !contiguous && separated {
                    runs.push(Interval::new(run_start, previous + window));
                    Some((start, start))
                } else {
                    Some((run_start, start))
                }
            }
        };
    }
    if let Some((run_start, previous)) = current {
        runs.push(Interval::new(run_start, previous + window));
    }

    runs
}

/// Find the content between silent runs, in time order.
///
/// A buffer that is silent throughout yields no intervals; one without any
/// qualifying silence yields a single interval covering all of it.
pub fn detect_nonsilent(
    buffer: &AudioBuffer,
    min_silence_len_ms: u64,
    silence_threshold_dbfs: f64,
) -> Vec<Interval> {
    let duration = buffer.duration_ms();
    if duration == 0 {
        return Vec::new();
    }

    let silent = detect_silence(buffer, min_silence_len_ms, silence_threshold_dbfs);
    let mut content = Vec::with_capacity(silent.len() + 1);
    let mut cursor = 0;
    for run in &silent {
        if run.start_ms > cursor {
            content.push(Interval::new(cursor, run.start_ms));
        }
        cursor = cursor.max(run.end_ms);
    }
    if cursor < duration {
        content.push(Interval::new(cursor, duration));
    }

    debug!(
        "found {} silent run(s) and {} non-silent interval(s) in {duration} ms",
        silent.len(),
        content.len()
    );
    content
}
