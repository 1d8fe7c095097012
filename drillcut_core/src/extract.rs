use crate::audio::AudioBuffer;
use crate::detect::Interval;

/// Default lead-in kept before each detected sentence.
pub const DEFAULT_PAD_BEFORE_MS: u64 = 150;
/// Default tail kept after each detected sentence.
pub const DEFAULT_PAD_AFTER_MS: u64 = 300;

/// Extra audio retained around each detected interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Padding {
    pub before_ms: u64,
    pub after_ms: u64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            before_ms: DEFAULT_PAD_BEFORE_MS,
            after_ms: DEFAULT_PAD_AFTER_MS,
        }
    }
}

/// One candidate sentence cut from the source recording.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Position in the detected sequence, starting at zero.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub audio: AudioBuffer,
}

/// Cut one padded chunk per interval.
///
/// Padding is clamped to the buffer. Neighbouring chunks may overlap once
/// padded.
pub fn extract(buffer: &AudioBuffer, intervals: &[Interval], padding: Padding) -> Vec<Chunk> {
    let duration = buffer.duration_ms();

    intervals
        .iter()
        .enumerate()
        .map(|(index, interval)| {
            let start_ms = interval.start_ms.saturating_sub(padding.before_ms);
            let end_ms = interval
                .end_ms
                .saturating_add(padding.after_ms)
                .min(duration)
                .max(start_ms);
            Chunk {
                index,
                start_ms,
                end_ms,
                audio: buffer.slice(start_ms, end_ms),
            }
        })
        .collect()
}
