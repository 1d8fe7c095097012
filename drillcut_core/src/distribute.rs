//! Routing of extracted chunks onto the source and target tracks.

use std::fmt;

use log::{debug, info};

use crate::error::{DrillcutError, Result};
use crate::extract::Chunk;

/// Content chunks in an alternating recording: 50 source/target pairs.
pub const EXPECTED_ALTERNATING_COUNT: usize = 100;
/// Content chunks in a target-only recording.
pub const EXPECTED_TARGET_ONLY_COUNT: usize = 50;
/// Chunks dropped from the start of each recording by default (intro).
pub const DEFAULT_SKIP_FIRST: usize = 2;
/// Chunks dropped from the end of each recording by default (outro).
pub const DEFAULT_SKIP_END: usize = 1;

/// How the content of one recording maps onto tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistributionMode {
    /// Sentences alternate between the source and the target language.
    SourceTargetAlternating,
    /// Every sentence belongs to the target language.
    TargetOnly,
}

impl DistributionMode {
    /// Track for the 1-based content `position`.
    pub fn track_for(self, position: usize) -> Track {
        match self {
            Self::SourceTargetAlternating if position % 2 == 1 => Track::Source,
            Self::SourceTargetAlternating | Self::TargetOnly => Track::Target,
        }
    }

    pub fn expected_count(self, expected: &ExpectedCounts) -> usize {
        match self {
            Self::SourceTargetAlternating => expected.alternating,
            Self::TargetOnly => expected.target_only,
        }
    }

    /// Tracks that receive chunks under this mode.
    pub fn tracks(self) -> &'static [Track] {
        match self {
            Self::SourceTargetAlternating => &[Track::Source, Track::Target],
            Self::TargetOnly => &[Track::Target],
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceTargetAlternating => f.write_str("source/target alternating"),
            Self::TargetOnly => f.write_str("target-only"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Track {
    Source,
    Target,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Number of content chunks each mode must produce per recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpectedCounts {
    pub alternating: usize,
    pub target_only: usize,
}

impl Default for ExpectedCounts {
    fn default() -> Self {
        Self {
            alternating: EXPECTED_ALTERNATING_COUNT,
            target_only: EXPECTED_TARGET_ONLY_COUNT,
        }
    }
}

/// Chunks discarded at either end of a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trim {
    pub skip_first: usize,
    pub skip_end: usize,
}

impl Default for Trim {
    fn default() -> Self {
        Self {
            skip_first: DEFAULT_SKIP_FIRST,
            skip_end: DEFAULT_SKIP_END,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedChunk {
    /// Position among the content chunks, starting at one.
    pub position: usize,
    pub track: Track,
    pub chunk: Chunk,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub items: Vec<ClassifiedChunk>,
    pub observed_count: usize,
    /// Chunks seen before trimming.
    pub detected: usize,
}

impl Distribution {
    pub fn count_for(&self, track: Track) -> usize {
        self.items.iter().filter(|item| item.track == track).count()
    }
}

/// Trim, classify and validate the chunks of one recording.
///
/// Nothing is returned unless the number of content chunks matches what
/// `mode` expects, so a bad threshold or skip count never reaches disk.
pub fn distribute(
    chunks: Vec<Chunk>,
    mode: DistributionMode,
    trim: Trim,
    expected: &ExpectedCounts,
) -> Result<Distribution> {
    let detected = chunks.len();
    let keep = detected
        .saturating_sub(trim.skip_first)
        .saturating_sub(trim.skip_end);

    let items: Vec<ClassifiedChunk> = chunks
        .into_iter()
        .skip(trim.skip_first)
        .take(keep)
        .enumerate()
        .map(|(offset, chunk)| {
            let position = offset + 1;
            ClassifiedChunk {
                position,
                track: mode.track_for(position),
                chunk,
            }
        })
        .collect();

    let observed_count = items.len();
    let expected_count = mode.expected_count(expected);
    debug!(
        "{detected} chunk(s) detected, {observed_count} left after skipping {} + {}",
        trim.skip_first, trim.skip_end
    );

    if observed_count != expected_count {
        return Err(DrillcutError::CountMismatch {
            mode,
            expected: expected_count,
            observed: observed_count,
        });
    }

    info!("{observed_count} content chunk(s) match the {mode} layout");
    Ok(Distribution {
        items,
        observed_count,
        detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBuffer;

    fn chunks(count: usize) -> Vec<Chunk> {
        (0..count)
            .map(|index| Chunk {
                index,
                start_ms: index as u64 * 10,
                end_ms: index as u64 * 10 + 5,
                audio: AudioBuffer::silent(5, 1_000, 1).unwrap(),
            })
            .collect()
    }

    #[test]
    fn one_chunk_short_is_rejected() {
        let err = distribute(
            chunks(102),
            DistributionMode::SourceTargetAlternating,
            Trim::default(),
            &ExpectedCounts::default(),
        )
        .unwrap_err();

        match err {
            DrillcutError::CountMismatch {
                mode,
                expected,
                observed,
            } => {
                assert_eq!(mode, DistributionMode::SourceTargetAlternating);
                assert_eq!(expected, 100);
                assert_eq!(observed, 99);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn alternating_routes_odd_positions_to_source() {
        let distribution = distribute(
            chunks(103),
            DistributionMode::SourceTargetAlternating,
            Trim::default(),
            &ExpectedCounts::default(),
        )
        .unwrap();

        assert_eq!(distribution.observed_count, 100);
        assert_eq!(distribution.count_for(Track::Source), 50);
        assert_eq!(distribution.count_for(Track::Target), 50);

        let first = &distribution.items[0];
        assert_eq!((first.position, first.track, first.chunk.index), (1, Track::Source, 2));
        let second = &distribution.items[1];
        assert_eq!((second.position, second.track), (2, Track::Target));
        let last = distribution.items.last().unwrap();
        assert_eq!((last.position, last.track, last.chunk.index), (100, Track::Target, 101));
    }

    #[test]
    fn target_only_sends_everything_to_target() {
        let distribution = distribute(
            chunks(53),
            DistributionMode::TargetOnly,
            Trim::default(),
            &ExpectedCounts::default(),
        )
        .unwrap();

        assert_eq!(distribution.count_for(Track::Target), 50);
        assert_eq!(distribution.count_for(Track::Source), 0);
    }

    #[test]
    fn oversized_trim_leaves_no_content() {
        let err = distribute(
            chunks(2),
            DistributionMode::TargetOnly,
            Trim {
                skip_first: 2,
                skip_end: 1,
            },
            &ExpectedCounts::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DrillcutError::CountMismatch { observed: 0, .. }));
    }

    #[test]
    fn custom_expectations_are_honoured() {
        let expected = ExpectedCounts {
            alternating: 4,
            target_only: 2,
        };
        let distribution = distribute(
            chunks(4),
            DistributionMode::SourceTargetAlternating,
            Trim {
                skip_first: 0,
                skip_end: 0,
            },
            &expected,
        )
        .unwrap();
        let tracks: Vec<_> = distribution.items.iter().map(|item| item.track).collect();
        assert_eq!(
            tracks,
            vec![Track::Source, Track::Target, Track::Source, Track::Target]
        );
    }
}
