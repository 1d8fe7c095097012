//! Global clip numbering and persistence of classified chunks.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::codec::{encode, AudioFormat, Metadata};
use crate::distribute::{ClassifiedChunk, Track};
use crate::error::{DrillcutError, Result};

/// Extension of every numbered clip on disk.
pub const CLIP_EXTENSION: &str = "wav";

/// File name of the clip numbered `sequence`, e.g. `0042.wav`.
pub fn clip_file_name(sequence: u32) -> String {
    format!("{sequence:04}.{CLIP_EXTENSION}")
}

/// Counter handing out clip numbers for a whole invocation.
///
/// The caller owns it and lends it to each [`SequenceWriter`], so numbering
/// continues across every input file processed with the same counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSequence {
    next: u32,
    last: Option<u32>,
}

impl OutputSequence {
    pub fn new(start: u32) -> Self {
        Self {
            next: start,
            last: None,
        }
    }

    /// The number the next advance will hand out.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// The most recently assigned number, if any.
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    pub fn advance(&mut self) -> u32 {
        let number = self.next;
        self.next = self.next.saturating_add(1);
        self.last = Some(number);
        number
    }
}

impl Default for OutputSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

/// How written chunks consume sequence numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumberingScheme {
    /// Every chunk takes the next number, whatever its track.
    #[default]
    PerChunk,
    /// A target chunk directly following a source chunk shares its number,
    /// producing matching `source/NNNN.wav` and `target/NNNN.wav` pairs.
    Paired,
}

/// Assigns numbers to classified chunks and writes them as WAV clips.
pub struct SequenceWriter<'a> {
    sequence: &'a mut OutputSequence,
    numbering: NumberingScheme,
    overwrite: bool,
    open_pair: Option<u32>,
}

impl<'a> SequenceWriter<'a> {
    pub fn new(sequence: &'a mut OutputSequence, numbering: NumberingScheme, overwrite: bool) -> Self {
        Self {
            sequence,
            numbering,
            overwrite,
            open_pair: None,
        }
    }

    /// Persist `item` as `track_dir/NNNN.wav`, creating the directory if needed.
    pub fn write(&mut self, item: &ClassifiedChunk, track_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(track_dir)?;

        let number = self.number_for(item.track);
        let path = track_dir.join(clip_file_name(number));
        if path.exists() && !self.overwrite {
            return Err(DrillcutError::OutputExists(path));
        }

        encode(&item.chunk.audio, &path, AudioFormat::Wav, &Metadata::default())?;
        debug!(
            "wrote {} chunk {} ({}..{} ms) to '{}'",
            item.track,
            item.chunk.index,
            item.chunk.start_ms,
            item.chunk.end_ms,
            path.display()
        );
        Ok(path)
    }

    /// Assign a number to `item` and return where it would be written,
    /// without touching the filesystem.
    pub fn plan(&mut self, item: &ClassifiedChunk, track_dir: &Path) -> PathBuf {
        let number = self.number_for(item.track);
        track_dir.join(clip_file_name(number))
    }

    fn number_for(&mut self, track: Track) -> u32 {
        match (self.numbering, track) {
            (NumberingScheme::PerChunk, _) => self.sequence.advance(),
            (NumberingScheme::Paired, Track::Source) => {
                let number = self.sequence.advance();
                self.open_pair = Some(number);
                number
            }
            (NumberingScheme::Paired, Track::Target) => match self.open_pair.take() {
                Some(number) => number,
                None => self.sequence.advance(),
            },
        }
    }
}
