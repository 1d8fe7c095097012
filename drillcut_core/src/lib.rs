//! Split spoken-language drill recordings into numbered sentence clips and
//! join those clips back into batched review tracks.
//!
//! The split pass decodes a recording, finds the non-silent intervals with an
//! RMS threshold ([`detect`]), cuts padded chunks ([`extract`]), trims and
//! routes them to the source or target track ([`distribute`]) and writes them
//! under one continuous numbering ([`sequence`]). The join pass ([`join`])
//! rebuilds review files from those numbered clips.

pub mod audio;
pub mod codec;
pub mod config;
pub mod detect;
pub mod distribute;
pub mod error;
pub mod extract;
pub mod join;
pub mod progress;
pub mod resample;
pub mod sequence;
pub mod split;

pub use audio::{AudioBuffer, Timeline};
pub use codec::{decode, encode, AudioFormat, Metadata};
pub use config::{EndPolicy, JoinConfig, JoinConfigBuilder, SplitConfig, SplitConfigBuilder};
pub use detect::{detect_nonsilent, detect_silence, Interval};
pub use distribute::{
    distribute, ClassifiedChunk, Distribution, DistributionMode, ExpectedCounts, Track, Trim,
};
pub use error::{DrillcutError, Result};
pub use extract::{extract, Chunk, Padding};
pub use join::{join, JoinReport, JoinedBatch};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter};
pub use resample::resample;
pub use sequence::{clip_file_name, NumberingScheme, OutputSequence, SequenceWriter};
pub use split::{discover_inputs, plan_split, run_split, segment, SplitInput, SplitReport};
