use std::path::Path;

use crate::distribute::Track;

/// Notifications emitted while splitting or joining.
#[derive(Clone, Copy, Debug)]
pub enum ProgressEvent<'a> {
    /// A recording is about to be decoded and split.
    InputStarted { input: &'a Path },
    /// A clip has been written (or planned, during a dry run).
    ChunkWritten {
        track: Track,
        path: &'a Path,
        written: usize,
        total: usize,
    },
    /// Every clip of a recording has been written.
    InputFinished { input: &'a Path, chunks: usize },
    /// A joined review file has been written.
    BatchWritten { path: &'a Path, first_sequence: u32 },
}

/// Receiver for [`ProgressEvent`]s. The default implementation ignores them.
pub trait ProgressReporter {
    fn event(&mut self, _event: ProgressEvent<'_>) {}
}

/// Reporter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
