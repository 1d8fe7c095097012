//! The join pass: numbered clips from several tracks in, batched review files out.
//!
//! For each sequence number the source clip is followed by a fixed gap, and
//! every other track's clip is followed by silence as long as the clip itself,
//! leaving room to repeat the phrase. Each full batch ends with the chime and is
//! written as one file; a batch is never written partially.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::audio::Timeline;
use crate::codec::{decode, encode, Metadata};
use crate::config::{EndPolicy, JoinConfig};
use crate::error::{DrillcutError, Result};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::sequence::clip_file_name;

/// One written review file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedBatch {
    pub path: PathBuf,
    pub first_sequence: u32,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub batches: Vec<JoinedBatch>,
}

impl JoinReport {
    pub fn total_duration_ms(&self) -> u64 {
        self.batches.iter().map(|batch| batch.duration_ms).sum()
    }
}

/// Join the numbered clips of `config.track_dirs` into batched review files.
pub fn join(config: &JoinConfig, progress: &mut dyn ProgressReporter) -> Result<JoinReport> {
    if !config.chime.is_file() {
        return Err(DrillcutError::MissingAsset(config.chime.clone()));
    }
    let chime = decode(&config.chime)?;
    let gap_ms = config.gap_after_source_ms();

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)?;
    info!(
        "joining {} track(s) into '{}'",
        config.track_dirs.len(),
        output_dir.display()
    );

    let mut report = JoinReport::default();
    let mut timeline = Timeline::new();

    for sequence in 1..=config.scan_ceiling {
        let batch_start = (sequence - 1) / config.batch_size * config.batch_size + 1;
        if sequence == batch_start && end_of_material(config, sequence) {
            info!("no clips numbered {sequence:04}, stopping");
            break;
        }

        for (track, dir) in config.track_dirs.iter().enumerate() {
            let path = dir.join(clip_file_name(sequence));
            if !path.is_file() {
                return Err(DrillcutError::MissingClip { path, sequence });
            }

            let clip = decode(&path)?;
            timeline.push(&clip)?;
            if track == 0 {
                timeline.push_silence(gap_ms);
            } else {
                timeline.push_silence(clip.duration_ms());
            }
        }
        debug!("appended clips {sequence:04}");

        if sequence % config.batch_size == 0 {
            timeline.push(&chime)?;
            let batch = flush(config, &mut timeline, batch_start)?;
            progress.event(ProgressEvent::BatchWritten {
                path: &batch.path,
                first_sequence: batch.first_sequence,
            });
            report.batches.push(batch);
        }
    }

    if !timeline.is_empty() {
        warn!(
            "scan ceiling {} reached inside a batch, discarding {} ms of unfinished audio",
            config.scan_ceiling,
            timeline.duration_ms()
        );
    }

    info!("joining finished, wrote {} file(s)", report.batches.len());
    Ok(report)
}

/// Whether a missing `sequence` at the start of a batch ends the material.
fn end_of_material(config: &JoinConfig, sequence: u32) -> bool {
    config.end_policy == EndPolicy::StopAtBatchBoundary
        && config
            .track_dirs
            .iter()
            .all(|dir| !dir.join(clip_file_name(sequence)).is_file())
}

fn flush(config: &JoinConfig, timeline: &mut Timeline, batch_start: u32) -> Result<JoinedBatch> {
    let path = config.batch_path(batch_start);
    if path.exists() && !config.overwrite {
        return Err(DrillcutError::OutputExists(path));
    }

    let Some(buffer) = timeline.take() else {
        return Err(DrillcutError::InvalidAudio(format!(
            "batch {batch_start:04} has no audio"
        )));
    };

    let metadata = Metadata {
        artist: Some(config.artist.clone()),
        title: file_title(&path),
    };
    encode(&buffer, &path, config.format, &metadata)?;
    info!("wrote '{}'", path.display());

    Ok(JoinedBatch {
        path,
        first_sequence: batch_start,
        duration_ms: buffer.duration_ms(),
    })
}

fn file_title(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
}
