//! The split pass: recording in, numbered sentence clips out.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use walkdir::WalkDir;

use crate::audio::AudioBuffer;
use crate::codec::{decode, AudioFormat};
use crate::config::SplitConfig;
use crate::detect::detect_nonsilent;
use crate::distribute::{distribute, Distribution};
use crate::error::Result;
use crate::extract::extract;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::sequence::{OutputSequence, SequenceWriter};

/// Outcome of splitting one recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitInput {
    pub input: PathBuf,
    /// Chunks found before head/tail trimming.
    pub detected: usize,
    pub written: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub inputs: Vec<SplitInput>,
    /// Files passed over because they are not WAV or MP3.
    pub skipped: Vec<PathBuf>,
}

impl SplitReport {
    pub fn chunks_written(&self) -> usize {
        self.inputs.iter().map(|input| input.written.len()).sum()
    }
}

/// List the files to split: `input` itself, or every file below it in file
/// name order.
pub fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Detect, cut and classify the sentences of a decoded recording.
pub fn segment(buffer: &AudioBuffer, config: &SplitConfig) -> Result<Distribution> {
    let content = buffer.slice(config.skip_start_ms(), buffer.duration_ms());
    let intervals = detect_nonsilent(
        &content,
        config.min_silence_ms(),
        config.silence_threshold_dbfs,
    );
    let chunks = extract(&content, &intervals, config.padding);
    info!("detected {} chunk(s)", chunks.len());

    distribute(chunks, config.mode, config.trim, &config.expected)
}

/// Split every input named by `config`, numbering clips from `sequence`.
///
/// Unsupported files are skipped. Any other failure, including a chunk count
/// that does not fit the distribution mode, stops the run.
pub fn run_split(
    config: &SplitConfig,
    sequence: &mut OutputSequence,
    progress: &mut dyn ProgressReporter,
) -> Result<SplitReport> {
    process(config, sequence, progress, Action::Write)
}

/// Work out the clip paths a split would produce without writing anything.
///
/// `sequence` advances exactly as it would for a real run.
pub fn plan_split(config: &SplitConfig, sequence: &mut OutputSequence) -> Result<Vec<PathBuf>> {
    let mut progress = crate::progress::NoProgress;
    let report = process(config, sequence, &mut progress, Action::Plan)?;
    Ok(report
        .inputs
        .into_iter()
        .flat_map(|input| input.written)
        .collect())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Action {
    Write,
    Plan,
}

fn process(
    config: &SplitConfig,
    sequence: &mut OutputSequence,
    progress: &mut dyn ProgressReporter,
    action: Action,
) -> Result<SplitReport> {
    let mut report = SplitReport::default();

    for input in discover_inputs(&config.input)? {
        if AudioFormat::from_path(&input).is_none() {
            warn!("'{}' is not an MP3 or WAV file, ignoring it", input.display());
            report.skipped.push(input);
            continue;
        }

        let split = split_file(config, &input, sequence, progress, action)?;
        report.inputs.push(split);
    }

    info!(
        "split {} file(s) into {} clip(s)",
        report.inputs.len(),
        report.chunks_written()
    );
    Ok(report)
}

fn split_file(
    config: &SplitConfig,
    input: &Path,
    sequence: &mut OutputSequence,
    progress: &mut dyn ProgressReporter,
    action: Action,
) -> Result<SplitInput> {
    let started = Instant::now();
    info!("splitting '{}'", input.display());
    progress.event(ProgressEvent::InputStarted { input });

    let buffer = decode(input)?;
    let distribution = segment(&buffer, config)?;
    drop(buffer);

    let total = distribution.items.len();
    let mut writer = SequenceWriter::new(sequence, config.numbering, config.overwrite);
    let mut written = Vec::with_capacity(total);
    for item in &distribution.items {
        let dir = config.track_dir(item.track);
        let path = match action {
            Action::Write => writer.write(item, dir)?,
            Action::Plan => writer.plan(item, dir),
        };
        progress.event(ProgressEvent::ChunkWritten {
            track: item.track,
            path: &path,
            written: written.len() + 1,
            total,
        });
        written.push(path);
    }

    progress.event(ProgressEvent::InputFinished {
        input,
        chunks: written.len(),
    });
    info!(
        "wrote {} clip(s) from '{}' in {:.1}s",
        written.len(),
        input.display(),
        started.elapsed().as_secs_f32()
    );

    Ok(SplitInput {
        input: input.to_path_buf(),
        detected: distribution.detected,
        written,
    })
}
