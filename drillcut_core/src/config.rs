//! Validated settings for the split and join passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codec::AudioFormat;
use crate::distribute::{DistributionMode, ExpectedCounts, Track, Trim};
use crate::error::{DrillcutError, Result};
use crate::extract::Padding;
use crate::sequence::NumberingScheme;

/// Minimum pause separating two sentences.
pub const DEFAULT_MIN_SILENCE: Duration = Duration::from_millis(2_000);
/// Level at or below which audio counts as silence.
pub const DEFAULT_SILENCE_THRESHOLD_DBFS: f64 = -48.0;
/// Silence inserted after every source clip when joining.
pub const DEFAULT_GAP_AFTER_SOURCE: Duration = Duration::from_millis(700);
/// Sentences per joined output file.
pub const JOIN_BATCH_SIZE: u32 = 50;
/// Highest sequence number the join pass looks for.
pub const JOIN_SCAN_CEILING: u32 = 3_000;
/// Artist tag written into joined files.
pub const DEFAULT_ARTIST: &str = "drillcut";
pub const DEFAULT_SOURCE_TRACK: &str = "source";
pub const DEFAULT_TARGET_TRACK: &str = "target";
pub const DEFAULT_JOIN_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_CHIME: &str = "chime.wav";

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration for splitting one recording, or a directory of them.
#[derive(Clone, Debug)]
pub struct SplitConfig {
    /// A single WAV/MP3 file or a directory searched recursively.
    pub input: PathBuf,
    pub mode: DistributionMode,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub trim: Trim,
    /// Audio discarded from the start of every recording before detection.
    pub skip_start: Duration,
    pub min_silence: Duration,
    pub silence_threshold_dbfs: f64,
    pub padding: Padding,
    pub expected: ExpectedCounts,
    pub numbering: NumberingScheme,
    pub overwrite: bool,
}

impl SplitConfig {
    pub fn builder<P: AsRef<Path>>(input: P, mode: DistributionMode) -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: SplitConfig {
                input: input.as_ref().to_path_buf(),
                mode,
                source_dir: PathBuf::from(DEFAULT_SOURCE_TRACK),
                target_dir: PathBuf::from(DEFAULT_TARGET_TRACK),
                trim: Trim::default(),
                skip_start: Duration::ZERO,
                min_silence: DEFAULT_MIN_SILENCE,
                silence_threshold_dbfs: DEFAULT_SILENCE_THRESHOLD_DBFS,
                padding: Padding::default(),
                expected: ExpectedCounts::default(),
                numbering: NumberingScheme::default(),
                overwrite: false,
            },
        }
    }

    pub fn track_dir(&self, track: Track) -> &Path {
        match track {
            Track::Source => &self.source_dir,
            Track::Target => &self.target_dir,
        }
    }

    pub fn skip_start_ms(&self) -> u64 {
        millis(self.skip_start)
    }

    pub fn min_silence_ms(&self) -> u64 {
        millis(self.min_silence)
    }
}

/// Builder for [`SplitConfig`].
#[derive(Clone, Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn source_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.source_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn target_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.target_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn skip_first(mut self, count: usize) -> Self {
        self.config.trim.skip_first = count;
        self
    }

    pub fn skip_end(mut self, count: usize) -> Self {
        self.config.trim.skip_end = count;
        self
    }

    pub fn skip_start(mut self, duration: Duration) -> Self {
        self.config.skip_start = duration;
        self
    }

    pub fn min_silence(mut self, duration: Duration) -> Self {
        self.config.min_silence = duration;
        self
    }

    pub fn silence_threshold_dbfs(mut self, dbfs: f64) -> Self {
        self.config.silence_threshold_dbfs = dbfs;
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.config.padding = padding;
        self
    }

    pub fn expected_counts(mut self, expected: ExpectedCounts) -> Self {
        self.config.expected = expected;
        self
    }

    pub fn numbering(mut self, numbering: NumberingScheme) -> Self {
        self.config.numbering = numbering;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    pub fn build(self) -> Result<SplitConfig> {
        let config = self.config;

        if !config.input.exists() {
            return Err(DrillcutError::Configuration(format!(
                "input does not exist: {}",
                config.input.display()
            )));
        }
        if config.min_silence_ms() == 0 {
            return Err(DrillcutError::Configuration(
                "minimum silence length must be at least one millisecond".into(),
            ));
        }
        if !config.silence_threshold_dbfs.is_finite() || config.silence_threshold_dbfs > 0.0 {
            return Err(DrillcutError::Configuration(format!(
                "silence threshold must be a finite level at or below 0 dBFS, got {}",
                config.silence_threshold_dbfs
            )));
        }
        if config.mode == DistributionMode::SourceTargetAlternating
            && config.source_dir == config.target_dir
        {
            return Err(DrillcutError::Configuration(
                "source and target tracks must be written to different directories".into(),
            ));
        }
        for track in config.mode.tracks() {
            if config.track_dir(*track).as_os_str().is_empty() {
                return Err(DrillcutError::Configuration(format!(
                    "the {track} track needs a name"
                )));
            }
        }

        Ok(config)
    }
}

/// What a missing clip means to the join pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndPolicy {
    /// A batch whose first clip is absent from every track marks the end of
    /// the material; the join stops cleanly there.
    #[default]
    StopAtBatchBoundary,
    /// Every missing clip below the scan ceiling is an error.
    Strict,
}

/// Configuration for joining numbered clips into review files.
#[derive(Clone, Debug)]
pub struct JoinConfig {
    /// Track directories in playback order; the first is the source track.
    pub track_dirs: Vec<PathBuf>,
    pub output_name: String,
    pub output_root: PathBuf,
    pub gap_after_source: Duration,
    pub chime: PathBuf,
    pub batch_size: u32,
    pub scan_ceiling: u32,
    pub format: AudioFormat,
    pub artist: String,
    pub end_policy: EndPolicy,
    pub overwrite: bool,
}

impl JoinConfig {
    pub fn builder<I, P, S>(track_dirs: I, output_name: S) -> JoinConfigBuilder
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        S: Into<String>,
    {
        JoinConfigBuilder {
            config: JoinConfig {
                track_dirs: track_dirs
                    .into_iter()
                    .map(|dir| dir.as_ref().to_path_buf())
                    .collect(),
                output_name: output_name.into(),
                output_root: PathBuf::from(DEFAULT_JOIN_OUTPUT_ROOT),
                gap_after_source: DEFAULT_GAP_AFTER_SOURCE,
                chime: PathBuf::from(DEFAULT_CHIME),
                batch_size: JOIN_BATCH_SIZE,
                scan_ceiling: JOIN_SCAN_CEILING,
                format: AudioFormat::Mp3,
                artist: DEFAULT_ARTIST.to_owned(),
                end_policy: EndPolicy::default(),
                overwrite: false,
            },
        }
    }

    /// Directory receiving the joined files: `{output_root}/{output_name}`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.output_name)
    }

    /// Path of the batch whose first sequence number is `batch_start`.
    pub fn batch_path(&self, batch_start: u32) -> PathBuf {
        self.output_dir().join(format!(
            "{} - {batch_start:04}.{}",
            self.output_name,
            self.format.extension()
        ))
    }

    pub fn gap_after_source_ms(&self) -> u64 {
        millis(self.gap_after_source)
    }
}

/// Builder for [`JoinConfig`].
#[derive(Clone, Debug)]
pub struct JoinConfigBuilder {
    config: JoinConfig,
}

impl JoinConfigBuilder {
    pub fn output_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.config.output_root = root.as_ref().to_path_buf();
        self
    }

    pub fn gap_after_source(mut self, gap: Duration) -> Self {
        self.config.gap_after_source = gap;
        self
    }

    pub fn chime<P: AsRef<Path>>(mut self, chime: P) -> Self {
        self.config.chime = chime.as_ref().to_path_buf();
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn scan_ceiling(mut self, ceiling: u32) -> Self {
        self.config.scan_ceiling = ceiling;
        self
    }

    pub fn format(mut self, format: AudioFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn artist<S: Into<String>>(mut self, artist: S) -> Self {
        self.config.artist = artist.into();
        self
    }

    pub fn end_policy(mut self, policy: EndPolicy) -> Self {
        self.config.end_policy = policy;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    pub fn build(self) -> Result<JoinConfig> {
        let config = self.config;

        if config.track_dirs.len() < 2 {
            return Err(DrillcutError::Configuration(
                "joining needs two or more track directories".into(),
            ));
        }
        let name = config.output_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DrillcutError::Configuration(format!(
                "'{}' cannot be used as a join output name",
                config.output_name
            )));
        }
        if config.batch_size == 0 {
            return Err(DrillcutError::Configuration(
                "batch size must be greater than zero".into(),
            ));
        }
        if config.scan_ceiling < config.batch_size {
            return Err(DrillcutError::Configuration(format!(
                "scan ceiling {} is below the batch size {}",
                config.scan_ceiling, config.batch_size
            )));
        }

        Ok(config)
    }
}
