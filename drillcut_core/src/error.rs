use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

use crate::distribute::DistributionMode;

/// Errors that can occur while splitting or joining drill recordings.
#[derive(Debug, Error)]
pub enum DrillcutError {
    /// The requested combination of options cannot be executed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The input file is neither WAV nor MP3.
    #[error("unsupported input format: {}", .0.display())]
    UnsupportedInput(PathBuf),

    /// The number of content chunks left after trimming does not match the mode.
    #[error(
        "detected {observed} content chunks but {mode} mode expects {expected}; \
         adjust --skip-first/--skip-end or the silence detection settings"
    )]
    CountMismatch {
        mode: DistributionMode,
        expected: usize,
        observed: usize,
    },

    /// A numbered clip required by the join pass does not exist.
    #[error("missing clip {sequence:04}: {}", .path.display())]
    MissingClip { path: PathBuf, sequence: u32 },

    /// A fixed asset such as the chime could not be found.
    #[error("required audio asset not found: {}", .0.display())]
    MissingAsset(PathBuf),

    /// Refused to replace an existing output file.
    #[error("output file already exists: {} (use --overwrite to replace it)", .0.display())]
    OutputExists(PathBuf),

    /// Two buffers cannot be joined because their formats disagree.
    #[error(
        "cannot combine {left_rate} Hz/{left_channels}ch audio with {right_rate} Hz/{right_channels}ch audio"
    )]
    FormatMismatch {
        left_rate: u32,
        left_channels: u16,
        right_rate: u32,
        right_channels: u16,
    },

    /// Sample data or layout that does not describe a valid buffer.
    #[error("invalid audio buffer: {0}")]
    InvalidAudio(String),

    /// Sample-rate conversion could not be set up or run.
    #[error("resampling failed: {0}")]
    Resample(String),

    /// The external encoder failed or is unavailable.
    #[error("encoder failed: {0}")]
    Encoder(String),

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec")]
    UnsupportedCodec,

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around errors produced while writing WAV data.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = DrillcutError> = std::result::Result<T, E>;
