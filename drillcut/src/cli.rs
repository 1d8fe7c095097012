use std::path::PathBuf;
use std::time::Duration;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, ArgGroup, Command};
use drillcut_core::config::{
    DEFAULT_CHIME, DEFAULT_JOIN_OUTPUT_ROOT, DEFAULT_SOURCE_TRACK, DEFAULT_TARGET_TRACK,
};

pub const DEFAULT_SPLIT_OUTPUT: &str = ".";

/// Parse a human-friendly duration string into a [`Duration`].
///
/// Supported suffixes are `ms` (milliseconds), `s` (seconds), `m` (minutes),
/// and `h` (hours). Multiple components may be chained together, such as
/// `"1m30s"` or `"2s500ms"`. The total must be greater than zero.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration = parse_offset(value)?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".into());
    }
    Ok(duration)
}

/// Like [`parse_duration`], but a zero total such as `0ms` is accepted.
pub fn parse_offset(value: &str) -> Result<Duration, String> {
    let input = value.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".into());
    }

    let mut total_ms: u128 = 0;
    let mut index = 0;
    let bytes = input.as_bytes();
    let len = bytes.len();
    let invalid = || format!("invalid duration '{value}'");

    while index < len {
        if bytes[index].is_ascii_whitespace() {
            return Err(invalid());
        }

        let start = index;
        while index < len && bytes[index].is_ascii_digit() {
            index += 1;
        }

        if start == index {
            return Err(invalid());
        }

        let number = input[start..index].parse::<u128>().map_err(|_| invalid())?;

        if index >= len {
            return Err(invalid());
        }

        let remainder = &input[index..];
        let (unit_len, factor) = if remainder.starts_with("ms") {
            (2, 1u128)
        } else if remainder.starts_with('s') {
            (1, 1_000u128)
        } else if remainder.starts_with('m') {
            (1, 60_000u128)
        } else if remainder.starts_with('h') {
            (1, 3_600_000u128)
        } else {
            return Err(invalid());
        };

        index += unit_len;

        let component_ms = number
            .checked_mul(factor)
            .ok_or_else(|| "duration is too large".to_owned())?;
        total_ms = total_ms
            .checked_add(component_ms)
            .ok_or_else(|| "duration is too large".to_owned())?;
    }

    if total_ms > u128::from(u64::MAX) {
        return Err("duration is too large".into());
    }

    Ok(Duration::from_millis(total_ms as u64))
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Split drill recordings into sentence clips, or join clips into review tracks")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("split")
                .short('s')
                .long("split")
                .help("Split recordings into numbered sentence clips")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("join")
                .short('j')
                .long("join")
                .help("Join numbered clips from two or more track directories")
                .action(ArgAction::SetTrue),
        )
        .group(ArgGroup::new("action").args(["split", "join"]).multiple(false))
        .arg(
            Arg::new("b-files")
                .long("b-files")
                .alias("Bfiles")
                .help("Input alternates source and target sentences")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("c-files")
                .long("c-files")
                .alias("Cfiles")
                .help("Input contains target sentences only")
                .action(ArgAction::SetTrue),
        )
        .group(ArgGroup::new("mode").args(["b-files", "c-files"]).multiple(false))
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("NAME")
                .help("Directory name for source-language clips when splitting")
                .default_value(DEFAULT_SOURCE_TRACK),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("NAME")
                .help("Directory name for target-language clips when splitting")
                .default_value(DEFAULT_TARGET_TRACK),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help(format!(
                    "Root directory for the output (split: '{DEFAULT_SPLIT_OUTPUT}', join: '{DEFAULT_JOIN_OUTPUT_ROOT}')"
                ))
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("start-number")
                .long("start-number")
                .value_name("N")
                .help("Number given to the first clip written, e.g. 501 starts at 0501.wav")
                .default_value("1")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("skip-first")
                .long("skip-first")
                .value_name("COUNT")
                .help("Detected chunks to drop at the start of each recording")
                .default_value("2")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("skip-end")
                .long("skip-end")
                .value_name("COUNT")
                .help("Detected chunks to drop at the end of each recording")
                .default_value("1")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("skip-start")
                .long("skip-start")
                .value_name("DURATION")
                .help("Audio to ignore at the beginning of each recording (e.g. 0ms, 4s)")
                .default_value("0ms")
                .value_parser(ValueParser::new(parse_offset)),
        )
        .arg(
            Arg::new("detect-silence")
                .long("detect-silence")
                .value_name("DURATION")
                .help("Pause length that separates two sentences")
                .default_value("2s")
                .value_parser(ValueParser::new(parse_duration)),
        )
        .arg(
            Arg::new("silence-threshold")
                .long("silence-threshold")
                .value_name("DBFS")
                .help("Level at or below which audio counts as silence")
                .default_value("-48")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("gap-after-source")
                .long("gap-after-source")
                .value_name("DURATION")
                .help("Silence inserted after each source clip when joining")
                .default_value("700ms")
                .value_parser(ValueParser::new(parse_duration)),
        )
        .arg(
            Arg::new("join-name")
                .long("join-name")
                .value_name("NAME")
                .help("Name of the joined files, e.g. Custom_FR_EN gives 'Custom_FR_EN - 0001.mp3'"),
        )
        .arg(
            Arg::new("chime")
                .long("chime")
                .value_name("FILE")
                .help("Marker sound appended to every joined file")
                .default_value(DEFAULT_CHIME)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Format of the joined files")
                .default_value("mp3")
                .value_parser(["mp3", "wav"]),
        )
        .arg(
            Arg::new("paired-numbering")
                .long("paired-numbering")
                .help("Give each source clip and the target clip after it the same number")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict-end")
                .long("strict-end")
                .help("Treat a missing batch at the end of the material as an error")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing output files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the clips a split would write without creating files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("inputs")
                .value_name("INPUT")
                .help("Recording or directory to split, or track directories to join")
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
}
