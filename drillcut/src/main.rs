mod cli;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use drillcut_core::{
    join, plan_split, run_split, AudioFormat, DistributionMode, DrillcutError, EndPolicy,
    JoinConfig, NumberingScheme, OutputSequence, ProgressEvent, ProgressReporter, SplitConfig,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;

use crate::cli::{build_cli, DEFAULT_SPLIT_OUTPUT};

/// Renders split and join progress on stderr.
///
/// A split knows how many clips each recording yields, so it gets a bar. A
/// join only learns where the material ends when it gets there, so it shows a
/// spinner with a running batch count.
struct BarReporter {
    bar: ProgressBar,
    style: ProgressStyle,
}

impl BarReporter {
    fn for_split() -> Self {
        Self::new(ProgressBar::new(0), ProgressDrawTarget::stderr())
    }

    fn for_join() -> Self {
        Self::new(ProgressBar::new_spinner(), ProgressDrawTarget::stderr())
    }

    fn new(bar: ProgressBar, target: ProgressDrawTarget) -> Self {
        bar.set_draw_target(target);
        let style = if bar.length().is_some() {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
        } else {
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
        };
        bar.set_style(style.clone());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar, style }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarReporter {
    fn event(&mut self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::InputStarted { input } => {
                self.bar.set_style(self.style.clone());
                self.bar.set_position(0);
                self.bar.set_length(0);
                self.bar.set_message(format!("splitting {}", display_name(input)));
            }
            ProgressEvent::ChunkWritten {
                track,
                written,
                total,
                ..
            } => {
                self.bar.set_length(total as u64);
                self.bar.set_position(written as u64);
                self.bar.set_message(format!("{track}"));
            }
            ProgressEvent::InputFinished { input, chunks } => {
                self.bar
                    .println(format!("{}: wrote {chunks} clip(s)", display_name(input)));
            }
            ProgressEvent::BatchWritten { path, .. } => {
                self.bar.inc(1);
                self.bar
                    .set_message(format!("{} batch file(s) written", self.bar.position()));
                self.bar.println(format!("Wrote {}", display_name(path)));
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of validating the command line.
enum Invocation {
    Split {
        config: SplitConfig,
        start_number: u32,
        dry_run: bool,
    },
    Join(JoinConfig),
    /// The flags do not describe a runnable job; explain why and stop.
    Usage(String),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    match resolve(&matches)? {
        Invocation::Usage(message) => {
            eprintln!("{message}");
            Ok(())
        }
        Invocation::Split {
            config,
            start_number,
            dry_run,
        } => split(&config, start_number, dry_run),
        Invocation::Join(config) => run_join(&config),
    }
}

fn resolve(matches: &ArgMatches) -> anyhow::Result<Invocation> {
    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("inputs")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let overwrite = matches.get_flag("overwrite");

    let result = if matches.get_flag("split") {
        resolve_split(matches, &inputs, overwrite)
    } else if matches.get_flag("join") {
        resolve_join(matches, &inputs, overwrite)
    } else {
        return Ok(Invocation::Usage(
            "Please give --split (-s) or --join (-j)".into(),
        ));
    };

    match result {
        Err(DrillcutError::Configuration(message)) => Ok(Invocation::Usage(message)),
        other => other.context("failed to create configuration"),
    }
}

fn resolve_split(
    matches: &ArgMatches,
    inputs: &[PathBuf],
    overwrite: bool,
) -> Result<Invocation, DrillcutError> {
    let [input] = inputs else {
        return Ok(Invocation::Usage(
            "For splitting, give exactly one input file or directory".into(),
        ));
    };
    if !input.exists() {
        return Err(DrillcutError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("input does not exist: {}", input.display()),
        )));
    }

    let mode = if matches.get_flag("b-files") {
        DistributionMode::SourceTargetAlternating
    } else if matches.get_flag("c-files") {
        DistributionMode::TargetOnly
    } else {
        return Ok(Invocation::Usage("Please give --b-files or --c-files".into()));
    };

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SPLIT_OUTPUT));
    let source = required::<String>(matches, "source")?;
    let target = required::<String>(matches, "target")?;
    let numbering = if matches.get_flag("paired-numbering") {
        NumberingScheme::Paired
    } else {
        NumberingScheme::PerChunk
    };

    let config = SplitConfig::builder(input, mode)
        .source_dir(output.join(source))
        .target_dir(output.join(target))
        .skip_first(*required::<usize>(matches, "skip-first")?)
        .skip_end(*required::<usize>(matches, "skip-end")?)
        .skip_start(*required::<Duration>(matches, "skip-start")?)
        .min_silence(*required::<Duration>(matches, "detect-silence")?)
        .silence_threshold_dbfs(*required::<f64>(matches, "silence-threshold")?)
        .numbering(numbering)
        .overwrite(overwrite)
        .build()?;

    Ok(Invocation::Split {
        config,
        start_number: *required::<u32>(matches, "start-number")?,
        dry_run: matches.get_flag("dry-run"),
    })
}

fn resolve_join(
    matches: &ArgMatches,
    inputs: &[PathBuf],
    overwrite: bool,
) -> Result<Invocation, DrillcutError> {
    if inputs.len() < 2 {
        return Ok(Invocation::Usage(
            "For joining, give two or more track directories".into(),
        ));
    }
    let Some(name) = matches.get_one::<String>("join-name") else {
        return Ok(Invocation::Usage(
            "Give a name to the joined files with --join-name, e.g. Custom_FR_EN \
             creates Custom_FR_EN/Custom_FR_EN - 0001.mp3, Custom_FR_EN - 0051.mp3, ..."
                .into(),
        ));
    };
    if matches.get_flag("dry-run") {
        return Ok(Invocation::Usage("--dry-run only applies to --split".into()));
    }

    let format = match required::<String>(matches, "format")?.as_str() {
        "wav" => AudioFormat::Wav,
        _ => AudioFormat::Mp3,
    };
    let end_policy = if matches.get_flag("strict-end") {
        EndPolicy::Strict
    } else {
        EndPolicy::StopAtBatchBoundary
    };

    let mut builder = JoinConfig::builder(inputs, name.as_str())
        .gap_after_source(*required::<Duration>(matches, "gap-after-source")?)
        .chime(required::<PathBuf>(matches, "chime")?)
        .format(format)
        .end_policy(end_policy)
        .overwrite(overwrite);
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        builder = builder.output_root(output);
    }

    Ok(Invocation::Join(builder.build()?))
}

fn required<'a, T>(matches: &'a ArgMatches, id: &str) -> Result<&'a T, DrillcutError>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(id)
        .ok_or_else(|| DrillcutError::Configuration(format!("missing value for --{id}")))
}

fn split(config: &SplitConfig, start_number: u32, dry_run: bool) -> anyhow::Result<()> {
    let mut sequence = OutputSequence::new(start_number);

    if dry_run {
        let plan = plan_split(config, &mut sequence)
            .with_context(|| format!("failed to plan split of '{}'", config.input.display()))?;

        if plan.is_empty() {
            println!("Dry run: no clips would be written.");
        } else {
            println!("Dry run: would write {} clip(s):", plan.len());
            for path in plan {
                println!("  {}", path.display());
            }
        }
        return Ok(());
    }

    let mut progress = BarReporter::for_split();
    let result = run_split(config, &mut sequence, &mut progress)
        .with_context(|| format!("failed to split '{}'", config.input.display()));
    progress.finish();
    let report = result?;

    for skipped in &report.skipped {
        println!("Skipped {} (not MP3 or WAV)", skipped.display());
    }
    if report.inputs.is_empty() {
        return Err(anyhow!(
            "no MP3 or WAV files found in '{}'",
            config.input.display()
        ));
    }
    debug!("next free clip number is {}", sequence.peek());
    println!(
        "Wrote {} clip(s) from {} file(s)",
        report.chunks_written(),
        report.inputs.len()
    );

    Ok(())
}

fn run_join(config: &JoinConfig) -> anyhow::Result<()> {
    let mut progress = BarReporter::for_join();
    let result = join(config, &mut progress).with_context(|| {
        format!(
            "failed to join into '{}'",
            config.output_dir().display()
        )
    });
    progress.finish();
    let report = result?;

    println!(
        "Joining finished: wrote {} file(s) to {}",
        report.batches.len(),
        config.output_dir().display()
    );
    Ok(())
}
