mod common;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use common::{sorted_file_names, write_chime, write_chime_at, write_track, SAMPLE_RATE};
use drillcut_core::{
    decode, join, AudioFormat, DrillcutError, EndPolicy, JoinConfig, JoinConfigBuilder,
    NoProgress,
};
use tempfile::tempdir;

const SOURCE_MS: u64 = 200;
const TARGET_MS: u64 = 300;
const CHIME_MS: u64 = 500;
const GAP_MS: u64 = 700;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    source: PathBuf,
    target: PathBuf,
    chime: PathBuf,
}

impl Fixture {
    fn new(pairs: u32) -> Result<Self, Box<dyn Error>> {
        let dir = tempdir()?;
        let root = dir.path().to_path_buf();
        let source = root.join("fr");
        let target = root.join("en");
        let chime = root.join("chime.wav");
        write_track(&source, pairs, SOURCE_MS)?;
        write_track(&target, pairs, TARGET_MS)?;
        write_chime(&chime, CHIME_MS)?;
        Ok(Self {
            _dir: dir,
            root,
            source,
            target,
            chime,
        })
    }

    fn builder(&self, output: &str) -> JoinConfigBuilder {
        JoinConfig::builder([&self.source, &self.target], "Review")
            .output_root(self.root.join(output))
            .chime(&self.chime)
            .format(AudioFormat::Wav)
    }

    fn output_dir(&self, output: &str) -> PathBuf {
        self.root.join(output).join("Review")
    }
}

fn pair_slot_ms() -> u64 {
    SOURCE_MS + GAP_MS + TARGET_MS + TARGET_MS
}

#[test]
fn join_writes_one_file_per_batch_with_gaps_and_chime() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(100)?;
    let config = fixture.builder("out").build()?;

    let report = join(&config, &mut NoProgress)?;

    assert_eq!(report.batches.len(), 2);
    assert_eq!(report.batches[0].first_sequence, 1);
    assert_eq!(report.batches[1].first_sequence, 51);
    assert_eq!(
        sorted_file_names(&fixture.output_dir("out"))?,
        vec!["Review - 0001.wav".to_owned(), "Review - 0051.wav".to_owned()]
    );

    let expected_ms = 50 * pair_slot_ms() + CHIME_MS;
    for batch in &report.batches {
        assert_eq!(batch.duration_ms, expected_ms);
        assert_eq!(decode(&batch.path)?.duration_ms(), expected_ms);
    }
    Ok(())
}

#[test]
fn join_is_deterministic() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(50)?;

    let first = join(&fixture.builder("first").build()?, &mut NoProgress)?;
    let second = join(&fixture.builder("second").build()?, &mut NoProgress)?;

    assert_eq!(first.batches.len(), 1);
    assert_eq!(first.total_duration_ms(), second.total_duration_ms());
    assert_eq!(
        fs::read(&first.batches[0].path)?,
        fs::read(&second.batches[0].path)?
    );
    Ok(())
}

#[test]
fn missing_clip_inside_a_batch_aborts_without_output() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(50)?;
    fs::remove_file(fixture.target.join("0037.wav"))?;

    let err = join(&fixture.builder("out").build()?, &mut NoProgress)
        .expect_err("a hole in the target track must abort the join");

    match err {
        DrillcutError::MissingClip { path, sequence } => {
            assert_eq!(sequence, 37);
            assert_eq!(path, fixture.target.join("0037.wav"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(sorted_file_names(&fixture.output_dir("out"))?.is_empty());
    Ok(())
}

#[test]
fn end_policy_decides_what_a_missing_batch_means() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(4)?;

    let lenient = fixture.builder("lenient").batch_size(2).build()?;
    let report = join(&lenient, &mut NoProgress)?;
    assert_eq!(report.batches.len(), 2);

    let strict = fixture
        .builder("strict")
        .batch_size(2)
        .end_policy(EndPolicy::Strict)
        .build()?;
    match join(&strict, &mut NoProgress) {
        Err(DrillcutError::MissingClip { sequence, .. }) => assert_eq!(sequence, 5),
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn clip_missing_from_one_track_at_a_boundary_is_an_error() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(4)?;
    fs::remove_file(fixture.target.join("0003.wav"))?;
    fs::remove_file(fixture.target.join("0004.wav"))?;

    let config = fixture.builder("out").batch_size(2).build()?;
    match join(&config, &mut NoProgress) {
        Err(DrillcutError::MissingClip { sequence, .. }) => assert_eq!(sequence, 3),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(sorted_file_names(&fixture.output_dir("out"))?.len(), 1);
    Ok(())
}

#[test]
fn every_extra_track_gets_a_matching_silence() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(2)?;
    let third = fixture.root.join("de");
    write_track(&third, 2, 120)?;

    let config = JoinConfig::builder([&fixture.source, &fixture.target, &third], "Review")
        .output_root(fixture.root.join("out"))
        .chime(&fixture.chime)
        .format(AudioFormat::Wav)
        .batch_size(2)
        .build()?;
    let report = join(&config, &mut NoProgress)?;

    assert_eq!(report.batches.len(), 1);
    assert_eq!(
        report.batches[0].duration_ms,
        2 * (pair_slot_ms() + 120 + 120) + CHIME_MS
    );
    Ok(())
}

#[test]
fn scan_ceiling_discards_an_unfinished_batch() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(4)?;
    let config = fixture.builder("out").batch_size(2).scan_ceiling(3).build()?;

    let report = join(&config, &mut NoProgress)?;

    assert_eq!(report.batches.len(), 1);
    assert_eq!(
        sorted_file_names(&fixture.output_dir("out"))?,
        vec!["Review - 0001.wav".to_owned()]
    );
    Ok(())
}

#[test]
fn join_requires_the_chime() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(2)?;
    let missing = fixture.root.join("nowhere.wav");
    let config = fixture.builder("out").chime(&missing).build()?;

    match join(&config, &mut NoProgress) {
        Err(DrillcutError::MissingAsset(path)) => assert_eq!(path, missing),
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn existing_batches_are_kept_unless_overwrite_is_set() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(2)?;
    let config = fixture.builder("out").batch_size(2).build()?;
    join(&config, &mut NoProgress)?;

    assert!(matches!(
        join(&config, &mut NoProgress),
        Err(DrillcutError::OutputExists(_))
    ));

    let forced = fixture.builder("out").batch_size(2).overwrite(true).build()?;
    assert_eq!(join(&forced, &mut NoProgress)?.batches.len(), 1);
    Ok(())
}

#[test]
fn chime_at_another_sample_rate_is_converted() -> Result<(), Box<dyn Error>> {
    let fixture = Fixture::new(2)?;
    write_chime_at(&fixture.chime, CHIME_MS, 16_000)?;
    let config = fixture.builder("out").batch_size(2).build()?;

    let report = join(&config, &mut NoProgress)?;

    assert_eq!(report.batches.len(), 1);
    let expected_ms = 2 * pair_slot_ms() + CHIME_MS;
    assert_eq!(report.batches[0].duration_ms, expected_ms);

    let written = decode(&report.batches[0].path)?;
    assert_eq!(written.sample_rate(), SAMPLE_RATE);
    assert_eq!(written.channels(), 1);
    assert_eq!(written.duration_ms(), expected_ms);
    Ok(())
}
