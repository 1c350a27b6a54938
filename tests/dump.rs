mod common;

use std::{collections::BTreeMap, fs, path::Path};

use codepoint_dump::{CodepointDumper, Config, DumpError, Font, FontError};
use common::{FontBuilder, TestSubtable};
use tempfile::TempDir;

fn read_output(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            let name = entry.file_name().into_string().unwrap();
            (name, fs::read(entry.path()).unwrap())
        })
        .collect()
}

fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
    pairs
        .iter()
        .map(|(name, contents)| (name.to_string(), contents.as_bytes().to_vec()))
        .collect()
}

#[test]
fn skips_code_points_past_the_unicode_range() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(3, 10, TestSubtable::Format12(vec![(65, 66, 1), (0x110000, 0x110000, 3)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");

    let summary = CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap();

    assert_eq!(summary.tables, 1);
    assert_eq!(summary.files_written, 2);
    assert_eq!(read_output(&output_dir), expected(&[("65", "A"), ("66", "B")]));
    assert!(!output_dir.join("1114112").exists());
}

#[test]
fn every_subtable_contributes() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(3, 1, TestSubtable::Format4(vec![(0x41, 0x42, 1), (0x3042, 0x3042, 5)]))
        .subtable(3, 10, TestSubtable::Format12(vec![(0x42, 0x42, 2), (0x1F600, 0x1F600, 9)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");

    let summary = CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap();

    // 'B' is written by both subtables
    assert_eq!(summary.tables, 2);
    assert_eq!(summary.files_written, 5);
    assert_eq!(
        read_output(&output_dir),
        expected(&[
            ("65", "A"),
            ("66", "B"),
            ("12354", "あ"),
            ("128512", "😀"),
        ])
    );
}

#[test]
fn surrogates_are_skipped() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(3, 1, TestSubtable::Format4(vec![(0xD7FF, 0xD800, 1), (0xDFFF, 0xE000, 4)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");

    CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap();

    let names: Vec<String> = read_output(&output_dir).into_keys().collect();
    assert_eq!(names, vec!["55295".to_string(), "57344".to_string()]);
}

#[test]
fn rerunning_is_idempotent_and_keeps_foreign_files() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(0, 3, TestSubtable::Format4(vec![(0x61, 0x63, 10)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");
    let dumper = CodepointDumper::new(Config::new(&font_path, &output_dir));

    dumper.run().unwrap();
    let first = read_output(&output_dir);

    fs::write(output_dir.join("97"), "overwritten").unwrap();
    fs::write(output_dir.join("notes"), "left alone").unwrap();
    dumper.run().unwrap();

    let mut second = read_output(&output_dir);
    assert_eq!(second.remove("notes"), Some(b"left alone".to_vec()));
    assert_eq!(first, second);
    assert_eq!(first, expected(&[("97", "a"), ("98", "b"), ("99", "c")]));
}

#[test]
fn missing_font_writes_nothing() {
    let workdir = TempDir::new().unwrap();
    let output_dir = workdir.path().join("texts");

    let err = CodepointDumper::new(Config::new(workdir.path().join("nope.ttf"), &output_dir))
        .run()
        .unwrap_err();

    assert!(matches!(err, DumpError::FontParse(FontError::Open { .. })));
    assert!(output_dir.is_dir());
    assert!(read_output(&output_dir).is_empty());
}

#[test]
fn malformed_font_writes_nothing() {
    let workdir = TempDir::new().unwrap();
    let font_path = workdir.path().join("broken.ttf");
    let mut bytes = FontBuilder::new()
        .subtable(3, 1, TestSubtable::Format4(vec![(0x41, 0x5A, 1)]))
        .build();
    bytes.truncate(40);
    fs::write(&font_path, bytes).unwrap();
    let output_dir = workdir.path().join("texts");

    let err = CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap_err();

    assert!(matches!(err, DumpError::FontParse(_)));
    assert!(read_output(&output_dir).is_empty());
}

#[test]
fn failed_write_stops_the_run() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(3, 10, TestSubtable::Format12(vec![(65, 67, 1)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");
    fs::create_dir_all(output_dir.join("66")).unwrap();

    let err = CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap_err();

    match err {
        DumpError::WriteCodepoint { path, .. } => assert_eq!(path, output_dir.join("66")),
        other => panic!("expected a write failure, got {other:?}"),
    }
    assert_eq!(fs::read(output_dir.join("65")).unwrap(), b"A");
    assert!(output_dir.join("66").is_dir());
    assert!(!output_dir.join("67").exists());
}

#[test]
fn output_dir_blocked_by_a_file() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(3, 1, TestSubtable::Format4(vec![(0x41, 0x41, 1)]))
        .write_to(workdir.path());
    let output_dir = workdir.path().join("texts");
    fs::write(&output_dir, "not a directory").unwrap();

    let err = CodepointDumper::new(Config::new(&font_path, &output_dir))
        .run()
        .unwrap_err();

    assert!(matches!(err, DumpError::CreateOutputDir { .. }));
}

#[test]
fn font_exposes_its_encoding_records() {
    let workdir = TempDir::new().unwrap();
    let font_path = FontBuilder::new()
        .subtable(0, 3, TestSubtable::Format4(vec![(0x41, 0x41, 1)]))
        .subtable(3, 10, TestSubtable::Format12(vec![(0x41, 0x41, 1)]))
        .write_to(workdir.path());

    let font = Font::open(&font_path, 0).unwrap();
    let encodings: Vec<_> = font
        .cmap()
        .subtables()
        .iter()
        .map(|sub| (sub.platform_id(), sub.platform_specific_id(), sub.subtable().format()))
        .collect();

    assert_eq!(encodings, vec![(0, 3, 4), (3, 10, 12)]);
    assert_eq!(font.tables().offset.num_tables(), 1);
}
