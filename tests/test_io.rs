mod common;
use common::{make_block, signal, spike_train};
use ephys::io::{load::detect_format, load_blocks};
use ephys::{load_block, save_data, Block, BlockChoice, Format, Segment, WriteAction};
use std::path::Path;

fn annotated_block() -> Block {
    let mut block = make_block(&[2, 1]);
    block.annotations.insert("subject".into(), "rat-07".into());
    block.segments[0].name = Some("trial 0".into());
    block.segments[0].analog_signals[1] = signal("lfp", 32, 2000.0, -1.5).with_units("mV").with_t_start(0.5);
    block.segments[1].spike_trains[0] = spike_train("unit", &[0.125, 0.25, 0.75], 1.0).with_source("tetrode 3");
    block
}

// ── Round trips ───────────────────────────────────────────────────────────────

#[test]
fn roundtrip_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let block = annotated_block();
    for format in Format::ALL {
        let path = dir.path().join(format!("rec.{}", format.extension()));
        save_data(block.clone(), &path, None, WriteAction::New).unwrap();
        let loaded = load_block(&path, None, None).unwrap();
        assert_eq!(loaded, block, "{format}");
        assert_eq!(loaded.segments[1].spike_trains[0].source(), Some("tetrode 3"));
    }
}

#[test]
fn loose_series_saved_as_one_segment_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.json");
    let st = spike_train("unit", &[0.5], 2.0);
    save_data(st.clone(), &path, None, WriteAction::New).unwrap();

    let loaded = load_block(&path, None, None).unwrap();
    assert_eq!(loaded.segments, vec![Segment::with_series(vec![], vec![st])]);
}

// ── Write actions ─────────────────────────────────────────────────────────────

#[test]
fn write_action_must_match_file_existence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.safetensors");
    let block = make_block(&[1]);

    assert!(save_data(block.clone(), &path, None, WriteAction::Replace).is_err());
    assert!(save_data(block.clone(), &path, None, WriteAction::Update).is_err());
    assert!(!path.exists());

    save_data(block.clone(), &path, None, WriteAction::New).unwrap();
    let err = save_data(block.clone(), &path, None, WriteAction::New).unwrap_err();
    assert!(err.to_string().contains("already exists"), "{err}");
    save_data(block, &path, None, WriteAction::Replace).unwrap();
    assert_eq!(load_blocks(&path, None).unwrap().len(), 1);
}

#[test]
fn update_appends_a_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    save_data(make_block(&[1]), &path, None, WriteAction::New).unwrap();
    save_data(Block::named("second").with_segments(vec![Segment::new()]), &path, None, WriteAction::Update).unwrap();

    let blocks = load_blocks(&path, None).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].name.as_deref(), Some("second"));
}

#[test]
fn output_format_needed_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");
    assert!(save_data(make_block(&[1]), &path, None, WriteAction::New).is_err());
    assert!(!path.exists());
    save_data(make_block(&[1]), &path, Some(Format::Json), WriteAction::New).unwrap();
    assert_eq!(load_block(&path, None, None).unwrap(), make_block(&[1]));
}

// ── Format detection ──────────────────────────────────────────────────────────

#[test]
fn format_sniffed_when_extension_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    for format in Format::ALL {
        let path = dir.path().join(format!("data_{format}.bin"));
        save_data(make_block(&[1]), &path, Some(format), WriteAction::New).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(detect_format(&path, &bytes).unwrap(), format);
    }
}

#[test]
fn conflicting_extension_and_content_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("looks_like.json");
    save_data(make_block(&[1]), &path, Some(Format::Safetensors), WriteAction::New).unwrap();
    assert!(load_block(&path, None, None).is_err());
    // An explicit format overrides the extension.
    assert_eq!(load_block(&path, Some(Format::Safetensors), None).unwrap(), make_block(&[1]));
}

#[test]
fn explicit_format_must_match_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.json");
    save_data(make_block(&[1]), &path, None, WriteAction::New).unwrap();
    let err = load_blocks(&path, Some(Format::Safetensors)).unwrap_err();
    assert!(format!("{err:#}").contains("do not match"), "{err:#}");
}

#[test]
fn undetectable_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not a recording").unwrap();
    assert!(load_blocks(&path, None).is_err());
    assert!(load_blocks(Path::new("/nonexistent/rec.json"), None).is_err());
}

// ── Block choice ──────────────────────────────────────────────────────────────

#[test]
fn block_chosen_by_index_or_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.safetensors");
    save_data(Block::named("first").with_segments(vec![Segment::new()]), &path, None, WriteAction::New).unwrap();
    save_data(make_block(&[2]), &path, None, WriteAction::Update).unwrap();

    assert_eq!(load_block(&path, None, None).unwrap().name.as_deref(), Some("first"));
    assert_eq!(load_block(&path, None, Some(&BlockChoice::Index(1))).unwrap(), make_block(&[2]));
    let by_name = load_block(&path, None, Some(&BlockChoice::Name("recording".into()))).unwrap();
    assert_eq!(by_name.segments[0].analog_signals.len(), 2);

    assert!(load_block(&path, None, Some(&BlockChoice::Index(2))).is_err());
    assert!(load_block(&path, None, Some(&BlockChoice::Name("missing".into()))).is_err());
}

#[test]
fn block_index_and_name_are_exclusive() {
    assert!(BlockChoice::from_options(Some(0), Some("a".into())).is_err());
    assert_eq!(BlockChoice::from_options(None, None).unwrap(), None);
    assert_eq!(BlockChoice::from_options(Some(3), None).unwrap(), Some(BlockChoice::Index(3)));
}
