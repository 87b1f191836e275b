mod common;
use common::{make_block, signal, spike_train};
use ephys::{assemble, Block, Error, MergeAction};

#[test]
fn empty_input_rejected_for_every_action() {
    for action in [MergeAction::New, MergeAction::Replace, MergeAction::Add { segment: 0 }] {
        assert_eq!(assemble(Some(make_block(&[1])), vec![], vec![], action), Err(Error::EmptyInput));
    }
    assert_eq!(assemble(None, vec![], vec![], MergeAction::New), Err(Error::EmptyInput));
}

#[test]
fn new_builds_fresh_block_and_leaves_existing_alone() {
    let existing = make_block(&[3, 2]);
    let snapshot = existing.clone();
    let sig = signal("lfp", 8, 500.0, 0.0);

    let out = assemble(Some(existing.clone()), vec![sig.clone()], vec![], MergeAction::New).unwrap();
    assert_eq!(out.segments.len(), 1);
    assert_eq!(out.segments[0].analog_signals, vec![sig]);
    assert!(out.name.is_none());
    assert_eq!(existing, snapshot);
}

#[test]
fn new_keeps_given_order() {
    let sigs: Vec<_> = ["c", "a", "b"].iter().map(|n| signal(n, 4, 100.0, 0.0)).collect();
    let trains = vec![spike_train("u1", &[0.5], 1.0), spike_train("u0", &[0.25], 1.0)];
    let out = Block::from_series(sigs, trains).unwrap();
    let seg = &out.segments[0];
    assert_eq!(seg.analog_signals.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["c", "a", "b"]);
    assert_eq!(seg.spike_trains.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["u1", "u0"]);
}

#[test]
fn replace_swaps_segments_in_place() {
    let mut existing = make_block(&[3, 2]);
    let sig = signal("filtered", 8, 500.0, 1.0);
    existing.replace_series(vec![sig.clone()], vec![]).unwrap();

    assert_eq!(existing.name.as_deref(), Some("recording"));
    assert_eq!(existing.segments.len(), 1);
    assert_eq!(existing.segments[0].analog_signals, vec![sig]);
    assert!(existing.segments[0].spike_trains.is_empty());
}

#[test]
fn replace_through_assemble_returns_the_same_block() {
    let existing = make_block(&[3, 2]);
    let sig = signal("filtered", 8, 500.0, 1.0);
    let out = assemble(Some(existing), vec![sig], vec![], MergeAction::Replace).unwrap();
    assert_eq!(out.name.as_deref(), Some("recording"));
    assert_eq!(out.segments.len(), 1);
}

#[test]
fn add_appends_to_target_segment() {
    let existing = make_block(&[2, 1]);
    let sig = signal("rate", 8, 500.0, 0.0);
    let train = spike_train("sorted", &[0.5], 1.0);

    let out = assemble(Some(existing.clone()), vec![sig.clone()], vec![], "add".parse().unwrap()).unwrap();
    assert_eq!(out.segments[0].analog_signals.len(), 3);
    assert_eq!(out.segments[0].analog_signals[2], sig);
    assert_eq!(out.segments[1], existing.segments[1]);

    let out = assemble(Some(existing), vec![], vec![train.clone()], "add:1".parse().unwrap()).unwrap();
    assert_eq!(out.segments[1].spike_trains.last(), Some(&train));
    assert_eq!(out.segments[0].spike_trains.len(), 2);
}

#[test]
fn rejected_calls_leave_block_untouched() {
    let mut block = make_block(&[2, 1]);
    let snapshot = block.clone();

    assert_eq!(
        block.append_series(4, vec![signal("x", 4, 100.0, 0.0)], vec![]),
        Err(Error::SegmentOutOfRange { index: 4, len: 2 })
    );
    assert_eq!(block.replace_series(vec![], vec![]), Err(Error::EmptyInput));
    assert_eq!(block.append_series(0, vec![], vec![]), Err(Error::EmptyInput));
    assert_eq!(block, snapshot);
}

#[test]
fn replace_and_add_need_a_block() {
    let sig = || vec![signal("x", 4, 100.0, 0.0)];
    assert_eq!(assemble(None, sig(), vec![], MergeAction::Replace), Err(Error::MissingBlock("replace")));
    assert_eq!(assemble(None, sig(), vec![], MergeAction::Add { segment: 0 }), Err(Error::MissingBlock("add")));
}

#[test]
fn unknown_action_rejected() {
    assert_eq!("merge".parse::<MergeAction>(), Err(Error::InvalidAction("merge".into())));
    assert_eq!(MergeAction::Add { segment: 2 }.to_string(), "add:2");
    assert_eq!(MergeAction::default(), MergeAction::New);
}
