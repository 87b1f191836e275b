use ephys::range::{parse_range, OutOfBounds, ResolvedIndex, Span};
use ephys::Error;

fn resolve(token: &str, len: usize) -> Vec<usize> {
    parse_range(token).unwrap().positions(len).unwrap()
}

// ── Inclusive stop ────────────────────────────────────────────────────────────

#[test]
fn span_includes_both_endpoints() {
    for a in 0..6 {
        for b in a..8 {
            let picked = resolve(&format!("{a}:{b}"), 10);
            assert_eq!(picked.len(), b - a + 1, "{a}:{b}");
            assert_eq!(picked.first(), Some(&a));
            assert_eq!(picked.last(), Some(&b));
        }
    }
}

#[test]
fn all_selects_every_element() {
    for n in 0..12 {
        assert_eq!(resolve("all", n), (0..n).collect::<Vec<_>>());
    }
}

#[test]
fn stop_before_start_is_empty() {
    assert!(resolve("3:1", 10).is_empty());
}

#[test]
fn open_bounds_and_step() {
    assert_eq!(resolve(":2", 10), vec![0, 1, 2]);
    assert_eq!(resolve("7:", 10), vec![7, 8, 9]);
    assert_eq!(resolve("::3", 10), vec![0, 3, 6, 9]);
    assert_eq!(resolve("1:7:2", 10), vec![1, 3, 5, 7]);
    assert_eq!(resolve(" 2 : 4 ", 10), vec![2, 3, 4]);
}

#[test]
fn upper_bound_saturates() {
    assert_eq!(resolve("0:5", 3), vec![0, 1, 2]);
    assert!(resolve("8:12", 3).is_empty());
}

// ── Single indices ────────────────────────────────────────────────────────────

#[test]
fn integer_passes_through() {
    assert_eq!(ResolvedIndex::from(4), ResolvedIndex::Single(4));
    assert_eq!(parse_range("4").unwrap(), ResolvedIndex::Single(4));
}

#[test]
fn single_index_past_end_is_out_of_bounds() {
    let idx = parse_range("3").unwrap();
    assert_eq!(idx.positions(3), Err(OutOfBounds { index: 3, len: 3 }));
    assert_eq!(idx.positions(4).unwrap(), vec![3]);
}

// ── Rejected tokens ───────────────────────────────────────────────────────────

#[test]
fn malformed_tokens_rejected() {
    let max_stop = format!("0:{}", usize::MAX);
    for bad in ["", "  ", "x", "1:x", "-1", "0:-2", "1:2:3:4", "0:5:0", "1.5", "ALL", max_stop.as_str()] {
        match parse_range(bad) {
            Err(Error::InvalidRange { token, .. }) => assert_eq!(token, bad),
            other => panic!("{bad:?} parsed as {other:?}"),
        }
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

#[test]
fn display_uses_token_syntax() {
    for token in ["4", "all", "1:5", ":3:2", "2:", "0:9:3"] {
        let parsed = parse_range(token).unwrap();
        assert_eq!(parsed.to_string(), token);
        assert_eq!(parse_range(&parsed.to_string()).unwrap(), parsed);
    }
    let empty = ResolvedIndex::Span(Span { start: None, stop: Some(0), step: None });
    assert!(parse_range(&empty.to_string()).unwrap().positions(5).unwrap().is_empty());
}
