use super::*;
use crate::codec::patch::apply_patch;

/// Deterministic xorshift so the alignment sees varied inputs without a rand dependency.
fn scramble(seed: u64, len: usize, alphabet: &[u8]) -> String {
    let mut x = seed.max(1);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            alphabet[(x % alphabet.len() as u64) as usize] as char
        })
        .collect()
}

fn mutate(seed: u64, base: &str) -> String {
    let mut chars: Vec<char> = base.chars().collect();
    let noise: Vec<char> = scramble(seed ^ 0x9e37, 16, b"xyz").chars().collect();
    let mut x = seed.max(1);
    for n in &noise {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        let at = (x as usize) % (chars.len() + 1);
        match x % 3 {
            0 => chars.insert(at, *n),
            1 if at < chars.len() => {
                chars.remove(at);
            }
            _ if at < chars.len() => chars[at] = *n,
            _ => chars.push(*n),
        }
    }
    chars.into_iter().collect()
}

#[test]
fn identical_frames_yield_an_empty_script() {
    assert!(diff_frames("same", "same").is_empty());
    assert!(diff_frames("", "").is_empty());
}

#[test]
fn base64_scenario_touches_only_changed_positions() {
    let s01 = diff_frames("AAAA", "AAAB");
    assert_eq!(s01.ops(), &[EditOp::replace(3, 4, "B")]);

    let s12 = diff_frames("AAAB", "ABAB");
    assert_eq!(s12.len(), 1);
    let op = &s12.ops()[0];
    assert!(op.low >= 1 && op.high <= 3, "{op:?}");

    let f1 = apply_patch("AAAA", &s01).unwrap();
    assert_eq!(apply_patch(&f1, &s12).unwrap(), "ABAB");
}

#[test]
fn pure_insertions_and_deletions() {
    assert_eq!(diff_frames("abc", "abcd").ops(), &[EditOp::insert(3, "d")]);
    assert_eq!(diff_frames("abcd", "abd").ops(), &[EditOp::delete(2, 3)]);
    assert_eq!(diff_frames("", "xy").ops(), &[EditOp::insert(0, "xy")]);
    assert_eq!(diff_frames("xy", "").ops(), &[EditOp::delete(0, 2)]);
}

#[test]
fn ops_ascend_and_do_not_overlap() {
    let a = scramble(7, 300, b"ABCD");
    let b = mutate(11, &a);
    let script = diff_frames(&a, &b);
    for pair in script.ops().windows(2) {
        assert!(pair[0].high <= pair[1].low, "{:?}", pair);
    }
}

#[test]
fn reproduces_the_target_exactly() {
    for seed in 1..40u64 {
        let a = scramble(seed, 50 + (seed as usize * 13) % 200, b"ACGT");
        let b = mutate(seed * 31, &a);
        let script = diff_frames(&a, &b);
        assert_eq!(apply_patch(&a, &script).unwrap(), b, "seed {seed}");
    }
}

#[test]
fn keeps_shared_runs_out_of_the_script() {
    let a = format!("{}MIDDLE{}", "x".repeat(100), "y".repeat(100));
    let b = format!("{}CENTER{}", "x".repeat(100), "y".repeat(100));
    let script = diff_frames(&a, &b);
    assert!(script.payload_chars() <= 6);
}

#[test]
fn cost_limit_trades_minimality_for_bounded_work() {
    let a = scramble(3, 400, b"ABCDEFGH");
    let b = scramble(5, 400, b"ABCDEFGH");
    let bounded = diff_frames_bounded(&a, &b, Some(1));
    assert_eq!(apply_patch(&a, &bounded).unwrap(), b);

    let exact = diff_frames(&a, &b);
    assert!(exact.payload_chars() <= bounded.payload_chars());
}

#[test]
fn parallel_and_sequential_sequences_agree() {
    let mut frames = vec![scramble(1, 120, b"AB01")];
    for k in 1..12u64 {
        let prev = frames.last().unwrap().clone();
        frames.push(mutate(k, &prev));
    }

    let sequential = diff_sequence(
        &frames,
        &DiffOpts {
            parallel: false,
            ..DiffOpts::default()
        },
    )
    .unwrap();
    let parallel = diff_sequence(
        &frames,
        &DiffOpts {
            parallel: true,
            threads: Some(3),
            ..DiffOpts::default()
        },
    )
    .unwrap();
    assert_eq!(sequential.len(), frames.len() - 1);
    assert_eq!(sequential, parallel);
}

#[test]
fn short_sequences_have_no_scripts() {
    let one = vec!["only".to_string()];
    let opts = DiffOpts::default();
    assert!(diff_sequence(&one, &opts).unwrap().is_empty());
    assert!(diff_sequence(&[], &opts).unwrap().is_empty());
}

#[test]
fn zero_threads_is_rejected() {
    let frames = vec!["a".to_string(), "b".to_string()];
    let opts = DiffOpts {
        parallel: true,
        threads: Some(0),
        ..DiffOpts::default()
    };
    assert!(matches!(
        diff_sequence(&frames, &opts),
        Err(FlipbookError::Validation(_))
    ));
}

#[test]
fn opts_follow_config() {
    let cfg = FlipbookConfig {
        parallel_diff: false,
        threads: Some(2),
        checkpoint_interval: Some(10),
        diff_cost_limit: None,
        ..FlipbookConfig::default()
    };
    let opts = DiffOpts::from(&cfg);
    assert!(!opts.parallel);
    assert_eq!(opts.threads, Some(2));
    assert_eq!(opts.checkpoint_interval, Some(10));
    assert_eq!(opts.cost_limit, None);
    assert_eq!(opts.normalization, Normalization::Base64LineFolding);
}
