use super::*;

#[test]
fn kind_is_inferred_from_the_triple() {
    assert_eq!(EditOp::delete(1, 3).kind(), EditKind::Delete);
    assert_eq!(EditOp::insert(2, "x").kind(), EditKind::Insert);
    assert_eq!(EditOp::replace(0, 1, "y").kind(), EditKind::Replace);
    // An empty range with no data is a no-op deletion.
    assert_eq!(EditOp::delete(4, 4).kind(), EditKind::Delete);
}

#[test]
fn applies_each_kind() {
    let del = EditScript::new(vec![EditOp::delete(1, 3)]);
    assert_eq!(apply_patch("abcde", &del).unwrap(), "ade");

    let ins = EditScript::new(vec![EditOp::insert(2, "XY")]);
    assert_eq!(apply_patch("abcde", &ins).unwrap(), "abXYcde");

    let rep = EditScript::new(vec![EditOp::replace(1, 4, "Z")]);
    assert_eq!(apply_patch("abcde", &rep).unwrap(), "aZe");
}

#[test]
fn insert_past_the_end_appends() {
    let s = EditScript::new(vec![EditOp::insert(3, "def")]);
    assert_eq!(apply_patch("abc", &s).unwrap(), "abcdef");
    assert!(matches!(
        apply_patch("", &s),
        Err(FlipbookError::CorruptPatch(_))
    ));

    let empty_base = EditScript::new(vec![EditOp::insert(0, "new")]);
    assert_eq!(apply_patch("", &empty_base).unwrap(), "new");
}

#[test]
fn ops_use_original_indices() {
    // Both ops address the base; the insert at 4 is not shifted by the earlier delete.
    let s = EditScript::new(vec![EditOp::delete(0, 2), EditOp::insert(4, "!")]);
    assert_eq!(apply_patch("abcdef", &s).unwrap(), "cd!ef");
}

#[test]
fn out_of_range_ops_are_corrupt() {
    let past_end = EditScript::new(vec![EditOp::replace(2, 9, "x")]);
    assert!(matches!(
        apply_patch("abc", &past_end),
        Err(FlipbookError::CorruptPatch(_))
    ));

    let inverted = EditScript::new(vec![EditOp::delete(2, 1)]);
    assert!(matches!(
        apply_patch("abc", &inverted),
        Err(FlipbookError::CorruptPatch(_))
    ));
}

#[test]
fn application_is_idempotent_and_order_independent() {
    let base = "the quick brown fox";
    let ops = vec![
        EditOp::replace(4, 9, "slow"),
        EditOp::delete(10, 16),
        EditOp::insert(19, " jumps"),
        EditOp::insert(0, ">> "),
    ];
    let forward = EditScript::new(ops.clone());
    let first = apply_patch(base, &forward).unwrap();
    assert_eq!(first, ">> the slow fox jumps");
    assert_eq!(apply_patch(base, &forward).unwrap(), first);

    let reversed: EditScript = ops.into_iter().rev().collect();
    assert_eq!(apply_patch(base, &reversed).unwrap(), first);
}

#[test]
fn multibyte_characters_are_single_cells() {
    let s = EditScript::new(vec![EditOp::replace(1, 2, "ü")]);
    assert_eq!(apply_patch("aéb", &s).unwrap(), "aüb");
}

#[test]
fn serializes_as_triples() {
    let s = EditScript::new(vec![EditOp::replace(3, 4, "B"), EditOp::delete(5, 6)]);
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json, r#"[[3,4,"B"],[5,6,""]]"#);
    let back: EditScript = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
    assert_eq!(back.payload_chars(), 1);
}
