use fvh_core::{
    ChangeId, ChangeRecord, ContentHash, FvhError, LineDelta, LineEdit, LineMap, Prefix,
    RepoConfig, TrackedFile,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_tokenize_round_trip() {
    let samples = [
        "",
        "single\n",
        "alpha\nbeta\n",
        "  indented\n\n\ttabbed\nlast\n",
        "unicode: café ✓\nsecond\n",
    ];

    for text in samples {
        let map = LineMap::tokenize(text.as_bytes());
        let expected = text.matches('\n').count();

        assert_eq!(map.len(), expected, "line count for {text:?}");
        assert!(map.line_numbers().eq(1..=expected), "keys for {text:?}");
        assert_eq!(map.to_text(), text);
    }
}

#[test]
fn test_tokenize_without_final_newline() {
    let map = LineMap::tokenize(b"alpha\nbeta");
    assert_eq!(map.len(), 2);
    // Re-joining adds the final newline back
    assert_eq!(map.to_text(), "alpha\nbeta\n");
}

#[test]
fn test_tokenize_invalid_utf8_is_lossy() {
    let map = LineMap::tokenize(&[b'o', b'k', b'\n', 0xff, b'\n']);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(1), Some("ok"));
    assert_eq!(map.get(2), Some("\u{fffd}"));
}

#[test]
fn test_read_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = LineMap::read(&temp.path().join("nope.txt")).unwrap_err();
    assert!(matches!(err, FvhError::FileNotFound { .. }));
}

#[test]
fn test_read_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    fs::write(&path, "alpha\nbeta\n").unwrap();

    let map = LineMap::read(&path).unwrap();
    let expected: LineMap = [(1, "alpha"), (2, "beta")].into_iter().collect();
    assert_eq!(map, expected);
}

#[test]
fn test_baseline_delta_covers_every_line() {
    let map = LineMap::tokenize(b"a\nb\nc\n");
    let delta = LineDelta::baseline(&map);

    assert_eq!(delta.len(), 3);
    assert_eq!(delta.get(2), Some(&LineEdit::Set("b".to_string())));
    assert_eq!(delta.deleted_count(), 0);

    let mut rebuilt = LineMap::new();
    rebuilt.apply(&delta);
    assert_eq!(rebuilt, map);
}

#[test]
fn test_sparse_delta_keys() {
    let delta: LineDelta = [(40, LineEdit::Set("x".into())), (3, LineEdit::Delete)]
        .into_iter()
        .collect();
    let lines: Vec<usize> = delta.iter().map(|(line, _)| line).collect();
    assert_eq!(lines, vec![3, 40]);
}

#[test]
fn test_tracked_file_serialization() {
    let tracked = TrackedFile::new("docs/notes.txt", ContentHash::new([0x0f; 32]));
    let value = serde_json::to_value(&tracked).unwrap();

    assert_eq!(value["file"], "docs/notes.txt");
    assert_eq!(value["hash"], "0f".repeat(32));

    let back: TrackedFile = serde_json::from_value(value).unwrap();
    assert_eq!(back, tracked);
}

#[test]
fn test_change_record_round_trip_keeps_deletes() {
    let mut payload = LineDelta::new();
    payload.set(1, "first");
    payload.delete(9);
    let record = ChangeRecord::new(Prefix::from("abcd1234"), "trim", payload);

    let json = serde_json::to_string(&record).unwrap();
    let back: ChangeRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(back, record);
    assert_eq!(back.payload.get(9), Some(&LineEdit::Delete));
}

#[test]
fn test_ids_display_as_plain_strings() {
    assert_eq!(Prefix::from("p8211").to_string(), "p8211");
    assert_eq!(ChangeId::from("Zx9").as_str(), "Zx9");
    assert_eq!(serde_json::to_string(&Prefix::from("k")).unwrap(), "\"k\"");
}

#[test]
fn test_default_config() {
    let config = RepoConfig::default();
    assert_eq!(config.prefix_length, 8);
    assert_eq!(config.change_id_length, 16);
    assert!(config.record_empty_changes);
    assert!(config.ignore.is_empty());
    assert!(config.validate().is_ok());
}
