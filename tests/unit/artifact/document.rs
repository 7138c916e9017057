use super::*;
use crate::capture::animation::FrameFragments;
use crate::capture::identity::ElementId;
use crate::codec::diff::DiffOpts;
use crate::foundation::core::LoopMode;
use crate::playback::engine::PlaybackState;

fn diff_artifact() -> Artifact {
    let opts = DiffOpts {
        parallel: false,
        ..DiffOpts::default()
    };
    let store = CheckpointStore::from_frames(&["AAAA", "AAAB", "ABAB"], &opts).unwrap();
    Artifact::diff(
        store,
        PlaybackConfig {
            interval_ms: 50.0,
            default_mode: LoopMode::Reflect,
        },
    )
}

fn scene_artifact() -> Artifact {
    let base = r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="A"><rect width="1"/></g></svg>"#;
    let frames = (2..5)
        .map(|w| {
            std::iter::once((
                ElementId::from_raw("A"),
                format!(r#"<g id="A"><rect width="{w}"/></g>"#),
            ))
            .collect::<FrameFragments>()
        })
        .collect();
    Artifact::scene(
        SceneAnimation::new(base.to_string(), frames),
        PlaybackConfig::default(),
    )
}

#[test]
fn json_is_tagged_by_kind() {
    let json = diff_artifact().to_json().unwrap();
    assert!(json.contains(r#""kind": "diff""#));
    assert!(json.contains(r#""default_mode": "reflect""#));

    let json = scene_artifact().to_json().unwrap();
    assert!(json.contains(r#""kind": "scene""#));
    assert!(json.contains(r#""base_document""#));
}

#[test]
fn json_round_trips_both_encodings() {
    for artifact in [diff_artifact(), scene_artifact()] {
        let back = Artifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(back, artifact);
        assert_eq!(back.kind(), artifact.kind());
    }
}

#[test]
fn reconstructs_through_either_store() {
    let diff = diff_artifact();
    assert_eq!(diff.frame_count(), 3);
    assert_eq!(diff.reconstruct(FrameIndex(2)).unwrap(), "ABAB");

    let scene = scene_artifact();
    assert_eq!(scene.frame_count(), 3);
    assert!(
        scene
            .reconstruct(FrameIndex(1))
            .unwrap()
            .contains(r#"<rect width="3"/>"#)
    );
}

#[test]
fn engines_start_with_the_artifact_settings() {
    let mut engine = diff_artifact().into_engine().unwrap();
    assert_eq!(engine.loop_mode(), LoopMode::Reflect);
    assert_eq!(engine.interval_ms(), 50.0);
    assert_eq!(engine.current_frame(), "AAAA");

    engine.play();
    assert_eq!(engine.state(), PlaybackState::PlayingForward);
    let tick = std::time::Duration::from_millis(100);
    engine.advance(tick).unwrap();
    assert_eq!(engine.current_frame(), "ABAB");

    let scene = scene_artifact().into_engine().unwrap();
    assert!(scene.current_frame().contains(r#"<rect width="2"/>"#));
}

#[test]
fn validation_runs_on_load() {
    let mut json: serde_json::Value =
        serde_json::from_str(&diff_artifact().to_json().unwrap()).unwrap();
    json["playback"]["interval_ms"] = serde_json::json!(-1.0);
    assert!(matches!(
        Artifact::from_json(&json.to_string()),
        Err(FlipbookError::Validation(_))
    ));

    assert!(matches!(
        Artifact::from_json(r#"{"kind":"video"}"#),
        Err(FlipbookError::Serde(_))
    ));
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("flipbook_artifact_{}", std::process::id()));
    let path = dir.join("nested").join("a.json");
    let artifact = scene_artifact();
    artifact.write_to(&path).unwrap();
    assert_eq!(Artifact::read_from(&path).unwrap(), artifact);
    assert!(Artifact::read_from(&dir.join("missing.json")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
