use super::*;
use crate::capture::vector::{NodeKey, Rgba8, Style, VectorScene};
use crate::playback::store::FrameStore;
use kurbo::{BezPath, Rect, Shape as _};

fn square(x: f64) -> BezPath {
    Rect::new(x, 0.0, x + 10.0, 10.0).to_path(0.1)
}

fn scene() -> (VectorScene, NodeKey, NodeKey, NodeKey) {
    let mut s = VectorScene::new(100.0, 20.0);
    let root = s.root_key();
    let g = s.add_group(root).unwrap();
    let a = s
        .add_path(g, square(0.0), Style::filled(Rgba8::rgb(255, 0, 0)))
        .unwrap();
    let b = s
        .add_path(g, square(20.0), Style::filled(Rgba8::rgb(0, 0, 255)))
        .unwrap();
    let clip = Rect::new(0.0, 0.0, 50.0, 20.0);
    s.set_clip(a, Some(clip)).unwrap();
    (s, g, a, b)
}

fn unlimited() -> CaptureOpts {
    CaptureOpts {
        budget_bytes: u64::MAX,
    }
}

#[test]
fn base_document_wraps_every_element_in_its_identity() {
    let (s, g, a, b) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    assert_eq!(r.capture_base(&s).unwrap(), 4);

    let base = r.base_document().unwrap();
    assert!(base.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(base.contains(r#"viewBox="0 0 100 20""#));
    roxmltree::Document::parse(base).unwrap();
    for key in [g, a, b, s.root_key()] {
        let id = r.tracker().identity(key).unwrap();
        assert!(base.contains(&format!(r#"<g id="{id}">"#)), "{id}");
    }
}

#[test]
fn frames_hold_only_changed_elements_in_draw_order() {
    let (mut s, _, a, b) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();

    s.set_path(b, square(30.0)).unwrap();
    s.set_path(a, square(5.0)).unwrap();
    let step = r.capture_frame(&s, [b, a, b]).unwrap();
    assert_eq!(step, CaptureStep::Captured(FrameIndex(0)));

    let frame = &r.frames()[0];
    assert_eq!(frame.len(), 2);
    let id_a = r.tracker().identity(a).unwrap();
    let frag = frame.get(id_a).unwrap();
    assert!(frag.starts_with(&format!(r#"<g id="{id_a}">"#)));
    assert!(frag.ends_with("</g>"));
    // The clip was already emitted by the base capture.
    assert!(!frag.contains("<defs>"));
}

#[test]
fn empty_change_sets_are_unchanged_frames() {
    let (s, ..) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();
    assert_eq!(
        r.capture_frame(&s, std::iter::empty()).unwrap(),
        CaptureStep::Captured(FrameIndex(0))
    );
    let report = r.report();
    assert_eq!(report.frames_captured, 1);
    assert_eq!(report.fragment_bytes, 0);
    assert!(r.frames()[0].is_empty());
}

#[test]
fn frames_need_a_base_capture() {
    let (s, _, a, _) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    assert!(matches!(
        r.capture_frame(&s, [a]),
        Err(FlipbookError::Validation(_))
    ));
}

#[test]
fn unknown_elements_abort_the_session() {
    let (mut s, g, a, _) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();

    let late = s.add_path(g, square(60.0), Style::default()).unwrap();
    assert!(matches!(
        r.capture_frame(&s, [a, late]),
        Err(FlipbookError::UnrecognizedElement { .. })
    ));
    assert!(matches!(
        r.capture_frame(&s, [a]),
        Err(FlipbookError::Validation(_))
    ));
    assert!(r.finish().is_err());
}

#[test]
fn redrawing_a_parent_with_a_new_child_is_unrecognized() {
    let (mut s, g, ..) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();
    s.add_path(g, square(60.0), Style::default()).unwrap();
    assert!(matches!(
        r.capture_frame(&s, [g]),
        Err(FlipbookError::UnrecognizedElement { .. })
    ));
}

#[test]
fn budget_trip_drops_the_frame_and_everything_after() {
    let (mut s, _, a, _) = scene();
    let mut r = IncrementalRenderer::new(CaptureOpts { budget_bytes: 1 });
    r.capture_base(&s).unwrap();

    s.set_path(a, square(1.0)).unwrap();
    let CaptureStep::Stopped(exceeded) = r.capture_frame(&s, [a]).unwrap() else {
        panic!("expected the budget to stop capture");
    };
    assert_eq!(exceeded.budget_bytes, 1);
    assert_eq!(exceeded.frames_dropped_at, FrameIndex(0));
    assert!(exceeded.total_bytes >= 1);
    assert!(r.is_stopped());

    assert_eq!(
        r.capture_frame(&s, [a]).unwrap(),
        CaptureStep::Stopped(exceeded)
    );
    let (animation, report) = r.finish().unwrap();
    assert_eq!(report.frames_captured, 0);
    assert_eq!(report.budget_exceeded, Some(exceeded));
    assert!(animation.frames().is_empty());
}

#[test]
fn recapture_resets_the_session() {
    let (s, _, a, _) = scene();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();
    r.capture_frame(&s, [a]).unwrap();
    let before = r.tracker().identity(a).cloned().unwrap();

    r.capture_base(&s).unwrap();
    assert!(r.frames().is_empty());
    assert_ne!(r.tracker().identity(a), Some(&before));
    // Definitions are emitted again in the new base document.
    assert!(r.base_document().unwrap().contains("<clipPath"));
}

#[test]
fn hidden_elements_keep_their_identity_group() {
    let (mut s, g, ..) = scene();
    s.set_visible(g, false).unwrap();
    let mut r = IncrementalRenderer::new(unlimited());
    r.capture_base(&s).unwrap();
    let id = r.tracker().identity(g).unwrap();
    assert!(
        r.base_document()
            .unwrap()
            .contains(&format!(r#"<g id="{id}" display="none">"#))
    );
}

#[test]
fn capture_runs_a_whole_session() {
    let (mut s, _, a, b) = scene();
    let (animation, report) = capture(
        &mut s,
        4,
        |scene, k| {
            scene.set_path(a, square(k.0 as f64))?;
            let mut changed = vec![a];
            if k.0 % 2 == 1 {
                scene.set_style(b, Style::filled(Rgba8::rgb(0, 255, 0)))?;
                changed.push(b);
            }
            Ok(changed)
        },
        &unlimited(),
    )
    .unwrap();

    assert_eq!(report.elements, 4);
    assert_eq!(report.frames_captured, 4);
    assert_eq!(report.budget_exceeded, None);
    assert_eq!(animation.frame_count(), 4);
    assert_eq!(animation.frames()[1].len(), 2);

    let base = animation.base_document();
    assert_eq!(base.matches("<defs").count(), 1);
    assert!(base.contains(r#"<defs id="flipbook-defs"><clipPath"#));
    roxmltree::Document::parse(&animation.compose_frame(FrameIndex(3)).unwrap()).unwrap();
}

#[test]
fn capture_opts_follow_config() {
    let cfg = FlipbookConfig {
        storage_budget_bytes: 512,
        ..FlipbookConfig::default()
    };
    assert_eq!(CaptureOpts::from(&cfg).budget_bytes, 512);
    assert_eq!(
        CaptureOpts::default().budget_bytes,
        crate::foundation::config::DEFAULT_STORAGE_BUDGET_BYTES
    );
}
