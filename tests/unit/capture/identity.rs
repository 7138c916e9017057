use super::*;
use crate::capture::scene::SvgWriter;
use crate::capture::vector::{NodeKey, Style, VectorScene};
use crate::foundation::error::FlipbookResult;
use kurbo::{BezPath, Point, Rect, Shape as _};
use std::collections::HashSet;

fn square(x: f64) -> BezPath {
    Rect::new(x, 0.0, x + 10.0, 10.0).to_path(0.1)
}

fn scene() -> (VectorScene, [NodeKey; 5]) {
    let mut s = VectorScene::new(100.0, 50.0);
    let root = s.root_key();
    let g = s.add_group(root).unwrap();
    let a = s.add_path(g, square(0.0), Style::default()).unwrap();
    let b = s.add_path(g, square(20.0), Style::default()).unwrap();
    let t = s
        .add_text(root, Point::new(0.0, 40.0), "hi", 12.0, Style::default())
        .unwrap();
    (s, [root, g, a, b, t])
}

#[test]
fn mint_prefixes_the_kind() {
    let id = ElementId::mint("Path");
    assert!(id.as_str().starts_with("Path_"));
    assert_eq!(id.as_str().len(), "Path_".len() + 32);
    assert!(ElementId::mint("a b<c>").as_str().starts_with("abc_"));
    assert!(ElementId::mint("<>").as_str().starts_with("Element_"));
    assert_ne!(ElementId::mint("Path"), ElementId::mint("Path"));
}

#[test]
fn children_are_tagged_before_parents_in_draw_order() {
    let (s, [root, g, a, b, t]) = scene();
    let mut tracker = IdentityTracker::new();
    assert_eq!(tracker.assign_all(&s), 5);

    let order: Vec<NodeKey> = tracker.iter().map(|(k, _)| k).collect();
    assert_eq!(order, vec![a, b, g, t, root]);
    assert_eq!(tracker.rank(a), Some(0));
    assert_eq!(tracker.rank(root), Some(4));
    assert!(tracker.identity(g).unwrap().as_str().starts_with("Group_"));
    assert!(tracker.identity(t).unwrap().as_str().starts_with("Text_"));
}

#[test]
fn identities_are_stable_within_a_session_and_fresh_across_sessions() {
    let (s, [_, _, a, _, _]) = scene();
    let mut tracker = IdentityTracker::new();
    tracker.assign_all(&s);
    let first = tracker.identity(a).cloned().unwrap();
    assert_eq!(tracker.identity(a), Some(&first));

    tracker.assign_all(&s);
    let second = tracker.identity(a).cloned().unwrap();
    assert_ne!(first, second);

    let distinct: HashSet<&ElementId> = tracker.iter().map(|(_, id)| id).collect();
    assert_eq!(distinct.len(), tracker.len());
}

#[test]
fn elements_added_later_are_unknown() {
    let (mut s, [root, ..]) = scene();
    let mut tracker = IdentityTracker::new();
    tracker.assign_all(&s);
    let late = s.add_group(root).unwrap();
    assert!(!tracker.contains(late));
    assert_eq!(tracker.identity(late), None);
}

struct Looped {
    children: Vec<Vec<u8>>,
}

impl SceneGraph for Looped {
    type Key = u8;

    fn root(&self) -> u8 {
        0
    }

    fn children(&self, key: u8) -> &[u8] {
        self.children
            .get(key as usize)
            .map_or(&[][..], Vec::as_slice)
    }

    fn kind_name(&self, _key: u8) -> &str {
        "Node"
    }

    fn viewport(&self) -> (f64, f64) {
        (1.0, 1.0)
    }

    fn write_element(&self, _key: u8, _out: &mut SvgWriter<'_>) -> FlipbookResult<()> {
        Ok(())
    }
}

#[test]
fn cycles_and_shared_children_are_tagged_once() {
    let scene = Looped {
        children: vec![vec![1, 2], vec![0, 2], vec![]],
    };
    let mut tracker = IdentityTracker::new();
    assert_eq!(tracker.assign_all(&scene), 3);
    let order: Vec<u8> = tracker.iter().map(|(k, _)| k).collect();
    assert_eq!(order, vec![2, 1, 0]);
}
