//! Integration tests for outline import, editing and commit.
//!
//! Most tests start from a hand-linked outline:
//!
//! ```text
//! /Outlines ─▶ A ─▶ B
//!              ├─ A1
//!              └─ A2
//! ```

use pdf_mutate::{Document, Error, Object, ObjectRef, OutlineItem, OutlineOptions};

struct Sample {
    doc: Document,
    outlines: ObjectRef,
    a: ObjectRef,
    a1: ObjectRef,
    b: ObjectRef,
}

fn node(doc: &mut Document, title: &str) -> ObjectRef {
    doc.add_object(Object::dict(vec![("Title", Object::string(title))]))
        .reference()
}

fn set(doc: &mut Document, on: ObjectRef, key: &str, value: Object) {
    doc.get_dict_mut(on).unwrap().insert(key.to_string(), value);
}

fn sample() -> Sample {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut doc = Document::new();
    let outlines = doc
        .add_object(Object::dict(vec![("Type", Object::name("Outlines"))]))
        .reference();
    doc.catalog_mut()
        .unwrap()
        .insert("Outlines".to_string(), outlines.into());

    let a = node(&mut doc, "A");
    let a1 = node(&mut doc, "A1");
    let a2 = node(&mut doc, "A2");
    let b = node(&mut doc, "B");

    set(&mut doc, outlines, "First", a.into());
    set(&mut doc, outlines, "Last", b.into());
    set(&mut doc, outlines, "Count", Object::Integer(4));

    set(&mut doc, a, "Parent", outlines.into());
    set(&mut doc, a, "Next", b.into());
    set(&mut doc, a, "First", a1.into());
    set(&mut doc, a, "Last", a2.into());
    set(&mut doc, a, "Count", Object::Integer(2));

    set(&mut doc, a1, "Parent", a.into());
    set(&mut doc, a1, "Next", a2.into());
    set(&mut doc, a2, "Parent", a.into());
    set(&mut doc, a2, "Prev", a1.into());

    set(&mut doc, b, "Parent", outlines.into());
    set(&mut doc, b, "Prev", a.into());

    Sample {
        doc,
        outlines,
        a,
        a1,
        b,
    }
}

fn titles(items: &[OutlineItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

fn count_of(doc: &Document, r: ObjectRef) -> Option<i64> {
    doc.get_dict(r).unwrap().get("Count").and_then(Object::as_integer)
}

#[test]
fn test_import_linked_outline() {
    let s = sample();
    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();

    assert_eq!(titles(&outline.root), vec!["A", "B"]);
    assert_eq!(titles(&outline.root[0].children), vec!["A1", "A2"]);
    assert_eq!(outline.root[0].obj(), Some(s.a));
    assert_eq!(outline.root[0].children[0].obj(), Some(s.a1));
    assert!(!outline.root[0].is_closed);

    let walked: Vec<&str> = outline.walk().map(|i| i.title.as_str()).collect();
    assert_eq!(walked, vec!["A", "A1", "A2", "B"]);
}

#[test]
fn test_negative_count_means_closed() {
    let mut s = sample();
    set(&mut s.doc, s.a, "Count", Object::Integer(-2));
    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert!(outline.root[0].is_closed);
    assert!(!outline.root[1].is_closed);
}

#[test]
fn test_max_depth_zero_imports_top_level_only() {
    let s = sample();
    let outline = s
        .doc
        .load_outline(OutlineOptions::default().with_max_depth(0))
        .unwrap();

    assert_eq!(titles(&outline.root), vec!["A", "B"]);
    assert!(outline.root[0].children.is_empty());
    assert!(outline.root[0].has_unloaded_children());
    assert!(!outline.root[1].has_unloaded_children());
}

#[test]
fn test_depth_limited_node_keeps_children_on_commit() {
    let mut s = sample();
    s.doc
        .edit_outline(OutlineOptions::default().with_max_depth(0), |outline| {
            outline.root[0].title = "A renamed".to_string();
            Ok(())
        })
        .unwrap();

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A renamed", "B"]);
    assert_eq!(titles(&outline.root[0].children), vec!["A1", "A2"]);
    assert_eq!(count_of(&s.doc, s.a), Some(2));
    assert_eq!(count_of(&s.doc, s.outlines), Some(4));
}

#[test]
fn test_sibling_loop_lenient_and_strict() {
    let mut s = sample();
    set(&mut s.doc, s.b, "Next", s.a.into());

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B"]);

    let strict = s.doc.load_outline(OutlineOptions::default().with_strict(true));
    assert!(matches!(strict, Err(Error::StructuralError(_))));
}

#[test]
fn test_child_loop_to_ancestor() {
    let mut s = sample();
    set(&mut s.doc, s.a1, "Next", s.a.into());

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B"]);
    assert_eq!(titles(&outline.root[0].children), vec!["A1"]);

    let strict = s.doc.load_outline(OutlineOptions::default().with_strict(true));
    assert!(matches!(strict, Err(Error::StructuralError(_))));
}

#[test]
fn test_commit_repairs_loop() {
    let mut s = sample();
    set(&mut s.doc, s.b, "Next", s.a.into());

    s.doc
        .edit_outline(OutlineOptions::default(), |_| Ok(()))
        .unwrap();

    let outline = s
        .doc
        .load_outline(OutlineOptions::default().with_strict(true))
        .unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B"]);
    assert!(s.doc.get_dict(s.b).unwrap().get("Next").is_none());
}

#[test]
fn test_link_back_to_outlines_root() {
    let mut s = sample();
    set(&mut s.doc, s.a, "First", s.outlines.into());

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B"]);
    assert!(outline.root[0].children.is_empty());
    assert!(outline.walk().all(|item| item.obj() != Some(s.outlines)));

    let strict = s.doc.load_outline(OutlineOptions::default().with_strict(true));
    assert!(matches!(strict, Err(Error::StructuralError(_))));

    s.doc
        .edit_outline(OutlineOptions::default(), |_| Ok(()))
        .unwrap();

    let repaired = s
        .doc
        .load_outline(OutlineOptions::default().with_strict(true))
        .unwrap();
    assert_eq!(titles(&repaired.root), vec!["A", "B"]);
    assert!(s.doc.get_dict(s.a).unwrap().get("First").is_none());
    assert_eq!(
        s.doc.get_dict(s.outlines).unwrap().get("Type"),
        Some(&Object::name("Outlines"))
    );
    assert_eq!(count_of(&s.doc, s.outlines), Some(2));
}

#[test]
fn test_sibling_link_back_to_outlines_root() {
    let mut s = sample();
    set(&mut s.doc, s.b, "Next", s.outlines.into());

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B"]);

    let strict = s.doc.load_outline(OutlineOptions::default().with_strict(true));
    assert!(matches!(strict, Err(Error::StructuralError(_))));
}

#[test]
fn test_duplicate_item_written_as_copy() {
    let mut s = sample();
    let mut outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    let copy = outline.root[0].clone();
    outline.root.push(copy);
    s.doc.commit_outline(&mut outline).unwrap();

    assert_eq!(outline.root[0].obj(), Some(s.a));
    assert_ne!(outline.root[2].obj(), Some(s.a));

    let reloaded = s
        .doc
        .load_outline(OutlineOptions::default().with_strict(true))
        .unwrap();
    assert_eq!(titles(&reloaded.root), vec!["A", "B", "A"]);
    assert_eq!(titles(&reloaded.root[2].children), vec!["A1", "A2"]);
    assert_eq!(count_of(&s.doc, s.outlines), Some(7));
}

#[test]
fn test_duplicate_item_strict_writes_nothing() {
    let mut s = sample();
    let options = OutlineOptions::default().with_strict(true);
    let mut outline = s.doc.load_outline(options).unwrap();
    let copy = outline.root[1].clone();
    outline.root.push(copy);

    let result = s.doc.commit_outline(&mut outline);
    assert!(matches!(result, Err(Error::StructuralError(_))));

    let unchanged = s.doc.load_outline(options).unwrap();
    assert_eq!(titles(&unchanged.root), vec!["A", "B"]);
    assert_eq!(count_of(&s.doc, s.outlines), Some(4));
}

#[test]
fn test_counts_for_new_tree() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = Document::new();
    let page = doc.add_blank_page((595.0, 842.0)).unwrap().reference();

    let mut outline = doc.load_outline(OutlineOptions::default()).unwrap();
    let mut a = OutlineItem::new("A").with_page(page);
    a.children.push(OutlineItem::new("a1"));
    a.children.push(OutlineItem::new("a2"));
    let mut b = OutlineItem::new("B").with_closed(true);
    b.children.push(OutlineItem::new("b1"));
    outline.root.push(a);
    outline.root.push(b);

    doc.commit_outline(&mut outline).unwrap();

    assert!(outline.walk().all(|item| item.obj().is_some()));
    let a_ref = outline.root[0].obj().unwrap();
    let b_ref = outline.root[1].obj().unwrap();
    assert_eq!(count_of(&doc, a_ref), Some(2));
    assert_eq!(count_of(&doc, b_ref), Some(-1));

    let outlines_ref = doc
        .catalog()
        .unwrap()
        .get("Outlines")
        .and_then(Object::as_reference)
        .unwrap();
    let outlines = doc.get_dict(outlines_ref).unwrap();
    assert_eq!(outlines.get("Type"), Some(&Object::name("Outlines")));
    assert_eq!(outlines.get("Count"), Some(&Object::Integer(4)));
    assert_eq!(outlines.get("First"), Some(&Object::Reference(a_ref)));
    assert_eq!(outlines.get("Last"), Some(&Object::Reference(b_ref)));

    let a1_ref = outline.root[0].children[0].obj().unwrap();
    let a2_ref = outline.root[0].children[1].obj().unwrap();
    let a1 = doc.get_dict(a1_ref).unwrap();
    assert_eq!(a1.get("Parent"), Some(&Object::Reference(a_ref)));
    assert_eq!(a1.get("Next"), Some(&Object::Reference(a2_ref)));
    assert!(a1.get("Prev").is_none());
    assert!(a1.get("Count").is_none());
}

#[test]
fn test_remove_item() {
    let mut s = sample();
    s.doc
        .edit_outline(OutlineOptions::default(), |outline| {
            outline.root.pop();
            outline.root[0].children.remove(0);
            Ok(())
        })
        .unwrap();

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A"]);
    assert_eq!(titles(&outline.root[0].children), vec!["A2"]);

    let outlines = s.doc.get_dict(s.outlines).unwrap();
    assert_eq!(outlines.get("Last"), Some(&Object::Reference(s.a)));
    assert_eq!(outlines.get("Count"), Some(&Object::Integer(2)));
    assert!(s.doc.get_dict(s.a).unwrap().get("Next").is_none());
}

#[test]
fn test_clear_outline() {
    let mut s = sample();
    s.doc
        .edit_outline(OutlineOptions::default(), |outline| {
            outline.root.clear();
            Ok(())
        })
        .unwrap();

    let outlines = s.doc.get_dict(s.outlines).unwrap();
    assert!(outlines.get("First").is_none());
    assert!(outlines.get("Last").is_none());
    assert_eq!(outlines.get("Count"), Some(&Object::Integer(0)));
    assert!(s
        .doc
        .load_outline(OutlineOptions::default())
        .unwrap()
        .root
        .is_empty());
}

#[test]
fn test_guard_commits_on_drop() {
    let mut s = sample();
    {
        let mut guard = s.doc.open_outline(OutlineOptions::default()).unwrap();
        guard.root.push(OutlineItem::new("Appendix"));
    }
    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["A", "B", "Appendix"]);
}

#[test]
fn test_guard_explicit_commit() {
    let mut s = sample();
    let mut guard = s.doc.open_outline(OutlineOptions::default()).unwrap();
    guard.root.swap(0, 1);
    guard.commit().unwrap();

    let outline = s.doc.load_outline(OutlineOptions::default()).unwrap();
    assert_eq!(titles(&outline.root), vec!["B", "A"]);
    assert_eq!(s.doc.get_dict(s.b).unwrap().get("Next"), Some(&Object::Reference(s.a)));
    assert!(s.doc.get_dict(s.b).unwrap().get("Prev").is_none());
}

#[test]
fn test_edit_outline_returns_closure_value() {
    let mut s = sample();
    let count = s
        .doc
        .edit_outline(OutlineOptions::default(), |outline| Ok(outline.walk().count()))
        .unwrap();
    assert_eq!(count, 4);
}
