//! Integration tests for emplace.
//!
//! A page is rebuilt from scratch and emplaced over the original so that
//! everything pointing at the original page keeps working.

use pdf_mutate::{Document, Error, Object, OutlineItem, OutlineOptions};

#[test]
fn test_replace_page_keeps_identity_and_links() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut doc = Document::new();
    let page = doc.add_blank_page((612.0, 792.0)).unwrap();
    let pages_ref = doc.pages_root().unwrap();

    doc.edit_outline(OutlineOptions::default(), |outline| {
        outline
            .root
            .push(OutlineItem::new("Cover").with_page(page.reference()));
        Ok(())
    })
    .unwrap();

    let contents = doc.add_object(Object::stream(&b"0 0 1 rg 0 0 100 100 re f"[..]));
    let rebuilt = doc.add_object(Object::dict(vec![
        ("Type", Object::name("Page")),
        ("Parent", Object::Reference(pages_ref)),
        ("MediaBox", Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(100),
            Object::Integer(100),
        ])),
        ("Contents", Object::Reference(contents.reference())),
    ]));

    doc.emplace(&page, &rebuilt).unwrap();

    // Same identity, new content
    assert_eq!(doc.pages().unwrap(), vec![page.reference()]);
    assert_eq!(doc.mediabox(page.reference()).unwrap(), [0.0, 0.0, 100.0, 100.0]);
    assert!(doc.get_dict(page.reference()).unwrap().get("Resources").is_none());
    assert_eq!(
        doc.page_contents(page.reference()).unwrap().as_ref(),
        b"0 0 1 rg 0 0 100 100 re f"
    );

    // The outline destination still lands on the page
    let outline = doc.load_outline(OutlineOptions::default()).unwrap();
    let dest = outline.root[0].destination.as_ref().unwrap();
    assert_eq!(
        dest.as_array().unwrap()[0],
        Object::Reference(page.reference())
    );
    assert_eq!(dest.as_array().unwrap()[1], Object::name("Fit"));
}

#[test]
fn test_shared_children_are_not_copied() {
    let mut doc = Document::new();
    let resources = doc.add_object(Object::dict(vec![("ProcSet", Object::Array(vec![]))]));
    let a = doc.add_object(Object::dict(vec![]));
    let b = doc.add_object(Object::dict(vec![(
        "Resources",
        Object::Reference(resources.reference()),
    )]));
    let objects_before = doc.object_count();

    doc.emplace(&a, &b).unwrap();

    assert_eq!(doc.object_count(), objects_before);
    assert_eq!(
        doc.get_dict(a.reference()).unwrap().get("Resources"),
        Some(&Object::Reference(resources.reference()))
    );
}

#[test]
fn test_cross_document_emplace_rejected() {
    let mut doc1 = Document::new();
    let mut doc2 = Document::new();
    let a = doc1.add_object(Object::dict(vec![("K", Object::Integer(1))]));
    let b = doc2.add_object(Object::dict(vec![("K", Object::Integer(2))]));

    let result = doc1.emplace(&a, &b);
    assert!(matches!(
        result,
        Err(Error::OwnershipMismatch { destination, source_ref })
            if destination == a.reference() && source_ref == b.reference()
    ));
    assert_eq!(
        doc1.get_dict(a.reference()).unwrap().get("K"),
        Some(&Object::Integer(1))
    );

    // A handle from the other document is rejected even as destination
    assert!(matches!(doc1.emplace(&b, &a), Err(Error::OwnershipMismatch { .. })));
    assert_eq!(
        doc2.get_dict(b.reference()).unwrap().get("K"),
        Some(&Object::Integer(2))
    );
}
