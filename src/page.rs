//! Page tree helpers.
//!
//! Pages are plain dictionaries in the document; these helpers locate them
//! through the catalog's `/Pages` tree, read and filter their content
//! streams, and manage their page boxes.

use crate::content::TokenPipeline;
use crate::document::{Document, ObjectHandle};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use bytes::{Bytes, BytesMut};
use std::collections::HashSet;

/// A rectangle as `[llx, lly, urx, ury]`.
pub type PageBox = [f64; 4];

/// US Letter, used when a page tree carries no `/MediaBox` at all.
pub const LETTER: PageBox = [0.0, 0.0, 612.0, 792.0];

/// Smallest and largest page dimension accepted by [`Document::add_blank_page`].
const PAGE_DIMENSION_RANGE: std::ops::RangeInclusive<f64> = 3.0..=14400.0;

/// Validate that `obj` is an array of four numbers and return it as a box.
pub fn check_is_box(obj: &Object) -> Result<PageBox> {
    let items = obj
        .as_array()
        .ok_or_else(|| Error::wrong_type("rectangle", obj.type_name()))?;
    if items.len() != 4 {
        return Err(Error::wrong_type(
            "rectangle",
            &format!("Array of {} elements", items.len()),
        ));
    }
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = item
            .as_number()
            .ok_or_else(|| Error::wrong_type("rectangle", item.type_name()))?;
    }
    Ok(rect)
}

fn box_object(rect: PageBox) -> Object {
    Object::Array(rect.iter().map(|v| number_object(*v)).collect())
}

/// Whole numbers are written as integers.
fn number_object(v: f64) -> Object {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Object::Integer(v as i64)
    } else {
        Object::Real(v)
    }
}

impl Document {
    /// Reference to the root `/Pages` node.
    pub fn pages_root(&self) -> Result<ObjectRef> {
        let catalog = self.catalog()?;
        catalog
            .get("Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::StructuralError("catalog has no /Pages reference".to_string()))
    }

    /// All page objects in document order.
    ///
    /// Intermediate `/Pages` nodes are flattened. A node reached a second
    /// time is skipped, so a page tree with a loop still terminates.
    pub fn pages(&self) -> Result<Vec<ObjectRef>> {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.pages_root()?];

        while let Some(node_ref) = stack.pop() {
            if !visited.insert(node_ref) {
                log::warn!("Page tree node {} reached twice, skipping", node_ref);
                continue;
            }
            let node = self.get_dict(node_ref)?;
            match node.get("Type").and_then(Object::as_name) {
                Some("Pages") => {
                    if let Some(kids) = node.get("Kids").and_then(Object::as_array) {
                        // Reverse so the first kid is popped first
                        stack.extend(kids.iter().rev().filter_map(Object::as_reference));
                    }
                },
                _ => pages.push(node_ref),
            }
        }

        Ok(pages)
    }

    /// Number of pages.
    pub fn page_count(&self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    /// Append an empty page of `size` (width, height) to the end of the document.
    ///
    /// The page gets a `/MediaBox`, an empty content stream and empty
    /// `/Resources`. Each dimension must lie between 3 and 14400 units.
    pub fn add_blank_page(&mut self, size: (f64, f64)) -> Result<ObjectHandle> {
        let (width, height) = size;
        if !PAGE_DIMENSION_RANGE.contains(&width) || !PAGE_DIMENSION_RANGE.contains(&height) {
            return Err(Error::InvalidArgument(format!(
                "page size must be between 3 and 14400 units, got {} x {}",
                width, height
            )));
        }

        let pages_ref = self.pages_root()?;
        self.get_dict(pages_ref)?;

        let contents = self.add_object(Object::stream(Bytes::new()));
        let page = self.add_object(Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(pages_ref)),
            ("MediaBox", box_object([0.0, 0.0, width, height])),
            ("Contents", Object::Reference(contents.reference())),
            ("Resources", Object::Dictionary(Default::default())),
        ]));

        let pages = self.get_dict_mut(pages_ref)?;
        let count = pages.get("Count").and_then(Object::as_integer).unwrap_or(0);
        match pages.get_mut("Kids") {
            Some(Object::Array(kids)) => kids.push(Object::Reference(page.reference())),
            _ => {
                pages.insert(
                    "Kids".to_string(),
                    Object::Array(vec![Object::Reference(page.reference())]),
                );
            },
        }
        pages.insert("Count".to_string(), Object::Integer(count + 1));

        log::debug!("Added blank page {} ({} x {})", page.reference(), width, height);
        Ok(page)
    }

    /// The content streams of `page`, in drawing order.
    ///
    /// `/Contents` may be a stream reference, an array of stream references,
    /// or a reference to such an array. A page without `/Contents` has none.
    pub fn page_content_streams(&self, page: ObjectRef) -> Result<Vec<ObjectRef>> {
        let page_dict = self.get_dict(page)?;
        let Some(contents) = page_dict.get("Contents") else {
            return Ok(Vec::new());
        };

        let stream_ref = |obj: &Object| -> Result<ObjectRef> {
            let r = obj
                .as_reference()
                .ok_or_else(|| Error::wrong_type("Reference to Stream", obj.type_name()))?;
            match self.get(r)? {
                Object::Stream { .. } => Ok(r),
                other => Err(Error::wrong_type("Stream", other.type_name())),
            }
        };

        match self.resolve(contents)? {
            Object::Stream { .. } => Ok(vec![stream_ref(contents)?]),
            Object::Array(items) => items.iter().map(stream_ref).collect(),
            other => Err(Error::wrong_type("Stream or Array", other.type_name())),
        }
    }

    /// All content streams of `page` joined with a newline.
    pub fn page_contents(&self, page: ObjectRef) -> Result<Bytes> {
        let streams = self.page_content_streams(page)?;
        if let [single] = streams.as_slice() {
            return self.read_stream_bytes(*single);
        }
        let mut buf = BytesMut::new();
        for (i, stream) in streams.iter().enumerate() {
            if i > 0 {
                buf.extend_from_slice(b"\n");
            }
            buf.extend_from_slice(&self.read_stream_bytes(*stream)?);
        }
        Ok(buf.freeze())
    }

    /// Rewrite the content of `page` through `pipeline` (commit mode).
    ///
    /// The result is stored in the page's first content stream and
    /// `/Contents` is pointed at that stream alone. A page without content
    /// gets a new stream only if the pipeline produced output.
    pub fn add_content_token_filter(
        &mut self,
        page: ObjectRef,
        pipeline: &mut TokenPipeline<'_>,
    ) -> Result<()> {
        let streams = self.page_content_streams(page)?;
        let output = pipeline.process(self.page_contents(page)?)?;

        let target = match streams.first() {
            Some(first) => *first,
            None if output.is_empty() => return Ok(()),
            None => self.add_object(Object::stream(Bytes::new())).reference(),
        };
        self.write_stream_bytes(target, output)?;
        self.get_dict_mut(page)?
            .insert("Contents".to_string(), Object::Reference(target));

        if streams.len() > 1 {
            log::debug!(
                "Merged {} content streams of page {} into {}",
                streams.len(),
                page,
                target
            );
        }
        Ok(())
    }

    /// Content of `page` after running it through `pipeline` (preview mode).
    pub fn get_filtered_contents(
        &self,
        page: ObjectRef,
        pipeline: &mut TokenPipeline<'_>,
    ) -> Result<Vec<u8>> {
        pipeline.process(self.page_contents(page)?)
    }

    /// Look up a page attribute, following `/Parent` links for inheritable keys.
    fn inherited_attribute(&self, page: ObjectRef, key: &str) -> Result<Option<&Object>> {
        let mut visited = HashSet::new();
        let mut current = page;
        loop {
            if !visited.insert(current) {
                return Err(Error::StructuralError(format!(
                    "/Parent chain of page {} loops at {}",
                    page, current
                )));
            }
            let dict = self.get_dict(current)?;
            if let Some(value) = dict.get(key) {
                return Ok(Some(self.resolve(value)?));
            }
            match dict.get("Parent").and_then(Object::as_reference) {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    fn own_box(&self, page: ObjectRef, key: &str) -> Result<Option<PageBox>> {
        match self.get_dict(page)?.get(key) {
            Some(value) => Ok(Some(check_is_box(self.resolve(value)?)?)),
            None => Ok(None),
        }
    }

    fn set_box(&mut self, page: ObjectRef, key: &str, rect: PageBox) -> Result<()> {
        self.get_dict_mut(page)?
            .insert(key.to_string(), box_object(rect));
        Ok(())
    }

    /// The page's `/MediaBox`, inherited from ancestors if the page has none.
    pub fn mediabox(&self, page: ObjectRef) -> Result<PageBox> {
        match self.inherited_attribute(page, "MediaBox")? {
            Some(value) => check_is_box(value),
            None => Ok(LETTER),
        }
    }

    /// Set the page's `/MediaBox`.
    pub fn set_mediabox(&mut self, page: ObjectRef, rect: PageBox) -> Result<()> {
        self.set_box(page, "MediaBox", rect)
    }

    /// The page's `/CropBox`, or its media box if none is set.
    pub fn cropbox(&self, page: ObjectRef) -> Result<PageBox> {
        match self.inherited_attribute(page, "CropBox")? {
            Some(value) => check_is_box(value),
            None => self.mediabox(page),
        }
    }

    /// Set the page's `/CropBox`.
    pub fn set_cropbox(&mut self, page: ObjectRef, rect: PageBox) -> Result<()> {
        self.set_box(page, "CropBox", rect)
    }

    /// The page's `/TrimBox`, falling back to its crop box.
    pub fn trimbox(&self, page: ObjectRef) -> Result<PageBox> {
        match self.own_box(page, "TrimBox")? {
            Some(rect) => Ok(rect),
            None => self.cropbox(page),
        }
    }

    /// Set the page's `/TrimBox`.
    pub fn set_trimbox(&mut self, page: ObjectRef, rect: PageBox) -> Result<()> {
        self.set_box(page, "TrimBox", rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FilterOutcome, FnFilter, TokenType};

    fn page_with_contents(doc: &mut Document, parts: &[&'static [u8]]) -> ObjectRef {
        let page = doc.add_blank_page((612.0, 792.0)).unwrap().reference();
        let refs: Vec<Object> = parts
            .iter()
            .map(|p| Object::Reference(doc.add_object(Object::stream(*p)).reference()))
            .collect();
        doc.get_dict_mut(page)
            .unwrap()
            .insert("Contents".to_string(), Object::Array(refs));
        page
    }

    #[test]
    fn test_add_blank_page() {
        let mut doc = Document::new();
        let page = doc.add_blank_page((200.0, 300.0)).unwrap();
        assert_eq!(doc.pages().unwrap(), vec![page.reference()]);
        assert_eq!(doc.mediabox(page.reference()).unwrap(), [0.0, 0.0, 200.0, 300.0]);
        let pages = doc.get_dict(doc.pages_root().unwrap()).unwrap();
        assert_eq!(pages.get("Count").unwrap().as_integer(), Some(1));
        assert_eq!(doc.page_contents(page.reference()).unwrap().as_ref(), b"");
    }

    #[test]
    fn test_add_blank_page_rejects_size() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.add_blank_page((2.0, 100.0)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            doc.add_blank_page((100.0, 20000.0)),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(doc.page_count().unwrap(), 0);
    }

    #[test]
    fn test_pages_flattens_nested_tree() {
        let mut doc = Document::new();
        let root = doc.pages_root().unwrap();
        let p1 = doc.add_object(Object::dict(vec![("Type", Object::name("Page"))]));
        let p2 = doc.add_object(Object::dict(vec![("Type", Object::name("Page"))]));
        let inner = doc.add_object(Object::dict(vec![
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(vec![p1.reference().into()])),
        ]));
        doc.get_dict_mut(root).unwrap().insert(
            "Kids".to_string(),
            Object::Array(vec![inner.reference().into(), p2.reference().into()]),
        );
        assert_eq!(doc.pages().unwrap(), vec![p1.reference(), p2.reference()]);
    }

    #[test]
    fn test_pages_survives_loop() {
        let mut doc = Document::new();
        let root = doc.pages_root().unwrap();
        doc.get_dict_mut(root)
            .unwrap()
            .insert("Kids".to_string(), Object::Array(vec![root.into()]));
        assert!(doc.pages().unwrap().is_empty());
    }

    #[test]
    fn test_array_contents_joined() {
        let mut doc = Document::new();
        let page = page_with_contents(&mut doc, &[b"q", b"Q"]);
        assert_eq!(doc.page_content_streams(page).unwrap().len(), 2);
        assert_eq!(doc.page_contents(page).unwrap().as_ref(), b"q\nQ");
    }

    #[test]
    fn test_commit_merges_streams() {
        let mut doc = Document::new();
        let page = page_with_contents(&mut doc, &[b"1 0 0 RG", b"0 0 m"]);
        let first = doc.page_content_streams(page).unwrap()[0];
        let mut no_space = FnFilter(|t: &crate::content::Token| {
            if t.token_type() == TokenType::Space {
                FilterOutcome::Drop
            } else {
                t.clone().into()
            }
        });
        let mut pipeline = TokenPipeline::single(&mut no_space);
        doc.add_content_token_filter(page, &mut pipeline).unwrap();

        assert_eq!(doc.page_content_streams(page).unwrap(), vec![first]);
        assert_eq!(doc.page_contents(page).unwrap().as_ref(), b"100RG00m");
    }

    #[test]
    fn test_preview_leaves_page() {
        let mut doc = Document::new();
        let page = page_with_contents(&mut doc, &[b"q", b"Q"]);
        let mut pipeline = TokenPipeline::new();
        let out = doc.get_filtered_contents(page, &mut pipeline).unwrap();
        assert_eq!(out, b"q\nQ");
        assert_eq!(doc.page_content_streams(page).unwrap().len(), 2);
    }

    #[test]
    fn test_page_without_contents() {
        let mut doc = Document::new();
        let page = doc
            .add_object(Object::dict(vec![("Type", Object::name("Page"))]))
            .reference();
        let mut pipeline = TokenPipeline::new();
        doc.add_content_token_filter(page, &mut pipeline).unwrap();
        assert!(!doc.get_dict(page).unwrap().contains_key("Contents"));
    }

    #[test]
    fn test_mediabox_inherited() {
        let mut doc = Document::new();
        let root = doc.pages_root().unwrap();
        doc.set_mediabox(root, [0.0, 0.0, 100.0, 50.5]).unwrap();
        let page = doc
            .add_object(Object::dict(vec![
                ("Type", Object::name("Page")),
                ("Parent", root.into()),
            ]))
            .reference();
        assert_eq!(doc.mediabox(page).unwrap(), [0.0, 0.0, 100.0, 50.5]);
        assert_eq!(doc.cropbox(page).unwrap(), [0.0, 0.0, 100.0, 50.5]);
        assert_eq!(doc.trimbox(page).unwrap(), [0.0, 0.0, 100.0, 50.5]);
    }

    #[test]
    fn test_box_fallbacks() {
        let mut doc = Document::new();
        let page = doc.add_blank_page((612.0, 792.0)).unwrap().reference();
        doc.set_cropbox(page, [10.0, 10.0, 600.0, 780.0]).unwrap();
        assert_eq!(doc.trimbox(page).unwrap(), [10.0, 10.0, 600.0, 780.0]);
        doc.set_trimbox(page, [20.0, 20.0, 590.0, 770.0]).unwrap();
        assert_eq!(doc.trimbox(page).unwrap(), [20.0, 20.0, 590.0, 770.0]);
        assert_eq!(doc.mediabox(page).unwrap(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn test_check_is_box() {
        let ok = Object::Array(vec![
            Object::Integer(0),
            Object::Real(0.5),
            Object::Integer(10),
            Object::Integer(10),
        ]);
        assert_eq!(check_is_box(&ok).unwrap(), [0.0, 0.5, 10.0, 10.0]);
        assert!(check_is_box(&Object::Array(vec![Object::Integer(0)])).is_err());
        assert!(check_is_box(&Object::Array(vec![Object::name("A"); 4])).is_err());
        assert!(check_is_box(&Object::Integer(1)).is_err());
    }

    #[test]
    fn test_invalid_mediabox_reported() {
        let mut doc = Document::new();
        let page = doc.add_blank_page((612.0, 792.0)).unwrap().reference();
        doc.get_dict_mut(page)
            .unwrap()
            .insert("MediaBox".to_string(), Object::name("Letter"));
        assert!(matches!(doc.mediabox(page), Err(Error::InvalidObjectType { .. })));
    }
}
