//! Document outline (bookmarks) editing.
//!
//! The outline is stored in the file as a doubly linked tree: every item
//! points at its `/Parent`, its siblings (`/Prev`, `/Next`) and its first and
//! last child (`/First`, `/Last`), and carries a `/Count` of visible
//! descendants. Editing that structure in place is error prone, so it is
//! imported into an owned tree of [`OutlineItem`]s, edited as plain vectors,
//! and written back with every link recomputed.
//!
//! ```text
//!  /Outlines ──First──▶ item A ──Next──▶ item B
//!                         │  ◀──Prev──
//!                       First
//!                         ▼
//!                       item A.1
//! ```
//!
//! Files in the wild contain loops and shared nodes. Import detects both
//! with a per-object visit state and, depending on [`OutlineOptions::strict`],
//! either fails or drops the rest of the affected sibling chain.
//!
//! # Example
//!
//! ```
//! use pdf_mutate::{Document, OutlineItem, OutlineOptions};
//!
//! let mut doc = Document::new();
//! let page = doc.add_blank_page((612.0, 792.0))?.reference();
//!
//! doc.edit_outline(OutlineOptions::default(), |outline| {
//!     let mut chapter = OutlineItem::new("Chapter 1").with_page(page);
//!     chapter.children.push(OutlineItem::new("Section 1.1").with_page(page));
//!     outline.root.push(chapter);
//!     Ok(())
//! })?;
//!
//! let outline = doc.load_outline(OutlineOptions::default())?;
//! assert_eq!(outline.root[0].children[0].title, "Section 1.1");
//! # Ok::<(), pdf_mutate::Error>(())
//! ```

use crate::config::OutlineOptions;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{decode_text_string, encode_text_string, Dictionary, Object, ObjectRef};
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

/// A single outline item (bookmark) in the document hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    /// The title of this bookmark
    pub title: String,

    /// Explicit or named destination (`/Dest`)
    pub destination: Option<Object>,

    /// Action performed when the item is activated (`/A`)
    pub action: Option<Object>,

    /// Whether the item's children are hidden (negative `/Count`)
    pub is_closed: bool,

    /// Child bookmarks under this item
    pub children: Vec<OutlineItem>,

    obj: Option<ObjectRef>,
    depth_limited: bool,
}

impl OutlineItem {
    /// Create an item with a title and no destination.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination: None,
            action: None,
            is_closed: false,
            children: Vec::new(),
            obj: None,
            depth_limited: false,
        }
    }

    /// Point the item at `page`, fitting the whole page in the window.
    pub fn with_page(mut self, page: ObjectRef) -> Self {
        self.destination = Some(Object::Array(vec![
            Object::Reference(page),
            Object::name("Fit"),
        ]));
        self
    }

    /// Set an explicit destination array or a named destination.
    pub fn with_destination(mut self, destination: Object) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Set the item's action dictionary.
    pub fn with_action(mut self, action: Object) -> Self {
        self.action = Some(action);
        self
    }

    /// Mark the item closed or open.
    pub fn with_closed(mut self, closed: bool) -> Self {
        self.is_closed = closed;
        self
    }

    /// The indirect object this item was imported from or last committed to.
    pub fn obj(&self) -> Option<ObjectRef> {
        self.obj
    }

    /// Whether the item has persisted children that were not imported
    /// because of [`OutlineOptions::max_depth`].
    pub fn has_unloaded_children(&self) -> bool {
        self.depth_limited
    }

    fn from_dict(reference: ObjectRef, dict: &Dictionary) -> Self {
        let title = dict
            .get("Title")
            .and_then(Object::as_string)
            .map(decode_text_string)
            .unwrap_or_default();
        let is_closed = dict
            .get("Count")
            .and_then(Object::as_integer)
            .is_some_and(|count| count < 0);

        Self {
            title,
            destination: dict.get("Dest").cloned(),
            action: dict.get("A").cloned(),
            is_closed,
            children: Vec::new(),
            obj: Some(reference),
            depth_limited: false,
        }
    }
}

/// Owned outline tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// Top-level items
    pub root: Vec<OutlineItem>,
    options: OutlineOptions,
    outlines_ref: Option<ObjectRef>,
}

impl Outline {
    /// Options this outline was loaded with.
    pub fn options(&self) -> OutlineOptions {
        self.options
    }

    /// Depth-first, pre-order iterator over all items.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![self.root.iter()],
        }
    }
}

/// Iterator returned by [`Outline::walk`].
pub struct Walk<'a> {
    stack: Vec<std::slice::Iter<'a, OutlineItem>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a OutlineItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(item) => {
                    self.stack.push(item.children.iter());
                    return Some(item);
                },
                None => {
                    self.stack.pop();
                },
            }
        }
    }
}

/// An outline being edited; commits back to the document exactly once.
///
/// Committing happens on [`OutlineGuard::commit`] or, failing that, when the
/// guard is dropped. Errors during a drop-time commit can only be logged, so
/// callers who need them should commit explicitly or use
/// [`Document::edit_outline`].
pub struct OutlineGuard<'a> {
    doc: &'a mut Document,
    outline: Outline,
    committed: bool,
}

impl OutlineGuard<'_> {
    /// Write the outline back to the document.
    pub fn commit(mut self) -> Result<()> {
        self.committed = true;
        self.doc.commit_outline(&mut self.outline)
    }
}

impl Deref for OutlineGuard<'_> {
    type Target = Outline;

    fn deref(&self) -> &Outline {
        &self.outline
    }
}

impl DerefMut for OutlineGuard<'_> {
    fn deref_mut(&mut self) -> &mut Outline {
        &mut self.outline
    }
}

impl Drop for OutlineGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        if let Err(e) = self.doc.commit_outline(&mut self.outline) {
            log::error!("Failed to commit outline: {}", e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

/// One sibling chain being imported.
struct ImportFrame {
    level: usize,
    owner: Option<(ObjectRef, OutlineItem)>,
    items: Vec<OutlineItem>,
    cursor: Option<Object>,
}

/// Report a structural defect: an error in strict mode, a warning otherwise.
fn defect(options: &OutlineOptions, message: String) -> Result<()> {
    if options.strict {
        return Err(Error::StructuralError(message));
    }
    log::warn!("Outline truncated: {}", message);
    Ok(())
}

/// Where a node is written on commit.
enum Slot {
    Existing(ObjectRef),
    New,
}

/// A node with its final non-link entries, ready to be linked and written.
struct PlannedNode {
    slot: Slot,
    dict: Dictionary,
    children: Vec<usize>,
    closed: bool,
    /// `|/Count|` of a depth-limited node whose persisted children are kept
    kept_count: Option<i64>,
}

impl Document {
    /// Import the outline and return a guard that commits it when done.
    pub fn open_outline(&mut self, options: OutlineOptions) -> Result<OutlineGuard<'_>> {
        let outline = self.load_outline(options)?;
        Ok(OutlineGuard {
            doc: self,
            outline,
            committed: false,
        })
    }

    /// Run `edit` on the imported outline and commit it afterwards.
    ///
    /// The outline is committed even when `edit` fails. The closure's error
    /// takes precedence over a commit error.
    pub fn edit_outline<F, T>(&mut self, options: OutlineOptions, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Outline) -> Result<T>,
    {
        let mut outline = self.load_outline(options)?;
        let result = edit(&mut outline);
        let committed = self.commit_outline(&mut outline);
        let value = result?;
        committed?;
        Ok(value)
    }

    /// Import the outline tree without holding on to the document.
    pub fn load_outline(&self, options: OutlineOptions) -> Result<Outline> {
        let (outlines_ref, first) = match self.catalog()?.get("Outlines") {
            None | Some(Object::Null) => (None, None),
            Some(entry) => match self.resolve(entry) {
                Ok(Object::Dictionary(dict)) => (entry.as_reference(), dict.get("First").cloned()),
                Ok(other) => {
                    defect(&options, format!("/Outlines is a {}", other.type_name()))?;
                    (None, None)
                },
                Err(e) => {
                    defect(&options, format!("/Outlines cannot be resolved: {}", e))?;
                    (None, None)
                },
            },
        };

        // Links back to the /Outlines dictionary are loops like any other
        let mut state: HashMap<ObjectRef, VisitState> = HashMap::new();
        if let Some(r) = outlines_ref {
            state.insert(r, VisitState::Visiting);
        }
        let mut root = Vec::new();
        let mut stack = vec![ImportFrame {
            level: 0,
            owner: None,
            items: Vec::new(),
            cursor: first,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(link) = frame.cursor.take().filter(|l| !l.is_null()) else {
                // End of this sibling chain
                let Some(done) = stack.pop() else { break };
                match done.owner {
                    Some((owner_ref, mut owner)) => {
                        state.insert(owner_ref, VisitState::Visited);
                        owner.children = done.items;
                        if let Some(parent) = stack.last_mut() {
                            parent.items.push(owner);
                        }
                    },
                    None => root = done.items,
                }
                continue;
            };

            let node_ref = match self.outline_node(&link) {
                Ok(r) => r,
                Err(reason) => {
                    defect(&options, reason)?;
                    continue;
                },
            };
            match state.get(&node_ref) {
                Some(VisitState::Visiting) => {
                    defect(&options, format!("loop back to {}", node_ref))?;
                    continue;
                },
                Some(VisitState::Visited) => {
                    defect(&options, format!("node {} appears more than once", node_ref))?;
                    continue;
                },
                None => {},
            }

            let dict = self.get_dict(node_ref)?;
            let mut item = OutlineItem::from_dict(node_ref, dict);
            frame.cursor = dict.get("Next").cloned();
            let level = frame.level;

            match dict.get("First").filter(|f| !f.is_null()) {
                Some(first) if level < options.max_depth => {
                    state.insert(node_ref, VisitState::Visiting);
                    stack.push(ImportFrame {
                        level: level + 1,
                        owner: Some((node_ref, item)),
                        items: Vec::new(),
                        cursor: Some(first.clone()),
                    });
                },
                first => {
                    item.depth_limited = first.is_some();
                    state.insert(node_ref, VisitState::Visited);
                    frame.items.push(item);
                },
            }
        }

        log::debug!(
            "Loaded outline with {} nodes",
            state.len() - usize::from(outlines_ref.is_some())
        );
        Ok(Outline {
            root,
            options,
            outlines_ref,
        })
    }

    /// Validate an outline link; the error is a description of the defect.
    fn outline_node(&self, link: &Object) -> std::result::Result<ObjectRef, String> {
        let Some(r) = link.as_reference() else {
            return Err(format!("outline link is a direct {}", link.type_name()));
        };
        match self.get(r) {
            Ok(Object::Dictionary(_)) => Ok(r),
            Ok(other) => Err(format!("outline node {} is a {}", r, other.type_name())),
            Err(_) => Err(format!("outline node {} does not exist", r)),
        }
    }

    /// Write `outline` back into the document, recomputing every link.
    ///
    /// Either the whole outline is written or, on error, nothing is. On
    /// success every item's [`OutlineItem::obj`] names the object it was
    /// written to.
    pub fn commit_outline(&mut self, outline: &mut Outline) -> Result<()> {
        // Phase 1: plan every node without touching the document
        self.catalog()?;
        let strict = outline.options.strict;
        let mut plan: Vec<PlannedNode> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        let mut used: HashSet<ObjectRef> = HashSet::new();
        let mut pending: Vec<(&OutlineItem, Option<usize>)> =
            outline.root.iter().rev().map(|item| (item, None)).collect();

        while let Some((item, parent)) = pending.pop() {
            let index = plan.len();
            let (node, descend) = self.plan_node(item, &mut used, outline.outlines_ref, strict)?;
            plan.push(node);
            match parent {
                Some(p) => plan[p].children.push(index),
                None => roots.push(index),
            }
            if descend {
                pending.extend(item.children.iter().rev().map(|child| (child, Some(index))));
            } else if !item.children.is_empty() {
                log::warn!(
                    "Ignoring {} children of \"{}\" beyond the outline depth limit",
                    item.children.len(),
                    item.title
                );
            }
        }

        // Children always come after their parent, so a reverse sweep sees
        // every child's total before the parent needs it.
        let mut visible = vec![0i64; plan.len()];
        for i in (0..plan.len()).rev() {
            visible[i] = match plan[i].kept_count {
                Some(kept) => kept,
                None => plan[i]
                    .children
                    .iter()
                    .map(|&c| 1 + if plan[c].closed { 0 } else { visible[c] })
                    .sum(),
            };
        }
        let total: i64 = roots
            .iter()
            .map(|&r| 1 + if plan[r].closed { 0 } else { visible[r] })
            .sum();

        let existing_root = outline
            .outlines_ref
            .and_then(|r| self.get_dict(r).ok().map(|d| (r, d.clone())));

        if roots.is_empty() {
            if let Some((root_ref, mut dict)) = existing_root {
                dict.shift_remove("First");
                dict.shift_remove("Last");
                dict.insert("Count".to_string(), Object::Integer(0));
                self.insert_object(root_ref, Object::Dictionary(dict));
            }
            log::debug!("Committed empty outline");
            return Ok(());
        }

        // Phase 2: allocate identities and write
        let refs: Vec<ObjectRef> = plan
            .iter()
            .map(|node| match node.slot {
                Slot::Existing(r) => r,
                Slot::New => self.add_object(Object::Null).reference(),
            })
            .collect();
        let (outlines_ref, mut root_dict) = match existing_root {
            Some(existing) => existing,
            None => (self.add_object(Object::Null).reference(), Dictionary::new()),
        };

        let mut groups: Vec<(ObjectRef, Vec<usize>)> = vec![(outlines_ref, roots.clone())];
        for (i, node) in plan.iter().enumerate() {
            if node.kept_count.is_none() && !node.children.is_empty() {
                groups.push((refs[i], node.children.clone()));
            }
        }
        for (parent_ref, members) in &groups {
            for (pos, &member) in members.iter().enumerate() {
                let dict = &mut plan[member].dict;
                dict.insert("Parent".to_string(), Object::Reference(*parent_ref));
                if pos > 0 {
                    dict.insert("Prev".to_string(), Object::Reference(refs[members[pos - 1]]));
                }
                if let Some(&next) = members.get(pos + 1) {
                    dict.insert("Next".to_string(), Object::Reference(refs[next]));
                }
            }
        }

        for (i, node) in plan.iter_mut().enumerate() {
            let count = if node.closed { -visible[i] } else { visible[i] };
            if node.kept_count.is_some() {
                node.dict.insert("Count".to_string(), Object::Integer(count));
            } else if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
                node.dict.insert("First".to_string(), Object::Reference(refs[first]));
                node.dict.insert("Last".to_string(), Object::Reference(refs[last]));
                node.dict.insert("Count".to_string(), Object::Integer(count));
            }
        }
        for (node, reference) in plan.into_iter().zip(&refs) {
            self.insert_object(*reference, Object::Dictionary(node.dict));
        }

        root_dict.insert("Type".to_string(), Object::name("Outlines"));
        root_dict.insert("First".to_string(), Object::Reference(refs[roots[0]]));
        root_dict.insert("Last".to_string(), Object::Reference(refs[roots[roots.len() - 1]]));
        root_dict.insert("Count".to_string(), Object::Integer(total));
        self.insert_object(outlines_ref, Object::Dictionary(root_dict));
        self.catalog_mut()?
            .insert("Outlines".to_string(), Object::Reference(outlines_ref));

        // Record where each item now lives; same order as the planning pass
        let mut assign: Vec<&mut OutlineItem> = outline.root.iter_mut().rev().collect();
        let mut slots = refs.iter();
        while let Some(item) = assign.pop() {
            item.obj = slots.next().copied();
            if item.depth_limited {
                continue;
            }
            assign.extend(item.children.iter_mut().rev());
        }
        outline.outlines_ref = Some(outlines_ref);

        log::debug!(
            "Committed outline: {} nodes, {} visible at top level",
            refs.len(),
            total
        );
        Ok(())
    }

    /// Decide where `item` is written and build its non-link entries.
    ///
    /// Returns the planned node and whether the item's in-memory children are
    /// part of the commit.
    fn plan_node(
        &self,
        item: &OutlineItem,
        used: &mut HashSet<ObjectRef>,
        outlines_ref: Option<ObjectRef>,
        strict: bool,
    ) -> Result<(PlannedNode, bool)> {
        let persisted = item
            .obj
            .and_then(|r| self.get(r).ok().and_then(Object::as_dict).map(|d| (r, d)));

        let (slot, mut dict) = match persisted {
            Some((r, _)) if Some(r) == outlines_ref => {
                if strict {
                    return Err(Error::StructuralError(format!(
                        "outline item {} is the /Outlines dictionary",
                        r
                    )));
                }
                log::warn!("Outline item {} is the /Outlines dictionary, writing a new node", r);
                (Slot::New, Dictionary::new())
            },
            Some((r, d)) if used.insert(r) => (Slot::Existing(r), d.clone()),
            Some((r, d)) => {
                if strict {
                    return Err(Error::StructuralError(format!(
                        "outline node {} is used more than once",
                        r
                    )));
                }
                log::warn!("Outline node {} used more than once, writing a copy", r);
                (Slot::New, d.clone())
            },
            None => (Slot::New, Dictionary::new()),
        };

        let keeps_children = item.depth_limited && matches!(slot, Slot::Existing(_));
        let kept_count = if keeps_children {
            Some(dict.get("Count").and_then(Object::as_integer).unwrap_or(0).abs())
        } else {
            None
        };

        for key in ["Parent", "Prev", "Next"] {
            dict.shift_remove(key);
        }
        if !keeps_children {
            for key in ["First", "Last", "Count"] {
                dict.shift_remove(key);
            }
        }

        dict.insert("Title".to_string(), Object::String(encode_text_string(&item.title)));
        match &item.destination {
            Some(dest) => dict.insert("Dest".to_string(), dest.clone()),
            None => dict.shift_remove("Dest"),
        };
        match &item.action {
            Some(action) => dict.insert("A".to_string(), action.clone()),
            None => dict.shift_remove("A"),
        };

        let node = PlannedNode {
            slot,
            dict,
            children: Vec::new(),
            closed: item.is_closed,
            kept_count,
        };
        Ok((node, !item.depth_limited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(items: &[OutlineItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_empty_document_has_empty_outline() {
        let doc = Document::new();
        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        assert!(outline.root.is_empty());
    }

    #[test]
    fn test_commit_empty_does_not_create_outlines() {
        let mut doc = Document::new();
        doc.edit_outline(OutlineOptions::default(), |_| Ok(())).unwrap();
        assert!(!doc.catalog().unwrap().contains_key("Outlines"));
    }

    #[test]
    fn test_commit_then_reload() {
        let mut doc = Document::new();
        doc.edit_outline(OutlineOptions::default(), |outline| {
            let mut a = OutlineItem::new("A");
            a.children.push(OutlineItem::new("A.1"));
            a.children.push(OutlineItem::new("A.2"));
            outline.root.push(a);
            outline.root.push(OutlineItem::new("B"));
            Ok(())
        })
        .unwrap();

        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        assert_eq!(titles(&outline.root), vec!["A", "B"]);
        assert_eq!(titles(&outline.root[0].children), vec!["A.1", "A.2"]);
        assert!(outline.walk().all(|item| item.obj().is_some()));

        let outlines_ref = doc
            .catalog()
            .unwrap()
            .get("Outlines")
            .and_then(Object::as_reference)
            .unwrap();
        let root = doc.get_dict(outlines_ref).unwrap();
        assert_eq!(root.get("Count").unwrap().as_integer(), Some(4));
        assert_eq!(root.get("Type").unwrap().as_name(), Some("Outlines"));
    }

    #[test]
    fn test_closed_item_count() {
        let mut doc = Document::new();
        doc.edit_outline(OutlineOptions::default(), |outline| {
            let mut a = OutlineItem::new("A").with_closed(true);
            a.children.push(OutlineItem::new("A.1"));
            a.children.push(OutlineItem::new("A.2"));
            outline.root.push(a);
            Ok(())
        })
        .unwrap();

        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        let a = &outline.root[0];
        assert!(a.is_closed);
        let dict = doc.get_dict(a.obj().unwrap()).unwrap();
        assert_eq!(dict.get("Count").unwrap().as_integer(), Some(-2));
        let leaf = doc.get_dict(a.children[0].obj().unwrap()).unwrap();
        assert!(!leaf.contains_key("Count"));
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut a = OutlineItem::new("A");
        a.children.push(OutlineItem::new("A.1"));
        let outline = Outline {
            root: vec![a, OutlineItem::new("B")],
            options: OutlineOptions::default(),
            outlines_ref: None,
        };
        let order: Vec<&str> = outline.walk().map(|i| i.title.as_str()).collect();
        assert_eq!(order, vec!["A", "A.1", "B"]);
    }

    #[test]
    fn test_unicode_title_roundtrip() {
        let mut doc = Document::new();
        doc.edit_outline(OutlineOptions::default(), |outline| {
            outline.root.push(OutlineItem::new("Résumé"));
            Ok(())
        })
        .unwrap();
        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        assert_eq!(outline.root[0].title, "Résumé");
        let raw = doc.get_dict(outline.root[0].obj().unwrap()).unwrap();
        assert_eq!(raw.get("Title").and_then(Object::as_string).unwrap()[..2], [0xFE, 0xFF]);
    }

    #[test]
    fn test_guard_commits_on_drop() {
        let mut doc = Document::new();
        {
            let mut outline = doc.open_outline(OutlineOptions::default()).unwrap();
            outline.root.push(OutlineItem::new("Dropped"));
        }
        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        assert_eq!(titles(&outline.root), vec!["Dropped"]);
    }

    #[test]
    fn test_item_on_outlines_root_is_rewritten() {
        let mut doc = Document::new();
        doc.edit_outline(OutlineOptions::default(), |outline| {
            outline.root.push(OutlineItem::new("A"));
            Ok(())
        })
        .unwrap();

        let mut outline = doc.load_outline(OutlineOptions::default()).unwrap();
        let outlines_ref = outline.outlines_ref.unwrap();
        let mut rogue = OutlineItem::new("Rogue");
        rogue.obj = Some(outlines_ref);
        outline.root.push(rogue.clone());

        let mut strict = doc.load_outline(OutlineOptions::default().with_strict(true)).unwrap();
        strict.root.push(rogue);
        assert!(matches!(doc.commit_outline(&mut strict), Err(Error::StructuralError(_))));

        doc.commit_outline(&mut outline).unwrap();
        assert_ne!(outline.root[1].obj(), Some(outlines_ref));
        let root = doc.get_dict(outlines_ref).unwrap();
        assert_eq!(root.get("Type"), Some(&Object::name("Outlines")));
        assert_eq!(root.get("Count"), Some(&Object::Integer(2)));
        let reloaded = doc.load_outline(OutlineOptions::default().with_strict(true)).unwrap();
        assert_eq!(titles(&reloaded.root), vec!["A", "Rogue"]);
    }

    #[test]
    fn test_closure_error_still_commits() {
        let mut doc = Document::new();
        let result: Result<()> = doc.edit_outline(OutlineOptions::default(), |outline| {
            outline.root.push(OutlineItem::new("Kept"));
            Err(Error::Config("stop".to_string()))
        });
        assert!(matches!(result, Err(Error::Config(_))));
        let outline = doc.load_outline(OutlineOptions::default()).unwrap();
        assert_eq!(titles(&outline.root), vec!["Kept"]);
    }
}
