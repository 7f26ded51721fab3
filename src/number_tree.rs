//! Number trees (PDF 32000-1 §7.9.7).
//!
//! A number tree maps integer keys to objects. Small trees keep all pairs in
//! the root's `/Nums` array; large ones split them over `/Kids` whose
//! `/Limits` give the smallest and largest key below each node. Page labels
//! (`/PageLabels` in the catalog) are the usual example.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::collections::{BTreeMap, HashSet};

/// Handle to a number tree stored in a [`Document`].
///
/// The handle only records where the tree's root lives; every operation
/// reads or writes the document directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberTree {
    root: ObjectRef,
}

/// A `/Nums` entry located in the tree.
struct Found {
    leaf: ObjectRef,
    /// Index of the key in the leaf's `/Nums` array
    index: usize,
}

fn limits(node: &crate::object::Dictionary) -> Option<(i64, i64)> {
    let arr = node.get("Limits")?.as_array()?;
    match arr.as_slice() {
        [lo, hi] => Some((lo.as_integer()?, hi.as_integer()?)),
        _ => None,
    }
}

/// Integer keys of a `/Nums` array with their array index.
///
/// A trailing key without a value is not a key.
fn keys(nums: &[Object]) -> impl Iterator<Item = (usize, i64)> + '_ {
    nums.chunks_exact(2).enumerate().filter_map(|(pair, chunk)| {
        let key = chunk[0].as_integer();
        if key.is_none() {
            log::warn!("Skipping number tree entry with non-integer key");
        }
        key.map(|k| (pair * 2, k))
    })
}

impl NumberTree {
    /// Wrap an existing tree rooted at `root`.
    pub fn open(doc: &Document, root: ObjectRef) -> Result<Self> {
        doc.get_dict(root)?;
        Ok(Self { root })
    }

    /// Create an empty tree (`<< /Nums [] >>`) as a new indirect object.
    ///
    /// The tree is not linked from anywhere; store [`NumberTree::root`] in
    /// the catalog or wherever it belongs.
    pub fn new_empty(doc: &mut Document) -> Self {
        let handle = doc.add_object(Object::dict(vec![("Nums", Object::Array(Vec::new()))]));
        Self {
            root: handle.reference(),
        }
    }

    /// Reference to the tree's root dictionary.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// Locate `key`, pruning subtrees by their `/Limits`.
    fn find(&self, doc: &Document, key: i64) -> Result<Option<Found>> {
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(node_ref) = stack.pop() {
            if !visited.insert(node_ref) {
                log::warn!("Number tree node {} reached twice, skipping", node_ref);
                continue;
            }
            let node = doc.get_dict(node_ref)?;
            if node_ref != self.root {
                if let Some((lo, hi)) = limits(node) {
                    if key < lo || key > hi {
                        continue;
                    }
                }
            }
            if let Some(nums) = node.get("Nums").and_then(Object::as_array) {
                if let Some((index, _)) = keys(nums).find(|&(_, k)| k == key) {
                    return Ok(Some(Found {
                        leaf: node_ref,
                        index,
                    }));
                }
            }
            if let Some(kids) = node.get("Kids").and_then(Object::as_array) {
                stack.extend(kids.iter().rev().filter_map(Object::as_reference));
            }
        }
        Ok(None)
    }

    /// Value stored under `key`.
    pub fn get(&self, doc: &Document, key: i64) -> Result<Option<Object>> {
        let Some(found) = self.find(doc, key)? else {
            return Ok(None);
        };
        let nums = doc
            .get_dict(found.leaf)?
            .get("Nums")
            .and_then(Object::as_array);
        Ok(nums.and_then(|n| n.get(found.index + 1)).cloned())
    }

    /// Whether `key` is present.
    pub fn contains(&self, doc: &Document, key: i64) -> Result<bool> {
        Ok(self.find(doc, key)?.is_some())
    }

    /// Every key and value in the tree.
    ///
    /// Nodes reached twice through `/Kids` are read once.
    pub fn as_map(&self, doc: &Document) -> Result<BTreeMap<i64, Object>> {
        let mut map = BTreeMap::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(node_ref) = stack.pop() {
            if !visited.insert(node_ref) {
                continue;
            }
            let node = doc.get_dict(node_ref)?;
            if let Some(nums) = node.get("Nums").and_then(Object::as_array) {
                for (index, key) in keys(nums) {
                    if let Some(value) = nums.get(index + 1) {
                        map.insert(key, value.clone());
                    }
                }
            }
            if let Some(kids) = node.get("Kids").and_then(Object::as_array) {
                stack.extend(kids.iter().rev().filter_map(Object::as_reference));
            }
        }
        Ok(map)
    }

    /// Number of entries.
    pub fn len(&self, doc: &Document) -> Result<usize> {
        Ok(self.as_map(doc)?.len())
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self, doc: &Document) -> Result<bool> {
        Ok(self.len(doc)? == 0)
    }

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// New keys go into the leaf whose range covers them (the root itself for
    /// a flat tree), keeping `/Nums` sorted and widening `/Limits` on the way.
    pub fn insert(&self, doc: &mut Document, key: i64, value: Object) -> Result<()> {
        if let Some(found) = self.find(doc, key)? {
            if let Some(slot) = doc
                .get_dict_mut(found.leaf)?
                .get_mut("Nums")
                .and_then(|nums| match nums {
                    Object::Array(nums) => nums.get_mut(found.index + 1),
                    _ => None,
                })
            {
                *slot = value;
            }
            return Ok(());
        }

        let path = self.path_for_new_key(doc, key)?;
        let Some(&leaf) = path.last() else {
            return Err(Error::StructuralError("empty number tree path".to_string()));
        };

        let leaf_dict = doc.get_dict_mut(leaf)?;
        let nums = match leaf_dict
            .entry("Nums".to_string())
            .or_insert_with(|| Object::Array(Vec::new()))
        {
            Object::Array(nums) => nums,
            other => return Err(Error::wrong_type("Array", other.type_name())),
        };
        if nums.len() % 2 == 1 {
            log::warn!("Dropping dangling key at the end of /Nums in {}", leaf);
            nums.pop();
        }
        let at = keys(nums)
            .find(|&(_, k)| k > key)
            .map_or(nums.len(), |(index, _)| index);
        nums.insert(at, value);
        nums.insert(at, Object::Integer(key));

        // The root of a tree carries no /Limits
        for node_ref in path.iter().skip(1) {
            let node = doc.get_dict_mut(*node_ref)?;
            let (lo, hi) = limits(node).map_or((key, key), |(lo, hi)| (lo.min(key), hi.max(key)));
            node.insert(
                "Limits".to_string(),
                Object::Array(vec![Object::Integer(lo), Object::Integer(hi)]),
            );
        }

        log::debug!("Inserted key {} into number tree {} at leaf {}", key, self.root, leaf);
        Ok(())
    }

    /// Nodes from the root down to the leaf that should receive `key`.
    fn path_for_new_key(&self, doc: &Document, key: i64) -> Result<Vec<ObjectRef>> {
        let mut path = vec![self.root];
        let mut current = self.root;
        loop {
            let node = doc.get_dict(current)?;
            if node.contains_key("Nums") {
                return Ok(path);
            }
            let kids: Vec<ObjectRef> = node
                .get("Kids")
                .and_then(Object::as_array)
                .map(|k| k.iter().filter_map(Object::as_reference).collect())
                .unwrap_or_default();
            let Some(&last) = kids.last() else {
                return Ok(path);
            };

            // First kid whose range reaches the key, else the last one
            let mut next = last;
            for kid in &kids {
                if limits(doc.get_dict(*kid)?).is_some_and(|(_, hi)| key <= hi) {
                    next = *kid;
                    break;
                }
            }
            if path.contains(&next) {
                return Err(Error::StructuralError(format!(
                    "number tree {} loops at {}",
                    self.root, next
                )));
            }
            path.push(next);
            current = next;
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&self, doc: &mut Document, key: i64) -> Result<Option<Object>> {
        let Some(found) = self.find(doc, key)? else {
            return Ok(None);
        };
        let leaf = doc.get_dict_mut(found.leaf)?;
        let Some(Object::Array(nums)) = leaf.get_mut("Nums") else {
            return Ok(None);
        };
        let end = (found.index + 2).min(nums.len());
        let value = nums.drain(found.index..end).nth(1);

        if found.leaf != self.root && leaf.contains_key("Limits") {
            let bounds = leaf
                .get("Nums")
                .and_then(Object::as_array)
                .and_then(|nums| {
                    let mut ks = keys(nums).map(|(_, k)| k);
                    let first = ks.next()?;
                    Some(ks.fold((first, first), |(lo, hi), k| (lo.min(k), hi.max(k))))
                });
            if let Some((lo, hi)) = bounds {
                leaf.insert(
                    "Limits".to_string(),
                    Object::Array(vec![Object::Integer(lo), Object::Integer(hi)]),
                );
            }
        }
        Ok(value)
    }
}
