//! In-memory PDF document.
//!
//! A [`Document`] owns every indirect object it contains and hands out
//! [`ObjectHandle`]s that remember which document they came from. Everything
//! that mutates the graph (content filters, emplace, outline commits) goes
//! through `&mut Document`, so exclusive access is enforced by the borrow
//! checker rather than by locks.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Upper bound on `R -> R -> ...` chains followed by [`Document::resolve`].
const MAX_REFERENCE_CHAIN: usize = 32;

/// Process-unique identity of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw UUID bytes, used for the trailer `/ID`.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An indirect object together with the document that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    owner: DocumentId,
    reference: ObjectRef,
}

impl ObjectHandle {
    /// The owning document.
    pub fn owner(&self) -> DocumentId {
        self.owner
    }

    /// The object's identity pair within its owner.
    pub fn reference(&self) -> ObjectRef {
        self.reference
    }

    /// Whether both handles belong to the same document.
    pub fn same_owner_as(&self, other: &ObjectHandle) -> bool {
        self.owner == other.owner
    }
}

/// A PDF document held entirely in memory.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    version: (u8, u8),
    objects: BTreeMap<ObjectRef, Object>,
    next_id: u32,
    root: ObjectRef,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut doc = Self {
            id: DocumentId::new(),
            version: (1, 7),
            objects: BTreeMap::new(),
            next_id: 1,
            root: ObjectRef::new(0, 0),
        };

        let root = doc.alloc_ref();
        let pages = doc.alloc_ref();
        doc.objects.insert(
            pages,
            Object::dict(vec![
                ("Type", Object::name("Pages")),
                ("Kids", Object::Array(Vec::new())),
                ("Count", Object::Integer(0)),
            ]),
        );
        doc.objects.insert(
            root,
            Object::dict(vec![
                ("Type", Object::name("Catalog")),
                ("Pages", Object::Reference(pages)),
            ]),
        );
        doc.root = root;

        log::debug!("Created document {}", doc.id);
        doc
    }

    /// This document's identity.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// PDF version as (major, minor).
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Reference to the document catalog (trailer `/Root`).
    pub fn root_ref(&self) -> ObjectRef {
        self.root
    }

    /// The document catalog dictionary.
    pub fn catalog(&self) -> Result<&Dictionary> {
        self.get_dict(self.root)
    }

    /// Mutable access to the document catalog dictionary.
    pub fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let root = self.root;
        self.get_dict_mut(root)
    }

    fn alloc_ref(&mut self) -> ObjectRef {
        let r = ObjectRef::new(self.next_id, 0);
        self.next_id += 1;
        r
    }

    /// Store `obj` as a new indirect object and return its handle.
    ///
    /// Object numbers are never reused, so a handle stays unambiguous even
    /// after the object it named has been deleted.
    pub fn add_object(&mut self, obj: Object) -> ObjectHandle {
        let reference = self.alloc_ref();
        self.objects.insert(reference, obj);
        ObjectHandle {
            owner: self.id,
            reference,
        }
    }

    /// Handle for an existing indirect object.
    pub fn handle(&self, reference: ObjectRef) -> Result<ObjectHandle> {
        if !self.objects.contains_key(&reference) {
            return Err(Error::ObjectNotFound(reference.id, reference.gen));
        }
        Ok(ObjectHandle {
            owner: self.id,
            reference,
        })
    }

    /// Whether `handle` was issued by this document.
    pub fn owns(&self, handle: &ObjectHandle) -> bool {
        handle.owner == self.id
    }

    /// Whether an indirect object exists under `reference`.
    pub fn contains(&self, reference: ObjectRef) -> bool {
        self.objects.contains_key(&reference)
    }

    /// Number of live indirect objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// One past the highest object number ever allocated (the xref `/Size`).
    pub fn next_object_number(&self) -> u32 {
        self.next_id
    }

    /// Iterate over all indirect objects in ascending object number order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects.iter().map(|(r, o)| (*r, o))
    }

    /// Look up an indirect object.
    pub fn get(&self, reference: ObjectRef) -> Result<&Object> {
        self.objects
            .get(&reference)
            .ok_or(Error::ObjectNotFound(reference.id, reference.gen))
    }

    /// Look up an indirect object mutably.
    pub fn get_mut(&mut self, reference: ObjectRef) -> Result<&mut Object> {
        self.objects
            .get_mut(&reference)
            .ok_or(Error::ObjectNotFound(reference.id, reference.gen))
    }

    /// Look up an indirect object that must be a dictionary or stream.
    pub fn get_dict(&self, reference: ObjectRef) -> Result<&Dictionary> {
        self.get(reference)?.expect_dict()
    }

    /// Mutable variant of [`Document::get_dict`].
    pub fn get_dict_mut(&mut self, reference: ObjectRef) -> Result<&mut Dictionary> {
        let obj = self.get_mut(reference)?;
        let found = obj.type_name();
        obj.as_dict_mut()
            .ok_or_else(|| Error::wrong_type("Dictionary", found))
    }

    /// Dereference `obj` if it is a reference; direct objects are returned as-is.
    ///
    /// Chains of references are followed; a chain that loops or runs longer
    /// than a fixed bound is reported as a structural error.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        let mut current = obj;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                Object::Reference(r) => current = self.get(*r)?,
                other => return Ok(other),
            }
        }
        Err(Error::StructuralError(format!(
            "reference chain starting at {:?} exceeds {} links",
            obj.as_reference(),
            MAX_REFERENCE_CHAIN
        )))
    }

    /// Replace the value stored under an existing reference, keeping its identity.
    pub fn replace(&mut self, reference: ObjectRef, obj: Object) -> Result<Object> {
        let slot = self.get_mut(reference)?;
        Ok(std::mem::replace(slot, obj))
    }

    /// Store `obj` under `reference`, creating or overwriting the slot.
    pub(crate) fn insert_object(&mut self, reference: ObjectRef, obj: Object) {
        self.objects.insert(reference, obj);
    }

    /// Remove an indirect object. References to it become dangling.
    pub fn delete(&mut self, reference: ObjectRef) -> Option<Object> {
        self.objects.remove(&reference)
    }

    /// Payload of a stream object.
    pub fn read_stream_bytes(&self, reference: ObjectRef) -> Result<bytes::Bytes> {
        Ok(self.get(reference)?.stream_data()?.clone())
    }

    /// Overwrite the payload of a stream object.
    ///
    /// The data is stored unencoded: `/Filter` and `/DecodeParms` are removed
    /// and `/Length` is updated.
    pub fn write_stream_bytes(
        &mut self,
        reference: ObjectRef,
        bytes: impl Into<bytes::Bytes>,
    ) -> Result<()> {
        match self.get_mut(reference)? {
            Object::Stream { dict, data } => {
                *data = bytes.into();
                dict.shift_remove("Filter");
                dict.shift_remove("DecodeParms");
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                Ok(())
            },
            other => Err(Error::wrong_type("Stream", other.type_name())),
        }
    }
}
