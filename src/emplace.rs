//! Identity-preserving structural overwrite.
//!
//! `emplace` makes an indirect object look exactly like another one while
//! keeping its object number, so every `/Parent`, `/Kids`, `/Dest` or other
//! reference that already points at it now sees the new content. The typical
//! use is replacing a page with a rebuilt one without breaking links to it.

use crate::document::{Document, ObjectHandle};
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::HashSet;

impl Document {
    /// Copy all entries of `source` into `destination` without creating a new object.
    ///
    /// After the call `destination` has exactly the keys of `source`, each
    /// mapped to an equal value, and its identity pair is unchanged. Values are
    /// copied as they are: an entry holding a reference keeps pointing at the
    /// same indirect object, which is then shared by both objects. Children
    /// that lose their last reference are left in the document.
    ///
    /// Streams copy their dictionaries only; the destination keeps its payload.
    /// Arrays copy their elements.
    ///
    /// # Errors
    ///
    /// - [`Error::OwnershipMismatch`] if either handle belongs to another document
    /// - [`Error::ObjectNotFound`] if either object does not exist
    /// - [`Error::InvalidObjectType`] if the objects are not both dictionary-like
    ///   or both arrays
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use pdf_mutate::{Document, Object};
    ///
    /// let mut doc = Document::new();
    /// let page = doc.add_object(Object::dict(vec![("Rotate", Object::Integer(90))]));
    /// let replacement = doc.add_object(Object::dict(vec![("UserUnit", Object::Integer(2))]));
    /// doc.emplace(&page, &replacement)?;
    ///
    /// let dict = doc.get_dict(page.reference())?;
    /// assert!(dict.get("Rotate").is_none());
    /// assert_eq!(dict.get("UserUnit"), Some(&Object::Integer(2)));
    /// # Ok::<(), pdf_mutate::Error>(())
    /// ```
    pub fn emplace(&mut self, destination: &ObjectHandle, source: &ObjectHandle) -> Result<()> {
        if !self.owns(destination) || !destination.same_owner_as(source) {
            return Err(Error::OwnershipMismatch {
                destination: destination.reference(),
                source_ref: source.reference(),
            });
        }

        let dest_ref = destination.reference();
        let src_ref = source.reference();
        if dest_ref == src_ref {
            self.get(dest_ref)?;
            return Ok(());
        }

        // Snapshot the source first: it may be reachable from the destination,
        // and the destination is about to be mutated.
        let src = self.get(src_ref)?.clone();

        let dest = self.get_mut(dest_ref)?;
        let dest_type = dest.type_name();

        if let (Object::Array(dest_items), Object::Array(src_items)) = (&mut *dest, &src) {
            log::debug!("emplace {} <- {} ({} elements)", dest_ref, src_ref, src_items.len());
            *dest_items = src_items.clone();
            return Ok(());
        }

        let (dest_dict, src_dict) = match (dest.as_dict_mut(), src.as_dict()) {
            (Some(d), Some(s)) => (d, s),
            _ => {
                log::debug!(
                    "emplace {} <- {} rejected: {} onto {}",
                    dest_ref,
                    src_ref,
                    src.type_name(),
                    dest_type
                );
                let expected = format!("structure matching {}", src.type_name());
                return Err(Error::wrong_type(&expected, dest_type));
            },
        };

        let incoming: HashSet<&String> = src_dict.keys().collect();
        let stale: Vec<String> = dest_dict
            .keys()
            .filter(|k| !incoming.contains(k))
            .cloned()
            .collect();

        for (key, value) in src_dict {
            dest_dict.insert(key.clone(), value.clone());
        }
        for key in &stale {
            dest_dict.shift_remove(key);
        }

        log::debug!(
            "emplace {} <- {}: {} keys copied, {} removed",
            dest_ref,
            src_ref,
            src_dict.len(),
            stale.len()
        );
        Ok(())
    }
}
