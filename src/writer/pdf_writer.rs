//! PDF document writer.
//!
//! Assembles complete PDF files from a [`Document`]:
//! header, body, xref table, and trailer.

use super::object_serializer::ObjectSerializer;
use crate::document::Document;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use std::collections::BTreeSet;
use std::io::Write;

/// Configuration for PDF output.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// Leave out objects that cannot be reached from the catalog
    pub prune_unreachable: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            prune_unreachable: true,
        }
    }
}

impl PdfWriterConfig {
    /// Enable or disable dropping unreachable objects.
    pub fn with_prune_unreachable(mut self, prune: bool) -> Self {
        self.prune_unreachable = prune;
        self
    }
}

/// Writes a [`Document`] as a classic (xref table) PDF file.
pub struct PdfWriter<'a> {
    doc: &'a Document,
    config: PdfWriterConfig,
}

impl<'a> PdfWriter<'a> {
    /// Create a writer with default settings.
    pub fn new(doc: &'a Document) -> Self {
        Self::with_config(doc, PdfWriterConfig::default())
    }

    /// Create a writer with custom settings.
    pub fn with_config(doc: &'a Document, config: PdfWriterConfig) -> Self {
        Self { doc, config }
    }

    /// Objects reachable from the catalog.
    fn reachable(&self) -> BTreeSet<ObjectRef> {
        let mut seen = BTreeSet::new();
        let mut queue = vec![self.doc.root_ref()];

        while let Some(r) = queue.pop() {
            if !seen.insert(r) {
                continue;
            }
            let Ok(obj) = self.doc.get(r) else {
                log::warn!("Dangling reference to {}", r);
                seen.remove(&r);
                continue;
            };
            collect_references(obj, &mut queue);
        }
        seen
    }

    /// Build the complete PDF file.
    pub fn finish(self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::new();
        let mut output = Vec::new();
        let (major, minor) = self.doc.version();

        // PDF Header
        writeln!(output, "%PDF-{}.{}", major, minor)?;
        // Binary marker (recommended for binary content)
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let selected: Vec<ObjectRef> = if self.config.prune_unreachable {
            self.reachable().into_iter().collect()
        } else {
            self.doc.objects().map(|(r, _)| r).collect()
        };

        let mut xref_offsets: Vec<(ObjectRef, usize)> = Vec::with_capacity(selected.len());
        for r in &selected {
            xref_offsets.push((*r, output.len()));
            serializer.write_indirect(&mut output, r.id, r.gen, self.doc.get(*r)?)?;
        }

        // Write xref table
        let size = self.doc.next_object_number();
        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", size)?;

        // Numbers without a written object form the free list headed by
        // object 0. They are never reused, hence generation 1.
        let written: BTreeSet<u32> = xref_offsets.iter().map(|(r, _)| r.id).collect();
        let free: Vec<u32> = (1..size).filter(|id| !written.contains(id)).collect();
        let mut next_free = free.iter().copied().skip(1).chain(std::iter::once(0));

        writeln!(output, "{:010} 65535 f ", free.first().copied().unwrap_or(0))?;
        let mut offsets = xref_offsets.iter().peekable();
        for id in 1..size {
            match offsets.peek() {
                Some((r, offset)) if r.id == id => {
                    writeln!(output, "{:010} {:05} n ", offset, r.gen)?;
                    offsets.next();
                },
                _ => writeln!(output, "{:010} 00001 f ", next_free.next().unwrap_or(0))?,
            }
        }

        // Write trailer
        let id = Object::String(self.doc.id().as_bytes().to_vec());
        let trailer = Object::dict(vec![
            ("Size", Object::Integer(size as i64)),
            ("Root", Object::Reference(self.doc.root_ref())),
            ("ID", Object::Array(vec![id.clone(), id])),
        ]);

        writeln!(output, "trailer")?;
        serializer.write_object(&mut output, &trailer)?;
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!(
            "Wrote {} of {} objects ({} bytes)",
            selected.len(),
            self.doc.object_count(),
            output.len()
        );
        Ok(output)
    }
}

/// Push every reference nested in `obj` onto `out`.
fn collect_references(obj: &Object, out: &mut Vec<ObjectRef>) {
    match obj {
        Object::Reference(r) => out.push(*r),
        Object::Array(items) => items.iter().for_each(|o| collect_references(o, out)),
        Object::Dictionary(dict) | Object::Stream { dict, .. } => {
            dict.values().for_each(|o| collect_references(o, out))
        },
        _ => {},
    }
}

impl Document {
    /// Serialize the document to PDF bytes.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        PdfWriter::new(self).finish()
    }

    /// Write the document to `path`.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.save_to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
