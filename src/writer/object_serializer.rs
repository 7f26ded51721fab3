//! Object syntax (PDF 32000-1 §7.3).
//!
//! Everything is written on one line per object, dictionaries as
//! `<< /Key value >>` in insertion order.

use crate::object::{Dictionary, Object};
use std::io::{self, Write};

/// Writes [`Object`]s in PDF syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

/// Bytes allowed verbatim inside a literal string.
fn is_literal_safe(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r' | 0x20..=0x7E)
}

/// Bytes that must be written as `#xx` inside a name.
fn needs_name_escape(byte: u8) -> bool {
    !(0x21..=0x7E).contains(&byte)
        || matches!(
            byte,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        )
}

impl ObjectSerializer {
    /// Create a serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize `obj` into a fresh buffer.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_object(&mut buf, obj);
        buf
    }

    /// Write `obj` as the indirect object `id gen`.
    pub fn write_indirect<W: Write>(&self, w: &mut W, id: u32, gen: u16, obj: &Object) -> io::Result<()> {
        writeln!(w, "{} {} obj", id, gen)?;
        self.write_object(w, obj)?;
        w.write_all(b"\nendobj\n")
    }

    /// Write `obj` in place.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> io::Result<()> {
        match obj {
            Object::Null => w.write_all(b"null"),
            Object::Boolean(true) => w.write_all(b"true"),
            Object::Boolean(false) => w.write_all(b"false"),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write_real(w, *r),
            Object::String(s) if s.iter().copied().all(is_literal_safe) => write_literal(w, s),
            Object::String(s) => write_hex(w, s),
            Object::Name(n) => write_name(w, n),
            Object::Array(items) => {
                w.write_all(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.write_all(b" ")?;
                    }
                    self.write_object(w, item)?;
                }
                w.write_all(b"]")
            },
            Object::Dictionary(dict) => self.write_dictionary(w, dict, None),
            Object::Stream { dict, data } => {
                self.write_dictionary(w, dict, Some(data.len()))?;
                w.write_all(b"\nstream\n")?;
                w.write_all(data)?;
                w.write_all(b"\nendstream")
            },
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
        }
    }

    /// `length` replaces (or adds) `/Length` for stream dictionaries.
    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary, length: Option<usize>) -> io::Result<()> {
        w.write_all(b"<<")?;
        for (key, value) in dict {
            w.write_all(b" ")?;
            write_name(w, key)?;
            w.write_all(b" ")?;
            match (key.as_str(), length) {
                ("Length", Some(len)) => write!(w, "{}", len)?,
                _ => self.write_object(w, value)?,
            }
        }
        if let Some(len) = length.filter(|_| !dict.contains_key("Length")) {
            write!(w, " /Length {}", len)?;
        }
        if dict.is_empty() && length.is_none() {
            return w.write_all(b">>");
        }
        w.write_all(b" >>")
    }
}

/// Reals with at most five decimals; NaN and infinities become 0.
fn write_real<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    if !value.is_finite() {
        log::warn!("Writing non-finite real {} as 0", value);
        return w.write_all(b"0");
    }
    let fixed = format!("{:.5}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => w.write_all(b"0"),
        t => w.write_all(t.as_bytes()),
    }
}

fn write_literal<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    w.write_all(b"(")?;
    for &byte in data {
        let escaped: &[u8] = match byte {
            b'(' => b"\\(",
            b')' => b"\\)",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            _ => {
                w.write_all(&[byte])?;
                continue;
            },
        };
        w.write_all(escaped)?;
    }
    w.write_all(b")")
}

fn write_hex<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    w.write_all(b"<")?;
    for byte in data {
        write!(w, "{:02X}", byte)?;
    }
    w.write_all(b">")
}

fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    w.write_all(b"/")?;
    for byte in name.bytes() {
        if needs_name_escape(byte) {
            write!(w, "#{:02X}", byte)?;
        } else {
            w.write_all(&[byte])?;
        }
    }
    Ok(())
}
