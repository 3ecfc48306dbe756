use std::collections::BTreeMap;

use log::warn;

use crate::{Dictionary, Error, Object, Result, Stream};

/// Merged cross-reference table of a document.
///
/// Sections are merged newest-first: an entry from a later revision shadows
/// any entry for the same object number in the sections it supersedes.
#[derive(Debug, Clone)]
pub struct Xref {
    /// Type of the cross-reference section this table was seeded from.
    pub cross_reference_type: XrefType,

    /// Entries for indirect objects.
    pub entries: BTreeMap<u32, XrefEntry>,

    /// Total number of entries, including the free list head; taken from
    /// `/Size` and corrected against the actual entries after loading.
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefType {
    CrossReferenceTable,
    CrossReferenceStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free,
    Normal { offset: u32, generation: u16 },
    Compressed { container: u32, index: u16 },
}

impl Xref {
    pub fn new(size: u32, xref_type: XrefType) -> Xref {
        Xref {
            cross_reference_type: xref_type,
            entries: BTreeMap::new(),
            size,
        }
    }

    pub fn get(&self, id: u32) -> Option<&XrefEntry> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: u32, entry: XrefEntry) {
        self.entries.insert(id, entry);
    }

    /// Fold an older section into this table. Existing entries win.
    pub fn merge_prev(&mut self, prev: Xref) {
        for (id, entry) in prev.entries {
            self.entries.entry(id).or_insert(entry);
        }
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl XrefEntry {
    pub fn is_normal(&self) -> bool {
        matches!(*self, XrefEntry::Normal { .. })
    }

    pub fn is_compressed(&self) -> bool {
        matches!(*self, XrefEntry::Compressed { .. })
    }
}

/// Decode a `/Type /XRef` cross-reference stream into a table and the
/// trailer dictionary it doubles as. Structural stream keys are stripped
/// from the dictionary so it can be reused as a plain trailer.
pub fn decode_xref_stream(mut stream: Stream) -> Result<(Xref, Dictionary)> {
    if stream.is_compressed() {
        stream.decompress()?;
    }

    let mut dict = stream.dict;
    let size = dict
        .get(b"Size")
        .and_then(Object::as_i64)
        .map_err(|_| Error::Xref(crate::error::XrefError::Parse))?;
    let mut xref = Xref::new(size as u32, XrefType::CrossReferenceStream);

    let section_indices = dict
        .get(b"Index")
        .and_then(parse_integer_array)
        .unwrap_or_else(|_| vec![0, size]);
    let field_widths = dict
        .get(b"W")
        .and_then(parse_integer_array)
        .map_err(|_| Error::Xref(crate::error::XrefError::Parse))?;
    if field_widths.len() < 3 || field_widths.iter().take(3).any(|width| width.is_negative()) {
        return Err(Error::Xref(crate::error::XrefError::Parse));
    }
    let widths = [
        field_widths[0] as usize,
        field_widths[1] as usize,
        field_widths[2] as usize,
    ];

    let mut fields = FieldReader::new(&stream.content, widths);
    'sections: for section in section_indices.chunks(2) {
        let [start, count] = *section else { break };
        for j in 0..count {
            // An entry with a zero-width type field defaults to type 1.
            let Some([entry_type, field2, field3]) = fields.next_entry() else {
                warn!("xref stream ended before all announced entries were read");
                break 'sections;
            };
            let id = (start + j) as u32;
            match entry_type.unwrap_or(1) {
                0 => {
                    xref.insert(id, XrefEntry::Free);
                }
                1 => {
                    xref.insert(
                        id,
                        XrefEntry::Normal {
                            offset: field2.unwrap_or(0),
                            generation: field3.unwrap_or(0) as u16,
                        },
                    );
                }
                2 => {
                    xref.insert(
                        id,
                        XrefEntry::Compressed {
                            container: field2.unwrap_or(0),
                            index: field3.unwrap_or(0) as u16,
                        },
                    );
                }
                other => {
                    warn!("ignoring xref stream entry of unknown type {}", other);
                }
            }
        }
    }

    // These keys describe the stream itself, not the document.
    for key in [b"Length".as_slice(), b"W", b"Index", b"Type", b"Filter", b"DecodeParms"] {
        dict.remove(key);
    }
    Ok((xref, dict))
}

/// Reads fixed-width big-endian fields; a zero-width field yields `None`.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
    widths: [usize; 3],
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8], widths: [usize; 3]) -> Self {
        FieldReader { data, pos: 0, widths }
    }

    fn next_entry(&mut self) -> Option<[Option<u32>; 3]> {
        let mut entry = [None; 3];
        for (slot, &width) in entry.iter_mut().zip(self.widths.iter()) {
            if width == 0 {
                continue;
            }
            let bytes = self.data.get(self.pos..self.pos + width)?;
            self.pos += width;
            *slot = Some(bytes.iter().fold(0_u32, |value, &byte| (value << 8) | u32::from(byte)));
        }
        Some(entry)
    }
}

fn parse_integer_array(array: &Object) -> Result<Vec<i64>> {
    array.as_array()?.iter().map(Object::as_i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    #[test]
    fn later_sections_shadow_earlier_ones() {
        let mut newest = Xref::new(3, XrefType::CrossReferenceTable);
        newest.insert(1, XrefEntry::Normal { offset: 100, generation: 0 });

        let mut prev = Xref::new(3, XrefType::CrossReferenceTable);
        prev.insert(1, XrefEntry::Normal { offset: 10, generation: 0 });
        prev.insert(2, XrefEntry::Normal { offset: 20, generation: 0 });

        newest.merge_prev(prev);
        assert_eq!(newest.get(1), Some(&XrefEntry::Normal { offset: 100, generation: 0 }));
        assert_eq!(newest.get(2), Some(&XrefEntry::Normal { offset: 20, generation: 0 }));
        assert_eq!(newest.max_id(), 2);
    }

    #[test]
    fn decode_uncompressed_xref_stream() {
        // W [1 2 1], entries for objects 0..3: free, two normals, compressed.
        let data = vec![
            0, 0x00, 0x00, 0xFF, // object 0: free
            1, 0x00, 0x0F, 0x00, // object 1: offset 15
            1, 0x01, 0x00, 0x00, // object 2: offset 256
            2, 0x00, 0x04, 0x02, // object 3: in container 4, index 2
        ];
        let dict = dictionary! {
            "Type" => "XRef",
            "Size" => 4,
            "W" => vec![1.into(), 2.into(), 1.into()],
            "Root" => Object::Reference((5, 0)),
        };
        let (xref, trailer) = decode_xref_stream(Stream::new(dict, data)).unwrap();

        assert_eq!(xref.get(0), Some(&XrefEntry::Free));
        assert_eq!(xref.get(1), Some(&XrefEntry::Normal { offset: 15, generation: 0 }));
        assert_eq!(xref.get(2), Some(&XrefEntry::Normal { offset: 256, generation: 0 }));
        assert_eq!(xref.get(3), Some(&XrefEntry::Compressed { container: 4, index: 2 }));
        assert!(trailer.has(b"Root"));
        assert!(!trailer.has(b"Type"));
        assert!(!trailer.has(b"W"));
    }

    #[test]
    fn decode_respects_index_sections() {
        let data = vec![
            1, 0x00, 0x20, 0x00, // object 3
            1, 0x00, 0x30, 0x00, // object 7
        ];
        let dict = dictionary! {
            "Size" => 8,
            "W" => vec![1.into(), 2.into(), 1.into()],
            "Index" => vec![3.into(), 1.into(), 7.into(), 1.into()],
        };
        let (xref, _) = decode_xref_stream(Stream::new(dict, data)).unwrap();
        assert_eq!(xref.get(3), Some(&XrefEntry::Normal { offset: 32, generation: 0 }));
        assert_eq!(xref.get(7), Some(&XrefEntry::Normal { offset: 48, generation: 0 }));
        assert_eq!(xref.get(4), None);
    }
}
