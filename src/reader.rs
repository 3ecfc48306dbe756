use std::cmp;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::warn;

use crate::error::{ParseError, XrefError};
use crate::object_stream::ObjectStream;
use crate::parser::{self, ParserInput};
use crate::xref::{Xref, XrefEntry, XrefType};
use crate::{Dictionary, Document, Error, Object, ObjectId, Result};

impl Document {
    /// Load a PDF document from a specified file path.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_internal(file, capacity)
    }

    /// Load a PDF document from an arbitrary source.
    #[inline]
    pub fn load_from<R: Read>(source: R) -> Result<Document> {
        Self::load_internal(source, None)
    }

    fn load_internal<R: Read>(mut source: R, capacity: Option<usize>) -> Result<Document> {
        let mut buffer = capacity.map(Vec::with_capacity).unwrap_or_default();
        source.read_to_end(&mut buffer)?;

        Reader {
            buffer: &buffer,
            document: Document::new(),
        }
        .read()
    }

    /// Load a PDF document from a memory slice.
    pub fn load_mem(buffer: &[u8]) -> Result<Document> {
        buffer.try_into()
    }
}

impl TryInto<Document> for &[u8] {
    type Error = Error;

    fn try_into(self) -> Result<Document> {
        Reader {
            buffer: self,
            document: Document::new(),
        }
        .read()
    }
}

pub struct Reader<'a> {
    pub buffer: &'a [u8],
    pub document: Document,
}

/// Maximum allowed embedding of literal strings.
pub const MAX_BRACKET: usize = 100;

impl Reader<'_> {
    /// Read whole document.
    pub fn read(mut self) -> Result<Document> {
        // Some producers prepend junk before the header; the cross-reference offsets are
        // relative to the header in that case.
        let offset = self.buffer.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
        self.buffer = &self.buffer[offset..];

        // The document structure can be expressed in PEG as:
        //   document <- header indirect_object* xref trailer xref_start
        let version =
            parser::header(ParserInput::new_extra(self.buffer, "header")).ok_or(ParseError::InvalidFileHeader)?;

        // The binary mark is in the line after the PDF version.
        if let Some(pos) = self.buffer.iter().position(|&byte| byte == b'\n') {
            if let Some(binary_mark) =
                parser::binary_mark(ParserInput::new_extra(&self.buffer[pos + 1..], "binary_mark"))
            {
                if binary_mark.iter().all(|&byte| byte >= 128) {
                    self.document.binary_mark = binary_mark;
                }
            }
        }

        self.document.version = version;

        if let Err(err) = self.read_from_xref() {
            warn!("invalid cross-reference data ({err}), scanning the document for objects");

            if !self.recover()? {
                return Err(err);
            }
        }

        Ok(self.document)
    }

    /// Locate the newest cross-reference section, follow the /Prev chain back through earlier
    /// revisions and load every object the merged table refers to.
    fn read_from_xref(&mut self) -> Result<()> {
        let xref_start = Self::get_xref_start(self.buffer)?;
        if xref_start > self.buffer.len() {
            return Err(Error::Xref(XrefError::Start));
        }

        let (mut xref, mut trailer) =
            parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[xref_start..], "xref"), &*self)?;

        // Read previous xref sections of linearized or incrementally updated documents. Entries
        // from newer sections shadow the ones from older sections.
        let mut already_seen = HashSet::new();
        let mut prev_xref_start = trailer.remove(b"Prev");
        while let Some(prev) = prev_xref_start.and_then(|offset| offset.as_i64().ok()) {
            if already_seen.contains(&prev) {
                break;
            }
            already_seen.insert(prev);
            if prev < 0 || prev as usize > self.buffer.len() {
                return Err(Error::Xref(XrefError::PrevStart));
            }

            let (prev_xref, prev_trailer) =
                parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev as usize..], ""), &*self)?;
            xref.merge_prev(prev_xref);

            // Read the cross-reference stream of a hybrid-reference file. Only the newest
            // trailer is consulted for /XRefStm, and only when it also carries /Prev; a
            // hybrid pointer in an older revision's trailer is ignored.
            let prev_xref_stream_start = trailer.remove(b"XRefStm");
            if let Some(prev) = prev_xref_stream_start.and_then(|offset| offset.as_i64().ok()) {
                if prev < 0 || prev as usize > self.buffer.len() {
                    return Err(Error::Xref(XrefError::StreamStart));
                }

                let (prev_xref, _) =
                    parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev as usize..], ""), &*self)?;
                xref.merge_prev(prev_xref);
            }

            prev_xref_start = prev_trailer.get(b"Prev").cloned().ok();
        }

        let xref_entry_count = xref.max_id().checked_add(1).ok_or(Error::Xref(XrefError::Parse))?;
        if xref.size != xref_entry_count {
            warn!(
                "Size entry of trailer dictionary is {}, correct value is {}.",
                xref.size, xref_entry_count
            );
            xref.size = xref_entry_count;
        }

        self.document.max_id = xref.size - 1;
        self.document.trailer = trailer;
        self.document.reference_table = xref;

        self.load_objects()
    }

    /// Parse every object the cross-reference table points at.
    ///
    /// Object streams are expanded inline for plaintext documents; in an encrypted document
    /// their containers first have to be decrypted, so expansion is left to
    /// [`Document::decrypt`]. Unreadable objects are skipped with a warning so that a single
    /// damaged object does not make the whole document unreadable.
    fn load_objects(&mut self) -> Result<()> {
        let is_encrypted = self.document.trailer.get(b"Encrypt").is_ok();
        let mut objects = BTreeMap::new();
        let mut compressed_objects = BTreeMap::new();
        let mut zero_length_streams = vec![];

        for (_, entry) in self.document.reference_table.entries.iter() {
            let XrefEntry::Normal { offset, .. } = *entry else {
                continue;
            };

            let (object_id, mut object) = match self.read_object(offset as usize, None, &mut HashSet::new()) {
                Ok(result) => result,
                Err(err) => {
                    warn!("skipping object at offset {offset}: {err}");
                    continue;
                }
            };

            if let Ok(stream) = object.as_stream_mut() {
                if stream.dict.type_is(b"ObjStm") && !is_encrypted {
                    match ObjectStream::new(stream) {
                        Ok(object_stream) => compressed_objects.extend(object_stream.objects),
                        Err(err) => warn!("skipping object stream {}: {err}", object_id.0),
                    }
                } else if stream.content.is_empty() {
                    zero_length_streams.push(object_id);
                }
            }

            objects.insert(object_id, object);
        }

        self.document.objects = objects;

        // Only add compressed entries, but never replace objects from later revisions.
        for (id, object) in compressed_objects {
            self.document.objects.entry(id).or_insert(object);
        }

        for object_id in zero_length_streams {
            if let Err(err) = self.read_stream_content(object_id) {
                warn!("could not read content of stream {}: {err}", object_id.0);
            }
        }

        Ok(())
    }

    /// Rebuild the document from a linear scan for `id gen obj` headers.
    ///
    /// Used when the cross-reference data is broken. Returns false when the scan finds nothing
    /// usable, in which case the original error is reported instead.
    fn recover(&mut self) -> Result<bool> {
        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);
        let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
        let mut trailer = Dictionary::new();

        for (position, window) in self.buffer.windows(3).enumerate() {
            if window != b"obj" {
                continue;
            }

            // The keyword must stand on its own.
            if self.buffer.get(position + 3).is_some_and(|c| c.is_ascii_alphanumeric()) {
                continue;
            }

            // Backtrack over `id gen` to find the start of the indirect object.
            let Some(start) = Self::object_header_start(self.buffer, position) else {
                continue;
            };

            let input = ParserInput::new_extra(self.buffer, "indirect object");
            match parser::indirect_object(input, start, None, &*self, &mut HashSet::new()) {
                Ok((object_id, object)) => {
                    // A later object with the same id replaces an earlier one.
                    xref.insert(
                        object_id.0,
                        XrefEntry::Normal {
                            offset: start as u32,
                            generation: object_id.1,
                        },
                    );
                    objects.insert(object_id, object);
                }
                Err(err) => warn!("skipping unreadable object at offset {start}: {err}"),
            }
        }

        if objects.is_empty() {
            return Ok(false);
        }

        // Collect the trailer dictionaries; entries from later revisions override earlier ones.
        for (position, window) in self.buffer.windows(7).enumerate() {
            if window != b"trailer" {
                continue;
            }

            let input = ParserInput::new_extra(&self.buffer[position + 7..], "trailer");
            if let Some(Object::Dictionary(dict)) = parser::direct_object(input) {
                trailer.extend(&dict);
            }
        }

        // A document without a /Root entry is unusable; take the catalog found in the scan.
        if trailer.get(b"Root").is_err() {
            let catalog = objects.iter().find(|(_, object)| {
                object
                    .as_dict()
                    .map(|dict| dict.type_is(b"Catalog"))
                    .unwrap_or(false)
            });

            match catalog {
                Some((&id, _)) => {
                    trailer.set("Root", Object::Reference(id));
                }
                None => return Ok(false),
            }
        }

        xref.size = xref.max_id() + 1;
        trailer.set("Size", xref.size as i64);
        trailer.remove(b"Prev");
        trailer.remove(b"XRefStm");

        self.document.max_id = xref.size - 1;
        self.document.reference_table = xref;
        self.document.trailer = trailer;
        self.document.objects = objects;

        // Streams whose /Length could not be resolved during the scan are filled in now that
        // all objects are known.
        let pending: Vec<ObjectId> = self
            .document
            .objects
            .iter()
            .filter(|(_, object)| {
                object
                    .as_stream()
                    .map(|stream| stream.content.is_empty() && stream.start_position.is_some())
                    .unwrap_or(false)
            })
            .map(|(&id, _)| id)
            .collect();

        for object_id in pending {
            if let Err(err) = self.read_stream_content(object_id) {
                warn!("could not read content of stream {}: {err}", object_id.0);
            }
        }

        Ok(true)
    }

    /// Walk backwards from the `obj` keyword over the generation and object numbers. Returns
    /// the offset of the object number, or None if the bytes before the keyword do not look
    /// like an object header.
    fn object_header_start(buffer: &[u8], keyword: usize) -> Option<usize> {
        let mut position = keyword;

        let skip_backwards = |position: &mut usize, predicate: fn(u8) -> bool| {
            let mut count = 0;
            while *position > 0 && predicate(buffer[*position - 1]) {
                *position -= 1;
                count += 1;
            }
            count
        };

        if skip_backwards(&mut position, |c| c.is_ascii_whitespace()) == 0 {
            return None;
        }
        if skip_backwards(&mut position, |c| c.is_ascii_digit()) == 0 {
            return None;
        }
        if skip_backwards(&mut position, |c| c.is_ascii_whitespace()) == 0 {
            return None;
        }
        if skip_backwards(&mut position, |c| c.is_ascii_digit()) == 0 {
            return None;
        }

        Some(position)
    }

    fn read_stream_content(&mut self, object_id: ObjectId) -> Result<()> {
        let length = self.get_stream_length(object_id)?;
        let stream = self
            .document
            .get_object_mut(object_id)
            .and_then(Object::as_stream_mut)?;
        let start = stream
            .start_position
            .ok_or(Error::InvalidStream("missing start position".to_string()))?;

        if length < 0 {
            return Err(Error::InvalidStream("negative stream length".to_string()));
        }

        let length = usize::try_from(length).map_err(|e| Error::NumericCast(e.to_string()))?;
        let end = start + length;

        if end > self.buffer.len() {
            return Err(Error::InvalidStream("stream extends after document end".to_string()));
        }

        stream.set_content(self.buffer[start..end].to_vec());
        Ok(())
    }

    fn get_stream_length(&self, object_id: ObjectId) -> Result<i64> {
        let object = self.document.get_object(object_id)?;
        let stream = object.as_stream()?;
        stream
            .dict
            .get(b"Length")
            .and_then(|value| self.document.dereference(value))
            .and_then(|(_id, object)| object.as_i64())
            .inspect_err(|_err| {
                warn!(
                    "stream dictionary of '{} {} R' is missing the Length entry",
                    object_id.0, object_id.1
                );
            })
    }

    /// Get object offset by object id.
    fn get_offset(&self, id: ObjectId) -> Result<u32> {
        let entry = self.document.reference_table.get(id.0).ok_or(Error::ObjectNotFound(id))?;
        match *entry {
            XrefEntry::Normal { offset, generation } if generation == id.1 => Ok(offset),
            _ => Err(Error::ObjectNotFound(id)),
        }
    }

    pub fn get_object(&self, id: ObjectId, already_seen: &mut HashSet<ObjectId>) -> Result<Object> {
        if already_seen.contains(&id) {
            warn!("reference cycle detected resolving object {} {}", id.0, id.1);
            return Err(Error::ReferenceCycle(id));
        }
        already_seen.insert(id);

        let offset = self.get_offset(id)?;
        let (_, object) = self.read_object(offset as usize, Some(id), already_seen)?;

        Ok(object)
    }

    fn read_object(
        &self, offset: usize, expected_id: Option<ObjectId>, already_seen: &mut HashSet<ObjectId>,
    ) -> Result<(ObjectId, Object)> {
        if offset > self.buffer.len() {
            return Err(Error::InvalidOffset(offset));
        }

        parser::indirect_object(
            ParserInput::new_extra(self.buffer, "indirect object"),
            offset,
            expected_id,
            self,
            already_seen,
        )
    }

    fn get_xref_start(buffer: &[u8]) -> Result<usize> {
        // The %%EOF marker is normally in the last few bytes; when a producer appended
        // more trailing garbage than the window covers, search the whole buffer for the
        // final marker instead.
        let seek_pos = buffer.len() - cmp::min(buffer.len(), 512);
        Self::search_substring(buffer, b"%%EOF", seek_pos)
            .or_else(|| Self::search_substring(buffer, b"%%EOF", 0))
            .and_then(|eof_pos| if eof_pos > 25 { Some(eof_pos) } else { None })
            .and_then(|eof_pos| Self::search_substring(buffer, b"startxref", eof_pos - 25))
            .ok_or(Error::Xref(XrefError::Start))
            .and_then(|xref_pos| {
                if xref_pos <= buffer.len() {
                    match parser::xref_start(ParserInput::new_extra(&buffer[xref_pos..], "xref")) {
                        Some(startxref) => Ok(startxref as usize),
                        None => Err(Error::Xref(XrefError::Start)),
                    }
                } else {
                    Err(Error::Xref(XrefError::Start))
                }
            })
    }

    fn search_substring(buffer: &[u8], pattern: &[u8], start_pos: usize) -> Option<usize> {
        let mut seek_pos = start_pos;
        let mut index = 0;

        while seek_pos < buffer.len() && index < pattern.len() {
            if buffer[seek_pos] == pattern[index] {
                index += 1;
            } else if index > 0 {
                seek_pos -= index;
                index = 0;
            }
            seek_pos += 1;

            if index == pattern.len() {
                let res = seek_pos - index;
                return Self::search_substring(buffer, pattern, res + 1).or(Some(res));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_pdf() -> Vec<u8> {
        let body = "%PDF-1.5\n\
                    1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
                    2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n\
                    3 0 obj<</Type/Page/Parent 2 0 R/Contents 4 0 R>>endobj\n\
                    4 0 obj<</Length 45>>stream\n\
                    BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET\n\
                    endstream\nendobj\n";
        let offsets: Vec<usize> = (1..=4)
            .map(|id| body.find(&format!("{id} 0 obj")).unwrap())
            .collect();

        let mut xref = String::from("xref\n0 5\n0000000000 65535 f \n");
        for offset in &offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<</Root 1 0 R/Size 5>>\nstartxref\n{}\n%%EOF\n",
            body.len()
        ));

        format!("{body}{xref}").into_bytes()
    }

    #[test]
    fn load_simple_document() {
        let document = Document::load_mem(&simple_pdf()).unwrap();

        assert_eq!(document.version, "1.5");
        assert_eq!(document.objects.len(), 4);

        let content = document
            .get_object((4, 0))
            .and_then(Object::as_stream)
            .map(|stream| stream.content.clone())
            .unwrap();
        assert_eq!(content, b"BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET\n");
    }

    #[test]
    fn load_document_with_preceding_bytes() {
        let mut content = Vec::new();
        content.extend(b"garbage");
        content.extend(simple_pdf());

        let document = Document::load_mem(&content).unwrap();
        assert_eq!(document.version, "1.5");
        assert_eq!(document.objects.len(), 4);
    }

    #[test]
    #[should_panic(expected = "Xref(Start)")]
    fn load_short_document() {
        let _doc = Document::load_mem(b"%PDF-1.5\n%%EOF\n").unwrap();
    }

    #[test]
    fn recover_document_with_broken_startxref() {
        let pdf = String::from_utf8(simple_pdf()).unwrap();
        let broken = pdf.replace(&format!("startxref\n{}", pdf.find("xref").unwrap()), "startxref\n9999999");

        let document = Document::load_mem(broken.as_bytes()).unwrap();
        assert_eq!(document.objects.len(), 4);
        assert!(document.trailer.get(b"Root").is_ok());
        assert_eq!(
            document
                .get_object((4, 0))
                .and_then(Object::as_stream)
                .unwrap()
                .content,
            b"BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET\n".to_vec()
        );
    }

    #[test]
    fn find_xref_behind_long_trailing_garbage() {
        let mut content = simple_pdf();
        // An object header in the garbage would only show up if the document had to be
        // rebuilt by the recovery scan.
        content.extend(b"9 0 obj (junk) endobj\n");
        content.extend(vec![b'%'; 2048]);

        let document = Document::load_mem(&content).unwrap();
        assert_eq!(document.objects.len(), 4);
        assert!(document.get_object((9, 0)).is_err());
    }

    #[test]
    fn recover_document_without_trailer() {
        let body = "%PDF-1.4\n\
                    1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
                    2 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\n";

        let document = Document::load_mem(body.as_bytes()).unwrap();
        assert_eq!(document.objects.len(), 2);
        // The catalog found in the scan becomes the /Root entry.
        assert_eq!(
            document.trailer.get(b"Root").and_then(Object::as_reference).unwrap(),
            (1, 0)
        );
    }
}
