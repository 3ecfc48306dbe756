use std::collections::{BTreeMap, HashSet};

use log::warn;

use crate::encryption::crypt::CryptMethod;
use crate::encryption::{self, EncryptionState};
use crate::object_stream::ObjectStream;
use crate::xref::Xref;
use crate::{Dictionary, Error, Object, ObjectId, Result};

/// A PDF document.
///
/// Holds the objects of the newest revision of the file, keyed by object
/// identifier, together with the merged trailer dictionary.
#[derive(Debug, Clone)]
pub struct Document {
    /// The version of the PDF specification to which the file conforms.
    pub version: String,

    /// The binary comment following the header, marking the file as binary data.
    pub binary_mark: Vec<u8>,

    /// The trailer gives the location of the cross-reference table and of certain special
    /// objects.
    pub trailer: Dictionary,

    /// The cross-reference table contains locations of the indirect objects.
    pub reference_table: Xref,

    /// The objects that make up the document contained in the file.
    pub objects: BTreeMap<ObjectId, Object>,

    /// Current maximum object id within the document.
    pub max_id: u32,

    /// The state of the standard security handler once the document has been decrypted or
    /// encrypted.
    pub encryption_state: Option<EncryptionState>,
}

impl Document {
    /// Create new PDF document.
    pub fn new() -> Self {
        Self {
            version: "1.4".to_string(),
            binary_mark: vec![0xBB, 0xAD, 0xC0, 0xDE],
            trailer: Dictionary::new(),
            reference_table: Xref::new(0, crate::xref::XrefType::CrossReferenceTable),
            objects: BTreeMap::new(),
            max_id: 0,
            encryption_state: None,
        }
    }

    /// Create new PDF document with the given specification version.
    pub fn with_version<S: Into<String>>(version: S) -> Self {
        let mut document = Self::new();
        document.version = version.into();
        document
    }

    /// Follow a chain of references and return the id and value of the object they point at.
    pub fn dereference<'a>(&'a self, mut object: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        let mut id = None;
        let mut seen = HashSet::new();

        while let Ok(ref_id) = object.as_reference() {
            if !seen.insert(ref_id) {
                return Err(Error::ReferenceCycle(ref_id));
            }

            id = Some(ref_id);
            object = self.objects.get(&ref_id).ok_or(Error::ObjectNotFound(ref_id))?;
        }

        Ok((id, object))
    }

    /// Get object by object id, dereferencing it if it is a reference.
    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        let object = self.objects.get(&id).ok_or(Error::ObjectNotFound(id))?;
        Ok(self.dereference(object)?.1)
    }

    /// Get mutable reference to the object stored under `id`.
    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::ObjectNotFound(id))
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Add an object to the document and return its newly assigned id.
    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.max_id += 1;
        let id = (self.max_id, 0);
        self.objects.insert(id, object.into());
        id
    }

    /// Get the encryption dictionary, following the trailer's /Encrypt entry.
    pub fn get_encrypted(&self) -> Result<&Dictionary> {
        self.trailer
            .get(b"Encrypt")
            .and_then(|object| self.dereference(object).map(|(_, object)| object))
            .and_then(Object::as_dict)
    }

    /// Return true if the document is protected by the standard security handler.
    pub fn is_encrypted(&self) -> bool {
        self.get_encrypted().is_ok()
    }

    /// Collect the named crypt filters declared in the encryption dictionary's /CF entry.
    ///
    /// The Identity filter is always present and cannot be redefined. Filters with an
    /// unrecognized /CFM name are skipped with a warning; an object referring to one falls back
    /// to Identity.
    pub fn get_crypt_filters(&self) -> BTreeMap<Vec<u8>, CryptMethod> {
        let mut crypt_filters = BTreeMap::new();
        crypt_filters.insert(b"Identity".to_vec(), CryptMethod::Identity);

        let filters = self
            .get_encrypted()
            .and_then(|dict| dict.get(b"CF"))
            .and_then(|object| self.dereference(object).map(|(_, object)| object))
            .and_then(Object::as_dict);

        if let Ok(filters) = filters {
            for (name, filter) in filters.iter() {
                let method = filter
                    .as_dict()
                    .and_then(|dict| dict.get(b"CFM"))
                    .and_then(Object::as_name)
                    .ok()
                    .and_then(CryptMethod::from_name);

                match method {
                    Some(method) => {
                        crypt_filters.insert(name.clone(), method);
                    }
                    None => warn!("crypt filter {} has an unsupported method", String::from_utf8_lossy(name)),
                }
            }
        }

        crypt_filters
    }

    /// Authenticate `password` and decrypt all strings and streams in place.
    ///
    /// Object streams are expanded afterwards, since their containers only become readable once
    /// the document content has been decrypted. The /Encrypt entry is removed from the trailer,
    /// leaving an unprotected document.
    pub fn decrypt(&mut self, password: &str) -> Result<()> {
        let state = EncryptionState::decode(self, password)?;

        // Strings inside the encryption dictionary itself are not encrypted.
        let encrypt_id = self.trailer.get(b"Encrypt").and_then(Object::as_reference).ok();

        for (&id, object) in self.objects.iter_mut() {
            if Some(id) == encrypt_id {
                continue;
            }

            encryption::decrypt_object(&state, id, object)?;
        }

        self.expand_object_streams()?;

        self.trailer.remove(b"Encrypt");
        if let Some(encrypt_id) = encrypt_id {
            self.objects.remove(&encrypt_id);
            self.reference_table.entries.remove(&encrypt_id.0);
        }

        self.encryption_state = Some(state);

        Ok(())
    }

    /// Encrypt all strings and streams in place and install the corresponding /Encrypt entry.
    pub fn encrypt(&mut self, state: &EncryptionState) -> Result<()> {
        for (&id, object) in self.objects.iter_mut() {
            encryption::encrypt_object(state, id, object)?;
        }

        let encrypt_id = self.add_object(state.encryption_dictionary());
        self.trailer.set("Encrypt", Object::Reference(encrypt_id));

        self.encryption_state = Some(state.clone());

        Ok(())
    }

    /// Replace every `/Type /ObjStm` container with the objects it holds.
    ///
    /// Objects that are already present in the document take precedence, since a later revision
    /// may overwrite an object that an earlier revision stored compressed.
    pub fn expand_object_streams(&mut self) -> Result<()> {
        let container_ids: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| {
                object
                    .as_stream()
                    .map(|stream| stream.dict.type_is(b"ObjStm"))
                    .unwrap_or(false)
            })
            .map(|(&id, _)| id)
            .collect();

        for container_id in container_ids {
            let Some(Object::Stream(mut stream)) = self.objects.remove(&container_id) else {
                continue;
            };

            self.reference_table.entries.remove(&container_id.0);

            let object_stream = ObjectStream::new(&mut stream)?;

            for (id, object) in object_stream.objects {
                if let Some(entry) = self.reference_table.get(id.0) {
                    // Only adopt objects the cross-reference table still maps into this
                    // container.
                    if !entry.is_compressed() {
                        continue;
                    }
                }

                self.objects.entry(id).or_insert(object);
                self.max_id = self.max_id.max(id.0);
            }
        }

        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    #[test]
    fn dereference_follows_chains() {
        let mut document = Document::new();
        let target = document.add_object(Object::string_literal("payload"));
        let middle = document.add_object(Object::Reference(target));
        let entry = document.add_object(Object::Reference(middle));

        assert_eq!(document.get_object(entry).unwrap().as_str().unwrap(), b"payload");
    }

    #[test]
    fn dereference_detects_cycles() {
        let mut document = Document::new();
        let a = document.add_object(Object::Null);
        let b = document.add_object(Object::Reference(a));
        document.objects.insert(a, Object::Reference(b));

        assert!(matches!(document.get_object(a), Err(Error::ReferenceCycle(_))));
    }

    #[test]
    fn crypt_filters_always_contain_identity() {
        let document = Document::new();
        let filters = document.get_crypt_filters();
        assert_eq!(filters.get(&b"Identity"[..]), Some(&CryptMethod::Identity));
    }

    #[test]
    fn encrypt_dictionary_marks_document_encrypted() {
        let mut document = Document::new();
        assert!(!document.is_encrypted());

        let encrypt_id = document.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => 3,
        });
        document.trailer.set("Encrypt", Object::Reference(encrypt_id));

        assert!(document.is_encrypted());
    }
}
