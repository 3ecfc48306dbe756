mod algorithms;
pub mod crypt;
mod pkcs5;
mod rc4;

use std::collections::BTreeMap;

use bitflags::bitflags;
use rand::RngExt as _;
use thiserror::Error;

use crate::{Dictionary, Document, Error, Object, ObjectId};
use crypt::CryptMethod;

pub use algorithms::PasswordAlgorithm;

#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("the /Encrypt dictionary is missing")]
    MissingEncryptDictionary,
    #[error("missing encryption version")]
    MissingVersion,
    #[error("missing encryption revision")]
    MissingRevision,
    #[error("missing the owner password (/O)")]
    MissingOwnerPassword,
    #[error("missing the user password (/U)")]
    MissingUserPassword,
    #[error("missing the permissions field (/P)")]
    MissingPermissions,
    #[error("missing the file /ID elements")]
    MissingFileID,

    #[error("invalid encryption version")]
    InvalidVersion,
    #[error("invalid key length")]
    InvalidKeyLength,
    #[error("invalid hash length")]
    InvalidHashLength,
    #[error("invalid ciphertext length")]
    InvalidCipherTextLength,
    #[error("invalid revision")]
    InvalidRevision,
    // Used generically when an encryption dictionary entry has the wrong type
    #[error("unexpected type in encryption dictionary")]
    InvalidType,
    #[error("invalid padding")]
    Padding,

    #[error("the supplied password is incorrect")]
    IncorrectPassword,

    #[error("the encryption version is not implemented")]
    UnsupportedVersion,
    #[error("the encryption revision is not implemented")]
    UnsupportedRevision,

    #[error(transparent)]
    StringPrep(#[from] stringprep::Error),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub struct Permissions: u64 {
        /// (Security handlers of revision 2) Print the document.
        /// (Security handlers of revision 3 or greater) Print the document (possibly not at the
        /// highest quality level, depending on whether [`Permissions::PRINTABLE_IN_HIGH_QUALITY`]
        /// is also set).
        const PRINTABLE = 1 << 3;

        /// Modify the contents of the document by operations other than those controlled by
        /// [`Permissions::ANNOTABLE`], [`Permissions::FILLABLE`] and [`Permissions::ASSEMBLABLE`].
        const MODIFIABLE = 1 << 4;

        /// Copy or otherwise extract text and graphics from the document. However, for the limited
        /// purpose of providing this content to assistive technology, a PDF reader should behave
        /// as if this bit was set to 1.
        const COPYABLE = 1 << 5;

        /// Add or modify text annotations, fill in interactive form fields, and if
        /// [`Permissions::MODIFIABLE`] is also set, create or modify interactive form fields
        /// (including signature fields).
        const ANNOTABLE = 1 << 6;

        /// Fill in existing interactive fields (including signature fields), even if
        /// [`Permissions::ANNOTABLE`] is clear.
        const FILLABLE = 1 << 9;

        /// Copy or otherwise extract text and graphics from the document for the purpose of
        /// providing this content to assistive technology.
        ///
        /// Deprecated since PDF 2.0: must always be set for backward compatibility with PDF
        /// viewers following earlier specifications.
        const COPYABLE_FOR_ACCESSIBILITY = 1 << 10;

        /// (Security handlers of revision 3 or greater) Assemble the document (insert, rotate, or
        /// delete pages and create document outline items or thumbnail images), even if
        /// [`Permissions::MODIFIABLE`] is not set.
        const ASSEMBLABLE = 1 << 11;

        /// (Security handlers of revision 3 or greater) Print the document to a representation
        /// from which a faithful copy of the PDF content could be generated, based on an
        /// implementation-dependent algorithm. When this bit is clear (and
        /// [`Permissions::PRINTABLE`] is set), printing shall be limited to a low-level
        /// representation of the appearance, possibly of degraded quality.
        const PRINTABLE_IN_HIGH_QUALITY = 1 << 12;
    }
}

impl Permissions {
    /// The value of the /P entry with all reserved bits set as required.
    pub fn p_value(&self) -> u64 {
        self.bits() |
        // 7-8: Reserved. Must be 1.
        (0b11 << 7) |
        // 13-32: Reserved. Must be 1.
        (0b111 << 13) | (0xffff << 16) |
        // Extend the permissions (contents of the P integer) to 64 bits by setting the upper 32
        // bits to all 1s.
        (0xffffffff << 32)
    }
}

/// The parameters a document shall be encrypted with.
///
/// Each variant corresponds to one value of the /V entry of the encryption
/// dictionary and fixes the revision used with it: V1 uses revision 2 with
/// 40-bit RC4, V2 uses revision 3, V4 uses revision 4 with AES-128 crypt
/// filters and V5 uses revision 6 with AES-256 crypt filters.
#[derive(Clone, Copy, Debug)]
pub enum EncryptionVersion<'a> {
    V1 {
        document: &'a Document,
        owner_password: &'a str,
        user_password: &'a str,
        permissions: Permissions,
    },
    V2 {
        document: &'a Document,
        owner_password: &'a str,
        user_password: &'a str,
        /// The file encryption key length in bits, a multiple of 8 between 40 and 128.
        key_length: usize,
        permissions: Permissions,
    },
    V4 {
        document: &'a Document,
        encrypt_metadata: bool,
        owner_password: &'a str,
        user_password: &'a str,
        permissions: Permissions,
    },
    V5 {
        encrypt_metadata: bool,
        owner_password: &'a str,
        user_password: &'a str,
        permissions: Permissions,
    },
}

/// Everything needed to decrypt or encrypt the objects of one document:
/// the file encryption key, the resolved crypt methods and the password
/// hashes that go into (or came from) the encryption dictionary.
#[derive(Clone, Debug)]
pub struct EncryptionState {
    pub crypt_filters: BTreeMap<Vec<u8>, CryptMethod>,
    pub file_encryption_key: Vec<u8>,
    pub stream_method: CryptMethod,
    pub string_method: CryptMethod,
    pub encrypt_metadata: bool,
    pub version: i64,
    pub revision: i64,
    pub key_length: Option<usize>,
    pub owner_value: Vec<u8>,
    pub owner_encrypted: Vec<u8>,
    pub user_value: Vec<u8>,
    pub user_encrypted: Vec<u8>,
    pub permissions: Permissions,
    pub permission_encrypted: Vec<u8>,
}

impl EncryptionState {
    /// Authenticate `password` against the document's encryption dictionary and
    /// recover the file encryption key.
    ///
    /// The password is tried as the user password first and as the owner
    /// password second. For revision 4 and earlier the owner path recovers the
    /// user password from the /O entry, since that recovered password is what
    /// the file encryption key is derived from.
    pub fn decode(document: &Document, password: &str) -> Result<Self, Error> {
        if !document.is_encrypted() {
            return Err(Error::NotEncrypted);
        }

        // The name of the preferred security handler for this document. It shall be the name of
        // the security handler that was used to encrypt the document.
        //
        // Standard shall be the name of the built-in password-based security handler.
        let filter = document
            .get_encrypted()
            .and_then(|dict| dict.get(b"Filter"))
            .and_then(|object| object.as_name())
            .map_err(|_| Error::DictKey("Filter".to_string()))?;

        if filter != b"Standard" {
            return Err(Error::UnsupportedSecurityHandler(
                String::from_utf8_lossy(filter).into_owned(),
            ));
        }

        // An /Encrypt dictionary with a version this crate does not implement is an
        // unsupported handler, not a password failure.
        let algorithm = PasswordAlgorithm::try_from(document).map_err(|err| match err {
            Error::Decryption(cause @ (DecryptionError::InvalidVersion | DecryptionError::UnsupportedVersion)) => {
                Error::UnsupportedSecurityHandler(cause.to_string())
            }
            other => other,
        })?;

        if !(2..=6).contains(&algorithm.revision) {
            return Err(Error::UnsupportedSecurityHandler(format!(
                "encryption revision {}",
                algorithm.revision
            )));
        }

        let password = algorithm.sanitize_password(password)?;

        let file_encryption_key = match algorithm.revision {
            2..=4 => {
                if algorithm.authenticate_user_password(document, &password).is_ok() {
                    algorithm.compute_file_encryption_key(document, &password)?
                } else {
                    // Decrypting the /O entry with the owner password yields the padded user
                    // password, which both authenticates and keys the document.
                    let recovered = algorithm.recover_user_password_r4(&password)?;
                    algorithm.authenticate_user_password(document, &recovered)?;
                    algorithm.compute_file_encryption_key(document, &recovered)?
                }
            }
            // Algorithm 2.A already distinguishes the owner and user paths internally.
            5..=6 => algorithm.compute_file_encryption_key(document, &password)?,
            _ => return Err(DecryptionError::UnsupportedRevision)?,
        };

        let crypt_filters = document.get_crypt_filters();

        // Resolve the default crypt methods for streams and strings once. V1 and V2 encryption
        // always uses RC4; V4 and V5 name the filters via StmF and StrF, with Identity as the
        // default when an entry is absent.
        let (stream_method, string_method) = if algorithm.version <= 2 {
            (CryptMethod::Rc4, CryptMethod::Rc4)
        } else {
            let lookup = |key: &[u8]| {
                document
                    .get_encrypted()
                    .and_then(|dict| dict.get(key))
                    .and_then(|object| object.as_name())
                    .ok()
                    .and_then(|name| crypt_filters.get(name).copied())
                    .unwrap_or(CryptMethod::Identity)
            };

            (lookup(b"StmF"), lookup(b"StrF"))
        };

        Ok(Self {
            crypt_filters,
            file_encryption_key,
            stream_method,
            string_method,
            encrypt_metadata: algorithm.encrypt_metadata,
            version: algorithm.version,
            revision: algorithm.revision,
            key_length: algorithm.length,
            owner_value: algorithm.owner_value,
            owner_encrypted: algorithm.owner_encrypted,
            user_value: algorithm.user_value,
            user_encrypted: algorithm.user_encrypted,
            permissions: algorithm.permissions,
            permission_encrypted: algorithm.permission_encrypted,
        })
    }

    /// Build the /Encrypt dictionary describing this state.
    pub fn encryption_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Filter", Object::Name(b"Standard".to_vec()));
        dict.set("V", self.version);
        dict.set("R", self.revision);

        if let Some(length) = self.key_length {
            dict.set("Length", length as i64);
        }

        dict.set("O", Object::string_literal(self.owner_value.clone()));
        dict.set("U", Object::string_literal(self.user_value.clone()));
        dict.set("P", self.permissions.bits() as i64);

        if self.version >= 4 {
            let mut filter = Dictionary::new();

            filter.set("Type", Object::Name(b"CryptFilter".to_vec()));
            filter.set("CFM", Object::Name(self.stream_method.name().to_vec()));
            filter.set("AuthEvent", Object::Name(b"DocOpen".to_vec()));
            filter.set(
                "Length",
                if self.stream_method == CryptMethod::Aes256 { 32i64 } else { 16 },
            );

            let mut crypt_filters = Dictionary::new();
            crypt_filters.set("StdCF", filter);

            dict.set("CF", crypt_filters);
            dict.set("StmF", Object::Name(b"StdCF".to_vec()));
            dict.set("StrF", Object::Name(b"StdCF".to_vec()));
            dict.set("EncryptMetadata", self.encrypt_metadata);
        }

        if self.revision >= 5 {
            dict.set("OE", Object::string_literal(self.owner_encrypted.clone()));
            dict.set("UE", Object::string_literal(self.user_encrypted.clone()));
            dict.set("Perms", Object::string_literal(self.permission_encrypted.clone()));
        }

        dict
    }
}

impl<'a> TryFrom<EncryptionVersion<'a>> for EncryptionState {
    type Error = Error;

    fn try_from(version: EncryptionVersion<'a>) -> Result<Self, Self::Error> {
        match version {
            EncryptionVersion::V1 {
                document,
                owner_password,
                user_password,
                permissions,
            } => Self::from_passwords_r4(document, 1, 2, None, true, owner_password, user_password, permissions),
            EncryptionVersion::V2 {
                document,
                owner_password,
                user_password,
                key_length,
                permissions,
            } => {
                if key_length % 8 != 0 || !(40..=128).contains(&key_length) {
                    return Err(DecryptionError::InvalidKeyLength)?;
                }

                Self::from_passwords_r4(
                    document,
                    2,
                    3,
                    Some(key_length),
                    true,
                    owner_password,
                    user_password,
                    permissions,
                )
            }
            EncryptionVersion::V4 {
                document,
                encrypt_metadata,
                owner_password,
                user_password,
                permissions,
            } => {
                let mut state = Self::from_passwords_r4(
                    document,
                    4,
                    4,
                    Some(128),
                    encrypt_metadata,
                    owner_password,
                    user_password,
                    permissions,
                )?;

                state.stream_method = CryptMethod::Aes128;
                state.string_method = CryptMethod::Aes128;
                state.crypt_filters.insert(b"StdCF".to_vec(), CryptMethod::Aes128);

                Ok(state)
            }
            EncryptionVersion::V5 {
                encrypt_metadata,
                owner_password,
                user_password,
                permissions,
            } => Self::from_passwords_r6(encrypt_metadata, owner_password, user_password, permissions),
        }
    }
}

impl EncryptionState {
    #[allow(clippy::too_many_arguments)]
    fn from_passwords_r4(
        document: &Document,
        version: i64,
        revision: i64,
        key_length: Option<usize>,
        encrypt_metadata: bool,
        owner_password: &str,
        user_password: &str,
        permissions: Permissions,
    ) -> Result<Self, Error> {
        // The /P entry carries the permission flags with all reserved bits set; the key
        // derivation hashes that exact value, so the state keeps it in the same form.
        let permissions = Permissions::from_bits_retain(permissions.p_value());

        let mut algorithm = PasswordAlgorithm {
            encrypt_metadata,
            length: key_length,
            version,
            revision,
            permissions,
            ..Default::default()
        };

        let owner_password = algorithm.sanitize_password_r4(owner_password)?;
        let user_password = algorithm.sanitize_password_r4(user_password)?;

        // The O entry participates in the user password hash, so it has to be computed first.
        algorithm.owner_value = algorithm.compute_hashed_owner_password_r4(Some(&owner_password), &user_password)?;
        algorithm.user_value = match revision {
            2 => algorithm.compute_hashed_user_password_r2(document, &user_password)?,
            _ => algorithm.compute_hashed_user_password_r3_r4(document, &user_password)?,
        };

        let file_encryption_key = algorithm.compute_file_encryption_key_r4(document, &user_password)?;

        Ok(Self {
            crypt_filters: BTreeMap::new(),
            file_encryption_key,
            stream_method: CryptMethod::Rc4,
            string_method: CryptMethod::Rc4,
            encrypt_metadata,
            version,
            revision,
            key_length,
            owner_value: algorithm.owner_value,
            owner_encrypted: vec![],
            user_value: algorithm.user_value,
            user_encrypted: vec![],
            permissions,
            permission_encrypted: vec![],
        })
    }

    fn from_passwords_r6(
        encrypt_metadata: bool,
        owner_password: &str,
        user_password: &str,
        permissions: Permissions,
    ) -> Result<Self, Error> {
        let permissions = Permissions::from_bits_retain(permissions.p_value());

        let mut algorithm = PasswordAlgorithm {
            encrypt_metadata,
            length: Some(256),
            version: 5,
            revision: 6,
            permissions,
            ..Default::default()
        };

        let owner_password = algorithm.sanitize_password_r6(owner_password)?;
        let user_password = algorithm.sanitize_password_r6(user_password)?;

        // The file encryption key is not derived from the passwords for revision 6; it is drawn
        // from a strong random number generator and wrapped by them instead.
        let mut file_encryption_key = [0u8; 32];

        let mut rng = rand::rng();
        rng.fill(&mut file_encryption_key);

        let (user_value, user_encrypted) =
            algorithm.compute_hashed_user_password_r6(file_encryption_key, &user_password)?;

        algorithm.user_value = user_value;
        algorithm.user_encrypted = user_encrypted;

        // The U entry participates in the owner password hash, so it has to be computed first.
        let (owner_value, owner_encrypted) =
            algorithm.compute_hashed_owner_password_r6(file_encryption_key, &owner_password)?;

        algorithm.owner_value = owner_value;
        algorithm.owner_encrypted = owner_encrypted;

        algorithm.permission_encrypted = algorithm.compute_permissions(file_encryption_key)?;

        let mut crypt_filters = BTreeMap::new();
        crypt_filters.insert(b"StdCF".to_vec(), CryptMethod::Aes256);

        Ok(Self {
            crypt_filters,
            file_encryption_key: file_encryption_key.to_vec(),
            stream_method: CryptMethod::Aes256,
            string_method: CryptMethod::Aes256,
            encrypt_metadata,
            version: 5,
            revision: 6,
            key_length: Some(256),
            owner_value: algorithm.owner_value,
            owner_encrypted: algorithm.owner_encrypted,
            user_value: algorithm.user_value,
            user_encrypted: algorithm.user_encrypted,
            permissions,
            permission_encrypted: algorithm.permission_encrypted,
        })
    }
}

/// The crypt method an object shall be processed with, or `None` when the
/// object is exempt from encryption.
fn resolve_method(state: &EncryptionState, obj: &Object) -> Option<CryptMethod> {
    // The cross-reference stream shall not be encrypted and strings appearing in the
    // cross-reference stream dictionary shall not be encrypted.
    if let Ok(stream) = obj.as_stream() {
        if stream.dict.type_is(b"XRef") {
            return None;
        }

        // When document metadata is left in the clear, the metadata stream passes through
        // unchanged.
        if !state.encrypt_metadata && stream.dict.type_is(b"Metadata") {
            return None;
        }

        // A stream filter type, the Crypt filter can be specified for any stream in the document
        // to override the default filter for streams. The stream's DecodeParms entry shall
        // contain a Crypt filter decode parameters dictionary whose Name entry specifies the
        // particular crypt filter that shall be used (if missing, Identity is used).
        let has_crypt_filter = stream
            .filters()
            .map(|filters| filters.contains(&&b"Crypt"[..]))
            .unwrap_or(false);

        if has_crypt_filter {
            let method = stream
                .dict
                .get(b"DecodeParms")
                .and_then(Object::as_dict)
                .ok()
                .and_then(|dict| dict.get(b"Name").and_then(|object| object.as_name()).ok())
                .and_then(|name| state.crypt_filters.get(name).copied())
                .unwrap_or(CryptMethod::Identity);

            return Some(method);
        }

        return Some(state.stream_method);
    }

    match obj {
        Object::String(..) => Some(state.string_method),
        _ => None,
    }
}

/// Encrypts `obj`.
pub fn encrypt_object(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object) -> Result<(), DecryptionError> {
    // Encryption applies to all strings and streams in the document's PDF file, i.e., we have to
    // recursively process array and dictionary objects to encrypt any string and stream objects
    // stored inside of those.
    match obj {
        Object::Array(objects) => {
            for obj in objects {
                encrypt_object(state, obj_id, obj)?;
            }

            return Ok(());
        }
        Object::Dictionary(objects) => {
            for (_, obj) in objects.iter_mut() {
                encrypt_object(state, obj_id, obj)?;
            }

            return Ok(());
        }
        _ => (),
    }

    let Some(method) = resolve_method(state, obj) else {
        return Ok(());
    };

    // Compute the key from the original file encryption key and the object identifier to use for
    // the corresponding object.
    let key = method.compute_key(&state.file_encryption_key, obj_id)?;

    match obj {
        Object::Stream(stream) => {
            let ciphertext = method.encrypt(&key, &stream.content)?;
            stream.set_content(ciphertext);
        }
        Object::String(content, _) => *content = method.encrypt(&key, content)?,
        _ => (),
    }

    Ok(())
}

/// Decrypts `obj`.
pub fn decrypt_object(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object) -> Result<(), DecryptionError> {
    // Encryption applies to all strings and streams in the document's PDF file, i.e., we have to
    // recursively process array and dictionary objects to decrypt any string and stream objects
    // stored inside of those.
    match obj {
        Object::Array(objects) => {
            for obj in objects {
                decrypt_object(state, obj_id, obj)?;
            }

            return Ok(());
        }
        Object::Dictionary(objects) => {
            for (_, obj) in objects.iter_mut() {
                decrypt_object(state, obj_id, obj)?;
            }

            return Ok(());
        }
        _ => (),
    }

    let Some(method) = resolve_method(state, obj) else {
        return Ok(());
    };

    // Compute the key from the original file encryption key and the object identifier to use for
    // the corresponding object.
    let key = method.compute_key(&state.file_encryption_key, obj_id)?;

    match obj {
        Object::Stream(stream) => {
            let plaintext = method.decrypt(&key, &stream.content)?;
            stream.set_content(plaintext);
        }
        Object::String(content, _) => *content = method.decrypt(&key, content)?,
        _ => (),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dictionary, Stream};

    fn state_with(stream_method: CryptMethod, string_method: CryptMethod, key: Vec<u8>) -> EncryptionState {
        EncryptionState {
            crypt_filters: BTreeMap::new(),
            file_encryption_key: key,
            stream_method,
            string_method,
            encrypt_metadata: true,
            version: 2,
            revision: 3,
            key_length: Some(128),
            owner_value: vec![],
            owner_encrypted: vec![],
            user_value: vec![],
            user_encrypted: vec![],
            permissions: Permissions::all(),
            permission_encrypted: vec![],
        }
    }

    #[test]
    fn object_round_trip_recurses_into_containers() {
        let state = state_with(CryptMethod::Rc4, CryptMethod::Rc4, vec![0x42; 16]);

        let mut object = Object::Dictionary(dictionary! {
            "Title" => Object::string_literal("uncovered"),
            "Kids" => vec![Object::string_literal("nested"), Object::Integer(7)],
        });
        let original = object.clone();

        encrypt_object(&state, (3, 0), &mut object).unwrap();
        assert_ne!(
            object.as_dict().unwrap().get(b"Title").unwrap().as_str().unwrap(),
            b"uncovered"
        );

        decrypt_object(&state, (3, 0), &mut object).unwrap();
        assert_eq!(format!("{:?}", object), format!("{:?}", original));
    }

    #[test]
    fn xref_streams_pass_through() {
        let state = state_with(CryptMethod::Rc4, CryptMethod::Rc4, vec![0x42; 16]);

        let mut object = Object::Stream(Stream::new(dictionary! { "Type" => "XRef" }, b"raw".to_vec()));

        encrypt_object(&state, (1, 0), &mut object).unwrap();
        assert_eq!(object.as_stream().unwrap().content, b"raw");
    }

    #[test]
    fn unencrypted_metadata_passes_through() {
        let mut state = state_with(CryptMethod::Aes128, CryptMethod::Aes128, vec![0x42; 16]);
        state.encrypt_metadata = false;

        let mut object = Object::Stream(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            b"<xmp/>".to_vec(),
        ));

        encrypt_object(&state, (4, 0), &mut object).unwrap();
        assert_eq!(object.as_stream().unwrap().content, b"<xmp/>");
    }

    #[test]
    fn crypt_filter_override_defaults_to_identity() {
        let state = state_with(CryptMethod::Aes128, CryptMethod::Aes128, vec![0x42; 16]);

        let mut object = Object::Stream(Stream::new(
            dictionary! {
                "Filter" => "Crypt",
                "DecodeParms" => dictionary! { "Type" => "CryptFilterDecodeParms" },
            },
            b"already plain".to_vec(),
        ));

        encrypt_object(&state, (5, 0), &mut object).unwrap();
        assert_eq!(object.as_stream().unwrap().content, b"already plain");
    }

    #[test]
    fn decode_reports_unknown_versions_as_unsupported_handler() {
        let mut document = Document::with_version("1.7");
        let encrypt = document.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 7,
        });
        document.trailer.set("Encrypt", Object::Reference(encrypt));

        assert!(matches!(
            EncryptionState::decode(&document, ""),
            Err(Error::UnsupportedSecurityHandler(_))
        ));
    }

    #[test]
    fn p_value_sets_reserved_bits() {
        let permissions = Permissions::PRINTABLE | Permissions::COPYABLE;
        let p = permissions.p_value();

        assert_eq!(p & 0b11 << 7, 0b11 << 7);
        assert_eq!(p >> 32, 0xffffffff);
        assert_eq!(p & Permissions::PRINTABLE.bits(), Permissions::PRINTABLE.bits());
        assert_eq!(p & Permissions::MODIFIABLE.bits(), 0);
    }
}
