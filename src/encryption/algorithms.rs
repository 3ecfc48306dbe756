use aes::cipher::{BlockDecryptMut as _, BlockEncryptMut as _, KeyInit as _, KeyIvInit as _};
use md5::{Digest as _, Md5};
use rand::RngExt as _;
use sha2::{Sha256, Sha384, Sha512};

use super::rc4::Rc4;
use super::DecryptionError;
use super::Permissions;
use crate::{Document, Error, Object};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// Filler appended to passwords shorter than 32 bytes in the revision 4 and
/// earlier derivations. An empty password hashes the whole constant.
const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes.
fn pad_password(password: &[u8]) -> [u8; 32] {
    let len = password.len().min(32);
    let mut padded = [0u8; 32];

    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD_BYTES[..32 - len]);
    padded
}

/// One RC4 pass over `data` with every byte of `base_key` XORed against the
/// round counter. The /O and /U derivations of revision 3 and 4 chain 19 of
/// these, forwards when computing the entries and backwards when undoing them.
fn rc4_xor_pass(base_key: &[u8], round: u8, data: &[u8]) -> Vec<u8> {
    let key: Vec<u8> = base_key.iter().map(|byte| byte ^ round).collect();
    Rc4::new(&key).encrypt(data)
}

/// AES-256-CBC with a zero IV and no padding, used to seal the 32-byte file
/// encryption key into the /UE and /OE entries.
fn wrap_file_key(key: &[u8], file_key: &[u8]) -> Vec<u8> {
    let mut kek = [0u8; 32];
    kek.copy_from_slice(key);

    let iv = [0u8; 16];
    let mut wrapped = file_key.to_vec();
    let mut encryptor = Aes256CbcEnc::new(&kek.into(), &iv.into());

    for block in wrapped.chunks_exact_mut(16) {
        encryptor.encrypt_block_mut(block.into());
    }

    wrapped
}

fn unwrap_file_key(key: &[u8], wrapped: &[u8]) -> Vec<u8> {
    let mut kek = [0u8; 32];
    kek.copy_from_slice(key);

    let iv = [0u8; 16];
    let mut file_key = wrapped.to_vec();
    let mut decryptor = Aes256CbcDec::new(&kek.into(), &iv.into());

    for block in file_key.chunks_exact_mut(16) {
        decryptor.decrypt_block_mut(block.into());
    }

    file_key
}

/// The /O and /U entries of revision 5 and later hold the password hash, the
/// validation salt and the key salt back to back.
fn split_hash_salts(value: &[u8]) -> (&[u8], &[u8], &[u8]) {
    (&value[..32], &value[32..40], &value[40..48])
}

/// Passwords are limited to 127 bytes of UTF-8 from revision 5 on.
fn truncate_password(password: &[u8]) -> &[u8] {
    &password[..password.len().min(127)]
}

/// The first element of the trailer /ID array, which seeds the legacy key
/// derivation and the revision 3/4 user password hash.
fn first_file_id(doc: &Document) -> Result<&[u8], DecryptionError> {
    doc.trailer
        .get(b"ID")
        .map_err(|_| DecryptionError::MissingFileID)?
        .as_array()
        .map_err(|_| DecryptionError::InvalidType)?
        .first()
        .ok_or(DecryptionError::InvalidType)?
        .as_str()
        .map_err(|_| DecryptionError::InvalidType)
}

/// The password checks and key derivations of the standard security handler,
/// collected from the fields of an `/Encrypt` dictionary.
#[derive(Clone, Debug, Default)]
pub struct PasswordAlgorithm {
    pub(crate) encrypt_metadata: bool,
    pub(crate) length: Option<usize>,
    pub(crate) version: i64,
    pub(crate) revision: i64,
    pub(crate) owner_value: Vec<u8>,
    pub(crate) owner_encrypted: Vec<u8>,
    pub(crate) user_value: Vec<u8>,
    pub(crate) user_encrypted: Vec<u8>,
    pub(crate) permissions: Permissions,
    pub(crate) permission_encrypted: Vec<u8>,
}

impl TryFrom<&Document> for PasswordAlgorithm {
    type Error = Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let encrypted = document
            .get_encrypted()
            .map_err(|_| DecryptionError::MissingEncryptDictionary)?;

        let encrypt_metadata = encrypted
            .get(b"EncryptMetadata")
            .unwrap_or(&Object::Boolean(true))
            .as_bool()
            .map_err(|_| DecryptionError::InvalidType)?;

        let length: Option<usize> = match encrypted.get(b"Length") {
            Ok(length) => Some(
                length
                    .as_i64()
                    .map_err(|_| DecryptionError::InvalidType)?
                    .try_into()
                    .map_err(|_| DecryptionError::InvalidType)?,
            ),
            Err(_) => None,
        };

        let version = encrypted
            .get(b"V")
            .map_err(|_| DecryptionError::MissingVersion)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)?;

        // V0 is undocumented and V3 unpublished; neither may appear in a conforming file.
        // Anything above V5 is a handler this crate does not know.
        match version {
            1 | 2 | 4 | 5 => (),
            0 | 3 => return Err(DecryptionError::InvalidVersion)?,
            _ => return Err(DecryptionError::UnsupportedVersion)?,
        }

        // /Length only belongs to V2 and V3 dictionaries, but producers write it for the
        // other versions too, with the value those versions imply.
        if let Some(length) = length {
            let valid = match version {
                1 => length == 40,
                2 => length % 8 == 0 && (40..=128).contains(&length),
                4 => length == 128,
                5 => length == 256,
                _ => false,
            };

            if !valid {
                return Err(DecryptionError::InvalidKeyLength)?;
            }
        }

        let revision = encrypted
            .get(b"R")
            .map_err(|_| DecryptionError::MissingRevision)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)?;

        let required = |key: &[u8], missing: DecryptionError| -> Result<Vec<u8>, DecryptionError> {
            encrypted
                .get(key)
                .map_err(|_| missing)?
                .as_str()
                .map(|value| value.to_vec())
                .map_err(|_| DecryptionError::InvalidType)
        };
        let optional = |key: &[u8]| -> Vec<u8> {
            encrypted
                .get(key)
                .and_then(Object::as_str)
                .map(|value| value.to_vec())
                .unwrap_or_default()
        };

        let owner_value = required(b"O", DecryptionError::MissingOwnerPassword)?;
        let user_value = required(b"U", DecryptionError::MissingUserPassword)?;

        // Through revision 4 the hashed passwords are 32 bytes; revision 5 and later append
        // the validation and key salts, growing them to 48.
        let hash_len = if revision >= 5 { 48 } else { 32 };
        if owner_value.len() != hash_len || user_value.len() != hash_len {
            return Err(DecryptionError::InvalidHashLength)?;
        }

        let owner_encrypted = optional(b"OE");
        let user_encrypted = optional(b"UE");
        let permission_encrypted = optional(b"Perms");

        // Revision 5 and later carry the wrapped file key in /OE and /UE and the sealed
        // permission block in /Perms.
        if revision >= 5
            && (owner_encrypted.len() != 32 || user_encrypted.len() != 32 || permission_encrypted.len() != 16)
        {
            return Err(DecryptionError::InvalidCipherTextLength)?;
        }

        let permission_value = encrypted
            .get(b"P")
            .map_err(|_| DecryptionError::MissingPermissions)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)? as u64;

        let permissions = Permissions::from_bits_retain(permission_value);

        Ok(Self {
            encrypt_metadata,
            length,
            version,
            revision,
            owner_value,
            owner_encrypted,
            user_value,
            user_encrypted,
            permissions,
            permission_encrypted,
        })
    }
}

impl PasswordAlgorithm {
    /// Encode a password for the revision 4 and earlier algorithms.
    ///
    /// These passwords are single-byte Latin-1 strings; a password with characters outside
    /// that range cannot have been used to encrypt the document.
    pub(crate) fn sanitize_password_r4(&self, password: &str) -> Result<Vec<u8>, DecryptionError> {
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(password);

        if unmappable {
            return Err(DecryptionError::IncorrectPassword);
        }

        Ok(bytes.into_owned())
    }

    /// Key length in bytes for the MD5-based derivations: 5 for revision 2, /Length
    /// divided by 8 from revision 3 on, never more than one MD5 digest.
    fn legacy_key_size(&self) -> Result<usize, DecryptionError> {
        let n = if self.revision >= 3 { self.length.unwrap_or(40) / 8 } else { 5 };

        if n > 16 {
            return Err(DecryptionError::InvalidKeyLength);
        }

        Ok(n)
    }

    /// Algorithm 2: derive the file encryption key from a password (revision 4 and
    /// earlier).
    pub(crate) fn compute_file_encryption_key_r4<P>(
        &self,
        doc: &Document,
        password: P,
    ) -> Result<Vec<u8>, DecryptionError>
    where
        P: AsRef<[u8]>,
    {
        let mut hasher = Md5::new();

        hasher.update(pad_password(password.as_ref()));
        hasher.update(&self.owner_value);
        // The /P value enters the hash as a 32-bit integer, low byte first.
        hasher.update((self.permissions.bits() as u32).to_le_bytes());
        hasher.update(first_file_id(doc)?);

        // Revision 4 marks unencrypted metadata in the key itself.
        if self.revision >= 4 && !self.encrypt_metadata {
            hasher.update(b"\xff\xff\xff\xff");
        }

        let mut hash = hasher.finalize();
        let n = self.legacy_key_size()?;

        // Revision 3 and 4 stretch the hash with 50 further MD5 rounds over the
        // key-sized prefix.
        if self.revision >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(&hash[..n]);
            }
        }

        Ok(hash[..n].to_vec())
    }

    /// Encode a password for the revision 5 and later algorithms: SASLprep, then UTF-8.
    pub(crate) fn sanitize_password_r6(&self, password: &str) -> Result<Vec<u8>, DecryptionError> {
        Ok(stringprep::saslprep(password)?.as_bytes().to_vec())
    }

    /// Algorithm 2.A: recover the file encryption key wrapped in /OE or /UE (revision 5
    /// and later).
    ///
    /// The owner path has to be tried first because its hash covers the /U value. A key
    /// recovered through the user path additionally has to open the /Perms block.
    pub(crate) fn compute_file_encryption_key_r6<P>(&self, password: P) -> Result<Vec<u8>, DecryptionError>
    where
        P: AsRef<[u8]>,
    {
        let password = truncate_password(password.as_ref());

        let (owner_hash, owner_validation_salt, owner_key_salt) = split_hash_salts(&self.owner_value);
        let (user_hash, user_validation_salt, user_key_salt) = split_hash_salts(&self.user_value);

        if self.compute_hash(password, owner_validation_salt, Some(&self.user_value))? == owner_hash {
            let key = self.compute_hash(password, owner_key_salt, Some(&self.user_value))?;

            return Ok(unwrap_file_key(&key, &self.owner_encrypted));
        }

        if self.compute_hash(password, user_validation_salt, None)? == user_hash {
            let key = self.compute_hash(password, user_key_salt, None)?;
            let file_key = unwrap_file_key(&key, &self.user_encrypted);

            self.validate_permissions(&file_key)?;

            return Ok(file_key);
        }

        Err(DecryptionError::IncorrectPassword)
    }

    /// Algorithm 2.B: the hardened password hash of revision 6.
    ///
    /// Revision 5 stops after the initial SHA-256. `user_key` is the 48-byte /U value
    /// and is only present on the owner path.
    fn compute_hash<P, S>(&self, password: P, salt: S, user_key: Option<&[u8]>) -> Result<Vec<u8>, DecryptionError>
    where
        P: AsRef<[u8]>,
        S: AsRef<[u8]>,
    {
        let password = password.as_ref();
        let salt = salt.as_ref();

        let mut hasher = Sha256::new();

        hasher.update(password);
        hasher.update(salt);

        if let Some(user_key) = user_key {
            hasher.update(user_key);
        }

        let mut k = hasher.finalize().to_vec();

        if self.revision == 5 {
            return Ok(k);
        }

        // Each round encrypts 64 repetitions of password + K (+ user key) with
        // AES-128-CBC keyed and IV'd from K itself, then hashes the ciphertext E with
        // SHA-256, -384 or -512 depending on its first 16 bytes modulo 3. The buffer
        // holding K1 and E is reused across rounds.
        let mut k1 = Vec::with_capacity(64 * (password.len() + 64 + user_key.map_or(0, <[u8]>::len)));

        for round in 1u32.. {
            k1.clear();

            for _ in 0..64 {
                k1.extend_from_slice(password);
                k1.extend_from_slice(&k);

                if let Some(user_key) = user_key {
                    k1.extend_from_slice(user_key);
                }
            }

            // The 64 repetitions keep the length a multiple of 16, so no padding.
            let key = &k[0..][..16];
            let iv = &k[16..][..16];

            let mut encryptor = Aes128CbcEnc::new(key.into(), iv.into());

            for block in k1.chunks_exact_mut(16) {
                encryptor.encrypt_block_mut(block.into());
            }

            let e = k1;

            // A big-endian value modulo 3 equals its byte sum modulo 3.
            k = match e[..16].iter().map(|v| *v as u32).sum::<u32>() % 3 {
                0 => Sha256::digest(&e).to_vec(),
                1 => Sha384::digest(&e).to_vec(),
                2 => Sha512::digest(&e).to_vec(),
                _ => unreachable!(),
            };

            // At least 64 rounds, then stop once the last ciphertext byte no longer
            // exceeds round - 32.
            if round >= 64 && u32::from(e.last().copied().unwrap_or(0)) <= round - 32 {
                break;
            }

            k1 = e;
        }

        k.truncate(32);

        Ok(k)
    }

    /// Algorithm 3: the /O entry, the padded user password encrypted under a key
    /// derived from the owner password (revision 4 and earlier).
    pub(crate) fn compute_hashed_owner_password_r4<O, U>(
        &self,
        owner_password: Option<O>,
        user_password: U,
    ) -> Result<Vec<u8>, DecryptionError>
    where
        O: AsRef<[u8]>,
        U: AsRef<[u8]>,
    {
        let user_password = user_password.as_ref();

        // Without a distinct owner password the user password takes its place.
        let password = owner_password
            .as_ref()
            .map(|password| password.as_ref())
            .unwrap_or(user_password);

        let mut hash = Md5::digest(pad_password(password));

        if self.revision >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(hash);
            }
        }

        let n = self.legacy_key_size()?;

        let mut result = Rc4::new(&hash[..n]).encrypt(pad_password(user_password));

        if self.revision >= 3 {
            for i in 1..=19 {
                result = rc4_xor_pass(&hash[..n], i, &result);
            }
        }

        Ok(result)
    }

    /// Algorithm 4: the /U entry for revision 2, the padding constant encrypted under
    /// the file encryption key.
    pub(crate) fn compute_hashed_user_password_r2<U>(
        &self,
        doc: &Document,
        user_password: U,
    ) -> Result<Vec<u8>, DecryptionError>
    where
        U: AsRef<[u8]>,
    {
        let file_encryption_key = self.compute_file_encryption_key_r4(doc, user_password)?;

        Ok(Rc4::new(&file_encryption_key).encrypt(PAD_BYTES))
    }

    /// Algorithm 5: the /U entry for revision 3 and 4.
    pub(crate) fn compute_hashed_user_password_r3_r4<U>(
        &self,
        doc: &Document,
        user_password: U,
    ) -> Result<Vec<u8>, DecryptionError>
    where
        U: AsRef<[u8]>,
    {
        let file_encryption_key = self.compute_file_encryption_key_r4(doc, user_password)?;

        let mut hasher = Md5::new();

        hasher.update(PAD_BYTES);
        hasher.update(first_file_id(doc)?);

        let hash = hasher.finalize();

        let mut result = Rc4::new(&file_encryption_key).encrypt(hash);

        for i in 1..=19 {
            result = rc4_xor_pass(&file_encryption_key, i, &result);
        }

        // Only the first 16 bytes are ever compared; the tail is arbitrary padding.
        result.resize(32, 0);
        rand::rng().fill(&mut result[16..]);

        Ok(result)
    }

    /// Algorithm 6: check a user password against the /U entry (revision 4 and
    /// earlier). Revision 3 and 4 compare only the first 16 bytes.
    fn authenticate_user_password_r4<U>(&self, doc: &Document, user_password: U) -> Result<(), DecryptionError>
    where
        U: AsRef<[u8]>,
    {
        let hashed_user_password = match self.revision {
            2 => self.compute_hashed_user_password_r2(doc, &user_password)?,
            3 | 4 => self.compute_hashed_user_password_r3_r4(doc, &user_password)?,
            _ => return Err(DecryptionError::InvalidRevision),
        };

        let len = match self.revision {
            3 | 4 => 16,
            _ => hashed_user_password.len(),
        };

        if self.user_value.len() < len {
            return Err(DecryptionError::InvalidHashLength);
        }

        if hashed_user_password[..len] != self.user_value[..len] {
            return Err(DecryptionError::IncorrectPassword);
        }

        Ok(())
    }

    /// Decryption half of Algorithm 7: strip the owner key encryption from /O,
    /// yielding the padded user password.
    ///
    /// Authenticating the recovered password with Algorithm 6 completes the owner
    /// check, and Algorithm 2 derives the file encryption key from it when a document
    /// is opened with the owner password.
    pub(crate) fn recover_user_password_r4<O>(&self, owner_password: O) -> Result<Vec<u8>, DecryptionError>
    where
        O: AsRef<[u8]>,
    {
        let mut hash = Md5::digest(pad_password(owner_password.as_ref()));

        if self.revision >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(hash);
            }
        }

        let n = self.legacy_key_size()?;

        // Undo the XOR-keyed passes in reverse order, then the base pass.
        let mut result = self.owner_value.to_vec();

        if self.revision >= 3 {
            for i in (1..=19).rev() {
                result = rc4_xor_pass(&hash[..n], i, &result);
            }
        }

        Ok(Rc4::new(&hash[..n]).decrypt(&result))
    }

    /// Algorithm 7: check an owner password by recovering the user password from /O
    /// and running it through Algorithm 6 (revision 4 and earlier).
    fn authenticate_owner_password_r4<O>(&self, doc: &Document, owner_password: O) -> Result<(), DecryptionError>
    where
        O: AsRef<[u8]>,
    {
        let user_password = self.recover_user_password_r4(owner_password)?;

        self.authenticate_user_password_r4(doc, user_password)
    }

    /// Algorithm 8: the /U and /UE entries (revision 6).
    pub(crate) fn compute_hashed_user_password_r6<K, U>(
        &self,
        file_encryption_key: K,
        user_password: U,
    ) -> Result<(Vec<u8>, Vec<u8>), DecryptionError>
    where
        K: AsRef<[u8]>,
        U: AsRef<[u8]>,
    {
        let user_password = truncate_password(user_password.as_ref());

        // /U is the password hash over a fresh validation salt, followed by that salt
        // and a key salt.
        let mut user_value = [0u8; 48];
        rand::rng().fill(&mut user_value[32..]);

        let hash = self.compute_hash(user_password, &user_value[32..40], None)?;
        user_value[..32].copy_from_slice(&hash);

        // /UE is the file key wrapped under the hash over the key salt.
        let key = self.compute_hash(user_password, &user_value[40..48], None)?;
        let user_encrypted = wrap_file_key(&key, file_encryption_key.as_ref());

        Ok((user_value.to_vec(), user_encrypted))
    }

    /// Algorithm 9: the /O and /OE entries (revision 6). Both hashes cover the /U
    /// value, so Algorithm 8 has to run first.
    pub(crate) fn compute_hashed_owner_password_r6<K, O>(
        &self,
        file_encryption_key: K,
        owner_password: O,
    ) -> Result<(Vec<u8>, Vec<u8>), DecryptionError>
    where
        K: AsRef<[u8]>,
        O: AsRef<[u8]>,
    {
        let owner_password = truncate_password(owner_password.as_ref());

        let mut owner_value = [0u8; 48];
        rand::rng().fill(&mut owner_value[32..]);

        let hash = self.compute_hash(owner_password, &owner_value[32..40], Some(&self.user_value))?;
        owner_value[..32].copy_from_slice(&hash);

        let key = self.compute_hash(owner_password, &owner_value[40..48], Some(&self.user_value))?;
        let owner_encrypted = wrap_file_key(&key, file_encryption_key.as_ref());

        Ok((owner_value.to_vec(), owner_encrypted))
    }

    /// Algorithm 10: the /Perms entry, the permission bits sealed under the file
    /// encryption key (revision 6).
    pub(crate) fn compute_permissions<K>(&self, file_encryption_key: K) -> Result<Vec<u8>, DecryptionError>
    where
        K: AsRef<[u8]>,
    {
        let mut bytes = [0u8; 16];

        bytes[..8].copy_from_slice(&self.permissions.bits().to_le_bytes());
        bytes[8] = if self.encrypt_metadata { b'T' } else { b'F' };
        bytes[9..12].copy_from_slice(b"adb");
        // The remaining four bytes are random and ignored on validation.
        rand::rng().fill(&mut bytes[12..]);

        let mut key = [0u8; 32];
        key.copy_from_slice(file_encryption_key.as_ref());

        let mut encryptor = Aes256EcbEnc::new(&key.into());

        for block in bytes.chunks_exact_mut(16) {
            encryptor.encrypt_block_mut(block.into());
        }

        Ok(bytes.to_vec())
    }

    /// Algorithm 11: check a user password against /U (revision 5 and later).
    fn authenticate_user_password_r6<U>(&self, user_password: U) -> Result<(), DecryptionError>
    where
        U: AsRef<[u8]>,
    {
        let user_password = truncate_password(user_password.as_ref());
        let (user_hash, user_validation_salt, _) = split_hash_salts(&self.user_value);

        if self.compute_hash(user_password, user_validation_salt, None)? != user_hash {
            return Err(DecryptionError::IncorrectPassword);
        }

        Ok(())
    }

    /// Algorithm 12: check an owner password against /O (revision 5 and later).
    fn authenticate_owner_password_r6<O>(&self, owner_password: O) -> Result<(), DecryptionError>
    where
        O: AsRef<[u8]>,
    {
        let owner_password = truncate_password(owner_password.as_ref());
        let (owner_hash, owner_validation_salt, _) = split_hash_salts(&self.owner_value);

        if self.compute_hash(owner_password, owner_validation_salt, Some(&self.user_value))? != owner_hash {
            return Err(DecryptionError::IncorrectPassword);
        }

        Ok(())
    }

    /// Algorithm 13: decrypt /Perms with the recovered file key and cross-check it
    /// against /P and /EncryptMetadata.
    fn validate_permissions<K>(&self, file_encryption_key: K) -> Result<(), DecryptionError>
    where
        K: AsRef<[u8]>,
    {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.permission_encrypted);

        let mut key = [0u8; 32];
        key.copy_from_slice(file_encryption_key.as_ref());

        let mut decryptor = Aes256EcbDec::new(&key.into());

        for block in bytes.chunks_exact_mut(16) {
            decryptor.decrypt_block_mut(block.into());
        }

        // The marker bytes, the low three permission bytes and the metadata flag all
        // have to match what the dictionary claims.
        if &bytes[9..12] != b"adb"
            || bytes[..3] != self.permissions.bits().to_le_bytes()[..3]
            || bytes[8] != if self.encrypt_metadata { b'T' } else { b'F' }
        {
            return Err(DecryptionError::IncorrectPassword);
        }

        Ok(())
    }

    /// Sanitize the password for this revision.
    pub fn sanitize_password(&self, password: &str) -> Result<Vec<u8>, DecryptionError> {
        match self.revision {
            2..=4 => self.sanitize_password_r4(password),
            5..=6 => self.sanitize_password_r6(password),
            _ => Err(DecryptionError::UnsupportedRevision),
        }
    }

    /// Compute the file encryption key used to encrypt/decrypt the document.
    pub fn compute_file_encryption_key<P>(&self, doc: &Document, password: P) -> Result<Vec<u8>, DecryptionError>
    where
        P: AsRef<[u8]>,
    {
        match self.revision {
            2..=4 => self.compute_file_encryption_key_r4(doc, password),
            5..=6 => self.compute_file_encryption_key_r6(password),
            _ => Err(DecryptionError::UnsupportedRevision),
        }
    }

    /// Authenticate the user password.
    pub fn authenticate_user_password<U>(&self, doc: &Document, user_password: U) -> Result<(), DecryptionError>
    where
        U: AsRef<[u8]>,
    {
        match self.revision {
            2..=4 => self.authenticate_user_password_r4(doc, user_password),
            5..=6 => self.authenticate_user_password_r6(user_password),
            _ => Err(DecryptionError::UnsupportedRevision),
        }
    }

    /// Authenticate the owner password.
    pub fn authenticate_owner_password<O>(&self, doc: &Document, owner_password: O) -> Result<(), DecryptionError>
    where
        O: AsRef<[u8]>,
    {
        match self.revision {
            2..=4 => self.authenticate_owner_password_r4(doc, owner_password),
            5..=6 => self.authenticate_owner_password_r6(owner_password),
            _ => Err(DecryptionError::UnsupportedRevision),
        }
    }
}
