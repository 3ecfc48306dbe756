use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest as _, Md5};
use rand::RngExt as _;

use super::pkcs5::Pkcs5;
use super::rc4::Rc4;
use super::DecryptionError;
use crate::ObjectId;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// The crypt methods the standard security handler can assign to streams and
/// strings via `/CF` entries (or implicitly for V1/V2 encryption).
///
/// The supported revision set is fixed, so the method is a plain enum that is
/// resolved once when the handler state is built, rather than a trait object
/// looked up per object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CryptMethod {
    /// Pass data through unchanged (the `Identity` filter).
    Identity,
    /// RC4 with a per-object key (`/CFM /V2`).
    Rc4,
    /// AES-128 in CBC mode with a per-object key (`/CFM /AESV2`).
    Aes128,
    /// AES-256 in CBC mode keyed by the file encryption key (`/CFM /AESV3`).
    Aes256,
}

impl CryptMethod {
    /// The `/CFM` name this method is announced under.
    pub fn name(&self) -> &'static [u8] {
        match self {
            CryptMethod::Identity => b"Identity",
            CryptMethod::Rc4 => b"V2",
            CryptMethod::Aes128 => b"AESV2",
            CryptMethod::Aes256 => b"AESV3",
        }
    }

    /// Look a method up by its `/CFM` name.
    pub fn from_name(name: &[u8]) -> Option<CryptMethod> {
        match name {
            b"Identity" | b"None" => Some(CryptMethod::Identity),
            b"V2" => Some(CryptMethod::Rc4),
            b"AESV2" => Some(CryptMethod::Aes128),
            b"AESV3" => Some(CryptMethod::Aes256),
            _ => None,
        }
    }

    /// Derive the key for one object from the file encryption key.
    ///
    /// For RC4 and AES-128 the n-byte file key is extended by the low-order
    /// 3 bytes of the object number and 2 bytes of the generation number
    /// (AES additionally appends `sAlT`), hashed with MD5, and truncated to
    /// min(n + 5, 16) bytes. AES-256 uses the file key unchanged.
    pub fn compute_key(&self, key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>, DecryptionError> {
        match self {
            CryptMethod::Identity | CryptMethod::Aes256 => Ok(key.to_vec()),
            CryptMethod::Rc4 | CryptMethod::Aes128 => {
                let mut hasher = Md5::new();

                hasher.update(key);
                hasher.update(&obj_id.0.to_le_bytes()[..3]);
                hasher.update(&obj_id.1.to_le_bytes()[..2]);

                if *self == CryptMethod::Aes128 {
                    hasher.update(b"sAlT");
                }

                let key_len = std::cmp::min(key.len() + 5, 16);
                Ok(hasher.finalize()[..key_len].to_vec())
            }
        }
    }

    pub fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        match self {
            CryptMethod::Identity => Ok(plaintext.to_vec()),
            CryptMethod::Rc4 => Ok(Rc4::new(key).encrypt(plaintext)),
            CryptMethod::Aes128 => {
                if key.len() != 16 {
                    return Err(DecryptionError::InvalidKeyLength);
                }

                let (mut ciphertext, iv, message_len) = prepare_cbc_buffer(plaintext);
                Aes128CbcEnc::new(key.into(), &iv.into())
                    .encrypt_padded_mut::<Pkcs5>(&mut ciphertext[16..], message_len)
                    // Padding errors should not occur when encrypting, but
                    // avoid causing a panic.
                    .map_err(|_| DecryptionError::Padding)?;

                Ok(ciphertext)
            }
            CryptMethod::Aes256 => {
                if key.len() != 32 {
                    return Err(DecryptionError::InvalidKeyLength);
                }

                let (mut ciphertext, iv, message_len) = prepare_cbc_buffer(plaintext);
                Aes256CbcEnc::new(key.into(), &iv.into())
                    .encrypt_padded_mut::<Pkcs5>(&mut ciphertext[16..], message_len)
                    .map_err(|_| DecryptionError::Padding)?;

                Ok(ciphertext)
            }
        }
    }

    pub fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        match self {
            CryptMethod::Identity => Ok(ciphertext.to_vec()),
            CryptMethod::Rc4 => Ok(Rc4::new(key).decrypt(ciphertext)),
            CryptMethod::Aes128 => {
                if key.len() != 16 {
                    return Err(DecryptionError::InvalidKeyLength);
                }

                let Some((iv, mut data)) = split_cbc_payload(ciphertext)? else {
                    return Ok(vec![]);
                };

                Ok(Aes128CbcDec::new(key.into(), &iv.into())
                    .decrypt_padded_mut::<Pkcs5>(&mut data)
                    .map_err(|_| DecryptionError::Padding)?
                    .to_vec())
            }
            CryptMethod::Aes256 => {
                if key.len() != 32 {
                    return Err(DecryptionError::InvalidKeyLength);
                }

                let Some((iv, mut data)) = split_cbc_payload(ciphertext)? else {
                    return Ok(vec![]);
                };

                Ok(Aes256CbcDec::new(key.into(), &iv.into())
                    .decrypt_padded_mut::<Pkcs5>(&mut data)
                    .map_err(|_| DecryptionError::Padding)?
                    .to_vec())
            }
        }
    }
}

/// Lay out an AES-CBC payload: a random 16-byte IV followed by the plaintext
/// with room for PKCS#5 padding.
fn prepare_cbc_buffer(plaintext: &[u8]) -> (Vec<u8>, [u8; 16], usize) {
    // The ciphertext needs to be a multiple of 16 bytes to include the padding.
    let ciphertext_len = (plaintext.len() + 16) / 16 * 16;

    let mut buffer = Vec::with_capacity(16 + ciphertext_len);

    let mut rng = rand::rng();
    let mut iv = [0u8; 16];
    rng.fill(&mut iv);

    buffer.extend_from_slice(&iv);
    buffer.extend_from_slice(plaintext);
    buffer.resize(16 + ciphertext_len, 0);

    (buffer, iv, plaintext.len())
}

/// Split an AES-CBC payload into its IV and ciphertext blocks. Returns
/// `None` when there is nothing to decrypt (empty or IV-only payloads).
fn split_cbc_payload(ciphertext: &[u8]) -> Result<Option<([u8; 16], Vec<u8>)>, DecryptionError> {
    if ciphertext.len() % 16 != 0 {
        return Err(DecryptionError::InvalidCipherTextLength);
    }

    if ciphertext.is_empty() || ciphertext.len() == 16 {
        return Ok(None);
    }

    let mut iv = [0u8; 16];
    iv.copy_from_slice(&ciphertext[..16]);

    Ok(Some((iv, ciphertext[16..].to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_object_keys_differ_between_objects() {
        let file_key = [0x11u8; 16];
        let key_a = CryptMethod::Rc4.compute_key(&file_key, (1, 0)).unwrap();
        let key_b = CryptMethod::Rc4.compute_key(&file_key, (2, 0)).unwrap();
        assert_ne!(key_a, key_b);
        assert_eq!(key_a.len(), 16);
    }

    #[test]
    fn aes_key_salt_changes_derivation() {
        let file_key = [0x22u8; 16];
        let rc4_key = CryptMethod::Rc4.compute_key(&file_key, (7, 0)).unwrap();
        let aes_key = CryptMethod::Aes128.compute_key(&file_key, (7, 0)).unwrap();
        assert_ne!(rc4_key, aes_key);
    }

    #[test]
    fn aes256_uses_file_key_directly() {
        let file_key = [0x33u8; 32];
        let key = CryptMethod::Aes256.compute_key(&file_key, (9, 1)).unwrap();
        assert_eq!(key, file_key.to_vec());
    }

    #[test]
    fn aes128_round_trip() {
        let key = [0x44u8; 16];
        let plaintext = b"BT (Hello) Tj ET";
        let ciphertext = CryptMethod::Aes128.encrypt(&key, plaintext).unwrap();
        assert_eq!(ciphertext.len() % 16, 0);
        assert_ne!(&ciphertext[16..16 + plaintext.len()], plaintext.as_slice());
        assert_eq!(CryptMethod::Aes128.decrypt(&key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn aes256_round_trip() {
        let key = [0x55u8; 32];
        let plaintext = b"per-document payload";
        let ciphertext = CryptMethod::Aes256.encrypt(&key, plaintext).unwrap();
        assert_eq!(CryptMethod::Aes256.decrypt(&key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn aes_empty_ciphertext_decrypts_to_empty() {
        let key = [0x66u8; 16];
        assert_eq!(CryptMethod::Aes128.decrypt(&key, &[]).unwrap(), Vec::<u8>::new());
        assert_eq!(CryptMethod::Aes128.decrypt(&key, &[0u8; 16]).unwrap(), Vec::<u8>::new());
    }
}
