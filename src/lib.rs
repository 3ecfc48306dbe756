//! Remove password protection from PDF files.
//!
//! The library parses a PDF document, authenticates the supplied password against the
//! standard security handler, decrypts every string and stream and writes the document
//! back out without its `/Encrypt` dictionary:
//!
//! ```no_run
//! let input = std::fs::read("protected.pdf")?;
//! let output = pdf_unlock::unlock(&input, Some("secret"))?;
//! std::fs::write("unlocked.pdf", output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
mod object;
mod document;
pub mod encryption;
mod error;
mod filters;
mod object_stream;
mod parser;
mod reader;
mod writer;
mod xref;

pub use document::Document;
pub use encryption::{EncryptionState, EncryptionVersion, Permissions};
pub use error::{Error, ParseError, Result, XrefError};
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use reader::Reader;
pub use writer::Writer;
pub use xref::{Xref, XrefEntry, XrefType};

use encryption::DecryptionError;

/// Decrypt `input` with `password` and return the document re-serialized without encryption.
///
/// The password is tried as the user password first and as the owner password second; either
/// grants decryption. When no password is given the empty user password is tried, which opens
/// documents that are encrypted only to restrict permissions.
pub fn unlock(input: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
    let mut document = Document::load_mem(input)?;

    if !document.is_encrypted() {
        return Err(Error::NotEncrypted);
    }

    match document.decrypt(password.unwrap_or("")) {
        Ok(()) => {}
        Err(Error::Decryption(DecryptionError::IncorrectPassword)) => {
            return Err(match password {
                Some(_) => Error::InvalidPassword,
                None => Error::AuthenticationRequired,
            });
        }
        Err(err) => return Err(err),
    }

    let mut output = Vec::with_capacity(input.len());
    document.save_to(&mut output)?;
    Ok(output)
}
