use std::fmt;

use crate::ObjectId;
use crate::encryption::DecryptionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document carries no `/Encrypt` dictionary, so there is nothing
    /// to unlock.
    #[error("the document is not encrypted")]
    NotEncrypted,
    /// A password was supplied but matched neither the user nor the owner
    /// password.
    #[error("invalid password")]
    InvalidPassword,
    /// No password was supplied and the document does not open with the
    /// empty user password.
    #[error("a password is required to open this document")]
    AuthenticationRequired,
    /// The document uses a security handler this crate does not implement.
    #[error("unsupported security handler: {0}")]
    UnsupportedSecurityHandler(String),
    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("dictionary key {0:?} was missing")]
    DictKey(String),
    #[error("byte index {0} is outside the bounds of the input")]
    InvalidOffset(usize),
    #[error("invalid stream: {0}")]
    InvalidStream(String),
    #[error("invalid object stream: {0}")]
    ObjectStream(String),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("numeric type cast failed: {0}")]
    NumericCast(String),
    /// The object stored at an offset did not match the identifier the
    /// cross-reference entry announced.
    #[error("object {0:?} was stored under a different identifier")]
    ObjectIdMismatch(ObjectId),
    #[error("object {0:?} does not exist")]
    ObjectNotFound(ObjectId),
    #[error("object has wrong type; expected type {expected} but found type {found}")]
    ObjectType { expected: &'static str, found: &'static str },
    #[error("PDF parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("dereferencing object {0:?} failed; a reference cycle was detected")]
    ReferenceCycle(ObjectId),
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("cross-reference error: {0}")]
    Xref(XrefError),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // `std::io::Error` is not `PartialEq`, so compare the rendered
        // messages; every variant's `Display` includes its payload.
        self.to_string() == other.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid file header")]
    InvalidFileHeader,
    #[error("invalid object at byte {0}")]
    InvalidObject(usize),
    #[error("invalid file trailer")]
    InvalidTrailer,
}

#[derive(Debug)]
pub enum XrefError {
    /// Could not parse the cross-reference table or stream.
    Parse,
    /// Could not find the `startxref` keyword.
    Start,
    /// The offset in a `/Prev` entry is invalid.
    PrevStart,
    /// The offset in an `/XRefStm` entry is invalid.
    StreamStart,
}

impl fmt::Display for XrefError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            XrefError::Parse => write!(f, "could not parse xref"),
            XrefError::Start => write!(f, "invalid start value"),
            XrefError::PrevStart => write!(f, "invalid start value in Prev field"),
            XrefError::StreamStart => write!(f, "invalid stream start value"),
        }
    }
}

impl From<XrefError> for Error {
    fn from(err: XrefError) -> Self {
        Error::Xref(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Utf8(err.utf8_error())
    }
}
