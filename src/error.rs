use std::{error, fmt, io, result};

/// Result is a specialized [`result::Result`] for this crate.
pub type Result<T> = result::Result<T, Error>;

/// Error is the error type returned by this crate.
#[derive(Debug)]
pub enum Error {
    /// The requested cipher name is in neither registry.
    CipherNotSupported,
    /// The caller-supplied key does not match the cipher's required size.
    ///
    /// Contains the expected key size in bytes.
    KeySize(usize),
    /// The AEAD tag did not verify.
    Authentication,
    /// A datagram was shorter than the cipher's IV or salt size.
    ShortPacket,
    /// The caller-supplied buffer is too small to hold the result.
    ShortBuffer,
    /// The CSPRNG failed to produce a salt or IV.
    Rand(rand_core::Error),
    /// Too many chunks were written and the nonce counter overflowed.
    CounterOverflow,
    /// The entire buffer could not be written.
    ///
    /// Contains the number of bytes written before the short write.
    ShortWrite(usize),
    /// Unexpected EOF while reading a salt, IV, or chunk.
    ///
    /// Contains the number of bytes read before the EOF.
    UnexpectedEof(usize),
    /// An I/O error from the underlying transport.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CipherNotSupported => write!(f, "cipher not supported"),
            Error::KeySize(n) => {
                write!(f, "key size error: need {} bytes", n)
            }
            Error::Authentication => write!(f, "authentication error"),
            Error::ShortPacket => write!(f, "short packet"),
            Error::ShortBuffer => write!(f, "short buffer"),
            Error::Rand(err) => write!(f, "CSPRNG failure: {}", err),
            Error::CounterOverflow => write!(f, "nonce counter overflow"),
            Error::ShortWrite(n) => write!(f, "short write of {} bytes", n),
            Error::UnexpectedEof(n) => {
                write!(f, "unexpected EOF after {} bytes", n)
            }
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Rand(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_: hkdf::InvalidLength) -> Self {
        // HKDF's output-length bound (255 * hash size) is vastly larger
        // than any cipher key size this crate supports, so this can only
        // fire if a registry descriptor is misconfigured.
        Error::Authentication
    }
}

impl From<aead::Error> for Error {
    fn from(_: aead::Error) -> Self {
        Error::Authentication
    }
}

impl From<rand_core::Error> for Error {
    fn from(value: rand_core::Error) -> Self {
        Error::Rand(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof(0),
            io::ErrorKind::WriteZero => Error::ShortWrite(0),
            _ => Error::Io(value),
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(err) => err,
            Error::UnexpectedEof(_) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, value)
            }
            Error::ShortWrite(_) => {
                io::Error::new(io::ErrorKind::WriteZero, value)
            }
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}
