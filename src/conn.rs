//! Full-duplex connection wrappers.
//!
//! A Shadowsocks connection needs an independent nonce/IV sequence in
//! each direction, so `AeadConnection`/`StreamCipherConnection` each
//! hold two handles to the same underlying stream: one drives a
//! [`crate::aead_framing::Reader`] or [`crate::stream_framing::Reader`],
//! the other drives the matching `Writer`. Both sides defer their
//! handshake (reading or writing a salt/IV) until first use, so
//! constructing a connection never touches the network.

use {
    crate::{
        aead_cipher::AeadCipher,
        aead_framing,
        error::Result,
        stream_cipher::StreamCipher,
        stream_framing,
    },
    std::{
        io::{Read, Write},
        net::TcpStream,
    },
};

/// A type that can hand out a second, independent handle to the same
/// underlying stream.
///
/// Go's reference implementation needs nothing like this: its
/// `StreamConn` embeds one `net.Conn` and reads from `self.Conn` and
/// writes to `self.Conn` in the same method set, relying on the
/// interface value's reference semantics. Rust's `Reader`/`Writer`
/// split needs a real second handle to satisfy the borrow checker, so
/// this trait — and `try_clone`-based duplication — has no upstream
/// counterpart; it exists purely to make two owned, independently
/// driven halves out of one `TcpStream`.
pub trait TryDup: Sized {
    fn try_dup(&self) -> Result<Self>;
}

impl TryDup for TcpStream {
    fn try_dup(&self) -> Result<Self> {
        Ok(self.try_clone()?)
    }
}

/// A Shadowsocks connection using the chunked AEAD protocol.
pub struct AeadConnection<S> {
    reader: aead_framing::Reader<S>,
    writer: aead_framing::Writer<S>,
}

impl<S: Read + Write + TryDup> AeadConnection<S> {
    /// Wraps `stream`, sharing `cipher` between both directions.
    pub fn new(stream: S, cipher: AeadCipher) -> Result<Self> {
        let read_half = stream.try_dup()?;
        Ok(Self {
            reader: aead_framing::Reader::new(read_half, cipher.clone()),
            writer: aead_framing::Writer::new(stream, cipher),
        })
    }
}

impl<S: Read> Read for AeadConnection<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<S: Write> Write for AeadConnection<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// A Shadowsocks connection using the legacy stream-cipher protocol.
pub struct StreamCipherConnection<S> {
    reader: stream_framing::Reader<S>,
    writer: stream_framing::Writer<S>,
}

impl<S: Read + Write + TryDup> StreamCipherConnection<S> {
    /// Wraps `stream`, sharing `cipher` between both directions.
    pub fn new(stream: S, cipher: StreamCipher) -> Result<Self> {
        let read_half = stream.try_dup()?;
        Ok(Self {
            reader: stream_framing::Reader::new(read_half, cipher.clone()),
            writer: stream_framing::Writer::new(stream, cipher),
        })
    }
}

impl<S: Read> Read for StreamCipherConnection<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<S: Write> Write for StreamCipherConnection<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
