//! Chunked AEAD framing over a reliable byte stream.
//!
//! Each side of the connection generates one random salt on its first
//! write, sends it unencrypted ahead of any ciphertext, and derives a
//! subkey from it via [`crate::hkdf_ss`]. From there the stream is a
//! sequence of independently sealed chunks: a two-byte big-endian
//! length (masked to 14 bits), its tag, the payload, and its tag. A
//! single nonce counter is shared between the length and the payload
//! of a chunk and advances by one after each seal/open, so it advances
//! twice per chunk.

use {
    crate::{
        aead_cipher::{AeadCipher, SealOpen},
        buf::Buf,
        error::{Error, Result},
    },
    rand_core::{OsRng, RngCore},
    std::io::{self, Read, Write},
};

/// The largest payload a single chunk may carry; the top two bits of
/// the 16-bit length field are always clear.
pub(crate) const MAX_PAYLOAD_SIZE: usize = 0x3FFF;

/// Increments `nonce` as a little-endian counter. Returns `true` if every
/// byte carried, i.e. the counter wrapped all the way back to zero.
fn increment_nonce(nonce: &mut [u8]) -> bool {
    for byte in nonce.iter_mut() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            return false;
        }
    }
    true
}

/// Reads full buffers, distinguishing a clean EOF between records from
/// a truncated one in the middle of a record.
fn read_full_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::UnexpectedEof(filled));
        }
        filled += n;
    }
    Ok(true)
}

/// Decrypts a chunked-AEAD stream, handling the salt handshake lazily
/// on the first call to [`Read::read`].
pub struct Reader<R> {
    inner: R,
    cipher: AeadCipher,
    opener: Option<Box<dyn SealOpen>>,
    nonce: Vec<u8>,
    leftover: Buf,
}

impl<R: Read> Reader<R> {
    /// Wraps `inner`, deferring the salt read until the first byte is
    /// requested.
    pub fn new(inner: R, cipher: AeadCipher) -> Self {
        Self {
            inner,
            cipher,
            opener: None,
            nonce: Vec::new(),
            leftover: Buf::with_capacity(0),
        }
    }

    fn ensure_opener(&mut self) -> Result<()> {
        if self.opener.is_some() {
            return Ok(());
        }
        let mut salt = vec![0u8; self.cipher.salt_size()];
        self.inner.read_exact(&mut salt)?;
        let opener = self.cipher.decrypter(&salt)?;
        self.nonce = vec![0u8; opener.nonce_size()];
        self.leftover = Buf::with_capacity(MAX_PAYLOAD_SIZE);
        self.opener = Some(opener);
        Ok(())
    }

    /// Decrypts the next chunk into `leftover`. Returns `false` on a
    /// clean EOF that falls exactly on a chunk boundary.
    fn fill_chunk(&mut self) -> Result<bool> {
        self.ensure_opener()?;
        let tag_size = self.opener.as_ref().unwrap().tag_size();

        let mut len_buf = [0u8; 2];
        if !read_full_or_eof(&mut self.inner, &mut len_buf)? {
            return Ok(false);
        }
        let mut len_tag = vec![0u8; tag_size];
        self.inner.read_exact(&mut len_tag)?;
        {
            let opener = self.opener.as_ref().unwrap();
            opener.open_in_place(&self.nonce, &mut len_buf, &len_tag)?;
        }
        if increment_nonce(&mut self.nonce) {
            return Err(Error::CounterOverflow);
        }

        let n = (u16::from_be_bytes(len_buf) & MAX_PAYLOAD_SIZE as u16) as usize;

        let mut tag = vec![0u8; tag_size];
        {
            let buf = self.leftover.scratch_mut(n);
            self.inner.read_exact(buf)?;
        }
        self.inner.read_exact(&mut tag)?;
        {
            let opener = self.opener.as_ref().unwrap();
            let buf = self.leftover.scratch_mut(n);
            opener.open_in_place(&self.nonce, buf, &tag)?;
        }
        if increment_nonce(&mut self.nonce) {
            return Err(Error::CounterOverflow);
        }
        self.leftover.set_len(n);
        Ok(true)
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.leftover.is_empty() {
            if !self.fill_chunk().map_err(io::Error::from)? {
                return Ok(0);
            }
        }
        Ok(self.leftover.read(buf))
    }
}

/// Encrypts a chunked-AEAD stream, handling the salt handshake lazily
/// on the first call to [`Write::write`].
pub struct Writer<W> {
    inner: W,
    cipher: AeadCipher,
    sealer: Option<Box<dyn SealOpen>>,
    nonce: Vec<u8>,
    pending_salt: Option<Vec<u8>>,
    /// One maximum chunk's worth of backing storage: length field, its
    /// tag, the payload, and its tag, laid out in wire order. Sized
    /// once `sealer` is known and reused for every chunk thereafter.
    buf: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Wraps `inner`, deferring salt generation and the write of that
    /// salt until the first byte is supplied.
    pub fn new(inner: W, cipher: AeadCipher) -> Self {
        Self {
            inner,
            cipher,
            sealer: None,
            nonce: Vec::new(),
            pending_salt: None,
            buf: Vec::new(),
        }
    }

    /// Like [`Writer::new`], but uses `salt` instead of one drawn from
    /// the system CSPRNG. Exists for reproducible tests.
    pub fn new_with_salt(inner: W, cipher: AeadCipher, salt: Vec<u8>) -> Self {
        Self {
            inner,
            cipher,
            sealer: None,
            nonce: Vec::new(),
            pending_salt: Some(salt),
            buf: Vec::new(),
        }
    }

    fn ensure_sealer(&mut self) -> Result<()> {
        if self.sealer.is_some() {
            return Ok(());
        }
        let salt = match self.pending_salt.take() {
            Some(salt) => salt,
            None => {
                let mut salt = vec![0u8; self.cipher.salt_size()];
                OsRng.try_fill_bytes(&mut salt)?;
                salt
            }
        };
        self.inner.write_all(&salt)?;
        let sealer = self.cipher.encrypter(&salt)?;
        self.nonce = vec![0u8; sealer.nonce_size()];
        let tag_size = sealer.tag_size();
        self.buf = vec![0u8; 2 + tag_size + MAX_PAYLOAD_SIZE + tag_size];
        self.sealer = Some(sealer);
        Ok(())
    }

    /// Seals `payload` into `self.buf` and writes the whole chunk —
    /// length, length tag, payload, payload tag — in one call.
    fn write_chunk(&mut self, payload: &[u8]) -> Result<()> {
        debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);
        let sealer = self.sealer.as_ref().unwrap();
        let tag_size = sealer.tag_size();
        let n = payload.len();
        let total = 2 + tag_size + n + tag_size;

        let (len_buf, rest) = self.buf[..total].split_at_mut(2);
        len_buf.copy_from_slice(&(n as u16).to_be_bytes());
        let (len_tag, rest) = rest.split_at_mut(tag_size);
        let (body, body_tag) = rest.split_at_mut(n);
        body.copy_from_slice(payload);

        sealer.seal_in_place(&self.nonce, len_buf, len_tag)?;
        if increment_nonce(&mut self.nonce) {
            return Err(Error::CounterOverflow);
        }

        sealer.seal_in_place(&self.nonce, body, body_tag)?;
        if increment_nonce(&mut self.nonce) {
            return Err(Error::CounterOverflow);
        }

        self.inner.write_all(&self.buf[..total])?;
        Ok(())
    }

    /// Flushes and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.ensure_sealer().map_err(io::Error::from)?;
        let n = buf.len().min(MAX_PAYLOAD_SIZE);
        self.write_chunk(&buf[..n]).map_err(io::Error::from)?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
