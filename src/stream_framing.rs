//! Legacy stream-cipher framing over a reliable byte stream.
//!
//! Unlike the AEAD framing in [`crate::aead_framing`] there is no
//! chunking, length prefix, or authentication tag: each side writes
//! one random IV ahead of the ciphertext, and everything after that is
//! the plaintext XORed with the cipher's keystream, byte for byte.

use {
    crate::{
        error::Result,
        stream_cipher::{StreamCipher, XorStream},
    },
    rand_core::{OsRng, RngCore},
    std::io::{self, Read, Write},
};

/// Decrypts a stream-cipher stream, handling the IV handshake lazily
/// on the first call to [`Read::read`].
pub struct Reader<R> {
    inner: R,
    cipher: StreamCipher,
    decrypter: Option<Box<dyn XorStream>>,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R, cipher: StreamCipher) -> Self {
        Self {
            inner,
            cipher,
            decrypter: None,
        }
    }

    fn ensure_decrypter(&mut self) -> Result<()> {
        if self.decrypter.is_some() {
            return Ok(());
        }
        let mut iv = vec![0u8; self.cipher.iv_size()];
        self.inner.read_exact(&mut iv)?;
        self.decrypter = Some(self.cipher.decrypter(&iv));
        Ok(())
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_decrypter().map_err(io::Error::from)?;
        let n = self.inner.read(buf)?;
        self.decrypter.as_mut().unwrap().apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}

/// Encrypts a stream-cipher stream, handling the IV handshake lazily
/// on the first call to [`Write::write`].
pub struct Writer<W> {
    inner: W,
    cipher: StreamCipher,
    encrypter: Option<Box<dyn XorStream>>,
    pending_iv: Option<Vec<u8>>,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W, cipher: StreamCipher) -> Self {
        Self {
            inner,
            cipher,
            encrypter: None,
            pending_iv: None,
        }
    }

    /// Like [`Writer::new`], but uses `iv` instead of one drawn from
    /// the system CSPRNG. Exists for reproducible tests.
    pub fn new_with_iv(inner: W, cipher: StreamCipher, iv: Vec<u8>) -> Self {
        Self {
            inner,
            cipher,
            encrypter: None,
            pending_iv: Some(iv),
        }
    }

    fn ensure_encrypter(&mut self) -> Result<()> {
        if self.encrypter.is_some() {
            return Ok(());
        }
        let iv = match self.pending_iv.take() {
            Some(iv) => iv,
            None => {
                let mut iv = vec![0u8; self.cipher.iv_size()];
                OsRng.try_fill_bytes(&mut iv)?;
                iv
            }
        };
        self.inner.write_all(&iv)?;
        self.encrypter = Some(self.cipher.encrypter(&iv));
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.ensure_encrypter().map_err(io::Error::from)?;
        let mut scratch = buf.to_vec();
        self.encrypter.as_mut().unwrap().apply_keystream(&mut scratch);
        self.inner.write_all(&scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_cipher;

    fn cipher() -> StreamCipher {
        let desc = stream_cipher::lookup("AES-256-CTR").unwrap();
        StreamCipher::new(vec![0x91u8; 32], desc)
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher();
        let mut wire = Vec::new();
        {
            let mut w = Writer::new_with_iv(&mut wire, cipher.clone(), vec![0x02u8; 16]);
            w.write_all(b"legacy shadowsocks payload").unwrap();
        }

        let mut r = Reader::new(wire.as_slice(), cipher);
        let mut got = Vec::new();
        r.read_to_end(&mut got).unwrap();
        assert_eq!(got, b"legacy shadowsocks payload");
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let cipher = cipher();
        let mut wire = Vec::new();
        let mut w = Writer::new_with_iv(&mut wire, cipher, vec![0x03u8; 16]);
        w.write_all(b"plaintext should not appear on the wire").unwrap();
        assert!(!wire
            .windows(b"plaintext".len())
            .any(|window| window == b"plaintext"));
    }

    #[test]
    fn test_small_reads_stay_in_sync() {
        let cipher = cipher();
        let mut wire = Vec::new();
        {
            let mut w = Writer::new_with_iv(&mut wire, cipher.clone(), vec![0x04u8; 16]);
            w.write_all(b"0123456789abcdef0123456789abcdef").unwrap();
        }

        let mut r = Reader::new(wire.as_slice(), cipher);
        let mut got = Vec::new();
        let mut chunk = [0u8; 3];
        loop {
            let n = r.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            got.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(got, b"0123456789abcdef0123456789abcdef");
    }
}
