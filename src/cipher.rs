//! Cipher selection: turns a cipher name plus either a raw key or a
//! password into a ready-to-use [`CipherKind`], and dispatches stream
//! and packet wrapping to the right framing regardless of which
//! family the chosen cipher belongs to.

use crate::{
    aead_cipher::{self, AeadCipher},
    conn::{AeadConnection, StreamCipherConnection, TryDup},
    error::{Error, Result},
    kdf,
    packet::{AeadPacketConn, PacketSocket, StreamCipherPacketConn},
    stream_cipher::{self, StreamCipher},
};
use std::io::{Read, Write};

/// A cipher chosen for one listener or dial, holding enough state to
/// wrap any number of connections or packet sockets with it.
#[derive(Clone)]
pub enum CipherKind {
    Aead(AeadCipher),
    Stream(StreamCipher),
    /// No encryption at all; passes bytes and datagrams through
    /// unmodified. Exists for testing and for chaining with an outer
    /// transport that already provides confidentiality.
    None,
}

impl CipherKind {
    /// Wraps a reliable byte stream, dispatching to the AEAD or
    /// legacy-stream framing this cipher needs.
    pub fn wrap_stream<S: Read + Write + TryDup + 'static>(
        &self,
        stream: S,
    ) -> Result<Box<dyn ReadWrite>> {
        match self {
            CipherKind::Aead(cipher) => {
                Ok(Box::new(AeadConnection::new(stream, cipher.clone())?))
            }
            CipherKind::Stream(cipher) => Ok(Box::new(StreamCipherConnection::new(
                stream,
                cipher.clone(),
            )?)),
            CipherKind::None => Ok(Box::new(stream)),
        }
    }

    /// Wraps a UDP socket, dispatching to the AEAD or legacy-stream
    /// datagram encapsulation this cipher needs.
    pub fn wrap_packet<S: PacketSocket + 'static>(&self, socket: S) -> PacketConn<S> {
        match self {
            CipherKind::Aead(cipher) => {
                PacketConn::Aead(AeadPacketConn::new(socket, cipher.clone()))
            }
            CipherKind::Stream(cipher) => {
                PacketConn::Stream(StreamCipherPacketConn::new(socket, cipher.clone()))
            }
            CipherKind::None => PacketConn::Plain(socket),
        }
    }
}

/// A blanket `Read + Write` object bound, used so [`CipherKind::wrap_stream`]
/// can return one of three concrete wrapper types uniformly.
pub trait ReadWrite: Read + Write {}
impl<T: Read + Write> ReadWrite for T {}

/// The datagram counterpart of [`ReadWrite`]: one of the three
/// concrete packet-conn types, exposed through a uniform enum rather
/// than a trait object since `recv_from`/`send_to` take `&self`.
pub enum PacketConn<S> {
    Aead(AeadPacketConn<S>),
    Stream(StreamCipherPacketConn<S>),
    Plain(S),
}

impl<S: PacketSocket> PacketConn<S> {
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, std::net::SocketAddr)> {
        match self {
            PacketConn::Aead(c) => c.recv_from(buf),
            PacketConn::Stream(c) => c.recv_from(buf),
            PacketConn::Plain(s) => Ok(s.recv_from(buf)?),
        }
    }

    pub fn send_to(&self, buf: &[u8], addr: std::net::SocketAddr) -> Result<usize> {
        match self {
            PacketConn::Aead(c) => c.send_to(buf, addr),
            PacketConn::Stream(c) => c.send_to(buf, addr),
            PacketConn::Plain(s) => Ok(s.send_to(buf, addr)?),
        }
    }
}

/// Looks up `name` in both registries and builds a [`CipherKind`] from
/// either a raw pre-shared key or, if `key` is empty, one derived from
/// `password` via the legacy MD5-based KDF.
///
/// `"none"` (case-insensitive) always succeeds and returns
/// [`CipherKind::None`] regardless of `key`/`password`.
pub fn pick_cipher(name: &str, key: &[u8], password: &[u8]) -> Result<CipherKind> {
    let name = name.to_ascii_uppercase();
    if name == "NONE" {
        return Ok(CipherKind::None);
    }
    if let Some(desc) = aead_cipher::lookup(&name) {
        let key = resolve_key(key, password, desc.key_size);
        aead_cipher::check_key_size(desc, &key)?;
        return Ok(CipherKind::Aead(AeadCipher::new(key, desc)));
    }
    if let Some(desc) = stream_cipher::lookup(&name) {
        let key = resolve_key(key, password, desc.key_size);
        if key.len() != desc.key_size {
            return Err(Error::KeySize(desc.key_size));
        }
        return Ok(CipherKind::Stream(StreamCipher::new(key, desc)));
    }
    Err(Error::CipherNotSupported)
}

/// An empty `key` means "derive one from the password"; a non-empty one
/// is used as-is and validated by the caller.
fn resolve_key(key: &[u8], password: &[u8], key_size: usize) -> Vec<u8> {
    if key.is_empty() {
        kdf::kdf(password, key_size)
    } else {
        key.to_vec()
    }
}

/// Like [`pick_cipher`], but always derives the key from `password`
/// instead of taking one directly. A thin convenience wrapper around
/// `pick_cipher(name, &[], password)` for callers that never carry a
/// raw key.
pub fn pick_cipher_with_password(name: &str, password: &[u8]) -> Result<CipherKind> {
    pick_cipher(name, &[], password)
}

/// The names of every registered cipher, AEAD first.
pub fn list_ciphers() -> Vec<&'static str> {
    let mut names: Vec<&'static str> =
        aead_cipher::REGISTRY.iter().map(|(n, _)| *n).collect();
    names.extend(stream_cipher::REGISTRY.iter().map(|(n, _)| *n));
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_cipher_none_ignores_key_and_password() {
        assert!(matches!(
            pick_cipher("none", b"", b"").unwrap(),
            CipherKind::None
        ));
        assert!(matches!(
            pick_cipher("NONE", &[0u8; 16], b"irrelevant").unwrap(),
            CipherKind::None
        ));
    }

    #[test]
    fn test_pick_cipher_rejects_unknown_name() {
        assert!(matches!(
            pick_cipher("ROT13", &[0u8; 16], b""),
            Err(Error::CipherNotSupported)
        ));
    }

    #[test]
    fn test_pick_cipher_rejects_wrong_key_size() {
        assert!(matches!(
            pick_cipher("AES-256-GCM", &[0u8; 16], b""),
            Err(Error::KeySize(32))
        ));
    }

    #[test]
    fn test_pick_cipher_normalizes_name_case() {
        assert!(matches!(
            pick_cipher("aes-128-gcm", &[0u8; 16], b""),
            Ok(CipherKind::Aead(_))
        ));
        assert!(matches!(
            pick_cipher("Aes-256-Ctr", &[0u8; 32], b""),
            Ok(CipherKind::Stream(_))
        ));
    }

    #[test]
    fn test_pick_cipher_accepts_aead_and_stream_names() {
        assert!(matches!(
            pick_cipher("AES-128-GCM", &[0u8; 16], b""),
            Ok(CipherKind::Aead(_))
        ));
        assert!(matches!(
            pick_cipher("AES-128-CTR", &[0u8; 16], b""),
            Ok(CipherKind::Stream(_))
        ));
    }

    #[test]
    fn test_pick_cipher_with_empty_key_derives_from_password() {
        let kind = pick_cipher("AES-256-GCM", b"", b"hunter2").unwrap();
        assert!(matches!(kind, CipherKind::Aead(_)));
    }

    #[test]
    fn test_pick_cipher_with_password_derives_key() {
        let kind = pick_cipher_with_password("AES-256-GCM", b"hunter2").unwrap();
        assert!(matches!(kind, CipherKind::Aead(_)));
    }

    #[test]
    fn test_list_ciphers_contains_known_names() {
        let names = list_ciphers();
        assert!(names.contains(&"AES-256-GCM"));
        assert!(names.contains(&"CHACHA20-IETF"));
        assert_eq!(names.len(), 5 + 10);
    }
}
