//! Datagram encapsulation.
//!
//! Unlike the stream framings, a UDP packet carries its own salt/IV
//! and is encrypted whole: there is no chunking and, for AEAD ciphers,
//! the nonce is always zero, because a fresh salt already makes every
//! packet's subkey unique.

use {
    crate::{
        aead_cipher::AeadCipher,
        error::{Error, Result},
        stream_cipher::StreamCipher,
    },
    rand_core::{OsRng, RngCore},
    std::{
        io,
        net::{SocketAddr, UdpSocket},
        sync::Mutex,
    },
};

/// Larger than any UDP datagram a kernel will ever deliver to us.
const MAX_PACKET_SIZE: usize = 65536;

/// The minimal send/receive surface this module needs from a UDP
/// socket, so callers can substitute a test double.
pub trait PacketSocket {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

impl PacketSocket for UdpSocket {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }

    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }
}

/// A UDP socket that encrypts and decrypts whole datagrams with an
/// AEAD cipher.
pub struct AeadPacketConn<S> {
    socket: S,
    cipher: AeadCipher,
}

impl<S: PacketSocket> AeadPacketConn<S> {
    pub fn new(socket: S, cipher: AeadCipher) -> Self {
        Self { socket, cipher }
    }

    /// Receives one datagram, decrypting it into `buf`. Returns the
    /// plaintext length and the sender's address.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let mut raw = vec![0u8; MAX_PACKET_SIZE];
        let (n, addr) = self.socket.recv_from(&mut raw)?;
        let raw = &mut raw[..n];

        let salt_size = self.cipher.salt_size();
        if raw.len() < salt_size {
            log::debug!("dropping datagram from {addr}: shorter than salt ({n} bytes)");
            return Err(Error::ShortPacket);
        }
        let (salt, sealed) = raw.split_at_mut(salt_size);
        let opener = self.cipher.decrypter(salt)?;

        let tag_size = opener.tag_size();
        if sealed.len() < tag_size {
            log::debug!("dropping datagram from {addr}: shorter than AEAD tag");
            return Err(Error::ShortPacket);
        }
        let body_len = sealed.len() - tag_size;
        let (body, tag) = sealed.split_at_mut(body_len);
        let nonce = vec![0u8; opener.nonce_size()];
        if let Err(err) = opener.open_in_place(&nonce, body, tag) {
            log::debug!("dropping datagram from {addr}: authentication failed");
            return Err(err);
        }

        if buf.len() < body_len {
            return Err(Error::ShortBuffer);
        }
        buf[..body_len].copy_from_slice(body);
        Ok((body_len, addr))
    }

    /// Encrypts `buf` whole and sends it as one datagram to `addr`.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize> {
        let salt_size = self.cipher.salt_size();
        let mut salt = vec![0u8; salt_size];
        OsRng.try_fill_bytes(&mut salt)?;
        let sealer = self.cipher.encrypter(&salt)?;

        let tag_size = sealer.tag_size();
        let nonce = vec![0u8; sealer.nonce_size()];
        let mut body = buf.to_vec();
        let mut tag = vec![0u8; tag_size];
        sealer.seal_in_place(&nonce, &mut body, &mut tag)?;

        let mut packet = Vec::with_capacity(salt_size + body.len() + tag_size);
        packet.extend_from_slice(&salt);
        packet.extend_from_slice(&body);
        packet.extend_from_slice(&tag);
        self.socket.send_to(&packet, addr)?;
        Ok(buf.len())
    }
}

/// A UDP socket that XORs whole datagrams with a stream cipher's
/// keystream, reseeded with a fresh IV on every packet.
///
/// The scratch buffer is shared and mutex-guarded rather than
/// allocated per call, since datagrams are frequent and bounded in
/// size.
pub struct StreamCipherPacketConn<S> {
    socket: S,
    cipher: StreamCipher,
    scratch: Mutex<Vec<u8>>,
}

impl<S: PacketSocket> StreamCipherPacketConn<S> {
    pub fn new(socket: S, cipher: StreamCipher) -> Self {
        Self {
            socket,
            cipher,
            scratch: Mutex::new(vec![0u8; MAX_PACKET_SIZE]),
        }
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let mut guard = self.scratch.lock().unwrap();
        let (n, addr) = self.socket.recv_from(&mut guard)?;

        let iv_size = self.cipher.iv_size();
        if n < iv_size {
            log::debug!("dropping datagram from {addr}: shorter than IV ({n} bytes)");
            return Err(Error::ShortPacket);
        }
        let (iv, body) = guard[..n].split_at_mut(iv_size);
        self.cipher.decrypter(iv).apply_keystream(body);

        let body_len = body.len();
        if buf.len() < body_len {
            return Err(Error::ShortBuffer);
        }
        buf[..body_len].copy_from_slice(body);
        Ok((body_len, addr))
    }

    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize> {
        let iv_size = self.cipher.iv_size();
        let total = iv_size + buf.len();
        let mut guard = self.scratch.lock().unwrap();
        if guard.len() < total {
            guard.resize(total, 0);
        }

        let mut iv = vec![0u8; iv_size];
        OsRng.try_fill_bytes(&mut iv)?;
        guard[..iv_size].copy_from_slice(&iv);
        guard[iv_size..total].copy_from_slice(buf);
        self.cipher.encrypter(&iv).apply_keystream(&mut guard[iv_size..total]);

        self.socket.send_to(&guard[..total], addr)?;
        Ok(buf.len())
    }
}
