//! Top-level entry points: dial a peer, listen for connections, or
//! listen for datagrams, each already wrapped in the cipher chosen by
//! [`crate::cipher::pick_cipher`].

use crate::{
    cipher::{CipherKind, PacketConn, ReadWrite},
    error::Result,
};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};

/// Connects to `addr` and wraps the resulting stream with `cipher`.
pub fn dial<A: ToSocketAddrs>(addr: A, cipher: CipherKind) -> Result<Box<dyn ReadWrite>> {
    let stream = TcpStream::connect(addr)?;
    cipher.wrap_stream(stream)
}

/// Binds a UDP socket at `addr` and wraps it with `cipher`.
pub fn listen_packet<A: ToSocketAddrs>(
    addr: A,
    cipher: CipherKind,
) -> Result<PacketConn<UdpSocket>> {
    let socket = UdpSocket::bind(addr)?;
    Ok(cipher.wrap_packet(socket))
}

/// A `TcpListener` that wraps every accepted connection with one fixed
/// cipher.
pub struct Listener {
    inner: TcpListener,
    cipher: CipherKind,
}

impl Listener {
    /// Binds at `addr`. Accepted connections will be wrapped with
    /// `cipher`.
    pub fn bind<A: ToSocketAddrs>(addr: A, cipher: CipherKind) -> Result<Self> {
        Ok(Self {
            inner: TcpListener::bind(addr)?,
            cipher,
        })
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Accepts one connection, wrapping it with this listener's
    /// cipher before returning it.
    pub fn accept(&self) -> Result<(Box<dyn ReadWrite>, SocketAddr)> {
        let (stream, addr) = self.inner.accept()?;
        Ok((self.cipher.wrap_stream(stream)?, addr))
    }
}
