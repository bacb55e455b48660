//! Shadowsocks-compatible wire cryptography.
//!
//! This crate implements the two framings Shadowsocks uses to turn a
//! pre-shared key (or password) and a plain TCP/UDP transport into an
//! encrypted one:
//!
//!   - **AEAD framing** ([`aead_framing`]): the stream is broken into
//!     chunks of at most 16 KiB, each independently sealed with an
//!     AES-GCM or ChaCha20-Poly1305 family cipher. A fresh per-connection
//!     salt derives the subkey via HKDF-SHA1 ([`hkdf_ss`]); see
//!     [`aead_cipher`] for the cipher registry itself.
//!   - **Stream-cipher framing** ([`stream_framing`]): a legacy,
//!     unauthenticated mode that XORs the whole connection with a
//!     keystream seeded by a per-connection IV. Kept for interop with
//!     older deployments; see [`stream_cipher`].
//!
//! [`cipher::pick_cipher`] turns a cipher name and key into a
//! [`cipher::CipherKind`] that picks the right framing automatically,
//! and [`listener`] wires that into `std::net` for TCP and UDP.
//! [`conn`] and [`packet`] hold the full-duplex wrappers in between.
//!
//! Everything here speaks in terms of already-established pre-shared
//! keys; negotiating those keys and proxying the decrypted bytes
//! elsewhere are both out of scope.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod aead_cipher;
mod aead_framing;
mod buf;
mod cipher;
mod conn;
mod error;
mod hkdf_ss;
mod kdf;
mod listener;
mod packet;
mod stream_cipher;
mod stream_framing;

pub use aead_cipher::AeadCipher;
pub use cipher::{pick_cipher, pick_cipher_with_password, CipherKind, PacketConn, ReadWrite};
pub use conn::{AeadConnection, StreamCipherConnection, TryDup};
pub use error::{Error, Result};
pub use kdf::kdf;
pub use listener::{dial, listen_packet, Listener};
pub use packet::{AeadPacketConn, PacketSocket, StreamCipherPacketConn};
pub use stream_cipher::StreamCipher;

pub use aead_framing::{Reader as AeadReader, Writer as AeadWriter};
pub use stream_framing::{Reader as StreamCipherReader, Writer as StreamCipherWriter};

/// Lists every cipher name this crate can dispatch via [`pick_cipher`].
pub use cipher::list_ciphers;
