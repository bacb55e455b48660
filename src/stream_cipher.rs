//! The legacy stream-cipher suite: AES-CFB/CTR at three key sizes,
//! RC4-MD5, and the ChaCha20 family. Unauthenticated — provided only
//! for compatibility with older Shadowsocks deployments.

use {
    aes::{Aes128, Aes192, Aes256},
    cfb_mode::{Decryptor as CfbDecryptor, Encryptor as CfbEncryptor},
    chacha20::{ChaCha20, ChaCha20Legacy, XChaCha20},
    cipher::{KeyIvInit, StreamCipher as _, KeyInit as _},
    ctr::Ctr128BE,
    md5::{Digest, Md5},
    rc4::Rc4,
};

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes192Ctr = Ctr128BE<Aes192>;
type Aes256Ctr = Ctr128BE<Aes256>;

/// An in-place XOR keystream. Erases the concrete RustCrypto stream
/// cipher type, the same role Go's `cipher.Stream` interface plays
/// natively.
pub(crate) trait XorStream: Send {
    fn apply_keystream(&mut self, buf: &mut [u8]);
}

impl<T: cipher::StreamCipher + Send> XorStream for T {
    fn apply_keystream(&mut self, buf: &mut [u8]) {
        cipher::StreamCipher::apply_keystream(self, buf)
    }
}

fn new_stream<C>(key: &[u8], iv: &[u8]) -> Box<dyn XorStream>
where
    C: KeyIvInit + cipher::StreamCipher + Send + 'static,
{
    // The registry validates key/IV length before calling this.
    Box::new(C::new_from_slices(key, iv).expect("key/IV size checked by registry"))
}

fn new_rc4_md5(psk: &[u8], iv: &[u8]) -> Box<dyn XorStream> {
    let mut h = Md5::new();
    h.update(psk);
    h.update(iv);
    let rc4_key: [u8; 16] = h.finalize().into();
    Box::new(Rc4::new_from_slice(&rc4_key).expect("RC4-MD5 key is always 16 bytes"))
}

/// A keystream cipher bound to one pre-shared key.
///
/// Produces an encrypter or decrypter keystream on demand from a
/// per-connection or per-datagram IV.
#[derive(Clone)]
pub struct StreamCipher {
    psk: Vec<u8>,
    iv_size: usize,
    encrypter_ctor: fn(&[u8], &[u8]) -> Box<dyn XorStream>,
    decrypter_ctor: fn(&[u8], &[u8]) -> Box<dyn XorStream>,
}

impl StreamCipher {
    pub(crate) fn new(psk: Vec<u8>, desc: &StreamDescriptor) -> Self {
        debug_assert_eq!(psk.len(), desc.key_size);
        Self {
            psk,
            iv_size: desc.iv_size,
            encrypter_ctor: desc.encrypter,
            decrypter_ctor: desc.decrypter,
        }
    }

    /// The IV (or RC4-MD5 effective-key salt) size in bytes.
    pub fn iv_size(&self) -> usize {
        self.iv_size
    }

    pub(crate) fn encrypter(&self, iv: &[u8]) -> Box<dyn XorStream> {
        (self.encrypter_ctor)(&self.psk, iv)
    }

    pub(crate) fn decrypter(&self, iv: &[u8]) -> Box<dyn XorStream> {
        (self.decrypter_ctor)(&self.psk, iv)
    }
}

/// An entry in the stream-cipher registry.
pub(crate) struct StreamDescriptor {
    pub key_size: usize,
    pub iv_size: usize,
    pub encrypter: fn(&[u8], &[u8]) -> Box<dyn XorStream>,
    pub decrypter: fn(&[u8], &[u8]) -> Box<dyn XorStream>,
}

pub(crate) const REGISTRY: &[(&str, StreamDescriptor)] = &[
    (
        "RC4-MD5",
        StreamDescriptor {
            key_size: 16,
            iv_size: 16,
            encrypter: new_rc4_md5,
            decrypter: new_rc4_md5,
        },
    ),
    (
        "AES-128-CFB",
        StreamDescriptor {
            key_size: 16,
            iv_size: 16,
            encrypter: new_stream::<CfbEncryptor<Aes128>>,
            decrypter: new_stream::<CfbDecryptor<Aes128>>,
        },
    ),
    (
        "AES-192-CFB",
        StreamDescriptor {
            key_size: 24,
            iv_size: 16,
            encrypter: new_stream::<CfbEncryptor<Aes192>>,
            decrypter: new_stream::<CfbDecryptor<Aes192>>,
        },
    ),
    (
        "AES-256-CFB",
        StreamDescriptor {
            key_size: 32,
            iv_size: 16,
            encrypter: new_stream::<CfbEncryptor<Aes256>>,
            decrypter: new_stream::<CfbDecryptor<Aes256>>,
        },
    ),
    (
        "AES-128-CTR",
        StreamDescriptor {
            key_size: 16,
            iv_size: 16,
            encrypter: new_stream::<Aes128Ctr>,
            decrypter: new_stream::<Aes128Ctr>,
        },
    ),
    (
        "AES-192-CTR",
        StreamDescriptor {
            key_size: 24,
            iv_size: 16,
            encrypter: new_stream::<Aes192Ctr>,
            decrypter: new_stream::<Aes192Ctr>,
        },
    ),
    (
        "AES-256-CTR",
        StreamDescriptor {
            key_size: 32,
            iv_size: 16,
            encrypter: new_stream::<Aes256Ctr>,
            decrypter: new_stream::<Aes256Ctr>,
        },
    ),
    (
        "CHACHA20",
        StreamDescriptor {
            key_size: 32,
            iv_size: 8,
            encrypter: new_stream::<ChaCha20Legacy>,
            decrypter: new_stream::<ChaCha20Legacy>,
        },
    ),
    (
        "CHACHA20-IETF",
        StreamDescriptor {
            key_size: 32,
            iv_size: 12,
            encrypter: new_stream::<ChaCha20>,
            decrypter: new_stream::<ChaCha20>,
        },
    ),
    (
        "XCHACHA20",
        StreamDescriptor {
            key_size: 32,
            iv_size: 24,
            encrypter: new_stream::<XChaCha20>,
            decrypter: new_stream::<XChaCha20>,
        },
    ),
];

pub(crate) fn lookup(name: &str) -> Option<&'static StreamDescriptor> {
    REGISTRY.iter().find(|(n, _)| *n == name).map(|(_, d)| d)
}
