//! The AEAD cipher suite: AES-GCM at three key sizes, ChaCha20-Poly1305,
//! and XChaCha20-Poly1305, each wrapped behind one object-safe interface
//! so the registry in [`crate::cipher`] can hold them in a single table.

use {
    crate::{
        error::{Error, Result},
        hkdf_ss::derive_subkey,
    },
    aead::{AeadInPlace, Key, KeyInit, Nonce, Tag},
    aes_gcm::{AesGcm, Aes128Gcm, Aes256Gcm},
    chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305},
    typenum::{U12, Unsigned},
};

/// AES-192-GCM has no ready-made type alias upstream; build it from the
/// generic `AesGcm` the same way `Aes128Gcm`/`Aes256Gcm` are defined.
type Aes192Gcm = AesGcm<aes::Aes192, U12>;

/// Seals or opens one record with a fixed subkey, given an explicit
/// nonce and detached tag. Erases the concrete RustCrypto AEAD type
/// chosen at registry-lookup time, the same role Go's `cipher.AEAD`
/// interface plays natively.
pub(crate) trait SealOpen: Send + Sync {
    fn nonce_size(&self) -> usize;
    fn tag_size(&self) -> usize;
    fn seal_in_place(
        &self,
        nonce: &[u8],
        buf: &mut [u8],
        tag_out: &mut [u8],
    ) -> Result<()>;
    fn open_in_place(
        &self,
        nonce: &[u8],
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<()>;
}

struct Adapter<A>(A);

impl<A> SealOpen for Adapter<A>
where
    A: AeadInPlace + Send + Sync,
{
    fn nonce_size(&self) -> usize {
        A::NonceSize::USIZE
    }

    fn tag_size(&self) -> usize {
        A::TagSize::USIZE
    }

    fn seal_in_place(
        &self,
        nonce: &[u8],
        buf: &mut [u8],
        tag_out: &mut [u8],
    ) -> Result<()> {
        let nonce = Nonce::<A>::from_slice(nonce);
        let tag = self.0.encrypt_in_place_detached(nonce, b"", buf)?;
        tag_out.copy_from_slice(&tag);
        Ok(())
    }

    fn open_in_place(
        &self,
        nonce: &[u8],
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        let nonce = Nonce::<A>::from_slice(nonce);
        let tag = Tag::<A>::from_slice(tag);
        self.0.decrypt_in_place_detached(nonce, b"", buf, tag)?;
        Ok(())
    }
}

fn new_adapter<A>(key: &[u8]) -> Box<dyn SealOpen>
where
    A: AeadInPlace + KeyInit + Send + Sync + 'static,
{
    // The registry validates the key length before calling this, so the
    // only way this panics is a misconfigured descriptor.
    let key = Key::<A>::from_slice(key);
    Box::new(Adapter(A::new(key)))
}

/// A suite of authenticated ciphers bound to one pre-shared key.
///
/// Produces an encrypter or decrypter on demand from a per-connection
/// or per-datagram salt (see [`crate::hkdf_ss`]); the salt is never
/// stored here.
#[derive(Clone)]
pub struct AeadCipher {
    psk: Vec<u8>,
    key_size: usize,
    salt_size: usize,
    ctor: fn(&[u8]) -> Box<dyn SealOpen>,
}

impl AeadCipher {
    pub(crate) fn new(psk: Vec<u8>, desc: &AeadDescriptor) -> Self {
        debug_assert_eq!(psk.len(), desc.key_size);
        Self {
            psk,
            key_size: desc.key_size,
            salt_size: desc.key_size.max(16),
            ctor: desc.ctor,
        }
    }

    /// The pre-shared key's length in bytes.
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// `max(key_size, 16)`, per the AEAD subkey derivation rule.
    pub fn salt_size(&self) -> usize {
        self.salt_size
    }

    pub(crate) fn encrypter(&self, salt: &[u8]) -> Result<Box<dyn SealOpen>> {
        self.seal_open(salt)
    }

    pub(crate) fn decrypter(&self, salt: &[u8]) -> Result<Box<dyn SealOpen>> {
        self.seal_open(salt)
    }

    fn seal_open(&self, salt: &[u8]) -> Result<Box<dyn SealOpen>> {
        let subkey = derive_subkey(&self.psk, salt, self.key_size)?;
        Ok((self.ctor)(&subkey))
    }
}

/// An entry in the AEAD registry: required key size plus a constructor
/// from subkey bytes to a sealer/opener.
pub(crate) struct AeadDescriptor {
    pub key_size: usize,
    pub ctor: fn(&[u8]) -> Box<dyn SealOpen>,
}

pub(crate) const REGISTRY: &[(&str, AeadDescriptor)] = &[
    (
        "AES-128-GCM",
        AeadDescriptor {
            key_size: 16,
            ctor: new_adapter::<Aes128Gcm>,
        },
    ),
    (
        "AES-192-GCM",
        AeadDescriptor {
            key_size: 24,
            ctor: new_adapter::<Aes192Gcm>,
        },
    ),
    (
        "AES-256-GCM",
        AeadDescriptor {
            key_size: 32,
            ctor: new_adapter::<Aes256Gcm>,
        },
    ),
    (
        "CHACHA20-IETF-POLY1305",
        AeadDescriptor {
            key_size: 32,
            ctor: new_adapter::<ChaCha20Poly1305>,
        },
    ),
    (
        "XCHACHA20-IETF-POLY1305",
        AeadDescriptor {
            key_size: 32,
            ctor: new_adapter::<XChaCha20Poly1305>,
        },
    ),
];

pub(crate) fn lookup(name: &str) -> Option<&'static AeadDescriptor> {
    REGISTRY.iter().find(|(n, _)| *n == name).map(|(_, d)| d)
}

/// Returns [`Error::CipherNotSupported`] style validation: the key
/// size must match exactly once derived or supplied.
pub(crate) fn check_key_size(desc: &AeadDescriptor, key: &[u8]) -> Result<()> {
    if key.len() != desc.key_size {
        return Err(Error::KeySize(desc.key_size));
    }
    Ok(())
}
