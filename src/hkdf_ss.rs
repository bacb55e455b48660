//! AEAD subkey derivation: HKDF-SHA1 with the fixed info string
//! `"ss-subkey"`, as defined by the Shadowsocks AEAD extension.

use {
    crate::error::Result,
    hkdf::Hkdf,
    sha1::Sha1,
};

const INFO: &[u8] = b"ss-subkey";

/// Derives a `key_size`-byte subkey from `psk` and `salt`.
pub(crate) fn derive_subkey(
    psk: &[u8],
    salt: &[u8],
    key_size: usize,
) -> Result<Vec<u8>> {
    let kdf = Hkdf::<Sha1>::new(Some(salt), psk);
    let mut out = vec![0u8; key_size];
    kdf.expand(INFO, &mut out)?;
    Ok(out)
}
