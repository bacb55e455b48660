//! The legacy password-to-key derivation function.
//!
//! This is OpenSSL's `EVP_BytesToKey` with no salt, MD5 as the digest,
//! and a single iteration per block. It exists only for compatibility
//! with deployed Shadowsocks clients that derive keys the same way; new
//! code should prefer supplying a key directly.

use md5::{Digest, Md5};

/// Derives an `length`-byte key from `password`.
///
/// Let `D(0) = MD5(password)` and `D(i) = MD5(D(i-1) || password)`. The
/// output is `D(0) || D(1) || ...` truncated to `length` bytes.
pub fn kdf(password: &[u8], length: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(length + Md5::output_size());
    let mut prev: Option<[u8; 16]> = None;
    while out.len() < length {
        let mut h = Md5::new();
        if let Some(prev) = prev {
            h.update(prev);
        }
        h.update(password);
        let digest: [u8; 16] = h.finalize().into();
        out.extend_from_slice(&digest);
        prev = Some(digest);
    }
    out.truncate(length);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdf_matches_openssl_bytes_to_key() {
        let d0 = Md5::digest(b"foobar");
        let mut h = Md5::new();
        h.update(d0);
        h.update(b"foobar");
        let d1 = h.finalize();

        let mut want = Vec::new();
        want.extend_from_slice(&d0);
        want.extend_from_slice(&d1);
        want.truncate(32);

        assert_eq!(kdf(b"foobar", 32), want);
    }

    #[test]
    fn test_kdf_length_is_exact() {
        for length in [0, 1, 15, 16, 17, 32, 63, 64, 100] {
            assert_eq!(kdf(b"password", length).len(), length);
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        assert_eq!(kdf(b"hunter2", 24), kdf(b"hunter2", 24));
    }

    #[test]
    fn test_kdf_sensitive_to_password() {
        assert_ne!(kdf(b"hunter2", 24), kdf(b"hunter3", 24));
    }
}
