use std::num::NonZeroU32;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::util::random_bytes;

const OUTPUT_LEN: usize = 32;
const SALT_LEN: usize = 64;

/// Server-side PBKDF2 iteration count applied on top of whatever the visitor
/// typed. Stored per user so it can be raised without breaking old hashes.
pub const SERVER_ITERATIONS: i32 = 100_000;

pub fn fresh_salt() -> Vec<u8> {
    random_bytes(SALT_LEN)
}

/// Derive the stored password hash: PBKDF2-HMAC-SHA256 over the plaintext
/// with a random per-user salt.
pub fn hash_password(secret: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut out = vec![0u8; OUTPUT_LEN];
    let iterations = NonZeroU32::new(iterations).expect("Iterations must be non-zero");
    pbkdf2_hmac::<Sha256>(secret, salt, iterations.get(), &mut out);
    out
}

pub fn verify_password_hash(secret: &[u8], salt: &[u8], expected: &[u8], iterations: u32) -> bool {
    let iterations = NonZeroU32::new(iterations).expect("Iterations must be non-zero");
    if expected.len() != OUTPUT_LEN {
        return false;
    }

    // Derive and constant-time compare.
    let mut out = vec![0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(secret, salt, iterations.get(), &mut out);
    subtle::ConstantTimeEq::ct_eq(out.as_ref(), expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep test iterations low; correctness does not depend on the count.
    const ITER: u32 = 1_000;

    #[test]
    fn verify_accepts_matching_password() {
        let salt = fresh_salt();
        let hash = hash_password(b"hunter2", &salt, ITER);
        assert!(verify_password_hash(b"hunter2", &salt, &hash, ITER));
    }

    #[test]
    fn verify_rejects_wrong_password_and_salt() {
        let salt = fresh_salt();
        let hash = hash_password(b"hunter2", &salt, ITER);
        assert!(!verify_password_hash(b"hunter3", &salt, &hash, ITER));
        assert!(!verify_password_hash(b"hunter2", &fresh_salt(), &hash, ITER));
    }

    #[test]
    fn verify_rejects_truncated_hash() {
        let salt = fresh_salt();
        let hash = hash_password(b"hunter2", &salt, ITER);
        assert!(!verify_password_hash(b"hunter2", &salt, &hash[..16], ITER));
    }

    #[test]
    fn same_password_different_salt_differs() {
        let a = hash_password(b"hunter2", &fresh_salt(), ITER);
        let b = hash_password(b"hunter2", &fresh_salt(), ITER);
        assert_ne!(a, b);
    }
}
