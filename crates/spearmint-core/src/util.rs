use chrono::{TimeZone, Utc};
use getrandom::fill;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

pub fn ts_to_rfc3339(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap())
        .to_rfc3339()
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    fill(&mut out).expect("Failed to generate random bytes");
    out
}

pub fn hex_encode(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0f) as usize] as char);
    }
    out
}

/// Activation and recovery codes are 160-bit tokens, hex-encoded to a fixed
/// 40 characters.
pub fn generate_code() -> String {
    hex_encode(&random_bytes(20))
}

/// Session keys address pending registrations; they gate nothing durable, so
/// 128 bits is plenty.
pub fn generate_session_key() -> String {
    hex_encode(&random_bytes(16))
}

/// 128-bit random row id, hex-encoded.
pub fn random_id() -> String {
    hex_encode(&random_bytes(16))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn hex_encode_matches_reference() {
        assert_eq!(hex_encode(&[]), "");
        assert_eq!(hex_encode(&[0x00, 0xff, 0x1a]), "00ff1a");
    }

    #[test]
    fn codes_are_fixed_length_hex() {
        let code = generate_code();
        assert_eq!(code.len(), 40);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(generate_session_key().len(), 32);
        assert_eq!(random_id().len(), 32);
    }

    #[test]
    fn codes_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_code()));
        }
    }

    #[test]
    fn rfc3339_rendering() {
        assert_eq!(ts_to_rfc3339(0), "1970-01-01T00:00:00+00:00");
    }
}
