//! Claim code generation
//!
//! A claim code is the short token a customer presents at the counter to
//! pick up an order. Uniqueness is backed by the database constraint on
//! `orders.claim_code`; callers retry generation on a conflict.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const CLAIM_CODE_LEN: usize = 8;

/// Generates an 8-character uppercase alphanumeric claim code.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CLAIM_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// True when `code` has the shape of a claim code (`[A-Z0-9]{8}`).
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CLAIM_CODE_LEN
        && code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..200 {
            let code = generate();
            assert!(is_well_formed(&code), "bad claim code: {code}");
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let first = generate();
        assert!((0..50).any(|_| generate() != first));
    }

    #[test]
    fn test_well_formed_rejects_wrong_shapes() {
        assert!(is_well_formed("AB12CD34"));
        assert!(!is_well_formed("ab12cd34"));
        assert!(!is_well_formed("AB12CD3"));
        assert!(!is_well_formed("AB12CD345"));
        assert!(!is_well_formed("AB12-D34"));
    }
}
