//! Account names handed out by the relay.
//!
//! A name is `base58(payload (6) || checksum (1))`. The payload is 128 bytes
//! of fresh randomness squeezed through BLAKE3 in derive-key mode; the
//! checksum is the payload hashed again under a separate context, so a
//! mistyped name is caught locally before it ever reaches the network.

const PAYLOAD_CONTEXT: &str = "sealdrop 2024-01-01 account name payload";
const CHECKSUM_CONTEXT: &str = "sealdrop 2024-01-01 account name checksum";

pub const ENTROPY_SIZE: usize = 128;
pub const PAYLOAD_SIZE: usize = 6;
pub const CHECKSUM_SIZE: usize = 1;
pub const IDENTIFIER_SIZE: usize = PAYLOAD_SIZE + CHECKSUM_SIZE;

fn derive<const N: usize>(context: &str, data: &[u8]) -> [u8; N] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    let mut out = [0u8; N];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// Allocate a new random account name.
pub fn generate() -> String {
    let mut entropy = [0u8; ENTROPY_SIZE];
    getrandom::getrandom(&mut entropy).expect("failed to generate random bytes");

    let payload: [u8; PAYLOAD_SIZE] = derive(PAYLOAD_CONTEXT, &entropy);
    encode(&payload)
}

fn encode(payload: &[u8; PAYLOAD_SIZE]) -> String {
    let checksum: [u8; CHECKSUM_SIZE] = derive(CHECKSUM_CONTEXT, payload);

    let mut raw = [0u8; IDENTIFIER_SIZE];
    raw[..PAYLOAD_SIZE].copy_from_slice(payload);
    raw[PAYLOAD_SIZE..].copy_from_slice(&checksum);
    bs58::encode(raw).into_string()
}

/// True when `name` decodes to the right length and its checksum matches.
///
/// Anything that passes is plain base58, so it is also safe to use as a
/// single path component.
pub fn verify(name: &str) -> bool {
    let raw = match bs58::decode(name).into_vec() {
        Ok(raw) => raw,
        Err(_) => return false,
    };
    if raw.len() != IDENTIFIER_SIZE {
        return false;
    }
    let (payload, checksum) = raw.split_at(PAYLOAD_SIZE);
    let expected: [u8; CHECKSUM_SIZE] = derive(CHECKSUM_CONTEXT, payload);
    checksum == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_verify() {
        for _ in 0..100 {
            let name = generate();
            assert!(verify(&name), "{name} should verify");
        }
    }

    #[test]
    fn names_are_distinct() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(!verify(""));
        assert!(!verify("0OIl"));
        assert!(!verify("../../etc"));
        assert!(!verify(&bs58::encode([1u8; 5]).into_string()));
        assert!(!verify(&bs58::encode([1u8; 9]).into_string()));
    }

    #[test]
    fn single_byte_flips_are_caught() {
        let mut undetected = 0;
        let mut trials = 0;
        for _ in 0..50 {
            let raw = bs58::decode(generate()).into_vec().unwrap();
            for position in 0..IDENTIFIER_SIZE {
                let mut flipped = raw.clone();
                flipped[position] ^= 0x5a;
                trials += 1;
                if verify(&bs58::encode(&flipped).into_string()) {
                    undetected += 1;
                }
            }
        }
        // a one-byte checksum misses about 1 in 256
        assert_eq!(trials, 350);
        assert!(undetected < 20, "{undetected} of {trials} flips undetected");
    }

    #[test]
    fn checksum_flip_always_caught() {
        let mut raw = bs58::decode(generate()).into_vec().unwrap();
        raw[PAYLOAD_SIZE] ^= 0xff;
        assert!(!verify(&bs58::encode(&raw).into_string()));
    }
}
