//! Content addresses for stored ciphertext.

use serde::{Deserialize, Serialize};

const BLOB_ID_CONTEXT: &str = "sealdrop 2024-01-01 blob id";

/// Which digest length the relay uses for new uploads.
///
/// Ids are always scoped by the recipient namespace, so the short form only
/// has to avoid collisions within one inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobIdScheme {
    /// 4 bytes, 8 hex characters
    #[default]
    Short,
    /// 32 bytes, 64 hex characters
    Long,
}

impl BlobIdScheme {
    pub fn digest_len(self) -> usize {
        match self {
            BlobIdScheme::Short => 4,
            BlobIdScheme::Long => 32,
        }
    }

    /// Derive the id for `data` as lowercase hex.
    pub fn derive(self, data: &[u8]) -> String {
        let mut hasher = blake3::Hasher::new_derive_key(BLOB_ID_CONTEXT);
        hasher.update(data);
        let mut out = vec![0u8; self.digest_len()];
        hasher.finalize_xof().fill(&mut out);
        hex::encode(out)
    }
}

/// Accepts ids of either scheme; used to validate path components.
pub fn is_valid(id: &str) -> bool {
    let valid_len = [BlobIdScheme::Short, BlobIdScheme::Long]
        .iter()
        .any(|s| id.len() == s.digest_len() * 2);
    valid_len && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_eight_hex_chars() {
        let id = BlobIdScheme::Short.derive(b"ciphertext");
        assert_eq!(id.len(), 8);
        assert!(is_valid(&id));
        assert_eq!(id, BlobIdScheme::Short.derive(b"ciphertext"));
        assert_ne!(id, BlobIdScheme::Short.derive(b"other ciphertext"));
    }

    #[test]
    fn long_ids_extend_short_ids() {
        let short = BlobIdScheme::Short.derive(b"ciphertext");
        let long = BlobIdScheme::Long.derive(b"ciphertext");
        assert_eq!(long.len(), 64);
        assert!(is_valid(&long));
        // XOF output: the short id is a prefix of the long one
        assert!(long.starts_with(&short));
    }

    #[test]
    fn rejects_path_like_ids() {
        assert!(!is_valid(""));
        assert!(!is_valid("../users"));
        assert!(!is_valid("ABCDEF01"));
        assert!(!is_valid("abcdef0"));
    }

    #[test]
    fn scheme_from_config_string() {
        #[derive(Deserialize)]
        struct Cfg {
            blob_id: BlobIdScheme,
        }
        let cfg: Cfg = serde_json::from_str(r#"{"blob_id":"long"}"#).unwrap();
        assert_eq!(cfg.blob_id, BlobIdScheme::Long);
    }
}
