//! Names and payloads shared by the relay's HTTP surface and its clients.

use serde::{Deserialize, Serialize};

/// Account name header on authenticated requests
pub const APIUSERNAME_HEADER: &str = "Apiusername";
/// API token header on authenticated requests
pub const APIKEY_HEADER: &str = "Apikey";

/// Multipart field carrying newline-separated recipient names
pub const RECIPIENT_LIST_FIELD: &str = "recipientList";
/// Multipart field carrying the sealed envelope
pub const UPLOAD_FILE_FIELD: &str = "uploadfile";

pub const PUB_ID_PARAM: &str = "pubID";
pub const MACHINE_ID_PARAM: &str = "MachineID";
pub const USERNAME_PARAM: &str = "username";

/// Credentials minted by the relay at registration.
///
/// Travels JSON-encoded inside an envelope sealed to the registering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub name: String,
    pub api_token: String,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub machine_token: Option<String>,
}

/// Body of `GET /_status/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// Hex public key the relay signs registration responses with
    pub public_key: String,
}

/// Filename the relay puts inside the registration envelope.
pub const REGISTER_RESPONSE_FILENAME: &str = "register.json";

/// Filename used for the encrypted client state pushed to the config vault.
pub const CONFIG_BACKUP_FILENAME: &str = "config-backup.json";

/// Format a size with binary suffixes, e.g. `1.5 KiB`.
pub fn human_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_response_machine_fields_optional() {
        let parsed: RegisterResponse =
            serde_json::from_str(r#"{"name":"abc","api_token":"00"}"#).unwrap();
        assert_eq!(parsed.name, "abc");
        assert!(parsed.machine_id.is_none());
        assert!(parsed.machine_token.is_none());
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
