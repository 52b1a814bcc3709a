//! Hashing helpers for session tokens and request signatures.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase hex SHA-256 of `input`.
///
/// # Examples
///
/// ```
/// use pipeline_auth::utils::sha256_hex;
///
/// assert_eq!(
///     sha256_hex("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// First session-token candidate for `username`: a hash of the current
/// time, the username and a random number.
#[must_use]
pub fn session_seed(username: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let salt: u32 = rand::random::<u32>() % 10_000_000;
    sha256_hex(&format!("{millis}:{username}:{salt}"))
}

/// Expected request signature for `params`.
///
/// The first value of every parameter is concatenated in key order after
/// `"{app_name}_"`, then hashed as
/// `sha256(app_name + sha256(sha256(payload)))`.
///
/// ```
/// use std::collections::HashMap;
/// use pipeline_auth::utils::request_signature;
///
/// let params = HashMap::from([
///     ("b".to_string(), vec!["2".to_string()]),
///     ("a".to_string(), vec!["1".to_string(), "ignored".to_string()]),
/// ]);
/// let reordered = HashMap::from([
///     ("a".to_string(), vec!["1".to_string()]),
///     ("b".to_string(), vec!["2".to_string()]),
/// ]);
/// assert_eq!(request_signature("shop", &params), request_signature("shop", &reordered));
/// ```
#[must_use]
pub fn request_signature(app_name: &str, params: &HashMap<String, Vec<String>>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let mut payload = format!("{app_name}_");
    for key in keys {
        if let Some(first) = params.get(key).and_then(|v| v.first()) {
            payload.push_str(first);
        }
    }

    let inner = sha256_hex(&sha256_hex(&payload));
    sha256_hex(&format!("{app_name}{inner}"))
}

/// Compare signatures in constant time.
#[must_use]
pub fn signatures_match(expected: &str, actual: &str) -> bool {
    constant_time_eq::constant_time_eq(expected.as_bytes(), actual.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_shape() {
        let hash = sha256_hex("bob");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sha256_hex_empty_input() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_session_seeds_differ() {
        assert_ne!(session_seed("bob"), session_seed("bob"));
    }

    #[test]
    fn test_signature_depends_on_values_and_app() {
        let params = HashMap::from([("a".to_string(), vec!["1".to_string()])]);
        let other = HashMap::from([("a".to_string(), vec!["2".to_string()])]);
        let sig = request_signature("shop", &params);
        assert_ne!(sig, request_signature("shop", &other));
        assert_ne!(sig, request_signature("blog", &params));
        assert!(signatures_match(&sig, &request_signature("shop", &params)));
        assert!(!signatures_match(&sig, "nope"));
    }
}
