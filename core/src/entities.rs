//! Request-scoped entities: who is calling, with what parameters, and the
//! accounts and sessions they resolve to.

use crate::validation::{check_bool, check_f64, check_i64};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameter bag: every key maps to a non-empty, ordered list of values.
pub type Parameters = HashMap<String, Vec<String>>;

/// Client or server version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Monotonic version code used for comparisons.
    pub code: i64,
    /// Display name (e.g. `2.4.1`).
    #[serde(default)]
    pub name: String,
}

impl Version {
    /// Create a version.
    #[must_use]
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }
}

/// Credentials sent by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthArgs {
    /// Username for password login.
    #[serde(default)]
    pub username: String,
    /// Password for password login.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Previously issued session token.
    #[serde(default)]
    pub session_token: String,
}

impl AuthArgs {
    /// Credentials consisting of a session token only.
    #[must_use]
    pub fn token(session_token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            ..Self::default()
        }
    }

    /// Username/password credentials.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            session_token: String::new(),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator.
    Admin,
    /// Regular user.
    #[default]
    User,
}

impl Role {
    /// Parse a role name; anything but `admin` is a regular user.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Internal id.
    pub id: i64,
    /// Customer id; `0` means the account is not active yet.
    pub cid: i64,
    /// Secondary client id.
    pub mcl_id: i64,
    /// Unique username.
    pub username: String,
    /// Preferred language.
    pub lang: String,
    /// Display name.
    pub full_name: String,
    /// Token of the session currently bound to this account.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_token: String,
    /// Role.
    pub role: Role,
    /// Password. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// IP the account was registered from.
    pub ip: String,
}

/// Server-side record binding an issued token to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Issued token.
    pub token: String,
    /// Authenticated account.
    pub account: Account,
}

/// Identity and metadata of whoever made the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    /// Remote IP.
    pub ip: String,
    /// Client version, if the client sent one.
    pub version: Option<Version>,
    /// Client type (explicit, else user agent).
    #[serde(rename = "type")]
    pub caller_type: String,
    /// Request language.
    pub language: String,
    /// Credentials, if any were sent.
    pub auth_args: Option<AuthArgs>,
    /// Bare session token sent without other credentials.
    pub session_token: Option<String>,
    /// Resolved session, filled in once the caller is authenticated.
    pub session: Option<Session>,
}

impl Caller {
    /// Caller with the given IP and nothing else.
    #[must_use]
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }

    /// Credentials to log in with: explicit auth args win, otherwise a bare
    /// session token (or the token of an attached session) is used.
    #[must_use]
    pub fn effective_auth_args(&self) -> Option<AuthArgs> {
        if let Some(args) = &self.auth_args {
            return Some(args.clone());
        }
        self.session_token
            .as_deref()
            .or_else(|| self.session.as_ref().map(|s| s.token.as_str()))
            .filter(|token| !token.is_empty())
            .map(AuthArgs::token)
    }
}

/// Canonical parsed request handed to actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParams {
    /// Request parameters.
    pub parameters: Parameters,
    /// Full request URL.
    pub url: String,
    /// Raw query string.
    #[serde(skip)]
    pub raw_query: String,
    /// Who is calling.
    pub caller: Caller,
    /// Request signature, if the transport carried one.
    #[serde(skip)]
    pub signature: Option<String>,
}

impl CallParams {
    /// Params for `caller` with no parameters.
    #[must_use]
    pub fn new(caller: Caller) -> Self {
        Self {
            caller,
            ..Self::default()
        }
    }

    /// All values of `key` (empty if absent).
    #[must_use]
    pub fn param(&self, key: &str) -> &[String] {
        self.parameters.get(key).map_or(&[], Vec::as_slice)
    }

    /// First value of `key`, or `""`.
    #[must_use]
    pub fn param_str(&self, key: &str) -> &str {
        self.param(key).first().map_or("", String::as_str)
    }

    /// First value of `key` as an integer, or `fallback`.
    #[must_use]
    pub fn param_i64(&self, key: &str, fallback: i64) -> i64 {
        check_i64(key, self.param_str(key)).unwrap_or(fallback)
    }

    /// First value of `key` as a float, or `fallback`.
    #[must_use]
    pub fn param_f64(&self, key: &str, fallback: f64) -> f64 {
        check_f64(key, self.param_str(key)).unwrap_or(fallback)
    }

    /// First value of `key` as a boolean, or `fallback`.
    #[must_use]
    pub fn param_bool(&self, key: &str, fallback: bool) -> bool {
        check_bool(key, self.param_str(key)).unwrap_or(fallback)
    }

    /// Replace all values of `key` with a single value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), vec![value.into()]);
    }

    /// First value of every parameter.
    #[must_use]
    pub fn str_params(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .filter_map(|(k, v)| v.first().map(|first| (k.clone(), first.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CallParams {
        let mut p = CallParams::new(Caller::from_ip("10.0.0.1"));
        p.parameters
            .insert("tags".to_string(), vec!["a".to_string(), "b".to_string()]);
        p.set_param("age", "41");
        p.set_param("flag", "true");
        p
    }

    #[test]
    fn test_param_accessors() {
        let p = params();
        assert_eq!(p.param("tags").len(), 2);
        assert_eq!(p.param_str("tags"), "a");
        assert_eq!(p.param_str("missing"), "");
        assert_eq!(p.param_i64("age", 0), 41);
        assert_eq!(p.param_i64("tags", -1), -1);
        assert!(p.param_bool("flag", false));
        assert_eq!(p.str_params().get("tags").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_effective_auth_args_prefers_explicit_credentials() {
        let mut caller = Caller::from_ip("1.2.3.4");
        assert_eq!(caller.effective_auth_args(), None);

        caller.session_token = Some("tok".to_string());
        assert_eq!(caller.effective_auth_args(), Some(AuthArgs::token("tok")));

        caller.auth_args = Some(AuthArgs::password("bob", "x"));
        assert_eq!(
            caller.effective_auth_args().map(|a| a.username),
            Some("bob".to_string())
        );
    }

    #[test]
    fn test_account_password_is_not_serialized() {
        let account = Account {
            username: "bob".to_string(),
            password: "secret".to_string(),
            ..Account::default()
        };
        let json = serde_json::to_string(&account).unwrap_or_default();
        assert!(json.contains("\"username\":\"bob\""));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse(""), Role::User);
    }
}
