//! Turns an HTTP request into [`CallParams`].
//!
//! | Field | Source |
//! |-------|--------|
//! | IP | `X-Forwarded-For`, `X-Real-IP`, socket address |
//! | client type | `caller-type` query param, else `User-Agent` |
//! | version | `Caller-Version-Code` / `Caller-Version-Name` headers |
//! | language | `lang` query param, `lang` header, configured default |
//! | credentials | HTTP Basic auth, `sessionToken` header |
//! | signature | `sgn` header |
//!
//! Parameters come from the query string for `GET` and from the
//! url-encoded body (followed by the query string) otherwise. Path
//! parameters are added under a `path__` prefix.

use crate::extractors::client_ip;
use axum::{
    body::to_bytes,
    extract::{FromRequestParts, Path, Request},
    http::{HeaderMap, Method, header, request::Parts},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pipeline_core::{
    AuthArgs, CallParams, Caller, Parameters, PipelineConfig, PipelineError, ValidationError,
    Version,
};
use std::collections::HashMap;

/// Query parameter naming the client type.
pub const CALLER_TYPE_PARAM: &str = "caller-type";
/// Header carrying the client version code.
pub const VERSION_CODE_HEADER: &str = "Caller-Version-Code";
/// Header carrying the client version name.
pub const VERSION_NAME_HEADER: &str = "Caller-Version-Name";
/// Query parameter and header carrying the request language.
pub const LANG_PARAM: &str = "lang";
/// Header carrying a session token.
pub const SESSION_TOKEN_HEADER: &str = "sessionToken";
/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "sgn";
/// Prefix of path parameters in the parameter bag.
pub const PATH_PARAM_PREFIX: &str = "path__";

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Reads callers and parameters from requests.
#[derive(Debug, Clone)]
pub struct RequestReader {
    default_lang: String,
    body_limit: usize,
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new("en")
    }
}

impl RequestReader {
    /// Reader falling back to `default_lang`.
    #[must_use]
    pub fn new(default_lang: impl Into<String>) -> Self {
        Self {
            default_lang: default_lang.into(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Reader configured from `config.default_lang`.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.default_lang.clone())
    }

    /// Cap request bodies at `bytes`.
    #[must_use]
    pub const fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// The caller described by the request head.
    #[must_use]
    pub fn read_caller(&self, parts: &Parts) -> Caller {
        let headers = &parts.headers;
        let query = query_params(parts.uri.query().unwrap_or_default()).unwrap_or_default();
        let first = |key: &str| {
            query
                .get(key)
                .and_then(|values| values.first())
                .filter(|value| !value.is_empty())
                .cloned()
        };

        let caller_type = first(CALLER_TYPE_PARAM)
            .or_else(|| header_str(headers, header::USER_AGENT.as_str()))
            .unwrap_or_default();
        let language = first(LANG_PARAM)
            .or_else(|| header_str(headers, LANG_PARAM))
            .unwrap_or_else(|| self.default_lang.clone());

        let session_token = header_str(headers, SESSION_TOKEN_HEADER);
        let auth_args = basic_auth(headers).map(|(username, password)| AuthArgs {
            username,
            password,
            session_token: session_token.clone().unwrap_or_default(),
        });

        Caller {
            ip: client_ip(headers, parts.extensions.get()).to_string(),
            version: read_version(headers),
            caller_type,
            language,
            session_token: if auth_args.is_some() { None } else { session_token },
            auth_args,
            session: None,
        }
    }

    /// Parse the whole request.
    ///
    /// # Errors
    ///
    /// `VALIDATION` if the body cannot be read within the size limit or is
    /// not valid url-encoded data.
    pub async fn read(&self, req: Request) -> Result<CallParams, PipelineError> {
        let (mut parts, body) = req.into_parts();
        let caller = self.read_caller(&parts);

        let raw_query = parts.uri.query().unwrap_or_default().to_string();
        let mut parameters = if parts.method == Method::GET {
            query_params(&raw_query)?
        } else {
            let bytes = to_bytes(body, self.body_limit).await.map_err(|err| {
                bad_input("body", None, "UNREADABLE", format!("Request body is unreadable: {err}"))
            })?;
            let mut params = form_params(&bytes)?;
            for (key, values) in query_params(&raw_query)? {
                params.entry(key).or_default().extend(values);
            }
            params
        };

        let path = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await;
        if let Ok(Path(path)) = path {
            for (key, value) in path {
                parameters.insert(format!("{PATH_PARAM_PREFIX}{key}"), vec![value]);
            }
        }

        Ok(CallParams {
            parameters,
            url: request_url(&parts),
            raw_query,
            caller,
            signature: header_str(&parts.headers, SIGNATURE_HEADER),
        })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Version headers; an unparsable code reads as `0`.
fn read_version(headers: &HeaderMap) -> Option<Version> {
    let code = header_str(headers, VERSION_CODE_HEADER)?;
    Some(Version::new(
        code.trim().parse().unwrap_or(0),
        header_str(headers, VERSION_NAME_HEADER).unwrap_or_default(),
    ))
}

fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = header_str(headers, header::AUTHORIZATION.as_str())?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn collect(pairs: Vec<(String, String)>) -> Parameters {
    let mut params = Parameters::new();
    for (key, value) in pairs {
        params.entry(key).or_default().push(value);
    }
    params
}

fn query_params(raw: &str) -> Result<Parameters, PipelineError> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
        .map(collect)
        .map_err(|err| bad_input("query", Some(raw.to_string()), "MALFORMED", err.to_string()))
}

fn form_params(body: &[u8]) -> Result<Parameters, PipelineError> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map(collect)
        .map_err(|err| bad_input("body", None, "MALFORMED", err.to_string()))
}

fn bad_input(
    param: &str,
    invalid_value: Option<String>,
    reason: &str,
    message: impl Into<String>,
) -> PipelineError {
    ValidationError::new(param, invalid_value, reason, message).into()
}

fn request_url(parts: &Parts) -> String {
    if parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }
    match header_str(&parts.headers, header::HOST.as_str()) {
        Some(host) => format!("http://{host}{}", parts.uri),
        None => parts.uri.to_string(),
    }
}
