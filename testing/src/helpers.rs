//! Builders for request parameters.

use pipeline_core::{AuthArgs, CallParams, Caller, Session, Version};

/// Fluent builder for [`CallParams`].
///
/// ```
/// use pipeline_testing::CallParamsBuilder;
///
/// let params = CallParamsBuilder::new()
///     .ip("10.0.0.7")
///     .param("username", "bob")
///     .version(42, "4.2")
///     .build();
///
/// assert_eq!(params.param_str("username"), "bob");
/// assert_eq!(params.caller.ip, "10.0.0.7");
/// ```
#[derive(Debug, Clone)]
pub struct CallParamsBuilder {
    params: CallParams,
}

impl Default for CallParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallParamsBuilder {
    /// Params from `127.0.0.1`, language `en`, nothing else.
    #[must_use]
    pub fn new() -> Self {
        let mut caller = Caller::from_ip("127.0.0.1");
        caller.language = "en".to_string();
        Self {
            params: CallParams::new(caller),
        }
    }

    /// Append a value to `key`.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .parameters
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Caller IP.
    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.params.caller.ip = ip.into();
        self
    }

    /// Caller type.
    #[must_use]
    pub fn caller_type(mut self, caller_type: impl Into<String>) -> Self {
        self.params.caller.caller_type = caller_type.into();
        self
    }

    /// Client version.
    #[must_use]
    pub fn version(mut self, code: i64, name: impl Into<String>) -> Self {
        self.params.caller.version = Some(Version::new(code, name));
        self
    }

    /// Request language.
    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.params.caller.language = lang.into();
        self
    }

    /// Username/password credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.params.caller.auth_args = Some(AuthArgs::password(username, password));
        self
    }

    /// Bare session token.
    #[must_use]
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.params.caller.session_token = Some(token.into());
        self
    }

    /// Already-resolved session.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.params.caller.session = Some(session);
        self
    }

    /// Request signature.
    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.params.signature = Some(signature.into());
        self
    }

    /// Request URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.params.url = url.into();
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> CallParams {
        self.params
    }
}
