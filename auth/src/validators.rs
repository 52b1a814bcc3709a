//! Pre-action checks: client version compatibility and caller security
//! profiles.

use crate::utils::{request_signature, signatures_match};
use pipeline_core::{CallParams, PipelineConfig, PipelineError, Reason, SettingsProvider};
use std::sync::Arc;

/// Rejects callers without a version or older than the server minimum.
#[derive(Clone)]
pub struct CallerValidator {
    settings: Arc<dyn SettingsProvider>,
}

impl CallerValidator {
    /// Validator reading the version policy from `settings`.
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self { settings }
    }

    /// Check the caller's client version.
    ///
    /// # Errors
    ///
    /// - `EMPTY_VERSION` if the caller sent no version
    /// - [`PipelineError::UpdateRequired`] if the server requires a newer one
    pub fn check(&self, params: &CallParams) -> Result<(), PipelineError> {
        let Some(version) = &params.caller.version else {
            return Err(PipelineError::with_reason(
                "Client version is not specified",
                Reason::EmptyVersion,
            ));
        };

        let settings = self.settings.settings();
        match &settings.global.version {
            Some(required) if required.code > version.code => Err(PipelineError::UpdateRequired {
                message: "Client version is outdated, update required".to_string(),
                required_version: required.clone(),
                update_url: settings.global.update_app_url.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for CallerValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerValidator").finish_non_exhaustive()
    }
}

/// Request signature and caller-profile checks.
#[derive(Clone)]
pub struct SecurityService {
    settings: Arc<dyn SettingsProvider>,
    app_name: String,
    validate_signature: bool,
}

impl SecurityService {
    /// Service reading profiles from `settings`.
    #[must_use]
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        app_name: impl Into<String>,
        validate_signature: bool,
    ) -> Self {
        Self {
            settings,
            app_name: app_name.into(),
            validate_signature,
        }
    }

    /// Service configured from `config.app_name` and
    /// `config.security.validate_signature`.
    #[must_use]
    pub fn from_config(settings: Arc<dyn SettingsProvider>, config: &PipelineConfig) -> Self {
        Self::new(settings, config.app_name.clone(), config.security.validate_signature)
    }

    /// Check `params` against the security policy of `action`.
    ///
    /// Callers whose type has no profile restricting `action` pass.
    ///
    /// # Errors
    ///
    /// - `INCORRECT_SIGNATURE` on a signature mismatch (when enabled)
    /// - `PROFILE_DENIED` if the caller's profile is denied outright
    /// - `PROFILE_DENIED_BY_IP` if the caller's IP is not allowed
    pub fn check(&self, params: &CallParams, action: &str) -> Result<(), PipelineError> {
        if self.validate_signature {
            let expected = request_signature(&self.app_name, &params.parameters);
            let actual = params.signature.as_deref().unwrap_or_default();
            if !signatures_match(&expected, actual) {
                tracing::warn!(action = %action, ip = %params.caller.ip, "Incorrect request signature");
                return Err(PipelineError::with_reason(
                    "access denied",
                    Reason::IncorrectSignature,
                ));
            }
        }

        let caller = &params.caller;
        if caller.caller_type.is_empty() {
            return Ok(());
        }

        let settings = self.settings.settings();
        let Some(profile) = settings.security.restriction(action, &caller.caller_type) else {
            return Ok(());
        };

        if profile.denied {
            return Err(PipelineError::with_reason(
                format!("Profile {} is denied", caller.caller_type),
                Reason::ProfileDenied,
            ));
        }
        if profile.ips.is_empty() || profile.ips.iter().any(|ip| *ip == caller.ip) {
            return Ok(());
        }
        Err(PipelineError::with_reason(
            format!("IP {} is denied for profile {}", caller.ip, caller.caller_type),
            Reason::ProfileDeniedByIp,
        ))
    }
}

impl std::fmt::Debug for SecurityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityService")
            .field("app_name", &self.app_name)
            .field("validate_signature", &self.validate_signature)
            .finish_non_exhaustive()
    }
}
