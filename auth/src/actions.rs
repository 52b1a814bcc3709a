//! Stock actions built on the auth services.
//!
//! All of them take [`Payload::Params`]. Checks forward their input
//! unchanged so they can sit anywhere in a chain.
//!
//! ```text
//! ValidateCaller ─▶ CheckSecurity ─▶ GetUser ─▶ ValidateActiveUser ─▶ <business action>
//! ```

use crate::service::AuthService;
use crate::validators::{CallerValidator, SecurityService};
use async_trait::async_trait;
use pipeline_core::{
    Account, Action, ActionContext, AlertParams, CallParams, ClassifiedError, Payload,
    PipelineError, Reason, Role,
};
use pipeline_runtime::AttemptLimiter;

fn mute_expected(alert: &mut AlertParams, err: &ClassifiedError) {
    if err.is(&Reason::AuthorizationRequired) || err.is(&Reason::InactiveUser) {
        alert.send = false;
    }
}

/// Checks the caller's client version.
#[derive(Debug, Clone)]
pub struct ValidateCallerAction {
    validator: CallerValidator,
}

impl ValidateCallerAction {
    /// Action backed by `validator`.
    #[must_use]
    pub const fn new(validator: CallerValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Action for ValidateCallerAction {
    fn name(&self) -> &str {
        "ValidateCaller"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        self.validator.check(arg.as_params()?)?;
        Ok(arg)
    }

    fn prepare_error_alert(
        &self,
        _ctx: &ActionContext,
        alert: &mut AlertParams,
        err: &ClassifiedError,
        _arg: &Payload,
    ) {
        if matches!(err.source(), Some(PipelineError::UpdateRequired { .. })) {
            alert.send = false;
        }
    }
}

/// Applies the security policy of one named action.
#[derive(Debug, Clone)]
pub struct CheckSecurityAction {
    security: SecurityService,
    checked_action: String,
}

impl CheckSecurityAction {
    /// Check `checked_action`'s policy with `security`.
    #[must_use]
    pub fn new(security: SecurityService, checked_action: impl Into<String>) -> Self {
        Self {
            security,
            checked_action: checked_action.into(),
        }
    }
}

#[async_trait]
impl Action for CheckSecurityAction {
    fn name(&self) -> &str {
        "CheckSecurity"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        self.security.check(arg.as_params()?, &self.checked_action)?;
        Ok(arg)
    }
}

/// Authenticates the caller and attaches the session to the params.
///
/// With an [`AttemptLimiter`], password logins are throttled per username:
/// wrong passwords count as failures and a successful login resets them.
#[derive(Debug, Clone)]
pub struct GetUserAction {
    auth: AuthService,
    attempts: Option<AttemptLimiter>,
}

impl GetUserAction {
    /// Action without attempt limiting.
    #[must_use]
    pub const fn new(auth: AuthService) -> Self {
        Self {
            auth,
            attempts: None,
        }
    }

    /// Throttle password logins with `attempts`.
    #[must_use]
    pub fn with_attempt_limiter(mut self, attempts: AttemptLimiter) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

#[async_trait]
impl Action for GetUserAction {
    fn name(&self) -> &str {
        "GetUser"
    }

    async fn run(&self, ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let mut params = arg.into_params()?;

        let Some(auth_args) = params.caller.effective_auth_args() else {
            return Err(PipelineError::with_reason(
                "User is not authorized",
                Reason::AuthorizationRequired,
            ));
        };

        let limited = self
            .attempts
            .as_ref()
            .filter(|_| auth_args.session_token.is_empty() && !auth_args.username.is_empty());
        if let Some(attempts) = limited {
            attempts.check_with_response(&auth_args.username)?;
        }

        let session = match self.auth.login(&auth_args) {
            Ok(session) => session,
            Err(err) => {
                if let Some(attempts) = limited {
                    if err.has_reason(&Reason::InvalidPassword) {
                        attempts.increment(&auth_args.username);
                    }
                }
                return Err(err);
            }
        };

        let Some(session) = session else {
            return Err(PipelineError::with_reason(
                "User does not exist",
                Reason::UserNotExist,
            ));
        };

        if let Some(attempts) = limited {
            attempts.reset(&auth_args.username);
        }
        ctx.log(format_args!("user={}", session.account.username));
        params.caller.session = Some(session);
        Ok(params.into())
    }

    fn prepare_error_alert(
        &self,
        _ctx: &ActionContext,
        alert: &mut AlertParams,
        err: &ClassifiedError,
        _arg: &Payload,
    ) {
        mute_expected(alert, err);
    }
}

/// Registers the account described by the params and emits its session.
#[derive(Debug, Clone)]
pub struct RegisterAccountAction {
    auth: AuthService,
}

impl RegisterAccountAction {
    /// Action registering through `auth`.
    #[must_use]
    pub const fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Action for RegisterAccountAction {
    fn name(&self) -> &str {
        "AccountRegistration"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let account = read_account(arg.as_params()?);
        Ok(self.auth.register(account)?.into())
    }
}

/// Requires an authenticated caller whose account is active (`cid != 0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateActiveUserAction;

#[async_trait]
impl Action for ValidateActiveUserAction {
    fn name(&self) -> &str {
        "ValidateActiveUser"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let params = arg.as_params()?;
        let Some(session) = &params.caller.session else {
            return Err(PipelineError::with_reason(
                "User is not authorized",
                Reason::AuthorizationRequired,
            ));
        };
        if session.account.cid == 0 {
            return Err(PipelineError::with_reason(
                "User is not active",
                Reason::InactiveUser,
            ));
        }
        Ok(arg)
    }

    fn prepare_error_alert(
        &self,
        _ctx: &ActionContext,
        alert: &mut AlertParams,
        err: &ClassifiedError,
        _arg: &Payload,
    ) {
        mute_expected(alert, err);
    }
}

/// Emits the caller's session, or nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetSessionAction;

#[async_trait]
impl Action for GetSessionAction {
    fn name(&self) -> &str {
        "GetSession"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let params = arg.into_params()?;
        Ok(params.caller.session.map_or(Payload::Empty, Payload::from))
    }
}

/// Closes the caller's session and emits it, or nothing if none was open.
#[derive(Debug, Clone)]
pub struct LogoutAction {
    auth: AuthService,
}

impl LogoutAction {
    /// Action logging out through `auth`.
    #[must_use]
    pub const fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Action for LogoutAction {
    fn name(&self) -> &str {
        "Logout"
    }

    async fn run(&self, _ctx: &mut ActionContext, arg: Payload) -> Result<Payload, PipelineError> {
        let params = arg.as_params()?;
        let token = params
            .caller
            .effective_auth_args()
            .map(|a| a.session_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PipelineError::with_reason("User is not authorized", Reason::AuthorizationRequired)
            })?;
        Ok(self.auth.logout(&token).map_or(Payload::Empty, Payload::from))
    }

    fn prepare_error_alert(
        &self,
        _ctx: &ActionContext,
        alert: &mut AlertParams,
        err: &ClassifiedError,
        _arg: &Payload,
    ) {
        mute_expected(alert, err);
    }
}

/// Account described by the request.
///
/// Reads `username`, `password`, `role`, `lang`, `fullName`, `token`,
/// `c_id` and `mcl_id`. Missing credentials fall back to the caller's auth
/// args; missing role, language and ids fall back to the caller's session.
#[must_use]
pub fn read_account(params: &CallParams) -> Account {
    let caller = &params.caller;
    let mut account = Account {
        username: params.param_str("username").to_string(),
        password: params.param_str("password").to_string(),
        lang: params.param_str("lang").to_string(),
        full_name: params.param_str("fullName").to_string(),
        session_token: params.param_str("token").to_string(),
        cid: params.param_i64("c_id", 0),
        mcl_id: params.param_i64("mcl_id", 0),
        ip: caller.ip.clone(),
        ..Account::default()
    };
    let role = params.param_str("role");

    if let Some(args) = &caller.auth_args {
        if account.username.is_empty() {
            account.username.clone_from(&args.username);
        }
        if account.password.is_empty() {
            account.password.clone_from(&args.password);
        }
        if account.session_token.is_empty() {
            account.session_token.clone_from(&args.session_token);
        }
    }

    match caller.session.as_ref().map(|s| &s.account) {
        Some(current) => {
            account.role = if role.is_empty() { current.role } else { Role::parse(role) };
            if account.lang.is_empty() {
                account.lang.clone_from(&current.lang);
            }
            if account.mcl_id == 0 {
                account.mcl_id = current.mcl_id;
            }
            if account.cid == 0 {
                account.cid = current.cid;
            }
        }
        None => account.role = Role::parse(role),
    }
    account
}
