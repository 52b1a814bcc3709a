//! Registration and login over the user repo and session store.

use crate::session::SessionStore;
use crate::users::UserRepo;
use pipeline_core::validation::check_not_empty;
use pipeline_core::{Account, AuthArgs, PipelineError, Reason, Role, Session};

/// Username of the built-in administrator.
pub const ADMIN_USERNAME: &str = "admin";
/// Fixed session token of the built-in administrator.
pub const ADMIN_SESSION_TOKEN: &str = "admin-sessiontoken";

/// Account registration, login and logout.
#[derive(Debug, Clone, Default)]
pub struct AuthService {
    users: UserRepo,
    sessions: SessionStore,
}

impl AuthService {
    /// Service over the given stores.
    #[must_use]
    pub const fn new(users: UserRepo, sessions: SessionStore) -> Self {
        Self { users, sessions }
    }

    /// The user repository.
    #[must_use]
    pub const fn users(&self) -> &UserRepo {
        &self.users
    }

    /// The session store.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Store a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// - `VALIDATION` if the username or password is empty
    /// - `ALREADY_EXIST` if the username is taken
    pub fn register(&self, mut account: Account) -> Result<Session, PipelineError> {
        check_not_empty("username", &account.username)?;
        check_not_empty("password", &account.password)?;

        if self.users.contains_by_username(&account.username) {
            return Err(PipelineError::with_reason(
                format!("User {} already exists", account.username),
                Reason::AlreadyExist,
            ));
        }

        let session = self.sessions.assign_session(&mut account);
        tracing::info!(username = %account.username, role = ?account.role, "Account registered");
        self.users.put(account);
        Ok(session)
    }

    /// Resolve credentials to a session.
    ///
    /// A session token wins over username/password and yields `None` when
    /// it names no live session; no password check happens in that case.
    ///
    /// # Errors
    ///
    /// - `VALIDATION` if the username or password is empty
    /// - `USER_NOT_EXIST` if no account has the username
    /// - `INVALID_PASSWORD` if the password does not match
    pub fn login(&self, args: &AuthArgs) -> Result<Option<Session>, PipelineError> {
        if !args.session_token.is_empty() {
            return Ok(self.sessions.session_by_token(&args.session_token));
        }

        check_not_empty("username", &args.username)?;
        check_not_empty("password", &args.password)?;

        let Some(mut user) = self.users.find_by_username(&args.username) else {
            return Err(PipelineError::with_reason(
                format!("User {} does not exist", args.username),
                Reason::UserNotExist,
            ));
        };

        if user.password != args.password {
            tracing::debug!(username = %args.username, "Invalid password");
            return Err(PipelineError::with_reason(
                "Invalid password",
                Reason::InvalidPassword,
            ));
        }

        let session = self.sessions.assign_session(&mut user);
        self.users.put(user);
        Ok(Some(session))
    }

    /// Close the session bound to `token`.
    pub fn logout(&self, token: &str) -> Option<Session> {
        self.sessions.logout_by_token(token)
    }

    /// Close every session.
    pub fn logout_all(&self) {
        self.sessions.clear();
    }

    /// Register the built-in administrator (`admin`/`admin`) with its fixed
    /// session token.
    ///
    /// # Errors
    ///
    /// `ALREADY_EXIST` if it was registered before.
    pub fn register_admin(&self) -> Result<Session, PipelineError> {
        self.register(Account {
            username: ADMIN_USERNAME.to_string(),
            password: ADMIN_USERNAME.to_string(),
            session_token: ADMIN_SESSION_TOKEN.to_string(),
            role: Role::Admin,
            ..Account::default()
        })
    }
}
