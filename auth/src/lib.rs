//! # Pipeline Auth
//!
//! Accounts, sessions and the caller checks that guard actions.
//!
//! - [`SessionStore`]: token ↔ account sessions, at most one per username
//! - [`AuthService`]: registration and login over a [`UserRepo`]
//! - [`CallerValidator`] / [`SecurityService`]: version and profile policy
//! - [`actions`]: the stock actions wiring all of the above into chains
//!
//! ## Example
//!
//! ```rust
//! use pipeline_auth::AuthService;
//! use pipeline_core::{Account, AuthArgs};
//!
//! let auth = AuthService::default();
//! let session = auth
//!     .register(Account {
//!         username: "bob".into(),
//!         password: "x".into(),
//!         ..Account::default()
//!     })
//!     .unwrap();
//!
//! let again = auth.login(&AuthArgs::token(session.token.clone())).unwrap();
//! assert_eq!(again.map(|s| s.account.username), Some("bob".to_string()));
//! ```

pub mod actions;
pub mod service;
pub mod session;
pub mod users;
pub mod utils;
pub mod validators;

pub use actions::{
    CheckSecurityAction, GetSessionAction, GetUserAction, LogoutAction, RegisterAccountAction,
    ValidateActiveUserAction, ValidateCallerAction, read_account,
};
pub use service::{ADMIN_SESSION_TOKEN, ADMIN_USERNAME, AuthService};
pub use session::SessionStore;
pub use users::UserRepo;
pub use validators::{CallerValidator, SecurityService};
