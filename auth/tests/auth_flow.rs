//! End-to-end tests for the stock auth actions driven through the runner.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pipeline_auth::{
    ADMIN_SESSION_TOKEN, AuthService, CallerValidator, GetSessionAction, GetUserAction,
    LogoutAction, RegisterAccountAction, ValidateActiveUserAction, ValidateCallerAction,
    read_account,
};
use pipeline_core::{
    Action, AuthArgs, Chain, DefaultErrorClassifier, Payload, Reason, Role, ServerSettings,
    SettingsProvider, StaticSettingsProvider,
};
use pipeline_runtime::{ActionRunner, AlertSink, AttemptLimiter};
use pipeline_testing::{CallParamsBuilder, RecordingAlertSink};
use std::sync::Arc;
use std::time::Duration;

fn runner(alerts: &Arc<RecordingAlertSink>) -> ActionRunner {
    ActionRunner::new(
        Arc::new(DefaultErrorClassifier::new(false)),
        Arc::clone(alerts) as Arc<dyn AlertSink>,
    )
}

fn params(builder: CallParamsBuilder) -> Payload {
    builder.build().into()
}

async fn register(auth: &AuthService, username: &str, password: &str) -> pipeline_core::Session {
    let alerts = Arc::new(RecordingAlertSink::new());
    let result = runner(&alerts)
        .run(&RegisterAccountAction::new(auth.clone()), || {
            Ok(params(
                CallParamsBuilder::new()
                    .param("username", username)
                    .param("password", password),
            ))
        })
        .await;
    result.value.into_session().unwrap()
}

#[tokio::test]
async fn test_register_then_login_by_token() {
    let auth = AuthService::default();
    let session = register(&auth, "bob", "x").await;
    assert_eq!(session.account.username, "bob");
    assert!(!session.token.is_empty());

    let alerts = Arc::new(RecordingAlertSink::new());
    let result = runner(&alerts)
        .run(&GetUserAction::new(auth.clone()), || {
            Ok(params(CallParamsBuilder::new().session_token(&session.token)))
        })
        .await;

    assert!(result.is_success());
    let logged_in = result.value.into_params().unwrap().caller.session.unwrap();
    assert_eq!(logged_in.account.username, "bob");
    assert_eq!(logged_in.token, session.token);
}

#[tokio::test]
async fn test_password_login_reuses_session() {
    let auth = AuthService::default();
    let session = register(&auth, "bob", "x").await;

    let again = auth.login(&AuthArgs::password("bob", "x")).unwrap().unwrap();
    assert_eq!(again.token, session.token);
    assert_eq!(auth.sessions().len(), 1);
}

#[tokio::test]
async fn test_duplicate_registration() {
    let auth = AuthService::default();
    register(&auth, "bob", "x").await;

    let alerts = Arc::new(RecordingAlertSink::new());
    let result = runner(&alerts)
        .run(&RegisterAccountAction::new(auth.clone()), || {
            Ok(params(
                CallParamsBuilder::new()
                    .param("username", "bob")
                    .param("password", "y"),
            ))
        })
        .await;
    assert_eq!(result.reason(), Some(&Reason::AlreadyExist));

    let missing_password = runner(&alerts)
        .run(&RegisterAccountAction::new(auth), || {
            Ok(params(CallParamsBuilder::new().param("username", "carol")))
        })
        .await;
    assert_eq!(missing_password.reason(), Some(&Reason::Validation));
}

#[tokio::test]
async fn test_unknown_token_and_missing_credentials() {
    let auth = AuthService::default();
    let alerts = Arc::new(RecordingAlertSink::new());
    let action = GetUserAction::new(auth);

    let unknown = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new().session_token("nope"))))
        .await;
    assert_eq!(unknown.reason(), Some(&Reason::UserNotExist));

    let anonymous = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new())))
        .await;
    assert_eq!(anonymous.reason(), Some(&Reason::AuthorizationRequired));

    // Only the unexpected failure is alerted.
    assert_eq!(
        alerts.alerts(),
        vec![("GetUser".to_string(), Reason::UserNotExist)]
    );
}

#[tokio::test]
async fn test_attempt_limiter_blocks_after_wrong_passwords() {
    let auth = AuthService::default();
    register(&auth, "bob", "x").await;

    let attempts = AttemptLimiter::new(2, Duration::from_secs(120), "Wait {minutes} minutes");
    let action = GetUserAction::new(auth).with_attempt_limiter(attempts.clone());
    let alerts = Arc::new(RecordingAlertSink::new());
    let login = |password: &'static str| {
        let runner = runner(&alerts);
        let action = action.clone();
        async move {
            runner
                .run(&action, || {
                    Ok(params(CallParamsBuilder::new().credentials("bob", password)))
                })
                .await
        }
    };

    assert_eq!(login("bad").await.reason(), Some(&Reason::InvalidPassword));
    assert!(login("x").await.is_success());
    assert_eq!(attempts.count("bob"), 0);

    assert_eq!(login("bad").await.reason(), Some(&Reason::InvalidPassword));
    assert_eq!(login("bad").await.reason(), Some(&Reason::InvalidPassword));

    let blocked = login("x").await;
    assert_eq!(blocked.reason(), Some(&Reason::TooManyRequests));
    assert_eq!(
        blocked.error.as_ref().map(|e| e.message.as_str()),
        Some("Wait 2 minutes")
    );
}

#[tokio::test]
async fn test_inactive_user_is_not_alerted() {
    let auth = AuthService::default();
    let session = register(&auth, "bob", "x").await;

    let chain = Chain::new(vec![
        Arc::new(GetUserAction::new(auth)) as Arc<dyn Action>,
        Arc::new(ValidateActiveUserAction) as Arc<dyn Action>,
        Arc::new(GetSessionAction) as Arc<dyn Action>,
    ]);
    let alerts = Arc::new(RecordingAlertSink::new());

    let result = runner(&alerts)
        .run(&chain, || Ok(params(CallParamsBuilder::new().session_token(&session.token))))
        .await;

    assert_eq!(result.reason(), Some(&Reason::InactiveUser));
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_active_user_gets_session() {
    let auth = AuthService::default();
    let alerts = Arc::new(RecordingAlertSink::new());
    let registered = runner(&alerts)
        .run(&RegisterAccountAction::new(auth.clone()), || {
            Ok(params(
                CallParamsBuilder::new()
                    .param("username", "bob")
                    .param("password", "x")
                    .param("c_id", "12"),
            ))
        })
        .await
        .value
        .into_session()
        .unwrap();
    assert_eq!(registered.account.cid, 12);

    let chain = Chain::new(vec![
        Arc::new(GetUserAction::new(auth)) as Arc<dyn Action>,
        Arc::new(ValidateActiveUserAction) as Arc<dyn Action>,
        Arc::new(GetSessionAction) as Arc<dyn Action>,
    ]);
    let result = runner(&alerts)
        .run(&chain, || {
            Ok(params(CallParamsBuilder::new().session_token(&registered.token)))
        })
        .await;

    assert_eq!(result.value.into_session().unwrap().token, registered.token);
}

#[tokio::test]
async fn test_update_required_is_access_denied_and_muted() {
    let settings = ServerSettings::from_toml_str(
        r#"
[global]
update_app_url = "https://example.com/app"
version = { code = 5, name = "0.5" }
"#,
    )
    .unwrap();
    let provider: Arc<dyn SettingsProvider> = Arc::new(StaticSettingsProvider::new(settings));
    let action = ValidateCallerAction::new(CallerValidator::new(provider));
    let alerts = Arc::new(RecordingAlertSink::new());

    let outdated = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new().version(4, "0.4"))))
        .await;
    assert_eq!(outdated.reason(), Some(&Reason::AccessDenied));
    assert!(alerts.alerts().is_empty());

    let current = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new().version(5, "0.5"))))
        .await;
    assert!(current.is_success());
}

#[tokio::test]
async fn test_logout() {
    let auth = AuthService::default();
    let session = register(&auth, "bob", "x").await;
    let alerts = Arc::new(RecordingAlertSink::new());
    let action = LogoutAction::new(auth.clone());

    let result = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new().session_token(&session.token))))
        .await;
    assert_eq!(result.value.into_session().unwrap().token, session.token);
    assert!(!auth.sessions().is_logged_in(&session.token));

    let again = runner(&alerts)
        .run(&action, || Ok(params(CallParamsBuilder::new().session_token(&session.token))))
        .await;
    assert!(again.is_success());
    assert_eq!(again.value, Payload::Empty);
}

#[test]
fn test_register_admin() {
    let auth = AuthService::default();
    let admin = auth.register_admin().unwrap();

    assert_eq!(admin.token, ADMIN_SESSION_TOKEN);
    assert_eq!(admin.account.role, Role::Admin);
    let by_token = auth.login(&AuthArgs::token(ADMIN_SESSION_TOKEN)).unwrap();
    assert_eq!(by_token.map(|s| s.account.username), Some("admin".to_string()));
    assert!(auth.register_admin().unwrap_err().has_reason(&Reason::AlreadyExist));
}

#[test]
fn test_read_account_falls_back_to_caller() {
    let session = AuthService::default().register_admin().unwrap();
    let params = CallParamsBuilder::new()
        .ip("10.1.2.3")
        .credentials("carol", "pw")
        .session(session)
        .param("fullName", "Carol C")
        .param("mcl_id", "9")
        .build();

    let account = read_account(&params);
    assert_eq!(account.username, "carol");
    assert_eq!(account.password, "pw");
    assert_eq!(account.full_name, "Carol C");
    assert_eq!(account.mcl_id, 9);
    assert_eq!(account.role, Role::Admin);
    assert_eq!(account.ip, "10.1.2.3");
}
