//! End-to-end signup and login against in-memory SQLite
#![cfg(feature = "sqlite")]

use std::sync::Arc;

use chrono::{Duration, Utc};
use franchise::{
    AccountConfig, ClientContext, Error, Franchise, FranchiseBuilder, JwtConfig, LoginRequest,
    NewInvitationCode, Role, SignupRequest, SqliteRepositoryProvider,
};
use franchise_core::{
    AuthError, InvitationError,
    audit::actions,
    repositories::{
        AccountRepository, AccountRepositoryProvider, InvitationCodeRepository,
        InvitationCodeRepositoryProvider,
    },
};

const PASSWORD: &str = "Abc12345!";

fn setup_test() {
    let _ = tracing_subscriber::fmt().try_init();
}

async fn setup() -> (Franchise<SqliteRepositoryProvider>, Arc<SqliteRepositoryProvider>) {
    setup_test();

    let provider = Arc::new(
        SqliteRepositoryProvider::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to SQLite"),
    );

    let franchise = FranchiseBuilder::new()
        .with_repositories(provider.clone())
        .with_jwt_config(
            JwtConfig::new_hs256(b"integration-test-secret".to_vec()).with_issuer("franchise"),
        )
        .with_account_config(AccountConfig::default().with_bcrypt_cost(4))
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Franchise");

    (franchise, provider)
}

async fn seed_code(franchise: &Franchise<SqliteRepositoryProvider>, code: NewInvitationCode) {
    franchise
        .create_invitation_code(code)
        .await
        .expect("Failed to create invitation code");
}

fn signup_request(code: &str, email: &str) -> SignupRequest {
    SignupRequest {
        invitation_code: code.to_string(),
        full_name: "Maria Santos".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn client() -> ClientContext {
    ClientContext::new(Some("203.0.113.7".to_string()), Some("integration-test".to_string()))
}

#[tokio::test]
async fn test_signup_then_login() {
    let (franchise, provider) = setup().await;
    seed_code(
        &franchise,
        NewInvitationCode::builder()
            .code("CREW2025")
            .role(Role::Crew)
            .max_uses(10)
            .build()
            .unwrap(),
    )
    .await;

    let created = franchise
        .signup(signup_request("CREW2025", "Crew.Member@Example.com"), &client())
        .await
        .expect("Signup failed");
    assert!(created.success);
    assert_eq!(created.data.email, "crew.member@example.com");
    assert_eq!(created.data.role, Role::Crew);
    assert!(!created.data.is_email_verified);

    let stored = provider
        .account()
        .find_by_email("crew.member@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, PASSWORD);
    assert!(stored.password_hash.starts_with("$2"));
    assert!(stored.email_verification_token.is_some());

    let code = provider
        .invitation_code()
        .find_by_code("CREW2025")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code.current_uses, 1);

    let logged_in = franchise
        .login(login_request("CREW.MEMBER@example.com", PASSWORD), &client())
        .await
        .expect("Login failed");
    assert_eq!(logged_in.message, "Login successful");
    assert!(logged_in.data.last_login.is_some());

    let account = franchise
        .authenticate(logged_in.token.as_str())
        .await
        .expect("Token should authenticate");
    assert_eq!(account.id, created.data.id);

    let recorded: Vec<String> = franchise
        .recent_audit_entries(10)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        recorded,
        vec![actions::LOGIN_SUCCESS, actions::USER_SIGNUP_SUCCESS]
    );
}

#[tokio::test]
async fn test_duplicate_email_differs_only_in_case() {
    let (franchise, _) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("OPEN").build().unwrap()).await;

    franchise
        .signup(signup_request("OPEN", "owner@example.com"), &client())
        .await
        .unwrap();

    let err = franchise
        .signup(signup_request("OPEN", "OWNER@EXAMPLE.COM"), &client())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::EmailAlreadyExists)));
}

#[tokio::test]
async fn test_expired_and_exhausted_code_reports_expired() {
    let (franchise, provider) = setup().await;
    seed_code(
        &franchise,
        NewInvitationCode::builder()
            .code("STALE")
            .max_uses(1)
            .expires_at(Utc::now() - Duration::days(1))
            .build()
            .unwrap(),
    )
    .await;
    let code = provider
        .invitation_code()
        .find_by_code("STALE")
        .await
        .unwrap()
        .unwrap();
    provider.invitation_code().redeem(&code.id).await.unwrap();

    let err = franchise
        .signup(signup_request("STALE", "late@example.com"), &client())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Invitation(InvitationError::Expired)));

    let latest = franchise.recent_audit_entries(1).await.unwrap();
    assert_eq!(latest[0].action, actions::SIGNUP_INVALID_INVITATION_CODE);
}

#[tokio::test]
async fn test_concurrent_signups_on_single_use_code() {
    let (franchise, provider) = setup().await;
    seed_code(
        &franchise,
        NewInvitationCode::builder().code("ONLYONE").max_uses(1).build().unwrap(),
    )
    .await;

    let client = client();
    let (first, second) = tokio::join!(
        franchise.signup(signup_request("ONLYONE", "first@example.com"), &client),
        franchise.signup(signup_request("ONLYONE", "second@example.com"), &client),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1);

    let failure = first.err().or(second.err()).unwrap();
    assert!(matches!(
        failure,
        Error::Invitation(InvitationError::Exhausted)
    ));

    let code = provider
        .invitation_code()
        .find_by_code("ONLYONE")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code.current_uses, 1);
}

#[tokio::test]
async fn test_lockout_after_five_failures() {
    let (franchise, provider) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("LOCK").build().unwrap()).await;
    franchise
        .signup(signup_request("LOCK", "locked@example.com"), &client())
        .await
        .unwrap();

    for _ in 0..5 {
        let err = franchise
            .login(login_request("locked@example.com", "Wrong1234!"), &client())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
    }

    let err = franchise
        .login(login_request("locked@example.com", PASSWORD), &client())
        .await
        .unwrap_err();
    match err {
        Error::Auth(AuthError::AccountLocked { minutes }) => assert!(minutes > 0 && minutes <= 15),
        other => panic!("expected lockout, got {other:?}"),
    }

    let account = provider
        .account()
        .find_by_email("locked@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(account.is_locked());
    assert_eq!(account.login_attempts, 0);
}

#[tokio::test]
async fn test_successful_login_resets_failures() {
    let (franchise, provider) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("RESET").build().unwrap()).await;
    franchise
        .signup(signup_request("RESET", "reset@example.com"), &client())
        .await
        .unwrap();

    for _ in 0..3 {
        let _ = franchise
            .login(login_request("reset@example.com", "Wrong1234!"), &client())
            .await;
    }
    franchise
        .login(login_request("reset@example.com", PASSWORD), &client())
        .await
        .unwrap();

    let account = provider
        .account()
        .find_by_email("reset@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.login_attempts, 0);
    assert!(account.locked_until.is_none());
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_share_message() {
    let (franchise, _) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("SAME").build().unwrap()).await;
    franchise
        .signup(signup_request("SAME", "known@example.com"), &client())
        .await
        .unwrap();

    let unknown = franchise
        .login(login_request("unknown@example.com", PASSWORD), &client())
        .await
        .unwrap_err();
    let wrong = franchise
        .login(login_request("known@example.com", "Wrong1234!"), &client())
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_inactive_account_is_rejected() {
    let (franchise, provider) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("OFF").build().unwrap()).await;
    franchise
        .signup(signup_request("OFF", "inactive@example.com"), &client())
        .await
        .unwrap();

    let mut account = provider
        .account()
        .find_by_email("inactive@example.com")
        .await
        .unwrap()
        .unwrap();
    account.is_active = false;
    provider.account().update(&account).await.unwrap();

    let err = franchise
        .login(login_request("inactive@example.com", PASSWORD), &client())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::AccountInactive)));
}

#[tokio::test]
async fn test_audit_failure_does_not_change_outcome() {
    let (franchise, provider) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("NOAUDIT").build().unwrap()).await;

    sqlx::query("DROP TABLE audit_logs")
        .execute(provider.pool())
        .await
        .expect("Failed to drop audit table");

    let created = franchise
        .signup(signup_request("NOAUDIT", "unaudited@example.com"), &client())
        .await
        .expect("Signup should succeed without an audit table");
    assert_eq!(created.data.email, "unaudited@example.com");

    franchise
        .login(login_request("unaudited@example.com", PASSWORD), &client())
        .await
        .expect("Login should succeed without an audit table");
}

#[tokio::test]
async fn test_deactivated_code_is_rejected() {
    let (franchise, provider) = setup().await;
    seed_code(&franchise, NewInvitationCode::builder().code("PAUSED").build().unwrap()).await;
    let code = provider
        .invitation_code()
        .find_by_code("PAUSED")
        .await
        .unwrap()
        .unwrap();

    franchise.deactivate_invitation_code(&code.id).await.unwrap();

    let err = franchise.validate_invitation_code("PAUSED").await.unwrap_err();
    assert!(matches!(err, Error::Invitation(InvitationError::Deactivated)));
}
