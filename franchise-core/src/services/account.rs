//! Signup and login.
//!
//! # Signup
//!
//! 1. Validate the submitted fields
//! 2. Validate the invitation code
//! 3. Refuse emails that are already registered
//! 4. Hash the password and generate an email verification token
//! 5. Redeem one use of the invitation code
//! 6. Persist the account, giving the use back if that fails
//!
//! # Login
//!
//! Unknown emails and wrong passwords produce the same error. Deactivated
//! and locked accounts are reported explicitly. Every
//! [`LockoutConfig::max_failed_attempts`] consecutive wrong passwords lock the
//! account for [`LockoutConfig::lockout_duration`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Account, AccountView, ClientContext, Error, InvitationCode, NewAccount, NewAuditEntry,
    audit::{actions, entities},
    crypto::{DEFAULT_BCRYPT_COST, PasswordHasher, generate_verification_token},
    error::{AuthError, SessionError, ValidationError},
    repositories::{AccountRepository, AuditLogRepository, InvitationCodeRepository},
    services::{AuditLogger, InvitationCodeService},
    session::{AccessToken, JwtIssuer},
    validation,
};

/// Failed-login lockout policy.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Consecutive wrong passwords that trigger a lock
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(15),
        }
    }
}

impl LockoutConfig {
    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.max_failed_attempts = max_failed_attempts;
        self
    }

    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = lockout_duration;
        self
    }
}

/// Configuration for [`AccountService`].
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub bcrypt_cost: u32,
    /// Lifetime of the email verification token issued at signup
    pub verification_token_ttl: Duration,
    pub lockout: LockoutConfig,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            verification_token_ttl: Duration::hours(24),
            lockout: LockoutConfig::default(),
        }
    }
}

impl AccountConfig {
    pub fn with_bcrypt_cost(mut self, bcrypt_cost: u32) -> Self {
        self.bcrypt_cost = bcrypt_cost;
        self
    }

    pub fn with_verification_token_ttl(mut self, ttl: Duration) -> Self {
        self.verification_token_ttl = ttl;
        self
    }

    pub fn with_lockout(mut self, lockout: LockoutConfig) -> Self {
        self.lockout = lockout;
        self
    }
}

/// Signup form as submitted by the client.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub invitation_code: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupRequest {
    /// Check every field, reporting the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_invitation_code_input(&self.invitation_code)?;
        validation::validate_full_name(&self.full_name)?;
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)?;
        validation::validate_password_confirmation(&self.password, &self.confirm_password)
    }
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("invitation_code", &self.invitation_code)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("Email is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField(
                "Password is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub data: AccountView,
}

impl SignupResponse {
    pub const MESSAGE: &'static str =
        "Account created successfully! Please check your email to verify your account.";

    fn new(data: AccountView) -> Self {
        Self {
            success: true,
            message: Self::MESSAGE.to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: AccessToken,
    pub data: AccountView,
}

impl LoginResponse {
    pub const MESSAGE: &'static str = "Login successful";

    fn new(token: AccessToken, data: AccountView) -> Self {
        Self {
            success: true,
            message: Self::MESSAGE.to_string(),
            token,
            data,
        }
    }
}

/// Account signup, login and token authentication.
pub struct AccountService<A, I, L>
where
    A: AccountRepository,
    I: InvitationCodeRepository,
    L: AuditLogRepository,
{
    accounts: Arc<A>,
    invitations: InvitationCodeService<I>,
    audit: AuditLogger<L>,
    hasher: PasswordHasher,
    issuer: JwtIssuer,
    config: AccountConfig,
}

impl<A, I, L> AccountService<A, I, L>
where
    A: AccountRepository,
    I: InvitationCodeRepository,
    L: AuditLogRepository,
{
    pub fn new(
        accounts: Arc<A>,
        invitations: InvitationCodeService<I>,
        audit: AuditLogger<L>,
        issuer: JwtIssuer,
        config: AccountConfig,
    ) -> Self {
        Self {
            accounts,
            invitations,
            audit,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            issuer,
            config,
        }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn invitations(&self) -> &InvitationCodeService<I> {
        &self.invitations
    }

    pub fn audit(&self) -> &AuditLogger<L> {
        &self.audit
    }

    pub fn issuer(&self) -> &JwtIssuer {
        &self.issuer
    }

    /// Register a new account with an invitation code.
    pub async fn signup(
        &self,
        request: SignupRequest,
        client: &ClientContext,
    ) -> Result<SignupResponse, Error> {
        request.validate()?;

        let invitation = match self.invitations.validate(&request.invitation_code).await {
            Ok(invitation) => invitation,
            Err(Error::Invitation(reason)) => {
                self.audit_rejected_invitation(&request.invitation_code, &reason.to_string(), client)
                    .await;
                return Err(reason.into());
            }
            Err(e) => return Err(e),
        };

        let email = request.email.to_lowercase();
        if self.accounts.find_by_email(&email).await?.is_some() {
            tracing::warn!("Signup rejected: email already registered");
            self.audit
                .record(
                    NewAuditEntry::new(actions::SIGNUP_EMAIL_EXISTS)
                        .entity(entities::USER, None)
                        .details(json!({ "email": request.email }))
                        .client(client),
                )
                .await;
            return Err(AuthError::EmailAlreadyExists.into());
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let new_account = NewAccount::builder()
            .email(email)
            .full_name(request.full_name)
            .password_hash(password_hash)
            .role(invitation.role)
            .invitation_code_id(Some(invitation.id.clone()))
            .email_verification(
                generate_verification_token(),
                Utc::now() + self.config.verification_token_ttl,
            )
            .is_active(true)
            .build()?;

        if let Err(e) = self.invitations.redeem(&invitation).await {
            if let Error::Invitation(reason) = &e {
                self.audit_rejected_invitation(&invitation.code, &reason.to_string(), client)
                    .await;
            }
            return Err(e);
        }

        let account = match self.accounts.create(new_account).await {
            Ok(account) => account,
            Err(e) => {
                self.release_redemption(&invitation).await;
                return Err(e);
            }
        };

        tracing::info!(account_id = %account.id, role = %account.role, "Account created");
        self.audit
            .record(
                NewAuditEntry::new(actions::USER_SIGNUP_SUCCESS)
                    .actor(&account.id)
                    .entity(entities::USER, Some(account.id.to_string()))
                    .details(json!({
                        "email": account.email,
                        "role": account.role,
                        "invitationCodeId": invitation.id,
                    }))
                    .client(client),
            )
            .await;

        Ok(SignupResponse::new(account.view()))
    }

    /// Check credentials and issue an access token.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientContext,
    ) -> Result<LoginResponse, Error> {
        request.validate()?;

        let email = request.email.to_lowercase();
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            self.audit
                .record(
                    NewAuditEntry::new(actions::LOGIN_USER_NOT_FOUND)
                        .entity(entities::USER, None)
                        .details(json!({ "email": email }))
                        .client(client),
                )
                .await;
            return Err(AuthError::InvalidCredentials.into());
        };

        if !account.is_active {
            self.audit_account_event(actions::LOGIN_ACCOUNT_INACTIVE, &account, json!({}), client)
                .await;
            return Err(AuthError::AccountInactive.into());
        }

        let now = Utc::now();
        if let Some(minutes) = account.lockout_minutes_remaining(now) {
            self.audit_account_event(
                actions::LOGIN_ACCOUNT_LOCKED,
                &account,
                json!({ "lockedUntil": account.locked_until }),
                client,
            )
            .await;
            return Err(AuthError::AccountLocked { minutes }.into());
        }

        if !self
            .hasher
            .verify(&request.password, &account.password_hash)
            .await?
        {
            let lockout = &self.config.lockout;
            let failed = self
                .accounts
                .record_failed_login(
                    &account.id,
                    lockout.max_failed_attempts,
                    now + lockout.lockout_duration,
                )
                .await?;

            if failed.locked() {
                tracing::warn!(account_id = %account.id, "Account locked after repeated failed logins");
            }
            self.audit_account_event(
                actions::LOGIN_INVALID_PASSWORD,
                &account,
                json!({ "attempts": failed.attempts, "locked": failed.locked() }),
                client,
            )
            .await;
            return Err(AuthError::InvalidCredentials.into());
        }

        let account = self
            .accounts
            .record_successful_login(&account.id, now)
            .await?;
        let token = self.issuer.issue(&account)?;

        tracing::info!(account_id = %account.id, "Login succeeded");
        self.audit_account_event(actions::LOGIN_SUCCESS, &account, json!({}), client)
            .await;

        Ok(LoginResponse::new(token, account.view()))
    }

    /// Resolve a bearer token to the account it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Account, Error> {
        let claims = self.issuer.verify(token)?;

        let account = self
            .accounts
            .find_by_id(&claims.account_id())
            .await?
            .ok_or_else(|| SessionError::InvalidToken("Account no longer exists".to_string()))?;

        if !account.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        Ok(account)
    }

    async fn audit_rejected_invitation(&self, code: &str, error: &str, client: &ClientContext) {
        tracing::warn!(error = %error, "Signup rejected: invitation code not accepted");
        self.audit
            .record(
                NewAuditEntry::new(actions::SIGNUP_INVALID_INVITATION_CODE)
                    .entity(entities::INVITATION_CODE, None)
                    .details(json!({ "code": code, "error": error }))
                    .client(client),
            )
            .await;
    }

    async fn audit_account_event(
        &self,
        action: &str,
        account: &Account,
        details: serde_json::Value,
        client: &ClientContext,
    ) {
        self.audit
            .record(
                NewAuditEntry::new(action)
                    .actor(&account.id)
                    .entity(entities::USER, Some(account.id.to_string()))
                    .details(details)
                    .client(client),
            )
            .await;
    }

    async fn release_redemption(&self, invitation: &InvitationCode) {
        if let Err(e) = self.invitations.release(&invitation.id).await {
            tracing::error!(
                invitation_code_id = %invitation.id,
                error = %e,
                "Failed to release invitation code use after signup failure"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AccountId, FailedLogin, InvitationError, NewInvitationCode, Role,
        services::audit::tests::{FailingAuditLogRepository, MockAuditLogRepository},
        services::invitation::tests::MockInvitationCodeRepository,
        session::JwtConfig,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAccountRepository {
        accounts: Mutex<HashMap<AccountId, Account>>,
        fail_create: bool,
    }

    impl MockAccountRepository {
        fn failing_create() -> Self {
            Self {
                fail_create: true,
                ..Default::default()
            }
        }

        fn set_active(&self, email: &str, is_active: bool) {
            let mut accounts = self.accounts.lock().unwrap();
            if let Some(account) = accounts.values_mut().find(|a| a.email == email) {
                account.is_active = is_active;
            }
        }

        fn get(&self, email: &str) -> Account {
            let accounts = self.accounts.lock().unwrap();
            accounts.values().find(|a| a.email == email).cloned().unwrap()
        }
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn create(&self, account: NewAccount) -> Result<Account, Error> {
            if self.fail_create {
                return Err(crate::error::StorageError::Database("insert failed".to_string()).into());
            }
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.values().any(|a| a.email == account.email) {
                return Err(AuthError::EmailAlreadyExists.into());
            }
            let now = Utc::now();
            let stored = Account {
                id: account.id,
                email: account.email,
                full_name: account.full_name,
                password_hash: account.password_hash,
                role: account.role,
                branch_id: None,
                invitation_code_id: account.invitation_code_id,
                is_active: account.is_active,
                is_email_verified: false,
                email_verification_token: account.email_verification_token,
                email_verification_expires: account.email_verification_expires,
                password_reset_token: None,
                password_reset_expires: None,
                last_login: None,
                login_attempts: 0,
                locked_until: None,
                created_at: now,
                updated_at: now,
            };
            accounts.insert(stored.id.clone(), stored.clone());
            Ok(stored)
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
            Ok(self.accounts.lock().unwrap().get(id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts.values().find(|a| a.email == email).cloned())
        }

        async fn record_failed_login(
            &self,
            id: &AccountId,
            max_attempts: u32,
            lock_until: DateTime<Utc>,
        ) -> Result<FailedLogin, Error> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts.get_mut(id).ok_or(AuthError::AccountNotFound)?;
            let attempts = account.login_attempts + 1;
            if attempts >= max_attempts {
                account.login_attempts = 0;
                account.locked_until = Some(lock_until);
                Ok(FailedLogin {
                    attempts,
                    locked_until: Some(lock_until),
                })
            } else {
                account.login_attempts = attempts;
                Ok(FailedLogin {
                    attempts,
                    locked_until: None,
                })
            }
        }

        async fn record_successful_login(
            &self,
            id: &AccountId,
            at: DateTime<Utc>,
        ) -> Result<Account, Error> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts.get_mut(id).ok_or(AuthError::AccountNotFound)?;
            account.login_attempts = 0;
            account.locked_until = None;
            account.last_login = Some(at);
            Ok(account.clone())
        }

        async fn update(&self, account: &Account) -> Result<Account, Error> {
            let mut accounts = self.accounts.lock().unwrap();
            accounts.insert(account.id.clone(), account.clone());
            Ok(account.clone())
        }
    }

    type TestService<L = MockAuditLogRepository> =
        AccountService<MockAccountRepository, MockInvitationCodeRepository, L>;

    const CODE: &str = "FRANCHISE-2024";
    const PASSWORD: &str = "Abc12345!";

    fn client() -> ClientContext {
        ClientContext::new(Some("203.0.113.7".to_string()), Some("test-agent".to_string()))
    }

    fn config() -> AccountConfig {
        AccountConfig::default().with_bcrypt_cost(4)
    }

    fn build<L: AuditLogRepository>(
        accounts: MockAccountRepository,
        audit: Arc<L>,
    ) -> (
        TestService<L>,
        Arc<MockAccountRepository>,
        Arc<MockInvitationCodeRepository>,
    ) {
        let accounts = Arc::new(accounts);
        let invitations = Arc::new(MockInvitationCodeRepository::default());
        let service = AccountService::new(
            Arc::clone(&accounts),
            InvitationCodeService::new(Arc::clone(&invitations)),
            AuditLogger::new(audit),
            JwtIssuer::new(JwtConfig::new_hs256(b"account_service_test_secret".to_vec())),
            config(),
        );
        (service, accounts, invitations)
    }

    async fn seed_code<L: AuditLogRepository>(
        service: &TestService<L>,
        max_uses: Option<u32>,
    ) -> InvitationCode {
        let mut builder = NewInvitationCode::builder()
            .code(CODE)
            .role(Role::FranchiseOwner);
        if let Some(max_uses) = max_uses {
            builder = builder.max_uses(max_uses);
        }
        service
            .invitations()
            .create(builder.build().unwrap())
            .await
            .unwrap()
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            invitation_code: CODE.to_string(),
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

    #[tokio::test]
    async fn test_signup_creates_account() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, accounts, invitations) =
            build(MockAccountRepository::default(), Arc::clone(&audit));
        let code = seed_code(&service, Some(10)).await;

        let response = service
            .signup(signup_request("Owner@Example.com"), &client())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, SignupResponse::MESSAGE);
        assert_eq!(response.data.email, "owner@example.com");
        assert_eq!(response.data.role, Role::FranchiseOwner);
        assert!(response.data.is_active);
        assert!(!response.data.is_email_verified);
        assert_eq!(response.data.invitation_code_id, Some(code.id.clone()));
        assert_eq!(invitations.current_uses(&code.id), 1);

        let stored = accounts.get("owner@example.com");
        assert_ne!(stored.password_hash, PASSWORD);
        assert_eq!(stored.email_verification_token.as_ref().map(String::len), Some(64));
        let ttl = stored.email_verification_expires.unwrap() - stored.created_at;
        assert!(ttl > Duration::hours(23) && ttl <= Duration::hours(24));

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, actions::USER_SIGNUP_SUCCESS);
        assert_eq!(entries[0].account_id, Some(stored.id.clone()));
        assert_eq!(entries[0].details["invitationCodeId"], code.id.to_string());
        assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_signup_role_comes_from_invitation_code() {
        let (service, _, _) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        service
            .invitations()
            .create(
                NewInvitationCode::builder()
                    .code("CREW-ONLY")
                    .role(Role::Crew)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let mut request = signup_request("crew@example.com");
        request.invitation_code = "CREW-ONLY".to_string();
        let response = service.signup(request, &client()).await.unwrap();
        assert_eq!(response.data.role, Role::Crew);
    }

    #[tokio::test]
    async fn test_signup_validation_runs_first() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, _, _) = build(MockAccountRepository::default(), Arc::clone(&audit));

        let mut request = signup_request("owner@example.com");
        request.confirm_password = "Different1!".to_string();
        let err = service.signup(request, &client()).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Passwords do not match"
        );
        assert!(audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_signup_unknown_code_is_audited() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, _, _) = build(MockAccountRepository::default(), Arc::clone(&audit));

        let err = service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Invitation(InvitationError::NotFound)));

        let entries = audit.entries();
        assert_eq!(entries[0].action, actions::SIGNUP_INVALID_INVITATION_CODE);
        assert_eq!(entries[0].account_id, None);
        assert_eq!(entries[0].entity_type.as_deref(), Some("invitation_code"));
        assert_eq!(entries[0].details["code"], CODE);
        assert_eq!(entries[0].details["error"], "Invalid invitation code");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_is_case_insensitive() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, _, invitations) =
            build(MockAccountRepository::default(), Arc::clone(&audit));
        let code = seed_code(&service, None).await;

        service
            .signup(signup_request("a@x.com"), &client())
            .await
            .unwrap();
        let err = service
            .signup(signup_request("A@X.COM"), &client())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::EmailAlreadyExists)));
        assert_eq!(invitations.current_uses(&code.id), 1);
        assert_eq!(
            audit.actions(),
            vec![actions::USER_SIGNUP_SUCCESS, actions::SIGNUP_EMAIL_EXISTS]
        );
    }

    #[tokio::test]
    async fn test_signup_exhausted_code() {
        let (service, _, _) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        seed_code(&service, Some(1)).await;

        service
            .signup(signup_request("first@example.com"), &client())
            .await
            .unwrap();
        let err = service
            .signup(signup_request("second@example.com"), &client())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Invitation(InvitationError::Exhausted)));
    }

    #[tokio::test]
    async fn test_concurrent_signups_on_single_use_code() {
        let (service, _, invitations) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        let code = seed_code(&service, Some(1)).await;

        let (client_a, client_b) = (client(), client());
        let (first, second) = tokio::join!(
            service.signup(signup_request("first@example.com"), &client_a),
            service.signup(signup_request("second@example.com"), &client_b),
        );

        let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if first.is_err() { first } else { second };
        assert!(matches!(
            loser,
            Err(Error::Invitation(InvitationError::Exhausted))
        ));
        assert_eq!(invitations.current_uses(&code.id), 1);
    }

    #[tokio::test]
    async fn test_signup_releases_code_when_persisting_fails() {
        let (service, _, invitations) = build(
            MockAccountRepository::failing_create(),
            Arc::new(MockAuditLogRepository::default()),
        );
        let code = seed_code(&service, Some(1)).await;

        let err = service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap_err();

        assert!(err.is_storage_error());
        assert_eq!(invitations.current_uses(&code.id), 0);
    }

    #[tokio::test]
    async fn test_signup_succeeds_when_audit_store_fails() {
        let (service, _, _) = build(
            MockAccountRepository::default(),
            Arc::new(FailingAuditLogRepository),
        );
        seed_code(&service, None).await;

        let response = service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();
        assert!(response.success);

        let login = service
            .login(login_request("owner@example.com", PASSWORD), &client())
            .await
            .unwrap();
        assert!(login.success);
    }

    #[tokio::test]
    async fn test_login_success_issues_token() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, accounts, _) = build(MockAccountRepository::default(), Arc::clone(&audit));
        seed_code(&service, None).await;
        service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();

        let response = service
            .login(login_request("OWNER@example.com", PASSWORD), &client())
            .await
            .unwrap();

        assert_eq!(response.message, LoginResponse::MESSAGE);
        assert!(response.data.last_login.is_some());

        let claims = service.issuer().verify(response.token.as_str()).unwrap();
        assert_eq!(claims.sub, response.data.id.to_string());
        assert_eq!(claims.email, "owner@example.com");

        let account = service.authenticate(response.token.as_str()).await.unwrap();
        assert_eq!(account.id, accounts.get("owner@example.com").id);
        assert_eq!(audit.actions().last().unwrap(), actions::LOGIN_SUCCESS);
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_wrong_password_look_the_same() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, _, _) = build(MockAccountRepository::default(), Arc::clone(&audit));
        seed_code(&service, None).await;
        service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();

        let unknown = service
            .login(login_request("nobody@example.com", PASSWORD), &client())
            .await
            .unwrap_err();
        let wrong = service
            .login(login_request("owner@example.com", "Wrong1234!"), &client())
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, Error::Auth(AuthError::InvalidCredentials)));

        let entries = audit.entries();
        let not_found = &entries[entries.len() - 2];
        assert_eq!(not_found.action, actions::LOGIN_USER_NOT_FOUND);
        assert_eq!(not_found.account_id, None);
        let invalid = &entries[entries.len() - 1];
        assert_eq!(invalid.action, actions::LOGIN_INVALID_PASSWORD);
        assert_eq!(invalid.details["attempts"], 1);
        assert_eq!(invalid.details["locked"], false);
    }

    #[tokio::test]
    async fn test_login_lockout_after_five_failures() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, accounts, _) = build(MockAccountRepository::default(), Arc::clone(&audit));
        seed_code(&service, None).await;
        service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();

        for _ in 0..5 {
            let err = service
                .login(login_request("owner@example.com", "Wrong1234!"), &client())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
        }

        let stored = accounts.get("owner@example.com");
        assert_eq!(stored.login_attempts, 0);
        assert!(stored.locked_until.is_some());
        assert_eq!(audit.entries().last().unwrap().details["locked"], true);

        let err = service
            .login(login_request("owner@example.com", PASSWORD), &client())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Please try again in"));
        match err {
            Error::Auth(AuthError::AccountLocked { minutes }) => {
                assert!(minutes > 0 && minutes <= 15);
            }
            other => panic!("Expected locked account, got {other:?}"),
        }
        assert_eq!(audit.actions().last().unwrap(), actions::LOGIN_ACCOUNT_LOCKED);
    }

    #[tokio::test]
    async fn test_successful_login_resets_attempts() {
        let (service, accounts, _) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        seed_code(&service, None).await;
        service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();

        for _ in 0..3 {
            let _ = service
                .login(login_request("owner@example.com", "Wrong1234!"), &client())
                .await;
        }
        assert_eq!(accounts.get("owner@example.com").login_attempts, 3);

        service
            .login(login_request("owner@example.com", PASSWORD), &client())
            .await
            .unwrap();
        let stored = accounts.get("owner@example.com");
        assert_eq!(stored.login_attempts, 0);
        assert!(stored.locked_until.is_none());
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_inactive_account() {
        let audit = Arc::new(MockAuditLogRepository::default());
        let (service, accounts, _) = build(MockAccountRepository::default(), Arc::clone(&audit));
        seed_code(&service, None).await;
        service
            .signup(signup_request("owner@example.com"), &client())
            .await
            .unwrap();
        accounts.set_active("owner@example.com", false);

        let err = service
            .login(login_request("owner@example.com", PASSWORD), &client())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::AccountInactive)));
        assert_eq!(
            audit.actions().last().unwrap(),
            actions::LOGIN_ACCOUNT_INACTIVE
        );
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (service, _, _) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        let err = service
            .login(login_request("", PASSWORD), &client())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Email is required");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let (service, _, _) = build(
            MockAccountRepository::default(),
            Arc::new(MockAuditLogRepository::default()),
        );
        assert!(service.authenticate("not-a-token").await.unwrap_err().is_session_error());
    }

    #[test]
    fn test_request_debug_redacts_passwords() {
        let rendered = format!("{:?}", signup_request("owner@example.com"));
        assert!(!rendered.contains(PASSWORD));
        let rendered = format!("{:?}", login_request("owner@example.com", PASSWORD));
        assert!(!rendered.contains(PASSWORD));
    }

    #[test]
    fn test_signup_request_deserializes_camel_case() {
        let request: SignupRequest = serde_json::from_value(json!({
            "invitationCode": CODE,
            "fullName": "Maria Santos",
            "email": "owner@example.com",
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let partial: SignupRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            partial.validate().unwrap_err().to_string(),
            "Invitation code is required"
        );
    }
}
